// ==========================================
// 需求周同步工具 - 数据清洗器实现
// ==========================================
// 职责: TRIM / NULL 标准化 / 数量与日期转换
// ==========================================

use crate::importer::error::RecordError;
use crate::importer::file_parser::parse_date_text;
use crate::importer::sheet_grid::CellValue;
use chrono::{Duration, NaiveDate};

/// Excel 1900 日期系统的序列号基准日
const EXCEL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

/// 日期转换结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateCell {
    Missing,
    Valid(NaiveDate),
    Invalid(String),
}

pub struct DataCleaner;

impl DataCleaner {
    /// 清洗文本（TRIM，空白 → None）
    pub fn clean_text(&self, cell: &CellValue) -> Option<String> {
        cell.as_text().and_then(|v| {
            let trimmed = v.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
    }

    /// 解析数量（小数截断取整，负数/非数值报错）
    ///
    /// # 返回
    /// - Ok(None): 空单元格
    /// - Ok(Some(q)): 非负整数数量
    /// - Err: 无法转换
    pub fn parse_quantity(
        &self,
        cell: &CellValue,
        row: u32,
        field: &str,
    ) -> Result<Option<u64>, RecordError> {
        if cell.is_blank() {
            return Ok(None);
        }

        let invalid = || RecordError::QuantityError {
            row,
            field: field.to_string(),
            value: cell.as_text().unwrap_or_default(),
        };

        let value = cell.as_number().ok_or_else(invalid)?;
        if !value.is_finite() || value < 0.0 {
            return Err(invalid());
        }
        Ok(Some(value.trunc() as u64))
    }

    /// 解析日期（日期单元格 / 文本日期 / Excel 序列号）
    pub fn parse_date(&self, cell: &CellValue) -> DateCell {
        match cell {
            CellValue::Empty => DateCell::Missing,
            CellValue::Date(dt) => DateCell::Valid(dt.date()),
            CellValue::Text(s) if s.trim().is_empty() => DateCell::Missing,
            CellValue::Text(s) => match parse_date_text(s) {
                Some(date) => DateCell::Valid(date),
                None => DateCell::Invalid(s.trim().to_string()),
            },
            CellValue::Number(n) => match excel_serial_to_date(*n) {
                Some(date) => DateCell::Valid(date),
                None => DateCell::Invalid(n.to_string()),
            },
        }
    }
}

/// Excel 序列号 → 日期（仅接受 1..=2958465，即 1900-01-01..9999-12-31）
fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !(1.0..=2_958_465.0).contains(&serial) {
        return None;
    }
    let (y, m, d) = EXCEL_EPOCH;
    NaiveDate::from_ymd_opt(y, m, d)?.checked_add_signed(Duration::days(serial.trunc() as i64))
}
