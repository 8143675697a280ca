// ==========================================
// 需求周同步工具 - 透视表写出
// ==========================================
// 工具: rust_xlsxwriter
// 格式: 表头加粗 / 灰底 D3D3D3 / 居中；当前周表头黄底；冻结 B2
// 列宽: 列内最长文本 + 2
// ==========================================

use crate::config::OutputConfig;
use crate::report::pivot::PivotTable;
use chrono::NaiveDateTime;
use rust_xlsxwriter::{Color, Format, FormatAlign, Workbook, XlsxError};
use std::path::Path;
use thiserror::Error;
use tracing::{info, instrument};

const HEADER_GRAY: u32 = 0xD3D3D3;
const CURRENT_WEEK_YELLOW: u32 = 0xFFFF00;
const COLUMN_PADDING: usize = 2;
/// xlsx 工作表列数上限（A..XFD）
const MAX_COLUMNS: usize = 16_384;

/// 透视表写出错误
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("透视表写出失败: {0}")]
    Xlsx(#[from] XlsxError),

    #[error("透视表列数超出工作表上限: {0}")]
    TooManyColumns(usize),
}

/// 输出文件名: <前缀><YYYYMMDD_HHMM>.xlsx
pub fn output_file_name(prefix: &str, now: NaiveDateTime) -> String {
    format!("{}{}.xlsx", prefix, now.format("%Y%m%d_%H%M"))
}

pub struct PivotWriter {
    sheet_name: String,
    item_header: String,
}

impl PivotWriter {
    pub fn new(config: &OutputConfig) -> Self {
        Self {
            sheet_name: config.sheet_name.clone(),
            item_header: config.item_header.clone(),
        }
    }

    /// 写出透视表到指定路径
    #[instrument(skip(self, pivot), fields(path = %path.display(), items = pivot.items().len(), weeks = pivot.weeks().len()))]
    pub fn write(&self, pivot: &PivotTable, path: &Path) -> Result<(), ReportError> {
        // 1 列物料号 + N 列周
        let last_col = pivot.weeks().len();
        if last_col + 1 > MAX_COLUMNS {
            return Err(ReportError::TooManyColumns(last_col + 1));
        }

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name(&self.sheet_name)?;

        let header_format = Format::new()
            .set_bold()
            .set_background_color(Color::RGB(HEADER_GRAY))
            .set_align(FormatAlign::Center);
        let current_format = Format::new()
            .set_bold()
            .set_background_color(Color::RGB(CURRENT_WEEK_YELLOW))
            .set_align(FormatAlign::Center);

        // ===== 表头 =====
        let mut widths: Vec<usize> = Vec::with_capacity(last_col + 1);
        sheet.write_string_with_format(0, 0, &self.item_header, &header_format)?;
        widths.push(self.item_header.chars().count());

        for (i, week) in pivot.weeks().iter().enumerate() {
            let label = week.to_string();
            let format = if pivot.current_column() == Some(i) {
                &current_format
            } else {
                &header_format
            };
            sheet.write_string_with_format(0, (i + 1) as u16, &label, format)?;
            widths.push(label.chars().count());
        }

        // ===== 数据行 =====
        for (r, (item, values)) in pivot.rows().enumerate() {
            let row = (r + 1) as u32;
            sheet.write_string(row, 0, item)?;
            widths[0] = widths[0].max(item.chars().count());
            for (c, value) in values.iter().enumerate() {
                sheet.write_number(row, (c + 1) as u16, *value as f64)?;
                widths[c + 1] = widths[c + 1].max(value.to_string().len());
            }
        }

        for (col, width) in widths.iter().enumerate() {
            sheet.set_column_width(col as u16, (width + COLUMN_PADDING) as f64)?;
        }
        sheet.set_freeze_panes(1, 1)?;

        workbook.save(path)?;
        info!("透视表已写出");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::calendar_week::{CalendarWeek, WeekEncoding};
    use crate::domain::record::DemandRecord;
    use calamine::{open_workbook_auto, Data, Reader};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    #[test]
    fn test_output_file_name() {
        let now = NaiveDate::from_ymd_opt(2025, 1, 8)
            .unwrap()
            .and_hms_opt(14, 5, 0)
            .unwrap();
        assert_eq!(
            output_file_name("extracted_data_", now),
            "extracted_data_20250108_1405.xlsx"
        );
    }

    #[test]
    fn test_write_pivot_workbook() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pivot.xlsx");
        let records = vec![
            DemandRecord::new("X1", "25CW02".parse().unwrap(), 8),
            DemandRecord::new("X2", "25CW03".parse().unwrap(), 4),
        ];
        let today = NaiveDate::from_ymd_opt(2025, 1, 8).unwrap();
        let pivot = PivotTable::build(&records, today, &[]);

        PivotWriter::new(&OutputConfig::default())
            .write(&pivot, &path)
            .unwrap();

        let mut workbook = open_workbook_auto(&path).unwrap();
        let range = workbook.worksheet_range("Extracted Data").unwrap();
        assert_eq!(
            range.get_value((0, 0)),
            Some(&Data::String("Customer Item".to_string()))
        );
        assert_eq!(
            range.get_value((0, 2)),
            Some(&Data::String("25CW03".to_string()))
        );
        assert_eq!(range.get_value((1, 1)), Some(&Data::Float(8.0)));
        assert_eq!(range.get_value((1, 2)), Some(&Data::Float(0.0)));
        assert_eq!(range.get_value((2, 0)), Some(&Data::String("X2".to_string())));
    }

    #[test]
    fn test_too_many_week_columns_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wide.xlsx");
        // 1 列物料号 + 16384 列周 = 16385 列
        let mut week = CalendarWeek::new(2000, 1, WeekEncoding::Slash).unwrap();
        let mut records = Vec::with_capacity(MAX_COLUMNS);
        for _ in 0..MAX_COLUMNS {
            records.push(DemandRecord::new("X1", week, 1));
            week = week.next();
        }
        let today = NaiveDate::from_ymd_opt(2025, 1, 8).unwrap();
        let pivot = PivotTable::build(&records, today, &[]);

        let result = PivotWriter::new(&OutputConfig::default()).write(&pivot, &path);

        assert!(matches!(result, Err(ReportError::TooManyColumns(16_385))));
        assert!(!path.exists());
    }
}
