// ==========================================
// 需求周同步工具 - 矩阵表行分类器
// ==========================================
// 职责: 行号 + 首列文本 → RowKind
// 规则: 周标签行 / 数量行按固定行号；标记行按首列正则（缺省 "ABS <编号>"）
// ==========================================

use crate::config::MatrixLayout;
use crate::domain::types::RowKind;
use crate::importer::error::DocumentError;
use crate::importer::sheet_grid::CellValue;
use regex::Regex;

pub struct RowClassifier {
    marker_pattern: Regex,
    marker_prefix: String,
    week_label_row: u32,
    quantity_row: u32,
}

impl RowClassifier {
    pub fn new(layout: &MatrixLayout) -> Result<Self, DocumentError> {
        let marker_pattern =
            Regex::new(&layout.marker_pattern).map_err(|e| DocumentError::InvalidPattern {
                pattern: layout.marker_pattern.clone(),
                message: e.to_string(),
            })?;

        Ok(Self {
            marker_pattern,
            marker_prefix: layout.marker_prefix.clone(),
            week_label_row: layout.week_label_row,
            quantity_row: layout.quantity_row,
        })
    }

    /// 行分类（固定行号优先于标记匹配）
    pub fn classify(&self, row: u32, first_cell: &CellValue) -> RowKind {
        if row == self.week_label_row {
            return RowKind::WeekHeader;
        }
        if row == self.quantity_row {
            return RowKind::QuantityRow;
        }

        // 只有文本单元格可能是标记行
        if let CellValue::Text(text) = first_cell {
            if let Some(sub_key) = self.marker_sub_key(text) {
                return RowKind::Marker(sub_key);
            }
        }
        RowKind::Unclassified
    }

    /// 标记文本 → 子键（去前缀、去首尾空白）
    pub fn marker_sub_key(&self, text: &str) -> Option<String> {
        if !self.marker_pattern.is_match(text) {
            return None;
        }
        let trimmed = text.trim();
        let rest = trimmed.strip_prefix(&self.marker_prefix).unwrap_or(trimmed);
        let sub_key = rest.trim();
        if sub_key.is_empty() {
            None
        } else {
            Some(sub_key.to_string())
        }
    }
}
