// ==========================================
// 需求周同步工具 - 矩阵表提取器（项目 MB）
// ==========================================
// 版式: 无表头，固定偏移
//   (1,0)     "Sachnummer: <物料号>"
//   第 5 行   周标签（自第 1 列起）
//   第 7 行   主需求数量（与周标签按列对齐）
//   "ABS n"   标记行，取当前周起 5 列窗口
// 积压: 首个名称以 "BKM" 开头的工作表，同行号第 21 列
// ==========================================

use crate::config::MatrixLayout;
use crate::domain::calendar_week::{current_week, CalendarWeek, WeekEncoding};
use crate::domain::record::{DemandRecord, MarkerRecord, WINDOW_WIDTH};
use crate::domain::types::{LayoutVariant, MatrixLabelMode, RowKind};
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::error::{DocumentError, DocumentResult, RecordError};
use crate::importer::extractor_trait::{ExtractContext, FileExtraction, RecordExtractor};
use crate::importer::file_parser::{SheetSelector, WorkbookReader};
use crate::importer::row_classifier::RowClassifier;
use crate::importer::sheet_grid::SheetGrid;
use regex::Regex;
use std::path::Path;
use tracing::{debug, instrument, warn};

pub struct MatrixExtractor {
    layout: MatrixLayout,
    cleaner: DataCleaner,
}

impl MatrixExtractor {
    pub fn new(layout: MatrixLayout) -> Self {
        Self {
            layout,
            cleaner: DataCleaner,
        }
    }

    /// 周标签对应的编码
    fn label_encoding(&self) -> WeekEncoding {
        match self.layout.label_mode {
            MatrixLabelMode::Week => WeekEncoding::Slash,
            MatrixLabelMode::Month => WeekEncoding::Ordinal,
        }
    }

    /// 锚点单元格 → 物料号
    fn read_anchor(&self, grid: &SheetGrid) -> DocumentResult<String> {
        let pattern =
            Regex::new(&self.layout.anchor_pattern).map_err(|e| DocumentError::InvalidPattern {
                pattern: self.layout.anchor_pattern.clone(),
                message: e.to_string(),
            })?;

        let (row, col) = (self.layout.anchor_row, self.layout.anchor_col);
        let value = grid.get(row, col).as_text().unwrap_or_default();

        let item = pattern
            .captures(&value)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|item| !item.is_empty());
        item.ok_or(DocumentError::AnchorMismatch { row, col, value })
    }

    fn parse_label(&self, text: &str) -> Option<CalendarWeek> {
        match self.layout.label_mode {
            MatrixLabelMode::Week => CalendarWeek::parse_slash(text).ok(),
            MatrixLabelMode::Month => CalendarWeek::from_month_period(text),
        }
    }

    /// 读取周标签行（按绝对列号索引，缺失/无法解析为 None）
    fn read_labels(&self, grid: &SheetGrid, skipped: &mut Vec<RecordError>) -> Vec<Option<CalendarWeek>> {
        let row = self.layout.week_label_row;
        let width = grid.width();
        let mut labels = vec![None; width as usize];

        for col in self.layout.first_data_col..width {
            let Some(text) = self.cleaner.clean_text(grid.get(row, col)) else {
                continue;
            };
            match self.parse_label(&text) {
                Some(week) => labels[col as usize] = Some(week),
                None => {
                    let err = RecordError::PeriodFormatError { col, value: text };
                    warn!(error = %err, "周标签跳过");
                    skipped.push(err);
                }
            }
        }
        labels
    }

    /// 主需求行: 标签与数量按列配对，任一缺失则丢弃该列
    fn read_demand(
        &self,
        grid: &SheetGrid,
        item: &str,
        labels: &[Option<CalendarWeek>],
        extraction: &mut FileExtraction,
    ) {
        let row = self.layout.quantity_row;
        let row_number = row + 1;

        for (col, label) in labels.iter().enumerate() {
            let Some(week) = label else { continue };
            let cell = grid.get(row, col as u32);
            match self.cleaner.parse_quantity(cell, row_number, "quantity") {
                Ok(Some(quantity)) => extraction
                    .demand
                    .push(DemandRecord::new(item, *week, quantity)),
                Ok(None) => {}
                Err(e) => {
                    warn!(error = %e, "数量跳过");
                    extraction.skipped.push(e);
                }
            }
        }
    }

    /// 标记行 → MarkerRecord（窗口起点为当前周所在列）
    #[allow(clippy::too_many_arguments)]
    fn read_marker(
        &self,
        grid: &SheetGrid,
        backlog: Option<&SheetGrid>,
        item: &str,
        row: u32,
        sub_key: &str,
        labels: &[Option<CalendarWeek>],
        current: CalendarWeek,
        skipped: &mut Vec<RecordError>,
    ) -> Result<MarkerRecord, RecordError> {
        let start = labels
            .iter()
            .position(|label| *label == Some(current))
            .ok_or_else(|| RecordError::CurrentWeekNotFound {
                row: row + 1,
                sub_key: sub_key.to_string(),
                week: current.to_string(),
            })?;

        let mut quantities = Vec::with_capacity(WINDOW_WIDTH);
        let mut weeks = Vec::with_capacity(WINDOW_WIDTH);
        for offset in 0..WINDOW_WIDTH {
            let col = start + offset;
            let cell = grid.get(row, col as u32);
            // 单格无效只置空该格，标记行保留
            let quantity = match self.cleaner.parse_quantity(cell, row + 1, sub_key) {
                Ok(quantity) => quantity,
                Err(e) => {
                    warn!(sub_key = %sub_key, col, error = %e, "窗口单元格跳过");
                    skipped.push(e);
                    None
                }
            };
            quantities.push(quantity);
            weeks.push(labels.get(col).copied().flatten());
        }

        let backlog = backlog.and_then(|sheet| sheet.get(row, self.layout.backlog_col).as_number());

        Ok(MarkerRecord {
            customer_item: item.to_string(),
            sub_key: sub_key.to_string(),
            quantities,
            weeks,
            backlog,
        })
    }

    /// 从已读取的工作表提取（backlog 为 BKM 工作表，无标记行时可缺省）
    pub fn extract_grids(
        &self,
        primary: &SheetGrid,
        backlog: Option<&SheetGrid>,
        ctx: &ExtractContext,
    ) -> DocumentResult<FileExtraction> {
        let item = self.read_anchor(primary)?;
        let classifier = RowClassifier::new(&self.layout)?;
        let mut extraction = FileExtraction::default();

        let labels = self.read_labels(primary, &mut extraction.skipped);
        self.read_demand(primary, &item, &labels, &mut extraction);

        let marker_rows: Vec<(u32, String)> = (0..primary.height())
            .filter_map(|row| match classifier.classify(row, primary.get(row, 0)) {
                RowKind::Marker(sub_key) => Some((row, sub_key)),
                _ => None,
            })
            .collect();

        if !marker_rows.is_empty() && backlog.is_none() {
            return Err(DocumentError::SheetNotFound(format!(
                "{}*",
                self.layout.backlog_sheet_prefix
            )));
        }

        let current = current_week(ctx.today, self.label_encoding());
        for (row, sub_key) in &marker_rows {
            match self.read_marker(
                primary,
                backlog,
                &item,
                *row,
                sub_key,
                &labels,
                current,
                &mut extraction.skipped,
            ) {
                Ok(marker) => extraction.markers.push(marker),
                Err(e) => {
                    warn!(sub_key = %sub_key, error = %e, "标记行跳过");
                    extraction.skipped.push(e);
                }
            }
        }

        debug!(
            item = %item,
            demand = extraction.demand.len(),
            markers = extraction.markers.len(),
            skipped = extraction.skipped.len(),
            "矩阵表提取完成"
        );
        Ok(extraction)
    }

    /// 是否存在标记行（决定是否需要读取积压工作表）
    fn has_marker_rows(&self, grid: &SheetGrid) -> DocumentResult<bool> {
        let classifier = RowClassifier::new(&self.layout)?;
        Ok((0..grid.height())
            .any(|row| classifier.classify(row, grid.get(row, 0)).marker_key().is_some()))
    }
}

impl RecordExtractor for MatrixExtractor {
    fn variant(&self) -> LayoutVariant {
        LayoutVariant::Matrix
    }

    #[instrument(skip(self, reader, ctx), fields(file = %file_path.display()))]
    fn extract(
        &self,
        file_path: &Path,
        reader: &dyn WorkbookReader,
        ctx: &ExtractContext,
    ) -> DocumentResult<FileExtraction> {
        let primary = reader.read_sheet(file_path, SheetSelector::Named(&self.layout.sheet_name))?;

        let backlog = if self.has_marker_rows(&primary)? {
            Some(reader.read_sheet(
                file_path,
                SheetSelector::Prefix(&self.layout.backlog_sheet_prefix),
            )?)
        } else {
            None
        };

        self.extract_grids(&primary, backlog.as_ref(), ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::sheet_grid::CellValue;
    use chrono::NaiveDate;

    fn text(v: &str) -> CellValue {
        CellValue::Text(v.to_string())
    }

    /// 构造矩阵表: 标签自第 1 列起，数量行对齐
    fn matrix_grid(labels: &[&str], quantities: &[Option<f64>], markers: &[(&str, Vec<f64>)]) -> SheetGrid {
        let mut grid = SheetGrid::new("Zeitraum bis Bedarfsende", Vec::new());
        grid.set(1, 0, text("Sachnummer: A0001234"));
        for (i, label) in labels.iter().enumerate() {
            grid.set(5, 1 + i as u32, text(label));
        }
        for (i, qty) in quantities.iter().enumerate() {
            if let Some(q) = qty {
                grid.set(7, 1 + i as u32, CellValue::Number(*q));
            }
        }
        for (offset, (marker, values)) in markers.iter().enumerate() {
            let row = 10 + offset as u32;
            grid.set(row, 0, text(marker));
            for (i, v) in values.iter().enumerate() {
                grid.set(row, 1 + i as u32, CellValue::Number(*v));
            }
        }
        grid
    }

    fn ctx(y: i32, m: u32, d: u32) -> ExtractContext {
        ExtractContext::new(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[test]
    fn test_demand_pairs_drop_missing_quantity() {
        let grid = matrix_grid(&["01/2025", "02/2025"], &[Some(10.0), None], &[]);

        let extraction = MatrixExtractor::new(MatrixLayout::default())
            .extract_grids(&grid, None, &ctx(2025, 1, 1))
            .unwrap();

        assert_eq!(extraction.demand.len(), 1);
        assert_eq!(extraction.demand[0].customer_item, "A0001234");
        assert_eq!(extraction.demand[0].calendar_week.to_string(), "01/2025");
        assert_eq!(extraction.demand[0].quantity, 10);
        assert!(extraction.markers.is_empty());
    }

    #[test]
    fn test_anchor_mismatch_is_document_error() {
        let mut grid = matrix_grid(&["01/2025"], &[Some(1.0)], &[]);
        grid.set(1, 0, text("Teilenummer A0001234"));

        let result = MatrixExtractor::new(MatrixLayout::default()).extract_grids(
            &grid,
            None,
            &ctx(2025, 1, 1),
        );
        assert!(matches!(result, Err(DocumentError::AnchorMismatch { .. })));
    }

    #[test]
    fn test_marker_window_starts_at_current_week() {
        let labels = ["01/2025", "02/2025", "03/2025", "04/2025"];
        let grid = matrix_grid(
            &labels,
            &[Some(1.0), Some(2.0), Some(3.0), Some(4.0)],
            &[("ABS 77A", vec![9.0, 20.0, 30.0, 40.0])],
        );
        let mut bkm = SheetGrid::new("BKM Lieferbeziehung", Vec::new());
        bkm.set(10, 21, CellValue::Number(12.5));

        // 2025-01-08 属于 02/2025
        let extraction = MatrixExtractor::new(MatrixLayout::default())
            .extract_grids(&grid, Some(&bkm), &ctx(2025, 1, 8))
            .unwrap();

        assert_eq!(extraction.markers.len(), 1);
        let marker = &extraction.markers[0];
        assert_eq!(marker.sub_key, "77A");
        assert_eq!(marker.quantities, vec![Some(20), Some(30), Some(40), None, None]);
        assert_eq!(marker.weeks[0].map(|w| w.to_string()).as_deref(), Some("02/2025"));
        assert_eq!(marker.weeks[3], None);
        assert_eq!(marker.backlog, Some(12.5));
    }

    #[test]
    fn test_missing_current_week_skips_marker_only() {
        let grid = matrix_grid(
            &["01/2025", "02/2025"],
            &[Some(1.0), Some(2.0)],
            &[("ABS 1", vec![5.0, 6.0])],
        );
        let bkm = SheetGrid::new("BKM Lieferbeziehung", Vec::new());

        let extraction = MatrixExtractor::new(MatrixLayout::default())
            .extract_grids(&grid, Some(&bkm), &ctx(2025, 6, 2))
            .unwrap();

        assert_eq!(extraction.demand.len(), 2);
        assert!(extraction.markers.is_empty());
        assert!(matches!(
            extraction.skipped[0],
            RecordError::CurrentWeekNotFound { row: 11, .. }
        ));
    }

    #[test]
    fn test_invalid_window_cell_is_absent_and_marker_kept() {
        let mut grid = matrix_grid(
            &["01/2025", "02/2025", "03/2025"],
            &[Some(1.0), Some(2.0), Some(3.0)],
            &[("ABS 1", vec![5.0, 0.0, 7.0])],
        );
        grid.set(10, 2, text("-"));
        let mut bkm = SheetGrid::new("BKM Lieferbeziehung", Vec::new());
        bkm.set(10, 21, CellValue::Number(9.0));

        let extraction = MatrixExtractor::new(MatrixLayout::default())
            .extract_grids(&grid, Some(&bkm), &ctx(2025, 1, 1))
            .unwrap();

        assert_eq!(extraction.markers.len(), 1);
        let marker = &extraction.markers[0];
        assert_eq!(marker.quantities, vec![Some(5), None, Some(7), None, None]);
        assert_eq!(marker.backlog, Some(9.0));
        assert_eq!(extraction.skipped.len(), 1);
        assert!(matches!(
            extraction.skipped[0],
            RecordError::QuantityError { row: 11, .. }
        ));
    }

    #[test]
    fn test_markers_require_backlog_sheet() {
        let grid = matrix_grid(&["01/2025"], &[Some(1.0)], &[("ABS 1", vec![5.0])]);
        let result = MatrixExtractor::new(MatrixLayout::default()).extract_grids(
            &grid,
            None,
            &ctx(2025, 1, 1),
        );
        assert!(matches!(result, Err(DocumentError::SheetNotFound(_))));
    }

    #[test]
    fn test_month_labels() {
        let layout = MatrixLayout {
            label_mode: MatrixLabelMode::Month,
            ..MatrixLayout::default()
        };
        let grid = matrix_grid(&["03/2025", "Summe"], &[Some(7.0), Some(99.0)], &[]);

        let extraction = MatrixExtractor::new(layout)
            .extract_grids(&grid, None, &ctx(2025, 3, 1))
            .unwrap();

        assert_eq!(extraction.demand.len(), 1);
        assert_eq!(extraction.demand[0].calendar_week.to_string(), "25CW09");
        assert!(matches!(
            extraction.skipped[0],
            RecordError::PeriodFormatError { col: 2, .. }
        ));
    }
}
