// ==========================================
// 需求周同步工具 - 平铺表提取器（项目 MA）
// ==========================================
// 输入: 首行表头，必需列 "Customer Item" / "Quantity" / "Planned Receipt Date"
// 输出: 每个有效行一条 DemandRecord（未聚合），周编码 A
// ==========================================

use crate::config::FlatTableLayout;
use crate::domain::calendar_week::CalendarWeek;
use crate::domain::record::DemandRecord;
use crate::domain::types::LayoutVariant;
use crate::importer::data_cleaner::{DataCleaner, DateCell};
use crate::importer::error::{DocumentError, DocumentResult, RecordError};
use crate::importer::extractor_trait::{ExtractContext, FileExtraction, RecordExtractor};
use crate::importer::file_parser::{SheetSelector, WorkbookReader};
use crate::importer::sheet_grid::{CellValue, SheetGrid};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, instrument, warn};

/// 必需列的列号
struct ColumnIndex {
    item: u32,
    quantity: u32,
    date: u32,
}

pub struct FlatTableExtractor {
    layout: FlatTableLayout,
    cleaner: DataCleaner,
}

impl FlatTableExtractor {
    pub fn new(layout: FlatTableLayout) -> Self {
        Self {
            layout,
            cleaner: DataCleaner,
        }
    }

    /// 从表头定位必需列
    fn locate_columns(&self, grid: &SheetGrid) -> DocumentResult<ColumnIndex> {
        let mut headers: HashMap<String, u32> = HashMap::new();
        for col in 0..grid.row_width(0) {
            if let Some(name) = self.cleaner.clean_text(grid.get(0, col)) {
                headers.entry(name).or_insert(col);
            }
        }

        let required = [
            &self.layout.item_column,
            &self.layout.quantity_column,
            &self.layout.date_column,
        ];
        let missing: Vec<String> = required
            .iter()
            .filter(|name| !headers.contains_key(name.as_str()))
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(DocumentError::MissingColumns(missing));
        }

        Ok(ColumnIndex {
            item: headers[&self.layout.item_column],
            quantity: headers[&self.layout.quantity_column],
            date: headers[&self.layout.date_column],
        })
    }

    /// 从已读取的网格提取记录
    pub fn extract_grid(&self, grid: &SheetGrid) -> DocumentResult<FileExtraction> {
        let columns = self.locate_columns(grid)?;
        let mut extraction = FileExtraction::default();

        for row in 1..grid.height() {
            let row_number = row + 1;
            let item_cell = grid.get(row, columns.item);
            let quantity_cell = grid.get(row, columns.quantity);
            let date_cell = grid.get(row, columns.date);

            // 跳过完全空白的行
            if item_cell.is_blank() && quantity_cell.is_blank() && date_cell.is_blank() {
                continue;
            }

            match self.map_row(row_number, item_cell, quantity_cell, date_cell) {
                Ok(record) => extraction.demand.push(record),
                Err(e) => {
                    warn!(row_number, error = %e, "记录跳过");
                    extraction.skipped.push(e);
                }
            }
        }

        debug!(
            sheet = grid.name(),
            records = extraction.demand.len(),
            skipped = extraction.skipped.len(),
            "平铺表提取完成"
        );
        Ok(extraction)
    }

    fn map_row(
        &self,
        row_number: u32,
        item_cell: &CellValue,
        quantity_cell: &CellValue,
        date_cell: &CellValue,
    ) -> Result<DemandRecord, RecordError> {
        let missing = |field: &str| RecordError::MissingField {
            row: row_number,
            field: field.to_string(),
        };

        let customer_item = self
            .cleaner
            .clean_text(item_cell)
            .ok_or_else(|| missing(&self.layout.item_column))?;

        let quantity = self
            .cleaner
            .parse_quantity(quantity_cell, row_number, &self.layout.quantity_column)?
            .ok_or_else(|| missing(&self.layout.quantity_column))?;

        let date = match self.cleaner.parse_date(date_cell) {
            DateCell::Valid(date) => date,
            DateCell::Missing => return Err(missing(&self.layout.date_column)),
            DateCell::Invalid(value) => {
                return Err(RecordError::DateFormatError {
                    row: row_number,
                    field: self.layout.date_column.clone(),
                    value,
                })
            }
        };

        Ok(DemandRecord::new(
            customer_item,
            CalendarWeek::from_date(date),
            quantity,
        ))
    }
}

impl RecordExtractor for FlatTableExtractor {
    fn variant(&self) -> LayoutVariant {
        LayoutVariant::FlatTable
    }

    #[instrument(skip(self, reader, _ctx), fields(file = %file_path.display()))]
    fn extract(
        &self,
        file_path: &Path,
        reader: &dyn WorkbookReader,
        _ctx: &ExtractContext,
    ) -> DocumentResult<FileExtraction> {
        let selector = match &self.layout.sheet_name {
            Some(name) => SheetSelector::Named(name),
            None => SheetSelector::First,
        };
        let grid = reader.read_sheet(file_path, selector)?;
        self.extract_grid(&grid)
    }
}
