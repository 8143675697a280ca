// ==========================================
// 需求周同步工具 - 导入层
// ==========================================
// 职责: 电子表格导出文件 → 需求记录 / 标记记录
// 支持: Excel (calamine), CSV
// 版式: 平铺表（项目 MA）, 固定偏移矩阵表（项目 MB）
// ==========================================

// 模块声明
pub mod data_cleaner;
pub mod error;
pub mod extractor_trait;
pub mod file_parser;
pub mod flat_table;
pub mod matrix;
pub mod row_classifier;
pub mod sheet_grid;

// 重导出核心类型
pub use data_cleaner::{DataCleaner, DateCell};
pub use error::{DocumentError, DocumentResult, RecordError};
pub use extractor_trait::{ExtractContext, FileExtraction, RecordExtractor};
pub use file_parser::{CalamineReader, CsvReader, SheetSelector, UniversalFileParser, WorkbookReader};
pub use flat_table::FlatTableExtractor;
pub use matrix::MatrixExtractor;
pub use row_classifier::RowClassifier;
pub use sheet_grid::{CellValue, SheetGrid};
