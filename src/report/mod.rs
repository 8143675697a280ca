// ==========================================
// 需求周同步工具 - 报表层
// ==========================================
// 职责: 需求记录 → 透视表 xlsx（物料 × 日历周）
// ==========================================

pub mod pivot;
pub mod pivot_writer;

pub use pivot::PivotTable;
pub use pivot_writer::{output_file_name, PivotWriter, ReportError};
