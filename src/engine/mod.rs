// ==========================================
// 需求周同步工具 - 引擎层
// ==========================================
// 职责: 聚合 / 补零 / 跟踪表对账 / 运行编排
// 红线: 引擎不直接读写文件格式（由 importer / repository / report 负责）
// ==========================================

pub mod aggregator;
pub mod gap_filler;
pub mod orchestrator;
pub mod reconcile;

// 重导出核心引擎
pub use aggregator::aggregate;
pub use gap_filler::fill_gaps;
pub use orchestrator::{
    discover_input_files, ProcessedFile, RunError, RunOptions, RunOrchestrator, RunSummary,
    SkippedFile,
};
pub use reconcile::{normalize_stored_key, reconcile, ReconcileReport, TrackedRow, TrackingGrid};
