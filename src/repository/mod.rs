// ==========================================
// 需求周同步工具 - 持久化层
// ==========================================
// 职责: 跟踪表（EDI）的加载与保存，屏蔽文件格式细节
// 红线: Repository 不含对账逻辑
// ==========================================

pub mod error;
pub mod tracking_store;
pub mod xlsx_tracking_store;

// 重导出
pub use error::{PersistenceError, PersistenceResult};
pub use tracking_store::TrackingStore;
pub use xlsx_tracking_store::{XlsxTrackingStore, TEMP_FILE_PREFIX};
