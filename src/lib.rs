// ==========================================
// 需求周同步工具 - 核心库
// ==========================================
// 输入: 客户需求导出表（平铺表 / 固定偏移矩阵表）
// 输出: 物料 × 日历周透视表 + EDI 跟踪表标记行同步
// 技术栈: calamine + rust_xlsxwriter + umya-spreadsheet
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 日历周与记录
pub mod domain;

// 导入层 - 外部数据
pub mod importer;

// 引擎层 - 聚合 / 补零 / 对账
pub mod engine;

// 持久化层 - 跟踪表
pub mod repository;

// 报表层 - 透视表
pub mod report;

// 配置层
pub mod config;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    CalendarWeek, DemandRecord, GridKey, LayoutVariant, MarkerRecord, MatrixLabelMode, RowKind,
    WeekEncoding, WeekError,
};

// 引擎
pub use engine::{
    aggregate, fill_gaps, reconcile, ReconcileReport, RunOptions, RunOrchestrator, RunSummary,
    TrackingGrid,
};

// 导入
pub use importer::{DocumentError, FlatTableExtractor, MatrixExtractor, RecordError};

// 持久化
pub use repository::{PersistenceError, TrackingStore, XlsxTrackingStore};

// 配置
pub use config::{ConfigManager, RunConfig};

// ==========================================
// 版本信息
// ==========================================
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = "需求周同步工具";
