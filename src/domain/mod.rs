// ==========================================
// 需求周同步工具 - 领域模型层
// ==========================================
// 职责: 日历周值对象、需求/标记记录、领域枚举
// 红线: 不含文件读写逻辑,不含引擎逻辑
// ==========================================

pub mod calendar_week;
pub mod record;
pub mod types;

// 重导出核心类型
pub use calendar_week::{
    current_week, generate_range, to_week_key_a, CalendarWeek, WeekEncoding, WeekError,
    WEEKS_PER_YEAR,
};
pub use record::{DemandRecord, GridKey, MarkerRecord, WINDOW_WIDTH};
pub use types::{LayoutVariant, MatrixLabelMode, RowKind};
