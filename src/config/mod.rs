// ==========================================
// 需求周同步工具 - 配置层
// ==========================================
// 职责: 版式偏移、列布局、输出参数的集中管理
// 存储: JSON 文件（可选），缺省值内置
// ==========================================

pub mod config_manager;
pub mod run_config;

// 重导出核心配置类型
pub use config_manager::{ConfigError, ConfigManager, ConfigSource};
pub use run_config::{FlatTableLayout, GridLayout, MatrixLayout, OutputConfig, RunConfig};
