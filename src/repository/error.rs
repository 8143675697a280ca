// ==========================================
// 需求周同步工具 - 跟踪表持久化错误类型
// ==========================================
// 影响范围: 仅中止对账步骤，透视表输出不受影响
// 工具: thiserror 派生宏
// ==========================================

use std::io::ErrorKind;
use thiserror::Error;

/// 跟踪表持久化错误
#[derive(Error, Debug)]
pub enum PersistenceError {
    // ===== 文件相关错误 =====
    #[error("跟踪表文件不存在: {0}")]
    NotFound(String),

    #[error("跟踪表工作表不存在: {0}")]
    SheetNotFound(String),

    #[error("跟踪表被占用或无写权限: {0}")]
    Locked(String),

    #[error("跟踪表无法解析: {0}")]
    Corrupt(String),

    #[error("跟踪表写入失败: {0}")]
    WriteFailed(String),

    // ===== 调用顺序错误 =====
    #[error("跟踪表尚未加载")]
    NotLoaded,
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for PersistenceError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            ErrorKind::NotFound => PersistenceError::NotFound(err.to_string()),
            ErrorKind::PermissionDenied => PersistenceError::Locked(err.to_string()),
            _ => PersistenceError::WriteFailed(err.to_string()),
        }
    }
}

/// Result 类型别名
pub type PersistenceResult<T> = Result<T, PersistenceError>;
