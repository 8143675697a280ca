// ==========================================
// 需求周同步工具 - 导入模块错误类型
// ==========================================
// 分级: DocumentError → 整个文件跳过，运行继续
//       RecordError   → 单条记录/标记行跳过，同文件其余记录继续
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 文件级错误（整个文件的贡献视为空）
#[derive(Error, Debug)]
pub enum DocumentError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .xlsx/.xls/.xlsm/.ods/.csv）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    // ===== 版式错误 =====
    #[error("工作表不存在: {0}")]
    SheetNotFound(String),

    #[error("缺少必需列: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("锚点单元格 ({row}, {col}) 无法识别物料号: {value:?}")]
    AnchorMismatch { row: u32, col: u32, value: String },

    #[error("版式匹配规则无效 ({pattern}): {message}")]
    InvalidPattern { pattern: String, message: String },
}

/// 记录级错误（仅跳过对应记录或标记行）
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    #[error("字段缺失 (行 {row}, 字段 {field})")]
    MissingField { row: u32, field: String },

    #[error("日期格式错误 (行 {row}, 字段 {field}): {value}")]
    DateFormatError {
        row: u32,
        field: String,
        value: String,
    },

    #[error("数量无效 (行 {row}, 字段 {field}): {value}")]
    QuantityError {
        row: u32,
        field: String,
        value: String,
    },

    #[error("周标签无法解析 (列 {col}): {value}")]
    PeriodFormatError { col: u32, value: String },

    #[error("当前周 {week} 不在周标签中 (行 {row}, 标记 {sub_key})")]
    CurrentWeekNotFound {
        row: u32,
        sub_key: String,
        week: String,
    },
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for DocumentError {
    fn from(err: std::io::Error) -> Self {
        DocumentError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for DocumentError {
    fn from(err: csv::Error) -> Self {
        DocumentError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for DocumentError {
    fn from(err: calamine::Error) -> Self {
        DocumentError::ExcelParseError(err.to_string())
    }
}

/// Result 类型别名
pub type DocumentResult<T> = Result<T, DocumentError>;
