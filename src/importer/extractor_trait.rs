// ==========================================
// 需求周同步工具 - 记录提取 Trait
// ==========================================
// 职责: 定义按输入版式提取记录的接口（不包含实现）
// 实现者: FlatTableExtractor, MatrixExtractor
// ==========================================

use crate::domain::record::{DemandRecord, MarkerRecord};
use crate::domain::types::LayoutVariant;
use crate::importer::error::{DocumentResult, RecordError};
use crate::importer::file_parser::WorkbookReader;
use chrono::NaiveDate;
use std::path::Path;

/// 提取上下文（时钟显式注入）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractContext {
    pub today: NaiveDate,
}

impl ExtractContext {
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }
}

/// 单个文件的提取结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileExtraction {
    pub demand: Vec<DemandRecord>,
    pub markers: Vec<MarkerRecord>,
    pub skipped: Vec<RecordError>, // 记录级跳过原因
}

// ==========================================
// RecordExtractor Trait
// ==========================================
pub trait RecordExtractor: Send + Sync {
    /// 对应的输入版式
    fn variant(&self) -> LayoutVariant;

    /// 提取单个文件
    ///
    /// # 返回
    /// - Ok(FileExtraction): 需求记录 + 标记记录 + 记录级跳过原因
    /// - Err(DocumentError): 整个文件跳过
    fn extract(
        &self,
        file_path: &Path,
        reader: &dyn WorkbookReader,
        ctx: &ExtractContext,
    ) -> DocumentResult<FileExtraction>;
}
