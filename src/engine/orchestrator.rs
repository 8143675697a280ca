// ==========================================
// 需求周同步工具 - 运行编排器
// ==========================================
// 主流程:
//   1. 发现输入文件（排除输出文件 / 锁文件 / 保存临时文件 / 跟踪表）
//   2. 逐个文件提取（文件级错误跳过该文件）
//   3. 聚合 → 补零 → 透视表写出
//   4. 标记记录对账 → 跟踪表提交（失败不影响透视表）
// 并发: 单线程顺序执行
// ==========================================

use crate::config::RunConfig;
use crate::domain::calendar_week::WeekError;
use crate::domain::record::{DemandRecord, MarkerRecord};
use crate::domain::types::LayoutVariant;
use crate::engine::aggregator::aggregate;
use crate::engine::gap_filler::fill_gaps;
use crate::engine::reconcile::{reconcile, ReconcileReport};
use crate::importer::extractor_trait::{ExtractContext, RecordExtractor};
use crate::importer::file_parser::{UniversalFileParser, WorkbookReader};
use crate::importer::flat_table::FlatTableExtractor;
use crate::importer::matrix::MatrixExtractor;
use crate::report::pivot::PivotTable;
use crate::report::pivot_writer::{output_file_name, PivotWriter, ReportError};
use crate::repository::error::PersistenceError;
use crate::repository::tracking_store::TrackingStore;
use crate::repository::xlsx_tracking_store::TEMP_FILE_PREFIX;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Office 临时锁文件前缀
const LOCK_FILE_PREFIX: &str = "~$";


/// 运行级错误（中止整个运行）
#[derive(Error, Debug)]
pub enum RunError {
    #[error("输入目录无法读取 ({path}): {source}")]
    InputDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("输出目录无法创建 ({path}): {source}")]
    OutputDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Week(#[from] WeekError),

    #[error(transparent)]
    Report(#[from] ReportError),
}

// ==========================================
// RunOptions - 单次运行参数
// ==========================================
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub tracking_file: Option<PathBuf>, // 用于从输入文件中排除
    pub today: NaiveDate,
    pub now: NaiveDateTime,
}

// ==========================================
// RunSummary - 运行结果清单
// ==========================================
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedFile {
    pub path: PathBuf,
    pub demand_records: usize,
    pub marker_records: usize,
    pub skipped_records: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub layout: LayoutVariant,
    pub today: NaiveDate,
    pub processed_files: Vec<ProcessedFile>,
    pub skipped_files: Vec<SkippedFile>,
    pub demand_records: usize,
    pub aggregated_records: usize,
    pub output_records: usize,
    pub marker_records: usize,
    pub pivot_path: Option<PathBuf>,
    pub reconcile: Option<ReconcileReport>,
    pub reconcile_error: Option<String>,
}

impl RunSummary {
    fn new(layout: LayoutVariant, today: NaiveDate) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            layout,
            today,
            processed_files: Vec::new(),
            skipped_files: Vec::new(),
            demand_records: 0,
            aggregated_records: 0,
            output_records: 0,
            marker_records: 0,
            pivot_path: None,
            reconcile: None,
            reconcile_error: None,
        }
    }

    /// 对账步骤是否失败
    pub fn has_reconcile_error(&self) -> bool {
        self.reconcile_error.is_some()
    }
}

/// 发现输入文件（按文件名排序）
///
/// # 参数
/// - dir: 输入目录
/// - output_prefix: 本工具生成的透视表文件名前缀
/// - tracking_file: 跟踪表路径（同目录时排除）
pub fn discover_input_files(
    dir: &Path,
    output_prefix: &str,
    tracking_file: Option<&Path>,
) -> std::io::Result<Vec<PathBuf>> {
    let tracking_name = tracking_file.and_then(|p| p.file_name()).map(|n| n.to_os_string());

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let excluded = !UniversalFileParser::is_supported(&path)
            || name.starts_with(LOCK_FILE_PREFIX)
            || name.starts_with(TEMP_FILE_PREFIX)
            || (!output_prefix.is_empty() && name.contains(output_prefix))
            || tracking_name.as_deref() == path.file_name();
        if !excluded {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

// ==========================================
// RunOrchestrator - 运行编排器
// ==========================================
pub struct RunOrchestrator {
    config: RunConfig,
    reader: Box<dyn WorkbookReader>,
    extractor: Box<dyn RecordExtractor>,
}

impl RunOrchestrator {
    /// 按输入版式创建编排器（读取器按扩展名自动选择）
    pub fn new(config: RunConfig, variant: LayoutVariant) -> Self {
        let extractor: Box<dyn RecordExtractor> = match variant {
            LayoutVariant::FlatTable => Box::new(FlatTableExtractor::new(config.flat_table.clone())),
            LayoutVariant::Matrix => Box::new(MatrixExtractor::new(config.matrix.clone())),
        };
        Self::with_parts(config, Box::new(UniversalFileParser), extractor)
    }

    pub fn with_parts(
        config: RunConfig,
        reader: Box<dyn WorkbookReader>,
        extractor: Box<dyn RecordExtractor>,
    ) -> Self {
        Self {
            config,
            reader,
            extractor,
        }
    }

    /// 执行完整流程
    ///
    /// # 参数
    /// - options: 目录与时钟
    /// - store: 跟踪表存储（None 则跳过对账）
    ///
    /// # 返回
    /// - Ok(RunSummary): 含跳过文件与对账结果（对账失败记录在 reconcile_error）
    /// - Err(RunError): 输入目录不可读 / 周编码混用 / 透视表写出失败
    #[instrument(skip(self, options, store), fields(layout = %self.extractor.variant(), input = %options.input_dir.display()))]
    pub fn run(
        &self,
        options: &RunOptions,
        store: Option<&mut dyn TrackingStore>,
    ) -> Result<RunSummary, RunError> {
        let mut summary = RunSummary::new(self.extractor.variant(), options.today);

        // ===== 步骤1: 文件发现 =====
        let files = discover_input_files(
            &options.input_dir,
            &self.config.output.file_prefix,
            options.tracking_file.as_deref(),
        )
        .map_err(|source| RunError::InputDir {
            path: options.input_dir.display().to_string(),
            source,
        })?;
        info!(files = files.len(), "发现输入文件");

        // ===== 步骤2: 逐文件提取 =====
        let (demand, markers) = self.extract_all(&files, options.today, &mut summary);

        // ===== 步骤3: 聚合 / 补零 / 透视表 =====
        let aggregated = aggregate(&demand);
        let output = if self.config.output.gap_fill {
            fill_gaps(&aggregated)?
        } else {
            aggregated.clone()
        };
        summary.demand_records = demand.len();
        summary.aggregated_records = aggregated.len();
        summary.output_records = output.len();
        summary.marker_records = markers.len();

        std::fs::create_dir_all(&options.output_dir).map_err(|source| RunError::OutputDir {
            path: options.output_dir.display().to_string(),
            source,
        })?;
        let pivot = PivotTable::build(&output, options.today, &self.config.output.item_order);
        if pivot.is_empty() {
            warn!("无有效需求记录，透视表仅含表头");
        }
        let pivot_path = options
            .output_dir
            .join(output_file_name(&self.config.output.file_prefix, options.now));
        PivotWriter::new(&self.config.output).write(&pivot, &pivot_path)?;
        summary.pivot_path = Some(pivot_path);

        // ===== 步骤4: 对账 =====
        match store {
            Some(store) if !markers.is_empty() => match self.reconcile_into(store, &markers) {
                Ok(report) => summary.reconcile = Some(report),
                Err(e) => {
                    warn!(error = %e, "跟踪表对账中止，透视表已输出");
                    summary.reconcile_error = Some(e.to_string());
                }
            },
            Some(_) => info!("无标记记录，跟踪表保持不变"),
            None => {}
        }

        info!(
            run_id = %summary.run_id,
            processed = summary.processed_files.len(),
            skipped = summary.skipped_files.len(),
            output_records = summary.output_records,
            "运行完成"
        );
        Ok(summary)
    }

    fn extract_all(
        &self,
        files: &[PathBuf],
        today: NaiveDate,
        summary: &mut RunSummary,
    ) -> (Vec<DemandRecord>, Vec<MarkerRecord>) {
        let ctx = ExtractContext::new(today);
        let mut demand = Vec::new();
        let mut markers = Vec::new();

        for path in files {
            match self.extractor.extract(path, self.reader.as_ref(), &ctx) {
                Ok(extraction) => {
                    summary.processed_files.push(ProcessedFile {
                        path: path.clone(),
                        demand_records: extraction.demand.len(),
                        marker_records: extraction.markers.len(),
                        skipped_records: extraction.skipped.iter().map(|e| e.to_string()).collect(),
                    });
                    demand.extend(extraction.demand);
                    markers.extend(extraction.markers);
                }
                Err(e) => {
                    warn!(file = %path.display(), error = %e, "文件跳过");
                    summary.skipped_files.push(SkippedFile {
                        path: path.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        (demand, markers)
    }

    fn reconcile_into(
        &self,
        store: &mut dyn TrackingStore,
        markers: &[MarkerRecord],
    ) -> Result<ReconcileReport, PersistenceError> {
        let mut grid = store.load()?;
        let report = reconcile(&mut grid, markers, &self.config.grid);
        store.commit(&grid)?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_discover_input_files_excludes_generated_and_lock_files() {
        let dir = TempDir::new().unwrap();
        for name in [
            "b_export.xlsx",
            "a_export.csv",
            "c_export.ods",
            ".demand-sync-Ab12Cd.xlsx",
            "extracted_data_20250101_0800.xlsx",
            "mb_extracted_data_20250101_0800.xlsx",
            "~$b_export.xlsx",
            "Mercedes_Shipping_Plan_EDI.xlsx",
            "notes.txt",
        ] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        fs::create_dir(dir.path().join("archive.xlsx")).unwrap();

        let tracking = dir.path().join("Mercedes_Shipping_Plan_EDI.xlsx");
        let files = discover_input_files(dir.path(), "extracted_data_", Some(&tracking)).unwrap();

        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a_export.csv", "b_export.xlsx", "c_export.ods"]);
    }

    #[test]
    fn test_missing_input_dir_is_run_error() {
        let dir = TempDir::new().unwrap();
        let options = RunOptions {
            input_dir: dir.path().join("missing"),
            output_dir: dir.path().to_path_buf(),
            tracking_file: None,
            today: NaiveDate::from_ymd_opt(2025, 1, 8).unwrap(),
            now: NaiveDate::from_ymd_opt(2025, 1, 8)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
        };
        let orchestrator = RunOrchestrator::new(RunConfig::default(), LayoutVariant::FlatTable);

        assert!(matches!(
            orchestrator.run(&options, None),
            Err(RunError::InputDir { .. })
        ));
    }
}
