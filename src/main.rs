// ==========================================
// 需求周同步工具 - 命令行入口
// ==========================================
// 用法:
//   demand-sync ma --input-dir <目录>
//   demand-sync mb --input-dir <目录> [--tracking-file <EDI 跟踪表>]
// ==========================================

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, ValueEnum};
use demand_sync::config::ConfigManager;
use demand_sync::engine::{RunOptions, RunOrchestrator, RunSummary};
use demand_sync::repository::{TrackingStore, XlsxTrackingStore};
use demand_sync::{logging, LayoutVariant};
use std::path::PathBuf;
use tracing::info;

/// 项目 MB 的缺省跟踪表文件名
const DEFAULT_TRACKING_FILE: &str = "Mercedes_Shipping_Plan_EDI.xlsx";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ProjectCode {
    /// 平铺表导出（Customer Item / Quantity / Planned Receipt Date）
    Ma,
    /// 固定偏移矩阵表导出（含 ABS 标记行，同步 EDI 跟踪表）
    Mb,
}

impl ProjectCode {
    fn layout(self) -> LayoutVariant {
        match self {
            ProjectCode::Ma => LayoutVariant::FlatTable,
            ProjectCode::Mb => LayoutVariant::Matrix,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "demand-sync", version, about = "需求周报表整理与 EDI 跟踪表同步")]
struct Args {
    /// 项目代号
    #[arg(value_enum)]
    project: ProjectCode,

    /// 输入目录
    #[arg(long, value_name = "DIR", default_value = ".")]
    input_dir: PathBuf,

    /// 透视表输出目录（缺省同输入目录）
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// EDI 跟踪表（项目 MB 缺省为输入目录下的 Mercedes_Shipping_Plan_EDI.xlsx）
    #[arg(long, value_name = "FILE")]
    tracking_file: Option<PathBuf>,

    /// 配置文件（JSON）
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// 当前日期 YYYY-MM-DD（缺省为本地日期）
    #[arg(long, value_name = "DATE")]
    today: Option<NaiveDate>,

    /// 关闭缺周补零
    #[arg(long)]
    no_gap_fill: bool,

    /// 以 JSON 输出运行结果
    #[arg(long)]
    json: bool,

    /// 以 JSON 行格式输出日志
    #[arg(long)]
    log_json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.log_json {
        logging::init_json();
    } else {
        logging::init();
    }
    info!(version = demand_sync::VERSION, "{} 启动", demand_sync::APP_NAME);

    let manager = ConfigManager::load(args.config.as_deref()).context("加载配置失败")?;
    info!(source = ?manager.source(), "配置已加载");
    let mut config = manager.into_config();
    if args.no_gap_fill {
        config.output.gap_fill = false;
    }

    let layout = args.project.layout();
    let tracking_file = match (args.tracking_file, args.project) {
        (Some(path), _) => Some(path),
        (None, ProjectCode::Mb) => Some(args.input_dir.join(DEFAULT_TRACKING_FILE)),
        (None, ProjectCode::Ma) => None,
    };

    let now = Local::now().naive_local();
    let options = RunOptions {
        output_dir: args.output_dir.unwrap_or_else(|| args.input_dir.clone()),
        input_dir: args.input_dir,
        tracking_file: tracking_file.clone(),
        today: args.today.unwrap_or_else(|| now.date()),
        now,
    };

    let mut store = tracking_file.map(|path| XlsxTrackingStore::new(path, config.grid.clone()));
    let orchestrator = RunOrchestrator::new(config, layout);
    let summary = orchestrator
        .run(
            &options,
            store.as_mut().map(|s| s as &mut dyn TrackingStore),
        )
        .context("运行失败")?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("运行结果序列化失败")?
        );
    } else {
        print_summary(&summary);
    }

    if let Some(error) = &summary.reconcile_error {
        bail!("跟踪表同步失败: {}", error);
    }
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!("运行编号: {}", summary.run_id);
    println!("输入版式: {}  当前日期: {}", summary.layout, summary.today);

    println!("已处理文件 ({}):", summary.processed_files.len());
    for file in &summary.processed_files {
        println!(
            "  {}  需求 {} 条, 标记 {} 条, 跳过 {} 条",
            file.path.display(),
            file.demand_records,
            file.marker_records,
            file.skipped_records.len()
        );
        for reason in &file.skipped_records {
            println!("    - {}", reason);
        }
    }

    if !summary.skipped_files.is_empty() {
        println!("跳过文件 ({}):", summary.skipped_files.len());
        for file in &summary.skipped_files {
            println!("  {}  原因: {}", file.path.display(), file.reason);
        }
    }

    println!(
        "记录: 提取 {} 条 → 聚合 {} 条 → 输出 {} 条",
        summary.demand_records, summary.aggregated_records, summary.output_records
    );
    if let Some(path) = &summary.pivot_path {
        println!("透视表: {}", path.display());
    }
    if let Some(report) = &summary.reconcile {
        println!(
            "跟踪表: 更新 {} 行, 新增 {} 行, 积压写入 {} 行, 表头冲突 {} 次",
            report.updated, report.inserted, report.backlog_written, report.header_overwrites
        );
    }
}
