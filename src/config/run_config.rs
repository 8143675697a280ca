// ==========================================
// 需求周同步工具 - 运行配置项
// ==========================================
// 职责: 输入版式偏移、跟踪表列布局、输出参数
// 约定: 行列号均为 0 基；缺省值即现场表格的固定布局
// ==========================================

use crate::domain::record::WINDOW_WIDTH;
use crate::domain::types::MatrixLabelMode;
use serde::{Deserialize, Serialize};

// ==========================================
// RunConfig - 单次运行的全部配置
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub flat_table: FlatTableLayout,
    pub matrix: MatrixLayout,
    pub grid: GridLayout,
    pub output: OutputConfig,
}

// ==========================================
// 平铺表版式（项目 MA）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlatTableLayout {
    pub sheet_name: Option<String>, // None = 第一个工作表
    pub item_column: String,
    pub quantity_column: String,
    pub date_column: String,
}

impl Default for FlatTableLayout {
    fn default() -> Self {
        Self {
            sheet_name: None,
            item_column: "Customer Item".to_string(),
            quantity_column: "Quantity".to_string(),
            date_column: "Planned Receipt Date".to_string(),
        }
    }
}

// ==========================================
// 矩阵表版式（项目 MB）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatrixLayout {
    pub sheet_name: String,
    pub anchor_row: u32,
    pub anchor_col: u32,
    pub anchor_pattern: String, // 第 1 个捕获组为物料号
    pub week_label_row: u32,
    pub quantity_row: u32,
    pub first_data_col: u32,
    pub label_mode: MatrixLabelMode,
    pub marker_pattern: String,
    pub marker_prefix: String,
    pub backlog_sheet_prefix: String,
    pub backlog_col: u32,
}

impl Default for MatrixLayout {
    fn default() -> Self {
        Self {
            sheet_name: "Zeitraum bis Bedarfsende".to_string(),
            anchor_row: 1,
            anchor_col: 0,
            anchor_pattern: r"Sachnummer:\s+(\S+)".to_string(),
            week_label_row: 5,
            quantity_row: 7,
            first_data_col: 1,
            label_mode: MatrixLabelMode::Week,
            marker_pattern: r"^\s*ABS\s+\d\w*".to_string(),
            marker_prefix: "ABS".to_string(),
            backlog_sheet_prefix: "BKM".to_string(),
            backlog_col: 21,
        }
    }
}

// ==========================================
// 跟踪表（EDI）列布局
// ==========================================
// 窗口列缺省 S/U/W/Y/AA（0 基 18/20/22/24/26）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridLayout {
    pub sheet_name: String,
    pub header_row: u32,
    pub first_data_row: u32,
    pub item_col: u32,
    pub marker_col: u32,
    pub backlog_col: u32,
    pub window_cols: Vec<u32>,
    pub legacy_marker_prefix: String,
    pub new_row_fill: String, // ARGB/RGB 十六进制
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            sheet_name: "EDI".to_string(),
            header_row: 0,
            first_data_row: 1,
            item_col: 3,
            marker_col: 6,
            backlog_col: 17,
            window_cols: vec![18, 20, 22, 24, 26],
            legacy_marker_prefix: "ABS ".to_string(),
            new_row_fill: "FFFF00".to_string(),
        }
    }
}

impl GridLayout {
    pub fn window_is_valid(&self) -> bool {
        self.window_cols.len() == WINDOW_WIDTH
    }
}

// ==========================================
// 输出配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub file_prefix: String,
    pub sheet_name: String,
    pub item_header: String,
    pub gap_fill: bool,
    pub item_order: Vec<String>, // 透视表优先排序的物料号，其余按字母序
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            file_prefix: "extracted_data_".to_string(),
            sheet_name: "Extracted Data".to_string(),
            item_header: "Customer Item".to_string(),
            gap_fill: true,
            item_order: Vec::new(),
        }
    }
}
