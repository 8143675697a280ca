// ==========================================
// 需求周同步工具 - 领域类型定义
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 输入版式 (Layout Variant)
// ==========================================
// FlatTable: 带表头的平铺表（项目 MA）
// Matrix:    无表头、固定偏移的矩阵表（项目 MB）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LayoutVariant {
    FlatTable,
    Matrix,
}

impl fmt::Display for LayoutVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutVariant::FlatTable => write!(f, "FLAT_TABLE"),
            LayoutVariant::Matrix => write!(f, "MATRIX"),
        }
    }
}

// ==========================================
// 矩阵表周标签模式
// ==========================================
// Week:  标签为 "WW/YYYY" 周号（保持编码 B）
// Month: 标签为 "MM/YYYY" 月份（转为月初所在周，编码 A）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatrixLabelMode {
    #[default]
    Week,
    Month,
}

// ==========================================
// 行分类 (Row Kind)
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowKind {
    Marker(String), // 标记行，携带子键
    WeekHeader,     // 周标签行
    QuantityRow,    // 主需求数量行
    Unclassified,
}

impl RowKind {
    pub fn marker_key(&self) -> Option<&str> {
        match self {
            RowKind::Marker(sub_key) => Some(sub_key),
            _ => None,
        }
    }
}
