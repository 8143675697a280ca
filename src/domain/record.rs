// ==========================================
// 需求周同步工具 - 记录模型
// ==========================================
// DemandRecord: (物料号, 日历周) → 数量
// MarkerRecord: 标记行子序列（当前周起 5 周窗口 + 积压）
// 生命周期: 单次运行内创建，创建后不再修改
// ==========================================

use crate::domain::calendar_week::CalendarWeek;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 标记行窗口宽度
pub const WINDOW_WIDTH: usize = 5;

// ==========================================
// DemandRecord - 需求记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemandRecord {
    pub customer_item: String,
    pub calendar_week: CalendarWeek,
    pub quantity: u64,
}

impl DemandRecord {
    pub fn new(customer_item: impl Into<String>, calendar_week: CalendarWeek, quantity: u64) -> Self {
        Self {
            customer_item: customer_item.into(),
            calendar_week,
            quantity,
        }
    }
}

// ==========================================
// GridKey - 跟踪表复合键 (物料号, 子键)
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridKey {
    pub customer_item: String,
    pub sub_key: String,
}

impl GridKey {
    pub fn new(customer_item: impl Into<String>, sub_key: impl Into<String>) -> Self {
        Self {
            customer_item: customer_item.into(),
            sub_key: sub_key.into(),
        }
    }
}

impl fmt::Display for GridKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.customer_item, self.sub_key)
    }
}

// ==========================================
// MarkerRecord - 标记行记录
// ==========================================
// quantities 与 weeks 等长（WINDOW_WIDTH），缺失位为 None
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerRecord {
    pub customer_item: String,
    pub sub_key: String,
    pub quantities: Vec<Option<u64>>,
    pub weeks: Vec<Option<CalendarWeek>>,
    pub backlog: Option<f64>,
}

impl MarkerRecord {
    pub fn grid_key(&self) -> GridKey {
        GridKey::new(self.customer_item.clone(), self.sub_key.clone())
    }

    /// 按窗口位置遍历 (数量, 周)
    pub fn slots(&self) -> impl Iterator<Item = (usize, Option<u64>, Option<CalendarWeek>)> + '_ {
        (0..WINDOW_WIDTH).map(move |i| {
            (
                i,
                self.quantities.get(i).copied().flatten(),
                self.weeks.get(i).copied().flatten(),
            )
        })
    }
}
