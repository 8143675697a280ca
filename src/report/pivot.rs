// ==========================================
// 需求周同步工具 - 透视表模型
// ==========================================
// 行: 物料号（优先顺序表中的物料在前，其余按字母序）
// 列: 日历周（按 (年, 周) 升序）
// 值: 数量，缺省 0
// ==========================================

use crate::domain::calendar_week::{current_week, CalendarWeek};
use crate::domain::record::DemandRecord;
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, PartialEq)]
pub struct PivotTable {
    items: Vec<String>,
    weeks: Vec<CalendarWeek>,
    values: Vec<Vec<u64>>,         // [物料][周]
    current_column: Option<usize>, // 当前周所在列（周列下标，不含物料列）
}

impl PivotTable {
    /// 由记录构建透视表
    ///
    /// # 参数
    /// - records: 需求记录（同一编码；通常已聚合/补零）
    /// - today: 用于标记当前周
    /// - item_order: 优先排序的物料号
    pub fn build(records: &[DemandRecord], today: NaiveDate, item_order: &[String]) -> Self {
        let weeks: Vec<CalendarWeek> = records
            .iter()
            .map(|r| r.calendar_week)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let present: BTreeSet<&str> = records.iter().map(|r| r.customer_item.as_str()).collect();
        let mut items: Vec<String> = Vec::with_capacity(present.len());
        for item in item_order {
            if present.contains(item.as_str()) && !items.contains(item) {
                items.push(item.clone());
            }
        }
        for item in &present {
            if !item_order.iter().any(|o| o.as_str() == *item) {
                items.push(item.to_string());
            }
        }

        let item_index: HashMap<&str, usize> =
            items.iter().enumerate().map(|(i, item)| (item.as_str(), i)).collect();
        let week_index: HashMap<CalendarWeek, usize> =
            weeks.iter().enumerate().map(|(i, w)| (*w, i)).collect();

        let mut values = vec![vec![0u64; weeks.len()]; items.len()];
        for record in records {
            if let (Some(&i), Some(&w)) = (
                item_index.get(record.customer_item.as_str()),
                week_index.get(&record.calendar_week),
            ) {
                values[i][w] = values[i][w].saturating_add(record.quantity);
            }
        }

        let current_column = weeks.first().and_then(|first| {
            let current = current_week(today, first.encoding());
            week_index.get(&current).copied()
        });

        Self {
            items,
            weeks,
            values,
            current_column,
        }
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn weeks(&self) -> &[CalendarWeek] {
        &self.weeks
    }

    pub fn current_column(&self) -> Option<usize> {
        self.current_column
    }

    pub fn value(&self, item: usize, week: usize) -> u64 {
        self.values
            .get(item)
            .and_then(|row| row.get(week))
            .copied()
            .unwrap_or(0)
    }

    /// 按行遍历 (物料号, 各周数量)
    pub fn rows(&self) -> impl Iterator<Item = (&str, &[u64])> + '_ {
        self.items
            .iter()
            .zip(self.values.iter())
            .map(|(item, values)| (item.as_str(), values.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
