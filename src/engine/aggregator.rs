// ==========================================
// 需求周同步工具 - 聚合引擎
// ==========================================
// 职责: 按 (物料号, 日历周) 汇总数量
// 红线: 结果与输入顺序无关（输出按键排序仅为确定性）
// ==========================================

use crate::domain::calendar_week::CalendarWeek;
use crate::domain::record::DemandRecord;
use std::collections::HashMap;
use tracing::instrument;

/// 按键求和，每个 (物料号, 日历周) 输出一条记录
///
/// # 参数
/// - records: 未聚合的需求记录（可来自多个文件）
///
/// # 返回
/// 按 (物料号, 日历周) 排序的聚合记录
#[instrument(skip(records), fields(input = records.len()))]
pub fn aggregate(records: &[DemandRecord]) -> Vec<DemandRecord> {
    let mut totals: HashMap<(&str, CalendarWeek), u64> = HashMap::new();
    for record in records {
        let total = totals
            .entry((record.customer_item.as_str(), record.calendar_week))
            .or_insert(0);
        *total = total.saturating_add(record.quantity);
    }

    let mut aggregated: Vec<DemandRecord> = totals
        .into_iter()
        .map(|((item, week), quantity)| DemandRecord::new(item, week, quantity))
        .collect();
    aggregated.sort_by(|a, b| {
        a.customer_item
            .cmp(&b.customer_item)
            .then(a.calendar_week.cmp(&b.calendar_week))
    });
    aggregated
}
