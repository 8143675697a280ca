// ==========================================
// 需求周同步工具 - 缺周补零引擎
// ==========================================
// 职责: 全局最小周..最大周的连续区间内，为每个物料补齐缺失周（数量 0）
// 红线: 区间取全体物料的全局范围，不按物料单独计算
// 幂等: fill_gaps(fill_gaps(x)) == fill_gaps(x)
// ==========================================

use crate::domain::calendar_week::{generate_range, CalendarWeek, WeekError};
use crate::domain::record::DemandRecord;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, instrument};

/// 缺周补零
///
/// # 参数
/// - records: 已聚合的需求记录（同一编码）
///
/// # 返回
/// - Ok: 物料 × 全局周区间 的完整记录，按 (物料号, 日历周) 排序
/// - Err(WeekError::EncodingMismatch): 输入混用两种周编码
#[instrument(skip(records), fields(input = records.len()))]
pub fn fill_gaps(records: &[DemandRecord]) -> Result<Vec<DemandRecord>, WeekError> {
    let Some(first) = records.first() else {
        return Ok(Vec::new());
    };

    let encoding = first.calendar_week.encoding();
    if let Some(other) = records
        .iter()
        .find(|r| r.calendar_week.encoding() != encoding)
    {
        return Err(WeekError::EncodingMismatch {
            left: encoding,
            right: other.calendar_week.encoding(),
        });
    }

    let mut min_week = first.calendar_week;
    let mut max_week = first.calendar_week;
    let mut quantities: HashMap<(&str, CalendarWeek), u64> = HashMap::new();
    let mut items: BTreeSet<&str> = BTreeSet::new();
    for record in records {
        min_week = min_week.min(record.calendar_week);
        max_week = max_week.max(record.calendar_week);
        items.insert(record.customer_item.as_str());
        *quantities
            .entry((record.customer_item.as_str(), record.calendar_week))
            .or_insert(0) += record.quantity;
    }

    let weeks = generate_range(min_week, max_week)?;
    debug!(
        items = items.len(),
        weeks = weeks.len(),
        from = %min_week,
        to = %max_week,
        "补零区间"
    );

    let mut filled = Vec::with_capacity(items.len() * weeks.len());
    for item in &items {
        for week in &weeks {
            let quantity = quantities.get(&(*item, *week)).copied().unwrap_or(0);
            filled.push(DemandRecord::new(*item, *week, quantity));
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn week(key: &str) -> CalendarWeek {
        key.parse().unwrap()
    }

    #[test]
    fn test_fill_uses_global_range() {
        let records = vec![
            DemandRecord::new("A", week("25CW01"), 1),
            DemandRecord::new("A", week("25CW03"), 3),
            DemandRecord::new("B", week("25CW04"), 4),
        ];

        let filled = fill_gaps(&records).unwrap();

        assert_eq!(filled.len(), 8);
        let b: Vec<(String, u64)> = filled
            .iter()
            .filter(|r| r.customer_item == "B")
            .map(|r| (r.calendar_week.to_string(), r.quantity))
            .collect();
        assert_eq!(
            b,
            vec![
                ("25CW01".to_string(), 0),
                ("25CW02".to_string(), 0),
                ("25CW03".to_string(), 0),
                ("25CW04".to_string(), 4),
            ]
        );
    }

    #[test]
    fn test_fill_across_year_boundary() {
        let records = vec![
            DemandRecord::new("A", week("25CW52"), 1),
            DemandRecord::new("A", week("26CW02"), 2),
        ];

        let filled = fill_gaps(&records).unwrap();
        let labels: Vec<String> = filled.iter().map(|r| r.calendar_week.to_string()).collect();

        assert_eq!(labels, vec!["25CW52", "25CW53", "26CW01", "26CW02"]);
    }

    #[test]
    fn test_fill_is_idempotent() {
        let records = vec![
            DemandRecord::new("A", week("10/2025"), 1),
            DemandRecord::new("B", week("14/2025"), 2),
        ];

        let once = fill_gaps(&records).unwrap();
        let twice = fill_gaps(&once).unwrap();

        assert_eq!(once, twice);
    }

    #[test]
    fn test_fill_rejects_mixed_encodings() {
        let records = vec![
            DemandRecord::new("A", week("25CW01"), 1),
            DemandRecord::new("A", week("02/2025"), 1),
        ];
        assert!(matches!(
            fill_gaps(&records),
            Err(WeekError::EncodingMismatch { .. })
        ));
    }

    #[test]
    fn test_fill_empty() {
        assert_eq!(fill_gaps(&[]).unwrap(), Vec::new());
    }
}
