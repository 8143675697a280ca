// ==========================================
// 日历周序列性质测试
// ==========================================
// 测试目标: 区间首尾、严格递增、无缺口、跨年进位、两位年回绕
// ==========================================

use demand_sync::domain::{generate_range, CalendarWeek, WeekEncoding, WEEKS_PER_YEAR};

fn ord(year: u16, week: u8) -> CalendarWeek {
    CalendarWeek::new(year, week, WeekEncoding::Ordinal).unwrap()
}

fn slash(year: u16, week: u8) -> CalendarWeek {
    CalendarWeek::new(year, week, WeekEncoding::Slash).unwrap()
}

/// 相邻两周是否为 "下一周" 关系
fn is_successor(prev: CalendarWeek, next: CalendarWeek) -> bool {
    if prev.week() == WEEKS_PER_YEAR {
        next.week() == 1 && next.year() == (prev.year() + 1) % 100
    } else {
        next.week() == prev.week() + 1 && next.year() == prev.year()
    }
}

#[test]
fn test_range_properties_over_many_pairs() {
    let starts = [ord(24, 1), ord(24, 50), ord(25, 53), ord(98, 52)];
    for start in starts {
        for span in [0u32, 1, 2, 5, 53, 60, 120] {
            let mut end = start;
            for _ in 0..span {
                end = end.next();
            }

            let weeks = generate_range(start, end).unwrap();

            assert_eq!(weeks.len(), span as usize + 1, "{start}..{end}");
            assert_eq!(weeks.first(), Some(&start));
            assert_eq!(weeks.last(), Some(&end));
            for pair in weeks.windows(2) {
                assert!(is_successor(pair[0], pair[1]), "{} → {}", pair[0], pair[1]);
            }
        }
    }
}

#[test]
fn test_range_is_strictly_increasing_without_wrap() {
    let weeks = generate_range(ord(24, 40), ord(26, 10)).unwrap();
    assert!(weeks.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(weeks.len(), 14 + 53 + 10);
}

#[test]
fn test_rollover_and_century_wrap() {
    let rollover: Vec<String> = generate_range(ord(25, 53), ord(26, 1))
        .unwrap()
        .iter()
        .map(|w| w.to_string())
        .collect();
    assert_eq!(rollover, vec!["25CW53", "26CW01"]);

    let wrap: Vec<String> = generate_range(ord(99, 53), ord(0, 2))
        .unwrap()
        .iter()
        .map(|w| w.to_string())
        .collect();
    assert_eq!(wrap, vec!["99CW53", "00CW01", "00CW02"]);
}

#[test]
fn test_slash_range_keeps_four_digit_year() {
    let weeks = generate_range(slash(2024, 52), slash(2025, 1)).unwrap();
    let labels: Vec<String> = weeks.iter().map(|w| w.to_string()).collect();
    assert_eq!(labels, vec!["52/2024", "53/2024", "01/2025"]);
}

#[test]
fn test_parse_and_display_agree() {
    for label in ["25CW02", "00CW53", "01/2025", "53/2026"] {
        let week: CalendarWeek = label.parse().unwrap();
        assert_eq!(week.to_string(), label);
    }
    assert!("25CW54".parse::<CalendarWeek>().is_err());
    assert!("1/25".parse::<CalendarWeek>().is_err());
}
