// ==========================================
// 需求周同步工具 - 日历周编解码
// ==========================================
// 职责: 日期/期间文本 → 日历周值对象，周序列生成
// 编码: A = "YYCWWW"（两位年，循环 99→00）
//       B = "WW/YYYY"（四位年）
// 红线: 同一序列内不得混用两种编码
// ==========================================

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// 每年周槽位数（固定 53，不区分 52 周年份）
pub const WEEKS_PER_YEAR: u8 = 53;

/// 周编码方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WeekEncoding {
    Ordinal, // YYCWWW
    Slash,   // WW/YYYY
}

impl WeekEncoding {
    /// 年份取值模数（两位年 100，四位年 10000）
    fn year_modulus(self) -> u32 {
        match self {
            WeekEncoding::Ordinal => 100,
            WeekEncoding::Slash => 10_000,
        }
    }
}

impl fmt::Display for WeekEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeekEncoding::Ordinal => write!(f, "YYCWWW"),
            WeekEncoding::Slash => write!(f, "WW/YYYY"),
        }
    }
}

/// 日历周错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WeekError {
    #[error("周号超出范围: {0}（允许 1..=53）")]
    InvalidWeek(u32),

    #[error("年份超出范围: {year}（编码 {encoding}）")]
    InvalidYear { year: u32, encoding: WeekEncoding },

    #[error("周编码不一致: {left} 与 {right}")]
    EncodingMismatch {
        left: WeekEncoding,
        right: WeekEncoding,
    },

    #[error("无法解析日历周: {0}")]
    Parse(String),
}

// ==========================================
// CalendarWeek - 日历周值对象
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CalendarWeek {
    year: u16,
    week: u8,
    encoding: WeekEncoding,
}

impl CalendarWeek {
    pub fn new(year: u16, week: u8, encoding: WeekEncoding) -> Result<Self, WeekError> {
        if !(1..=WEEKS_PER_YEAR).contains(&week) {
            return Err(WeekError::InvalidWeek(week as u32));
        }
        if year as u32 >= encoding.year_modulus() {
            return Err(WeekError::InvalidYear {
                year: year as u32,
                encoding,
            });
        }
        Ok(Self {
            year,
            week,
            encoding,
        })
    }

    pub fn year(&self) -> u16 {
        self.year
    }

    pub fn week(&self) -> u8 {
        self.week
    }

    pub fn encoding(&self) -> WeekEncoding {
        self.encoding
    }

    /// 日期 → ISO 日历周（编码 A，年份取模 100）
    pub fn from_date(date: NaiveDate) -> Self {
        Self::from_date_in(date, WeekEncoding::Ordinal)
    }

    /// 日期 → 指定编码的 ISO 日历周
    pub fn from_date_in(date: NaiveDate, encoding: WeekEncoding) -> Self {
        let iso = date.iso_week();
        let year = iso.year().rem_euclid(encoding.year_modulus() as i32) as u16;
        Self {
            year,
            week: iso.week() as u8,
            encoding,
        }
    }

    /// "M/YYYY" 月份期间 → 该月 1 日所在 ISO 周（编码 A）
    ///
    /// 一个月只映射到一个代表周；年份取标签年份，
    /// 即使 1 日的 ISO 周属于上一 ISO 年（如 01/2027 → 27CW53）。
    pub fn from_month_period(period: &str) -> Option<Self> {
        let (month_raw, year_raw) = period.trim().split_once('/')?;
        let month: u32 = month_raw.trim().parse().ok()?;
        let year: i32 = year_raw.trim().parse().ok()?;
        let first_day = NaiveDate::from_ymd_opt(year, month, 1)?;
        Some(Self {
            year: year.rem_euclid(100) as u16,
            week: first_day.iso_week().week() as u8,
            encoding: WeekEncoding::Ordinal,
        })
    }

    /// 解析 "WW/YYYY"
    pub fn parse_slash(label: &str) -> Result<Self, WeekError> {
        let text = label.trim();
        let (week_raw, year_raw) = text
            .split_once('/')
            .ok_or_else(|| WeekError::Parse(text.to_string()))?;
        let week: u8 = week_raw
            .trim()
            .parse()
            .map_err(|_| WeekError::Parse(text.to_string()))?;
        let year_raw = year_raw.trim();
        if year_raw.len() != 4 {
            return Err(WeekError::Parse(text.to_string()));
        }
        let year: u16 = year_raw
            .parse()
            .map_err(|_| WeekError::Parse(text.to_string()))?;
        Self::new(year, week, WeekEncoding::Slash)
    }

    /// 解析 "YYCWWW"
    pub fn parse_ordinal(key: &str) -> Result<Self, WeekError> {
        let text = key.trim();
        let parse_err = || WeekError::Parse(text.to_string());
        if text.len() != 6 || !text.is_ascii() || !text[2..4].eq_ignore_ascii_case("CW") {
            return Err(parse_err());
        }
        let year: u16 = text[..2].parse().map_err(|_| parse_err())?;
        let week: u8 = text[4..].parse().map_err(|_| parse_err())?;
        Self::new(year, week, WeekEncoding::Ordinal)
    }

    /// 编码转换（仅在记录边界使用；A → B 按 20xx 年处理）
    pub fn to_encoding(&self, target: WeekEncoding) -> Self {
        let year = match (self.encoding, target) {
            (WeekEncoding::Slash, WeekEncoding::Ordinal) => self.year % 100,
            (WeekEncoding::Ordinal, WeekEncoding::Slash) => 2000 + self.year,
            _ => self.year,
        };
        Self {
            year,
            week: self.week,
            encoding: target,
        }
    }

    /// 下一周（53 周后进位，年份按编码模数回绕）
    pub fn next(&self) -> Self {
        if self.week >= WEEKS_PER_YEAR {
            Self {
                year: ((self.year as u32 + 1) % self.encoding.year_modulus()) as u16,
                week: 1,
                encoding: self.encoding,
            }
        } else {
            Self {
                week: self.week + 1,
                ..*self
            }
        }
    }

    /// 线性槽位序号: year * 53 + (week - 1)
    fn slot(&self) -> u32 {
        self.year as u32 * WEEKS_PER_YEAR as u32 + (self.week as u32 - 1)
    }
}

impl Ord for CalendarWeek {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.year, self.week)
            .cmp(&(other.year, other.week))
            .then_with(|| (self.encoding as u8).cmp(&(other.encoding as u8)))
    }
}

impl PartialOrd for CalendarWeek {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for CalendarWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.encoding {
            WeekEncoding::Ordinal => write!(f, "{:02}CW{:02}", self.year, self.week),
            WeekEncoding::Slash => write!(f, "{:02}/{:04}", self.week, self.year),
        }
    }
}

impl FromStr for CalendarWeek {
    type Err = WeekError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.contains('/') {
            Self::parse_slash(s)
        } else {
            Self::parse_ordinal(s)
        }
    }
}

impl Serialize for CalendarWeek {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CalendarWeek {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// 可选日期 → 编码 A 日历周（缺失返回 None）
pub fn to_week_key_a(date: Option<NaiveDate>) -> Option<CalendarWeek> {
    date.map(CalendarWeek::from_date)
}

/// 当前日历周（时钟由调用方注入）
pub fn current_week(today: NaiveDate, encoding: WeekEncoding) -> CalendarWeek {
    CalendarWeek::from_date_in(today, encoding)
}

/// 生成 [start, end] 闭区间的连续周序列
///
/// 序列长度在进入循环前按回绕算术确定:
/// `((end_slot - start_slot) mod (modulus * 53)) + 1`。
/// start 晚于 end 时得到一整圈回绕序列。
pub fn generate_range(
    start: CalendarWeek,
    end: CalendarWeek,
) -> Result<Vec<CalendarWeek>, WeekError> {
    if start.encoding != end.encoding {
        return Err(WeekError::EncodingMismatch {
            left: start.encoding,
            right: end.encoding,
        });
    }

    let cycle = start.encoding.year_modulus() * WEEKS_PER_YEAR as u32;
    let span = (end.slot() + cycle - start.slot()) % cycle;
    let len = span as usize + 1;

    let mut weeks = Vec::with_capacity(len);
    let mut cursor = start;
    for _ in 0..len {
        weeks.push(cursor);
        cursor = cursor.next();
    }

    debug_assert_eq!(weeks.last(), Some(&end));
    Ok(weeks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ord(year: u16, week: u8) -> CalendarWeek {
        CalendarWeek::new(year, week, WeekEncoding::Ordinal).unwrap()
    }

    fn slash(year: u16, week: u8) -> CalendarWeek {
        CalendarWeek::new(year, week, WeekEncoding::Slash).unwrap()
    }

    #[test]
    fn test_from_date_iso_week() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        assert_eq!(CalendarWeek::from_date(date).to_string(), "25CW02");

        // 2024-12-30 属于 2025 ISO 年第 1 周
        let date = NaiveDate::from_ymd_opt(2024, 12, 30).unwrap();
        assert_eq!(CalendarWeek::from_date(date).to_string(), "25CW01");
    }

    #[test]
    fn test_to_week_key_a_missing_date() {
        assert_eq!(to_week_key_a(None), None);
    }

    #[test]
    fn test_current_week_slash() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 5).unwrap();
        assert_eq!(
            current_week(today, WeekEncoding::Slash).to_string(),
            "10/2025"
        );
    }

    #[test]
    fn test_from_month_period() {
        assert_eq!(
            CalendarWeek::from_month_period("03/2025").unwrap().to_string(),
            "25CW09"
        );
        // 2027-01-01 为周五，ISO 周属于 2026 年第 53 周，年份保持标签年份
        assert_eq!(
            CalendarWeek::from_month_period("1/2027").unwrap().to_string(),
            "27CW53"
        );
        assert!(CalendarWeek::from_month_period("13/2025").is_none());
        assert!(CalendarWeek::from_month_period("abc").is_none());
    }

    #[test]
    fn test_parse_and_display_roundtrip() {
        assert_eq!(
            CalendarWeek::parse_slash("01/2025").unwrap(),
            slash(2025, 1)
        );
        assert_eq!(CalendarWeek::parse_ordinal("25CW02").unwrap(), ord(25, 2));
        assert_eq!("07/2026".parse::<CalendarWeek>().unwrap().to_string(), "07/2026");
        assert!(CalendarWeek::parse_slash("54/2025").is_err());
        assert!(CalendarWeek::parse_slash("01/25").is_err());
        assert!(CalendarWeek::parse_ordinal("25XW02").is_err());
    }

    #[test]
    fn test_ordering_is_by_year_then_week() {
        // 字符串序 "02/2026" < "10/2025"，值序相反
        assert!(slash(2025, 10) < slash(2026, 2));
        assert!(ord(24, 53) < ord(25, 1));
    }

    #[test]
    fn test_to_encoding() {
        assert_eq!(slash(2025, 7).to_encoding(WeekEncoding::Ordinal), ord(25, 7));
        assert_eq!(ord(25, 7).to_encoding(WeekEncoding::Slash), slash(2025, 7));
    }

    #[test]
    fn test_generate_range_single() {
        let weeks = generate_range(ord(25, 10), ord(25, 10)).unwrap();
        assert_eq!(weeks, vec![ord(25, 10)]);
    }

    #[test]
    fn test_generate_range_year_rollover() {
        let weeks = generate_range(ord(25, 53), ord(26, 1)).unwrap();
        assert_eq!(weeks, vec![ord(25, 53), ord(26, 1)]);
    }

    #[test]
    fn test_generate_range_century_wrap() {
        let weeks = generate_range(ord(99, 53), ord(0, 1)).unwrap();
        assert_eq!(weeks, vec![ord(99, 53), ord(0, 1)]);
    }

    #[test]
    fn test_generate_range_reversed_bounds_full_cycle() {
        let weeks = generate_range(ord(25, 2), ord(25, 1)).unwrap();
        assert_eq!(weeks.len(), 100 * 53);
        assert_eq!(weeks.first(), Some(&ord(25, 2)));
        assert_eq!(weeks.last(), Some(&ord(25, 1)));
    }

    #[test]
    fn test_generate_range_encoding_mismatch() {
        let err = generate_range(ord(25, 1), slash(2025, 2)).unwrap_err();
        assert!(matches!(err, WeekError::EncodingMismatch { .. }));
    }
}
