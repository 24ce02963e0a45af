use chrono::{Datelike, NaiveDate};
use std::fmt::Display;

use crate::error::{HarvestError, Result};

const DATE_FORMAT: &str = "%Y%m%d";

/// 日期窗口，两端都包含
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(HarvestError::Config(format!(
                "起始日期 {} 晚于结束日期 {}",
                start.format(DATE_FORMAT),
                end.format(DATE_FORMAT)
            )));
        }
        Ok(Self { start, end })
    }

    /// 整年：YYYY0101 - YYYY1231
    pub fn for_year(year: i32) -> Result<Self> {
        let start = NaiveDate::from_ymd_opt(year, 1, 1)
            .ok_or_else(|| HarvestError::Config(format!("无效年份: {}", year)))?;
        let end = NaiveDate::from_ymd_opt(year, 12, 31)
            .ok_or_else(|| HarvestError::Config(format!("无效年份: {}", year)))?;
        Self::new(start, end)
    }

    /// 解析日期窗口
    ///
    /// 优先级：显式区间 `YYYYMMDD-YYYYMMDD` > 单个年份 `YYYY` > 当前年份
    pub fn resolve(range: Option<&str>, year: Option<&str>, today: NaiveDate) -> Result<Self> {
        if let Some(range) = range {
            let (start, end) = range.split_once('-').ok_or_else(|| {
                HarvestError::Config(format!("日期区间格式应为 YYYYMMDD-YYYYMMDD: {}", range))
            })?;
            return Self::new(parse_date(start)?, parse_date(end)?);
        }

        if let Some(year) = year {
            let year: i32 = year
                .trim()
                .parse()
                .map_err(|_| HarvestError::Config(format!("年份格式应为 YYYY: {}", year)))?;
            return Self::for_year(year);
        }

        Self::for_year(today.year())
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}-{}",
            self.start.format(DATE_FORMAT),
            self.end.format(DATE_FORMAT)
        )
    }
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|e| HarvestError::Config(format!("无法解析日期 '{}': {}", value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_explicit_range_wins_over_year() {
        let range =
            DateRange::resolve(Some("20220115-20220320"), Some("2019"), ymd(2024, 6, 1)).unwrap();
        assert_eq!(range.start, ymd(2022, 1, 15));
        assert_eq!(range.end, ymd(2022, 3, 20));
    }

    #[test]
    fn test_year_expands_to_full_year() {
        let range = DateRange::resolve(None, Some("2022"), ymd(2024, 6, 1)).unwrap();
        assert_eq!(range.to_string(), "20220101-20221231");
    }

    #[test]
    fn test_default_is_current_year() {
        let range = DateRange::resolve(None, None, ymd(2024, 6, 1)).unwrap();
        assert_eq!(range.start, ymd(2024, 1, 1));
        assert_eq!(range.end, ymd(2024, 12, 31));
    }

    #[test]
    fn test_invalid_ranges() {
        assert!(DateRange::resolve(Some("20230101"), None, ymd(2024, 1, 1)).is_err());
        assert!(DateRange::resolve(Some("20231231-20230101"), None, ymd(2024, 1, 1)).is_err());
        assert!(DateRange::resolve(None, Some("twenty"), ymd(2024, 1, 1)).is_err());
    }

    #[test]
    fn test_contains_is_inclusive() {
        let range = DateRange::for_year(2023).unwrap();
        assert!(range.contains(ymd(2023, 1, 1)));
        assert!(range.contains(ymd(2023, 12, 31)));
        assert!(!range.contains(ymd(2024, 1, 1)));
    }
}
