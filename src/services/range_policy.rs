//! 日期窗口终止策略 - 业务能力层
//!
//! 记录来源按日期从新到旧输出，所以：
//! - 比窗口新的行跳过，继续往后看
//! - 比窗口旧的行出现后，后面不会再有窗口内的行，整个账户停止翻页

use chrono::NaiveDate;

use crate::error::{HarvestError, Result};
use crate::models::DateRange;

/// 单行的处理决定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeDecision {
    /// 在窗口内，取回
    Retrieve,
    /// 太新，跳过并继续
    SkipContinue,
    /// 太旧，停止翻页
    Stop,
}

/// 日期窗口终止策略，两端都包含
#[derive(Debug, Clone, Copy)]
pub struct RangeTerminationPolicy {
    range: DateRange,
}

impl RangeTerminationPolicy {
    pub fn new(range: DateRange) -> Self {
        Self { range }
    }

    pub fn decide(&self, sort_date: NaiveDate) -> RangeDecision {
        if self.range.contains(sort_date) {
            RangeDecision::Retrieve
        } else if sort_date > self.range.end {
            RangeDecision::SkipContinue
        } else {
            RangeDecision::Stop
        }
    }
}

/// 检查行日期单调不增（跨页）
///
/// 顺序被打乱时终止策略会提前停止，悄悄漏掉记录，所以直接报结构错误
#[derive(Debug, Default)]
pub struct OrderGuard {
    last: Option<NaiveDate>,
}

impl OrderGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, sort_date: NaiveDate) -> Result<()> {
        if let Some(last) = self.last {
            if sort_date > last {
                return Err(HarvestError::structural(
                    "record-order",
                    format!(
                        "行日期不是从新到旧排列: {} 出现在 {} 之后",
                        sort_date.format("%Y-%m-%d"),
                        last.format("%Y-%m-%d")
                    ),
                ));
            }
        }
        self.last = Some(sort_date);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_boundaries_are_inclusive() {
        let policy = RangeTerminationPolicy::new(
            DateRange::new(ymd(2023, 1, 1), ymd(2023, 2, 28)).unwrap(),
        );

        assert_eq!(policy.decide(ymd(2023, 1, 1)), RangeDecision::Retrieve);
        assert_eq!(policy.decide(ymd(2023, 2, 28)), RangeDecision::Retrieve);
        assert_eq!(policy.decide(ymd(2023, 3, 1)), RangeDecision::SkipContinue);
        assert_eq!(policy.decide(ymd(2022, 12, 31)), RangeDecision::Stop);
    }

    #[test]
    fn test_order_guard() {
        let mut guard = OrderGuard::new();
        guard.observe(ymd(2023, 3, 10)).unwrap();
        guard.observe(ymd(2023, 3, 10)).unwrap();
        guard.observe(ymd(2023, 2, 1)).unwrap();

        let err = guard.observe(ymd(2023, 2, 2)).unwrap_err();
        assert!(matches!(err, HarvestError::StructuralMismatch { .. }));
    }
}
