//! 节奏控制 - 基础设施层
//!
//! 每次改变页面状态的操作之后停顿一下，避免请求过快。
//! 与业务逻辑无关，测试中换成 `NoopPacer`。

use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

/// 节奏控制策略
#[async_trait]
pub trait Pacer: Send + Sync {
    /// 在一次界面操作之后停顿
    async fn pause(&self);
}

/// 在 [min, max] 区间内随机停顿
#[derive(Debug, Clone)]
pub struct JitterPacer {
    min: Duration,
    max: Duration,
}

impl JitterPacer {
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    pub fn from_millis(min_ms: u64, max_ms: u64) -> Self {
        Self::new(Duration::from_millis(min_ms), Duration::from_millis(max_ms))
    }

    /// 下一次停顿的时长
    pub fn next_delay(&self) -> Duration {
        let min_ms = self.min.as_millis() as u64;
        let max_ms = self.max.as_millis() as u64;
        Duration::from_millis(rand::thread_rng().gen_range(min_ms..=max_ms))
    }
}

impl Default for JitterPacer {
    fn default() -> Self {
        Self::from_millis(2000, 5000)
    }
}

#[async_trait]
impl Pacer for JitterPacer {
    async fn pause(&self) {
        let delay = self.next_delay();
        debug!("停顿 {} ms", delay.as_millis());
        sleep(delay).await;
    }
}

/// 不停顿
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPacer;

#[async_trait]
impl Pacer for NoopPacer {
    async fn pause(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jitter_stays_within_bounds() {
        let pacer = JitterPacer::from_millis(20, 40);
        for _ in 0..100 {
            let delay = pacer.next_delay();
            assert!(delay >= Duration::from_millis(20));
            assert!(delay <= Duration::from_millis(40));
        }
    }

    #[test]
    fn test_swapped_bounds_are_normalized() {
        let pacer = JitterPacer::from_millis(50, 10);
        let delay = pacer.next_delay();
        assert!(delay >= Duration::from_millis(10) && delay <= Duration::from_millis(50));
    }

    #[test]
    fn test_noop_pacer_returns_immediately() {
        tokio_test::block_on(NoopPacer.pause());
    }
}
