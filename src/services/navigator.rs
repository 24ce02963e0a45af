//! 页面导航 - 业务能力层
//!
//! 等待用户在浏览器里完成登录，然后打开历史或对账单视图

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

use crate::error::{HarvestError, Result};
use crate::infrastructure::{JsExecutor, Pacer};
use crate::models::DocumentSource;

/// 登录后的客户区地址片段
pub const CLIENT_AREA_MARKER: &str = "client.schwab.com/clientapps";
const SESSION_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// 导航能力
#[async_trait]
pub trait Navigator: Send + Sync {
    /// 等待已登录的会话
    async fn wait_for_session(&self) -> Result<()>;

    /// 打开指定来源的列表视图
    async fn open(&self, source: DocumentSource) -> Result<()>;
}

/// 基于页面的导航
pub struct SchwabNavigator {
    executor: JsExecutor,
    pacer: Arc<dyn Pacer>,
    session_timeout: Duration,
}

impl SchwabNavigator {
    pub fn new(executor: JsExecutor, pacer: Arc<dyn Pacer>, session_timeout: Duration) -> Self {
        Self {
            executor,
            pacer,
            session_timeout,
        }
    }

    async fn click_text(&self, selector: &str, text: &str) -> Result<()> {
        if !self.executor.click_by_text(selector, text).await? {
            return Err(HarvestError::transient(
                "navigate",
                format!("没有找到 '{}' ({})", text, selector),
            ));
        }
        self.pacer.pause().await;
        Ok(())
    }
}

#[async_trait]
impl Navigator for SchwabNavigator {
    async fn wait_for_session(&self) -> Result<()> {
        info!("🔐 请在浏览器中登录，等待进入客户区...");
        let deadline = Instant::now() + self.session_timeout;
        loop {
            let url = self.executor.current_url().await?.unwrap_or_default();
            if url.contains(CLIENT_AREA_MARKER) {
                info!("✓ 已检测到登录会话");
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(HarvestError::transient(
                    "wait-session",
                    format!("{} 秒内没有进入客户区", self.session_timeout.as_secs()),
                ));
            }
            debug!("当前页面: {}", url);
            sleep(SESSION_POLL_INTERVAL).await;
        }
    }

    async fn open(&self, source: DocumentSource) -> Result<()> {
        info!("📂 打开 {} 视图", source.name());
        match source {
            DocumentSource::History => {
                self.click_text("nav a", "History").await?;
                self.click_text("[role='tab']", "Transactions").await
            }
            DocumentSource::Statements => self.click_text("nav a", "Statements").await,
        }
    }
}
