//! 账户切换 - 业务能力层
//!
//! 只负责"让某个账户成为页面上的当前账户"

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{HarvestError, Result};
use crate::infrastructure::{JsExecutor, Pacer};
use crate::models::Account;

const SELECTOR_BUTTON: &str = "button.account-selector-button";
const SELECTOR_DROPDOWN: &str = ".sdps-account-selector";

/// 账户切换能力
#[async_trait]
pub trait AccountSelector: Send + Sync {
    async fn select(&self, account: &Account) -> Result<()>;
}

/// 通过页面上的账户下拉框切换
pub struct DomAccountSelector {
    executor: JsExecutor,
    pacer: Arc<dyn Pacer>,
}

impl DomAccountSelector {
    pub fn new(executor: JsExecutor, pacer: Arc<dyn Pacer>) -> Self {
        Self { executor, pacer }
    }

    /// 当前选中账户按钮的文本
    async fn current_label(&self) -> Result<String> {
        let js_code = format!(
            r#"
            (() => {{
                const el = document.querySelector({});
                return el ? (el.innerText || '') : '';
            }})()
            "#,
            serde_json::to_string(SELECTOR_BUTTON)?
        );
        self.executor.eval_as(js_code).await
    }
}

#[async_trait]
impl AccountSelector for DomAccountSelector {
    async fn select(&self, account: &Account) -> Result<()> {
        if self.current_label().await?.contains(&account.number) {
            debug!("{} 已是当前账户", account);
            return Ok(());
        }

        if !self.executor.click(SELECTOR_DROPDOWN).await? {
            return Err(HarvestError::transient("select-account", "没有找到账户下拉框"));
        }
        if !self.executor.click_by_text("span", &account.number).await? {
            return Err(HarvestError::transient(
                "select-account",
                format!("下拉框中没有账号 {}", account.number),
            ));
        }
        self.pacer.pause().await;

        info!("✓ 已切换到 {}", account);
        Ok(())
    }
}
