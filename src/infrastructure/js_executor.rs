//! JS 执行器 - 基础设施层
//!
//! 持有唯一的 page 资源，只暴露"执行 JS / 点击 / 打印"等页面能力

use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::error::Result;

/// 轮询间隔
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// JS 执行器
///
/// 职责：
/// - 持有 Page 资源（clone 出来的副本共享同一个页面）
/// - 暴露 eval / 点击 / 打印能力
/// - 不认识账户、记录和文件名
#[derive(Clone)]
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    /// 创建新的 JS 执行器
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 执行 JS 代码并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> Result<JsonValue> {
        let result = self.page.evaluate(js_code.into()).await?;
        let json_value = result.into_value()?;
        Ok(json_value)
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> Result<T> {
        let json_value = self.eval(js_code).await?;
        let typed_value = serde_json::from_value(json_value)?;
        Ok(typed_value)
    }

    /// 选择器是否能匹配到元素
    pub async fn exists(&self, selector: &str) -> Result<bool> {
        let js_code = format!(
            "document.querySelector({}) !== null",
            serde_json::to_string(selector)?
        );
        self.eval_as(js_code).await
    }

    /// 在限定时间内等待元素出现
    ///
    /// # 返回
    /// 超时返回 false
    pub async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<bool> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.exists(selector).await? {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                debug!("等待元素超时: {}", selector);
                return Ok(false);
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    /// 点击第一个匹配的元素
    ///
    /// # 返回
    /// 没有匹配的元素时返回 false
    pub async fn click(&self, selector: &str) -> Result<bool> {
        let js_code = format!(
            r#"
            (() => {{
                const el = document.querySelector({});
                if (!el) {{ return false; }}
                el.click();
                return true;
            }})()
            "#,
            serde_json::to_string(selector)?
        );
        self.eval_as(js_code).await
    }

    /// 点击文本包含指定内容的第一个元素
    pub async fn click_by_text(&self, selector: &str, text: &str) -> Result<bool> {
        let js_code = format!(
            r#"
            (() => {{
                const needle = {};
                const el = Array.from(document.querySelectorAll({}))
                    .find(e => (e.innerText || '').includes(needle));
                if (!el) {{ return false; }}
                el.click();
                return true;
            }})()
            "#,
            serde_json::to_string(text)?,
            serde_json::to_string(selector)?
        );
        self.eval_as(js_code).await
    }

    /// 向当前焦点派发 Escape 按键
    pub async fn press_escape(&self) -> Result<()> {
        self.eval(
            r#"
            (() => {
                const target = document.activeElement || document.body;
                for (const type of ['keydown', 'keyup']) {
                    target.dispatchEvent(new KeyboardEvent(type, {
                        key: 'Escape', code: 'Escape', keyCode: 27, bubbles: true
                    }));
                }
                return true;
            })()
            "#,
        )
        .await?;
        Ok(())
    }

    /// 当前页面 URL
    pub async fn current_url(&self) -> Result<Option<String>> {
        Ok(self.page.url().await?)
    }

    /// 把当前页面渲染成 PDF
    pub async fn print_pdf(&self, params: PrintToPdfParams) -> Result<Vec<u8>> {
        Ok(self.page.pdf(params).await?)
    }

    /// 当前会话的 Cookie 头
    pub async fn cookie_header(&self) -> Result<String> {
        let cookies = self.page.get_cookies().await?;
        Ok(cookies
            .iter()
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; "))
    }
}
