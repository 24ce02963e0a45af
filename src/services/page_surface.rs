//! 基于浏览器页面的取回能力 - 业务能力层
//!
//! - `PageCaptureSurface`：在详情弹窗中找打印控件并渲染 PDF
//! - `SessionDownloader`：带着浏览器会话的 Cookie 直接下载文件

use async_trait::async_trait;
use reqwest::header::COOKIE;
use reqwest::Url;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{HarvestError, Result};
use crate::infrastructure::JsExecutor;
use crate::models::RetrievalHandle;
use crate::services::record_source::HISTORY_ROW_SELECTOR;
use crate::services::retrieval::{CaptureSurface, Downloader, PrintLayout};

/// 关闭详情弹窗的控件，依次尝试，都没有时按 Escape
const CLOSE_CONTROLS: &[&str] = &["button#modalClose", "button.modal-close", "[aria-label='Close']"];

/// 基于页面的渲染表面
pub struct PageCaptureSurface {
    executor: JsExecutor,
    row_selector: String,
    control_wait: Duration,
}

impl PageCaptureSurface {
    pub fn new(executor: JsExecutor, control_wait: Duration) -> Self {
        Self {
            executor,
            row_selector: HISTORY_ROW_SELECTOR.to_string(),
            control_wait,
        }
    }
}

#[async_trait]
impl CaptureSurface for PageCaptureSurface {
    async fn open_detail(&self, handle: &RetrievalHandle) -> Result<()> {
        let js_code = format!(
            r#"
            (() => {{
                const row = document.querySelectorAll({})[{}];
                const link = row ? row.querySelector('a') : null;
                if (!link) {{ return false; }}
                link.click();
                return true;
            }})()
            "#,
            serde_json::to_string(&self.row_selector)?,
            handle.row_index
        );

        let opened: bool = self.executor.eval_as(js_code).await?;
        if !opened {
            return Err(HarvestError::transient(
                "open-detail",
                format!(
                    "第 {} 页第 {} 行没有可点击的详情链接",
                    handle.page_index + 1,
                    handle.row_index + 1
                ),
            ));
        }
        Ok(())
    }

    async fn locate_control(&self, selector: &str) -> Result<bool> {
        self.executor.wait_for(selector, self.control_wait).await
    }

    async fn trigger_control(&self, selector: &str) -> Result<()> {
        // 打印控件只用来切换到打印视图，系统打印对话框会阻塞页面，先禁用
        self.executor.eval("window.print = () => {}; true").await?;
        if !self.executor.click(selector).await? {
            return Err(HarvestError::transient(
                "trigger-control",
                format!("控件已消失: {}", selector),
            ));
        }
        Ok(())
    }

    async fn render(&self, layout: &PrintLayout) -> Result<Vec<Vec<u8>>> {
        let bytes = self.executor.print_pdf(layout.to_params()).await?;
        debug!("渲染完成: {} 字节", bytes.len());
        Ok(vec![bytes])
    }

    async fn close_detail(&self) -> Result<()> {
        for selector in CLOSE_CONTROLS {
            if self.executor.click(selector).await? {
                debug!("已通过 {} 关闭详情", selector);
                return Ok(());
            }
        }
        debug!("没有找到关闭按钮，发送 Escape");
        self.executor.press_escape().await
    }
}

/// 带会话 Cookie 的直接下载
pub struct SessionDownloader {
    executor: JsExecutor,
    client: reqwest::Client,
}

impl SessionDownloader {
    pub fn new(executor: JsExecutor) -> Self {
        Self {
            executor,
            client: reqwest::Client::new(),
        }
    }

    /// 把相对链接解析成绝对地址
    async fn resolve_url(&self, href: &str) -> Result<Url> {
        if let Ok(url) = Url::parse(href) {
            return Ok(url);
        }
        let base = self
            .executor
            .current_url()
            .await?
            .ok_or_else(|| HarvestError::transient("download", "无法获取当前页面地址"))?;
        Url::parse(&base)
            .and_then(|base| base.join(href))
            .map_err(|e| HarvestError::transient("download", format!("无效链接 '{}': {}", href, e)))
    }
}

#[async_trait]
impl Downloader for SessionDownloader {
    async fn download(&self, handle: &RetrievalHandle) -> Result<Vec<u8>> {
        let href = handle
            .href
            .as_deref()
            .ok_or_else(|| HarvestError::transient("download", "行中没有下载链接"))?;
        let url = self.resolve_url(href).await?;
        let cookies = self.executor.cookie_header().await?;

        info!("⬇️ 正在下载: {}", url);
        let response = self
            .client
            .get(url.clone())
            .header(COOKIE, cookies)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| HarvestError::transient("download", format!("{}: {}", url, e)))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| HarvestError::transient("download", format!("{}: {}", url, e)))?;
        Ok(bytes.to_vec())
    }
}
