//! 记录来源 - 业务能力层
//!
//! 按页面渲染顺序一页一页地产出原始行，同一时间只有一页在内存中

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::infrastructure::{JsExecutor, Pacer};
use crate::models::{Account, RawRow, RetrievalHandle};

/// 交易历史表格的行
pub const HISTORY_ROW_SELECTOR: &str = "tr.data-row";
/// 对账单列表的行
pub const STATEMENT_ROW_SELECTOR: &str = "table.statements-table tbody tr";
/// 翻页链接的文本，必须完全相同
const NEXT_LINK_TEXT: &str = "Next";
/// 翻页后检查表格是否变化的间隔
const PAGE_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// 记录来源
#[async_trait]
pub trait RecordSource: Send {
    /// 开始处理一个账户，重置翻页状态
    async fn begin(&mut self, account: &Account) -> Result<()>;

    /// 下一页的行；返回空表示已经没有更多
    async fn next_page(&mut self, account: &Account) -> Result<Vec<RawRow>>;
}

/// 页面脚本返回的一行
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DomRow {
    cells: Vec<String>,
    has_link: bool,
    href: Option<String>,
}

/// "下一页"链接的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum NextLink {
    Missing,
    Disabled,
    Clicked,
}

/// 一页表格的指纹：行数加第一行的单元格
///
/// 点击"下一页"后指纹不变，说明页面没有翻过去
#[derive(Debug, Clone, PartialEq, Eq)]
struct PageSignature {
    row_count: usize,
    first_row: Vec<String>,
}

impl PageSignature {
    fn of<'a>(mut rows: impl ExactSizeIterator<Item = &'a [String]>) -> Self {
        let row_count = rows.len();
        let first_row = rows
            .next()
            .map(|cells| cells.iter().map(|c| c.trim().to_string()).collect())
            .unwrap_or_default();
        Self {
            row_count,
            first_row,
        }
    }

    fn of_rows(rows: &[DomRow]) -> Self {
        Self::of(rows.iter().map(|row| row.cells.as_slice()))
    }
}

/// 基于页面表格的记录来源
pub struct DomTableSource {
    executor: JsExecutor,
    pacer: Arc<dyn Pacer>,
    row_selector: &'static str,
    page_wait: Duration,
    page_index: usize,
    first_page: bool,
    last_signature: Option<PageSignature>,
}

impl DomTableSource {
    pub fn new(
        executor: JsExecutor,
        pacer: Arc<dyn Pacer>,
        row_selector: &'static str,
        page_wait: Duration,
    ) -> Self {
        Self {
            executor,
            pacer,
            row_selector,
            page_wait,
            page_index: 0,
            first_page: true,
            last_signature: None,
        }
    }

    /// 点击文本恰好为 "Next" 且可用的链接
    async fn click_next(&self) -> Result<NextLink> {
        let js_code = format!(
            r#"
            (() => {{
                const needle = {};
                const link = Array.from(document.querySelectorAll('a'))
                    .find(a => (a.innerText || a.textContent || '').trim() === needle);
                if (!link) {{ return 'missing'; }}
                const disabled = link.hasAttribute('disabled')
                    || link.getAttribute('aria-disabled') === 'true'
                    || link.classList.contains('disabled');
                if (disabled) {{ return 'disabled'; }}
                link.click();
                return 'clicked';
            }})()
            "#,
            serde_json::to_string(NEXT_LINK_TEXT)?
        );
        self.executor.eval_as(js_code).await
    }

    /// 翻到下一页并读出新行
    ///
    /// 没有链接、链接不可用、或者等待后表格没变时返回 None
    async fn advance(&mut self, account: &Account) -> Result<Option<Vec<DomRow>>> {
        match self.click_next().await? {
            NextLink::Clicked => {}
            NextLink::Missing => return Ok(None),
            NextLink::Disabled => {
                debug!("{} 的下一页链接不可用", account);
                return Ok(None);
            }
        }
        self.pacer.pause().await;

        let deadline = Instant::now() + self.page_wait;
        loop {
            let rows = self.read_rows().await?;
            let changed = self
                .last_signature
                .as_ref()
                .map_or(true, |before| *before != PageSignature::of_rows(&rows));
            if changed {
                self.page_index += 1;
                return Ok(Some(rows));
            }
            if Instant::now() >= deadline {
                warn!("⚠️ {} 点击下一页后表格没有变化，视为最后一页", account);
                return Ok(None);
            }
            sleep(PAGE_POLL_INTERVAL).await;
        }
    }

    async fn read_rows(&self) -> Result<Vec<DomRow>> {
        let js_code = format!(
            r#"
            Array.from(document.querySelectorAll({})).map(tr => {{
                const link = tr.querySelector('a');
                return {{
                    cells: Array.from(tr.querySelectorAll(':scope > td')).map(td => td.innerText || ''),
                    hasLink: link !== null,
                    href: link && link.getAttribute('href') && !link.getAttribute('href').startsWith('javascript')
                        ? link.href
                        : null
                }};
            }})
            "#,
            serde_json::to_string(self.row_selector)?
        );
        self.executor.eval_as(js_code).await
    }
}

#[async_trait]
impl RecordSource for DomTableSource {
    async fn begin(&mut self, account: &Account) -> Result<()> {
        debug!("开始读取 {} 的记录", account);
        self.page_index = 0;
        self.first_page = true;
        self.last_signature = None;
        Ok(())
    }

    async fn next_page(&mut self, account: &Account) -> Result<Vec<RawRow>> {
        let rows = if self.first_page {
            self.first_page = false;
            self.read_rows().await?
        } else {
            match self.advance(account).await? {
                Some(rows) => rows,
                None => {
                    info!("{} 没有更多页面", account);
                    return Ok(Vec::new());
                }
            }
        };

        let page_index = self.page_index;
        self.last_signature = Some(PageSignature::of_rows(&rows));
        debug!("{} 第 {} 页: {} 行", account, page_index + 1, rows.len());

        Ok(rows
            .into_iter()
            .enumerate()
            .map(|(row_index, row)| {
                let handle = row.has_link.then(|| RetrievalHandle {
                    page_index,
                    row_index,
                    href: row.href,
                });
                RawRow::new(row.cells, handle)
            })
            .collect())
    }
}
