//! 应用入口 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：创建输出目录、连接浏览器、创建 JsExecutor
//! 2. **会话与账户**：等待登录，读取账户目录（缓存或页面）
//! 3. **按来源编排**：为每个选中的来源打开视图，交给 `HarvestOrchestrator`
//! 4. **资源管理**：持有 Browser 和 JsExecutor，确保生命周期正确
//! 5. **全局统计**：汇总所有来源的结果，写人工处理清单

use anyhow::{Context, Result};
use chromiumoxide::Browser;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, warn};

use crate::browser;
use crate::config::Config;
use crate::infrastructure::{ensure_output_dir, ArtifactStore, JitterPacer, JsExecutor, Pacer};
use crate::models::{Account, DocumentSource, HarvestResult};
use crate::orchestrator::HarvestOrchestrator;
use crate::services::navigator::CLIENT_AREA_MARKER;
use crate::services::record_source::{HISTORY_ROW_SELECTOR, STATEMENT_ROW_SELECTOR};
use crate::services::{
    AccountDirectory, ArtifactNamer, AttentionWriter, CachedAccountDirectory, DirectDownload,
    DomAccountSelector, DomTableSource, LiveAccountDirectory, Navigator, PageCaptureSurface,
    RenderAndCapture, SchwabNavigator, SessionDownloader,
};
use crate::utils::logging::{log_accounts_loaded, log_startup, print_final_stats};
use crate::workflow::SourceRegistry;

/// 应用主结构
pub struct App {
    config: Config,
    _browser: Browser,
    executor: JsExecutor,
    pacer: Arc<dyn Pacer>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        log_startup(&config);

        ensure_output_dir(&config.root_directory)
            .with_context(|| format!("无法创建输出目录: {}", config.root_directory.display()))?;

        // 连接浏览器，优先复用已登录的标签页
        let (browser, page) = browser::connect_to_browser_and_page(
            config.browser_debug_port,
            Some(&config.target_url),
            Some(CLIENT_AREA_MARKER),
        )
        .await
        .context("无法连接浏览器")?;

        // 创建 JsExecutor（持有 page）
        let executor = JsExecutor::new(page);
        let pacer: Arc<dyn Pacer> = Arc::new(JitterPacer::from_millis(
            config.pacing_min_ms,
            config.pacing_max_ms,
        ));

        Ok(Self {
            config,
            _browser: browser,
            executor,
            pacer,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<HarvestResult> {
        let navigator = SchwabNavigator::new(
            self.executor.clone(),
            self.pacer.clone(),
            Duration::from_secs(self.config.session_timeout_secs),
        );
        navigator.wait_for_session().await?;

        let directory = CachedAccountDirectory::new(
            &self.config.account_cache_path,
            self.config.refresh_accounts,
            LiveAccountDirectory::new(self.executor.clone()),
        );
        let accounts = directory.accounts().await.context("无法获取账户列表")?;

        let registry = self.build_registry();
        let namer = ArtifactNamer::new(&self.config.root_directory);
        let store = ArtifactStore::new();
        let mut total = HarvestResult::default();

        for source in self.config.selection.sources() {
            let selected: Vec<Account> = accounts
                .values()
                .filter(|account| self.config.selection.includes(source, account.kind))
                .cloned()
                .collect();
            log_accounts_loaded(accounts.len(), selected.len(), source.name());
            if selected.is_empty() {
                continue;
            }

            if let Err(e) = navigator.open(source).await {
                error!("❌ 无法打开 {} 视图: {}", source.name(), e);
                for account in &selected {
                    total.record_failure(account, &e);
                }
                continue;
            }

            let records = Box::new(DomTableSource::new(
                self.executor.clone(),
                self.pacer.clone(),
                row_selector(source),
                Duration::from_millis(self.config.control_wait_ms),
            ));
            let mut orchestrator =
                HarvestOrchestrator::new(source, &registry, records, &namer, &store);
            total.merge(orchestrator.harvest(&selected, self.config.date_range).await);
        }

        let writer = AttentionWriter::new(&self.config.root_directory);
        let escalated = writer.write_all(total.needs_attention())?;
        if escalated > 0 {
            warn!(
                "⚠️ {} 个文件需要人工处理，详见: {}",
                escalated,
                writer.path().display()
            );
        }

        print_final_stats(&total, &self.config);
        Ok(total)
    }

    /// 交易历史逐条渲染详情，对账单直接下载
    fn build_registry(&self) -> SourceRegistry {
        let control_wait = Duration::from_millis(self.config.control_wait_ms);
        SourceRegistry::new()
            .register(
                DocumentSource::History,
                Box::new(DomAccountSelector::new(self.executor.clone(), self.pacer.clone())),
                Box::new(RenderAndCapture::new(
                    PageCaptureSurface::new(self.executor.clone(), control_wait),
                    self.pacer.clone(),
                )),
            )
            .register(
                DocumentSource::Statements,
                Box::new(DomAccountSelector::new(self.executor.clone(), self.pacer.clone())),
                Box::new(DirectDownload::new(SessionDownloader::new(self.executor.clone()))),
            )
    }
}

fn row_selector(source: DocumentSource) -> &'static str {
    match source {
        DocumentSource::History => HISTORY_ROW_SELECTOR,
        DocumentSource::Statements => STATEMENT_ROW_SELECTOR,
    }
}
