//! 账户采集编排器 - 编排层
//!
//! ## 职责
//!
//! 对一个文档来源，依次处理所有账户：
//!
//! 1. **切换账户**：委托注册表解析出的 `AccountSelector`
//! 2. **翻页**：从 `RecordSource` 一页一页取行，空页表示结束
//! 3. **逐行处理**：委托 `RecordFlow`，遇到 Stop 结束整个账户
//! 4. **失败隔离**：结构错误、需人工处理、会话错误只中止当前账户，
//!    单个文件的界面失败记录后继续下一行
//! 5. **统计**：每个账户一份 `HarvestResult`，合并成来源级统计

use tracing::{error, info, warn};

use crate::error::Result;
use crate::infrastructure::ArtifactStore;
use crate::models::{Account, DateRange, DocumentSource, HarvestResult};
use crate::services::{ArtifactNamer, RecordSource};
use crate::utils::logging::{log_account_complete, log_account_start};
use crate::workflow::{AccountCtx, RecordFlow, ResolvedStrategy, RowOutcome, SourceRegistry};

/// 账户采集编排器
pub struct HarvestOrchestrator<'a> {
    source: DocumentSource,
    registry: &'a SourceRegistry,
    records: Box<dyn RecordSource + 'a>,
    namer: &'a ArtifactNamer,
    store: &'a ArtifactStore,
}

impl<'a> HarvestOrchestrator<'a> {
    pub fn new(
        source: DocumentSource,
        registry: &'a SourceRegistry,
        records: Box<dyn RecordSource + 'a>,
        namer: &'a ArtifactNamer,
        store: &'a ArtifactStore,
    ) -> Self {
        Self {
            source,
            registry,
            records,
            namer,
            store,
        }
    }

    /// 处理所有账户
    ///
    /// 单个账户的失败写入结果后继续下一个账户，不返回错误
    pub async fn harvest(&mut self, accounts: &[Account], range: DateRange) -> HarvestResult {
        let registry = self.registry;
        let total_accounts = accounts.len();
        let mut total = HarvestResult::default();

        for (index, account) in accounts.iter().enumerate() {
            let ctx = AccountCtx::new(account.clone(), index + 1, total_accounts, self.source);

            let Some(resolved) = registry.resolve(self.source, account.kind) else {
                info!("{} 没有 {} 记录，跳过", ctx, self.source.name());
                continue;
            };

            log_account_start(&ctx, resolved.parser.name(), resolved.retrieval.name());

            let mut result = HarvestResult::default();
            if let Err(e) = self.harvest_account(&ctx, &resolved, range, &mut result).await {
                error!("{} ❌ 账户处理中止: {}", ctx, e);
                result.record_failure(account, &e);
            }

            log_account_complete(&ctx, &result);
            total.merge(result);
        }

        total
    }

    async fn harvest_account(
        &mut self,
        ctx: &AccountCtx,
        resolved: &ResolvedStrategy<'a>,
        range: DateRange,
        result: &mut HarvestResult,
    ) -> Result<()> {
        resolved.selector.select(&ctx.account).await?;
        self.records.begin(&ctx.account).await?;

        let mut flow = RecordFlow::new(resolved, self.namer, self.store, range);

        loop {
            let rows = self.records.next_page(&ctx.account).await?;
            if rows.is_empty() {
                info!("{} 记录已全部读取", ctx);
                return Ok(());
            }

            for row in rows {
                match flow.run(row, ctx).await {
                    Ok(RowOutcome::Downloaded(path)) => {
                        info!("{} ✓ 下载: {}", ctx, path.display());
                        result.downloaded += 1;
                    }
                    Ok(RowOutcome::SkippedExisting(path)) => {
                        info!("{} ⏭️ 已存在: {}", ctx, path.display());
                        result.skipped_existing += 1;
                    }
                    Ok(RowOutcome::SkippedOutOfRange) => result.skipped_out_of_range += 1,
                    Ok(RowOutcome::SkippedNoDocument) => result.skipped_no_document += 1,
                    Ok(RowOutcome::Stop) => {
                        info!("{} 🛑 已超出日期窗口 {}，停止翻页", ctx, range);
                        return Ok(());
                    }
                    Err(e) if !e.aborts_account() => {
                        warn!("{} ⚠️ 跳过此记录: {}", ctx, e);
                        result.record_failure(&ctx.account, &e);
                    }
                    Err(e) => return Err(e),
                }
            }
        }
    }
}
