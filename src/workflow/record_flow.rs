//! 单行处理流程 - 流程层
//!
//! 核心职责：定义"一行记录"的完整处理流程
//!
//! 流程顺序：
//! 1. 解析（跳过行直接计数，不参与终止判断）
//! 2. 顺序检查 → 日期窗口判断（Stop / SkipContinue / Retrieve）
//! 3. 命名 → 是否已存在 → 取回

use std::path::PathBuf;
use tracing::debug;

use crate::error::Result;
use crate::infrastructure::ArtifactStore;
use crate::models::{DateRange, ParseOutcome, RawRow};
use crate::services::{
    ArtifactNamer, OrderGuard, RangeDecision, RangeTerminationPolicy, RetrievalRequest,
    RetrievalStrategy, RowParser,
};
use crate::workflow::account_ctx::AccountCtx;
use crate::workflow::registry::ResolvedStrategy;

/// 单行处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    /// 新下载的文件
    Downloaded(PathBuf),
    /// 文件已存在，没有调用取回策略
    SkippedExisting(PathBuf),
    /// 比日期窗口新
    SkippedOutOfRange,
    /// 没有可取回的文档
    SkippedNoDocument,
    /// 比日期窗口旧，账户处理结束
    Stop,
}

/// 单行处理流程
///
/// - 每个账户创建一次，跨页保留顺序检查状态
/// - 不持有任何页面资源
pub struct RecordFlow<'a> {
    parser: &'a dyn RowParser,
    retrieval: &'a dyn RetrievalStrategy,
    namer: &'a ArtifactNamer,
    store: &'a ArtifactStore,
    policy: RangeTerminationPolicy,
    guard: OrderGuard,
}

impl<'a> RecordFlow<'a> {
    pub fn new(
        resolved: &ResolvedStrategy<'a>,
        namer: &'a ArtifactNamer,
        store: &'a ArtifactStore,
        range: DateRange,
    ) -> Self {
        Self {
            parser: resolved.parser,
            retrieval: resolved.retrieval,
            namer,
            store,
            policy: RangeTerminationPolicy::new(range),
            guard: OrderGuard::new(),
        }
    }

    pub async fn run(&mut self, row: RawRow, ctx: &AccountCtx) -> Result<RowOutcome> {
        let record = match self.parser.parse(row, &ctx.account)? {
            ParseOutcome::Record(record) => record,
            ParseOutcome::Skip { reason, .. } => {
                debug!("{} 跳过: {}", ctx, reason);
                return Ok(RowOutcome::SkippedNoDocument);
            }
        };

        self.guard.observe(record.sort_date())?;
        match self.policy.decide(record.sort_date()) {
            RangeDecision::SkipContinue => return Ok(RowOutcome::SkippedOutOfRange),
            RangeDecision::Stop => return Ok(RowOutcome::Stop),
            RangeDecision::Retrieve => {}
        }

        let target = self.namer.name(&record);
        let Some(handle) = record.retrieval_handle else {
            debug!("{} 没有详情链接: {}", ctx, record.artifact_key);
            return Ok(RowOutcome::SkippedNoDocument);
        };
        if self.store.exists(&target) {
            return Ok(RowOutcome::SkippedExisting(target));
        }

        debug!("{} 使用 {} 取回 {}", ctx, self.retrieval.name(), record.artifact_key);
        let request = RetrievalRequest {
            handle,
            detail: record.detail,
            target: target.clone(),
        };
        self.retrieval.fetch(request, self.store).await?;
        Ok(RowOutcome::Downloaded(target))
    }
}
