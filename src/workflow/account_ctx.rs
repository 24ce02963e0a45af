//! 账户处理上下文
//!
//! 封装"我正在处理第几个账户、哪个来源"这一信息

use std::fmt::Display;

use crate::models::{Account, DocumentSource};

/// 账户处理上下文
#[derive(Debug, Clone)]
pub struct AccountCtx {
    /// 当前账户
    pub account: Account,

    /// 账户索引（从1开始，仅用于日志显示）
    pub account_index: usize,

    /// 本次要处理的账户总数
    pub total_accounts: usize,

    /// 文档来源
    pub source: DocumentSource,
}

impl AccountCtx {
    pub fn new(
        account: Account,
        account_index: usize,
        total_accounts: usize,
        source: DocumentSource,
    ) -> Self {
        Self {
            account,
            account_index,
            total_accounts,
            source,
        }
    }
}

impl Display for AccountCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[账户 {}/{} {} {} {} {}]",
            self.account_index,
            self.total_accounts,
            self.source.name(),
            self.account.kind.tag(),
            self.account.display_name,
            self.account.number
        )
    }
}
