//! 来源注册表
//!
//! 按文档来源登记 `{账户切换, 取回策略}`，按账户类型选择行解析器。
//! 每个账户处理前解析一次。

use std::collections::HashMap;

use crate::models::{AccountKind, DocumentSource};
use crate::services::{
    AccountSelector, BankHistoryParser, BrokerageHistoryParser, EacHistoryParser,
    RetrievalStrategy, RowParser, StatementParser,
};

static BROKERAGE_HISTORY: BrokerageHistoryParser = BrokerageHistoryParser;
static EAC_HISTORY: EacHistoryParser = EacHistoryParser;
static BANK_HISTORY: BankHistoryParser = BankHistoryParser;
static STATEMENTS: StatementParser = StatementParser;

/// 来源与账户类型对应的解析器；该组合没有记录时返回 None
pub fn parser_for(source: DocumentSource, kind: AccountKind) -> Option<&'static dyn RowParser> {
    match (source, kind) {
        (DocumentSource::History, AccountKind::Brokerage | AccountKind::Daf) => {
            Some(&BROKERAGE_HISTORY)
        }
        (DocumentSource::History, AccountKind::Eac) => Some(&EAC_HISTORY),
        (DocumentSource::History, AccountKind::Bank) => Some(&BANK_HISTORY),
        (DocumentSource::History, AccountKind::Statement) => None,
        (DocumentSource::Statements, _) => Some(&STATEMENTS),
    }
}

struct SourceEntry {
    selector: Box<dyn AccountSelector>,
    retrieval: Box<dyn RetrievalStrategy>,
}

/// 为一个账户解析出的协作者
pub struct ResolvedStrategy<'a> {
    pub parser: &'static dyn RowParser,
    pub selector: &'a dyn AccountSelector,
    pub retrieval: &'a dyn RetrievalStrategy,
}

/// 来源注册表
#[derive(Default)]
pub struct SourceRegistry {
    entries: HashMap<DocumentSource, SourceEntry>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记一个来源，重复登记时覆盖
    pub fn register(
        mut self,
        source: DocumentSource,
        selector: Box<dyn AccountSelector>,
        retrieval: Box<dyn RetrievalStrategy>,
    ) -> Self {
        self.entries
            .insert(source, SourceEntry { selector, retrieval });
        self
    }

    pub fn resolve(&self, source: DocumentSource, kind: AccountKind) -> Option<ResolvedStrategy<'_>> {
        let entry = self.entries.get(&source)?;
        let parser = parser_for(source, kind)?;
        Some(ResolvedStrategy {
            parser,
            selector: entry.selector.as_ref(),
            retrieval: entry.retrieval.as_ref(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parser_selection() {
        let name = |s, k| parser_for(s, k).map(|p| p.name());

        assert_eq!(name(DocumentSource::History, AccountKind::Bank), Some("bank-history"));
        assert_eq!(name(DocumentSource::History, AccountKind::Daf), Some("brokerage-history"));
        assert_eq!(name(DocumentSource::History, AccountKind::Eac), Some("eac-history"));
        assert_eq!(name(DocumentSource::History, AccountKind::Statement), None);
        assert_eq!(name(DocumentSource::Statements, AccountKind::Bank), Some("statement"));
    }

    #[test]
    fn test_unregistered_source_resolves_to_none() {
        let registry = SourceRegistry::new();
        assert!(registry
            .resolve(DocumentSource::History, AccountKind::Bank)
            .is_none());
    }
}
