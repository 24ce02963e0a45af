//! 行与记录模型
//!
//! `RawRow` 和 `RetrievalHandle` 只在一次行迭代内存在，不会跨页保留

use chrono::NaiveDate;

/// 不参与终止判断的行使用的排序日期
pub const PINNED_SORT_DATE: NaiveDate = NaiveDate::MIN;

/// 文档来源（页面视图）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentSource {
    /// 交易历史（History → Transactions）
    History,
    /// 对账单 / 税表列表
    Statements,
}

impl DocumentSource {
    pub fn name(self) -> &'static str {
        match self {
            DocumentSource::History => "history",
            DocumentSource::Statements => "statements",
        }
    }
}

/// 指向页面上某个可打开 / 可下载元素的引用
///
/// 由取回策略按值消费，一次取回后即失效
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalHandle {
    /// 第几页（从 0 开始）
    pub page_index: usize,
    /// 页内第几行（从 0 开始）
    pub row_index: usize,
    /// 直接下载链接（对账单）
    pub href: Option<String>,
}

/// 当前页中的一行原始数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub cells: Vec<String>,
    pub handle: Option<RetrievalHandle>,
}

impl RawRow {
    pub fn new(cells: Vec<String>, handle: Option<RetrievalHandle>) -> Self {
        Self { cells, handle }
    }
}

/// 详情子类型，决定使用哪一组打印控件选择器
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetailKind {
    Trade,
    Wire,
    Check,
    Statement,
}

impl DetailKind {
    /// 根据记录类型推断详情子类型
    pub fn for_record_type(record_type: &str) -> Self {
        let lowered = record_type.to_ascii_lowercase();
        if lowered == "check" {
            DetailKind::Check
        } else if lowered.contains("wire") {
            DetailKind::Wire
        } else {
            DetailKind::Trade
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DetailKind::Trade => "trade",
            DetailKind::Wire => "wire",
            DetailKind::Check => "check",
            DetailKind::Statement => "statement",
        }
    }
}

/// 解析后的记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRecord {
    pub date: NaiveDate,
    pub record_type: String,
    pub description: String,
    pub amount_or_quantity: String,
    pub check_number: Option<String>,
    /// 文件名（不含根目录和扩展名）
    pub artifact_key: String,
    pub detail: DetailKind,
    pub retrieval_handle: Option<RetrievalHandle>,
}

impl ParsedRecord {
    /// 排序日期
    pub fn sort_date(&self) -> NaiveDate {
        self.date
    }
}

/// 行解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    Record(ParsedRecord),
    /// 有意跳过的行（汇总行、没有详情的 EAC 行）
    Skip {
        sort_date: NaiveDate,
        reason: &'static str,
    },
}
