//! 文件命名服务 - 业务能力层
//!
//! 文件名格式（字段顺序是下游工具依赖的约定，不能调整）：
//!
//! ```text
//! <root>/<source>_<kind>_<last4|EAC>_<label>_<YYYYMMDD>_<type>_<amount|qty>_<description|check>.pdf
//! ```
//!
//! 对账单没有金额字段。

use chrono::NaiveDate;
use std::path::PathBuf;

use crate::models::{Account, ParsedRecord};

/// 文件名中的来源标记
pub const SOURCE_TAG: &str = "schwab";

/// 文件扩展名
pub const ARTIFACT_EXTENSION: &str = "pdf";

/// 组成文件名的记录字段
#[derive(Debug, Clone, Copy)]
pub struct KeyFields<'a> {
    pub date: NaiveDate,
    pub record_type: &'a str,
    /// 对账单为 None
    pub amount: Option<&'a str>,
    /// 描述，支票为支票号
    pub tail: &'a str,
}

/// 文件命名器
#[derive(Debug, Clone)]
pub struct ArtifactNamer {
    root: PathBuf,
}

impl ArtifactNamer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// 记录对应的完整文件路径
    pub fn name(&self, record: &ParsedRecord) -> PathBuf {
        self.root
            .join(format!("{}.{}", record.artifact_key, ARTIFACT_EXTENSION))
    }
}

/// 计算文件名（不含根目录与扩展名）
pub fn artifact_key(account: &Account, fields: KeyFields<'_>) -> String {
    let mut parts = vec![
        SOURCE_TAG.to_string(),
        account.kind.tag().to_string(),
        account.id_suffix(),
        normalize_text(&account.display_name),
        fields.date.format("%Y%m%d").to_string(),
        normalize_text(fields.record_type),
    ];
    if let Some(amount) = fields.amount {
        parts.push(normalize_amount(amount));
    }
    parts.push(normalize_text(fields.tail));
    parts.join("_")
}

/// 金额：去掉 `$`、`,` 和开头的 `-`
pub fn normalize_amount(value: &str) -> String {
    value
        .trim()
        .replace(['$', ','], "")
        .trim_start_matches('-')
        .to_string()
}

/// 文本：首字母大写、去掉所有空白、去掉 `/`
pub fn normalize_text(value: &str) -> String {
    title_case(value)
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '/')
        .collect()
}

/// 每段连续字母的首字母大写
///
/// 全大写的单词折叠成小写（"ACH" → "Ach"），大小写混合的单词保留原样（"MyChecking"）
fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut word = String::new();
    for c in value.chars() {
        if c.is_alphabetic() {
            word.push(c);
        } else {
            push_word(&mut out, &word);
            word.clear();
            out.push(c);
        }
    }
    push_word(&mut out, &word);
    out
}

fn push_word(out: &mut String, word: &str) {
    let mut chars = word.chars();
    let Some(first) = chars.next() else {
        return;
    };
    out.extend(first.to_uppercase());
    let rest = chars.as_str();
    if rest.chars().any(char::is_lowercase) {
        out.push_str(rest);
    } else {
        out.push_str(&rest.to_lowercase());
    }
}
