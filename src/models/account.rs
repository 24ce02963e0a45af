use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// 账户类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    /// 证券账户
    Brokerage,
    /// 银行账户
    Bank,
    /// 员工股权账户（EAC）
    Eac,
    /// 捐赠者建议基金（DAF）
    Daf,
    /// 只有对账单的账户
    Statement,
}

impl AccountKind {
    /// 文件名中使用的类型标记
    pub fn tag(self) -> &'static str {
        match self {
            AccountKind::Brokerage => "brokerage",
            AccountKind::Bank => "bank",
            AccountKind::Eac => "eac",
            AccountKind::Daf => "daf",
            AccountKind::Statement => "statement",
        }
    }

    /// 从缓存或页面上的类型字符串解析
    ///
    /// 页面把 EAC / DAF 都归在 "other" 分组下，没有账号的是 EAC
    pub fn from_tag(tag: &str, number: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "brokerage" => Some(AccountKind::Brokerage),
            "bank" => Some(AccountKind::Bank),
            "eac" => Some(AccountKind::Eac),
            "daf" => Some(AccountKind::Daf),
            "statement" | "statement-only" => Some(AccountKind::Statement),
            "other" if is_eac_number(number) => Some(AccountKind::Eac),
            "other" => Some(AccountKind::Daf),
            _ => None,
        }
    }
}

/// 账户信息，在一次运行中不可变
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// 账户ID（缓存的键）
    pub id: String,
    /// 页面显示的账号，例如 "...1234"；EAC 账户为 "EAC"
    pub number: String,
    /// 账户昵称
    pub display_name: String,
    /// 账户类型
    pub kind: AccountKind,
}

impl Account {
    pub fn new(
        number: impl Into<String>,
        display_name: impl Into<String>,
        kind: AccountKind,
    ) -> Self {
        let number = number.into();
        Self {
            id: number.clone(),
            number,
            display_name: display_name.into(),
            kind,
        }
    }

    /// 文件名中使用的账号后缀：账号后 4 位，EAC 账户为 "EAC"
    pub fn id_suffix(&self) -> String {
        if is_eac_number(&self.number) {
            return "EAC".to_string();
        }
        let chars: Vec<char> = self.number.chars().collect();
        let start = chars.len().saturating_sub(4);
        chars[start..].iter().collect()
    }
}

impl Display for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{} {} {}]", self.kind.tag(), self.display_name, self.number)
    }
}

fn is_eac_number(number: &str) -> bool {
    let number = number.trim();
    number.is_empty() || number.eq_ignore_ascii_case("EAC")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_suffix() {
        let account = Account::new("...1234", "MyChecking", AccountKind::Bank);
        assert_eq!(account.id_suffix(), "1234");

        let account = Account::new("EAC", "Equity Awards", AccountKind::Eac);
        assert_eq!(account.id_suffix(), "EAC");

        let account = Account::new("12", "Short", AccountKind::Brokerage);
        assert_eq!(account.id_suffix(), "12");
    }

    #[test]
    fn test_kind_from_tag() {
        assert_eq!(AccountKind::from_tag("bank", "...1234"), Some(AccountKind::Bank));
        assert_eq!(AccountKind::from_tag("Brokerage", "...9"), Some(AccountKind::Brokerage));
        assert_eq!(AccountKind::from_tag("other", "EAC"), Some(AccountKind::Eac));
        assert_eq!(AccountKind::from_tag("other", "...5555"), Some(AccountKind::Daf));
        assert_eq!(AccountKind::from_tag("savings", "...5555"), None);
    }
}
