use crate::error::HarvestError;
use crate::models::Account;

/// 失败分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    StructuralMismatch,
    TransientUi,
    NeedsOperatorAttention,
    /// 浏览器会话、文件系统、配置等基础设施错误
    Session,
}

impl FailureKind {
    pub fn label(self) -> &'static str {
        match self {
            FailureKind::StructuralMismatch => "行结构不匹配",
            FailureKind::TransientUi => "界面操作失败",
            FailureKind::NeedsOperatorAttention => "需要人工处理",
            FailureKind::Session => "会话错误",
        }
    }
}

/// 单条失败记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRecord {
    pub account_id: String,
    pub account_label: String,
    pub kind: FailureKind,
    pub message: String,
}

impl FailureRecord {
    pub fn from_error(account: &Account, error: &HarvestError) -> Self {
        Self {
            account_id: account.id.clone(),
            account_label: account.display_name.clone(),
            kind: error.failure_kind(),
            message: error.to_string(),
        }
    }
}

/// 一次账户处理（或整次运行）的统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestResult {
    pub downloaded: usize,
    pub skipped_existing: usize,
    pub skipped_out_of_range: usize,
    /// 没有可取回文档的行（汇总行、无详情的行）
    pub skipped_no_document: usize,
    pub failed: Vec<FailureRecord>,
}

impl HarvestResult {
    /// 合并到运行级统计
    pub fn merge(&mut self, other: HarvestResult) {
        self.downloaded += other.downloaded;
        self.skipped_existing += other.skipped_existing;
        self.skipped_out_of_range += other.skipped_out_of_range;
        self.skipped_no_document += other.skipped_no_document;
        self.failed.extend(other.failed);
    }

    pub fn record_failure(&mut self, account: &Account, error: &HarvestError) {
        self.failed.push(FailureRecord::from_error(account, error));
    }

    pub fn needs_attention(&self) -> impl Iterator<Item = &FailureRecord> {
        self.failed
            .iter()
            .filter(|f| f.kind == FailureKind::NeedsOperatorAttention)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AccountKind;

    #[test]
    fn test_merge_sums_counters_and_keeps_failures() {
        let account = Account::new("...1234", "MyChecking", AccountKind::Bank);
        let mut total = HarvestResult {
            downloaded: 2,
            skipped_existing: 1,
            ..Default::default()
        };
        let mut other = HarvestResult {
            downloaded: 3,
            skipped_out_of_range: 4,
            skipped_no_document: 1,
            ..Default::default()
        };
        other.record_failure(&account, &HarvestError::structural("bank-history", "5 个单元格"));

        total.merge(other);

        assert_eq!(total.downloaded, 5);
        assert_eq!(total.skipped_existing, 1);
        assert_eq!(total.skipped_out_of_range, 4);
        assert_eq!(total.skipped_no_document, 1);
        assert_eq!(total.failed.len(), 1);
        assert_eq!(total.failed[0].account_id, "...1234");
        assert_eq!(total.needs_attention().count(), 0);
    }
}
