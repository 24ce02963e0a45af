use std::path::Path;

use thiserror::Error;

use crate::models::FailureKind;

/// 采集引擎错误类型
#[derive(Debug, Error)]
pub enum HarvestError {
    /// 行结构与账户类型的预期不符（单元格数量、日期格式、金额列等）
    #[error("行结构不匹配 [{parser}]: {detail}")]
    StructuralMismatch { parser: String, detail: String },

    /// 预期的界面控件未在限定时间内出现，或下载失败
    #[error("界面操作失败 ({action}): {detail}")]
    TransientUi { action: String, detail: String },

    /// 无法自动继续，需要人工处理
    #[error("需要人工处理 ({artifact}): {reason}")]
    NeedsOperatorAttention { artifact: String, reason: String },

    /// 账户缓存校验失败
    #[error("账户缓存无效 ({path}): {reason}")]
    CacheCorruption { path: String, reason: String },

    /// 浏览器 / CDP 错误
    #[error("浏览器错误: {0}")]
    Browser(#[from] chromiumoxide::error::CdpError),

    /// 文件操作失败
    #[error("文件操作失败 ({path}): {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON 解析失败
    #[error("JSON解析失败: {0}")]
    Json(#[from] serde_json::Error),

    /// 正则表达式编译失败
    #[error("正则表达式错误: {0}")]
    Regex(#[from] regex::Error),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),
}

impl HarvestError {
    /// 创建行结构不匹配错误
    pub fn structural(parser: impl Into<String>, detail: impl Into<String>) -> Self {
        HarvestError::StructuralMismatch {
            parser: parser.into(),
            detail: detail.into(),
        }
    }

    /// 创建界面操作失败错误
    pub fn transient(action: impl Into<String>, detail: impl Into<String>) -> Self {
        HarvestError::TransientUi {
            action: action.into(),
            detail: detail.into(),
        }
    }

    /// 创建人工处理错误
    pub fn attention(artifact: &Path, reason: impl Into<String>) -> Self {
        HarvestError::NeedsOperatorAttention {
            artifact: artifact.display().to_string(),
            reason: reason.into(),
        }
    }

    /// 创建文件操作错误
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        HarvestError::Io {
            path: path.display().to_string(),
            source,
        }
    }

    /// 错误分类，用于写入 `HarvestResult.failed`
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            HarvestError::StructuralMismatch { .. } => FailureKind::StructuralMismatch,
            HarvestError::TransientUi { .. } => FailureKind::TransientUi,
            HarvestError::NeedsOperatorAttention { .. } => FailureKind::NeedsOperatorAttention,
            _ => FailureKind::Session,
        }
    }

    /// 是否终止当前账户的处理
    ///
    /// 只有单个文件的界面失败可以跳过继续，其余错误都中止当前账户
    pub fn aborts_account(&self) -> bool {
        !matches!(self, HarvestError::TransientUi { .. })
    }
}

/// 采集引擎结果类型
pub type Result<T> = std::result::Result<T, HarvestError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_failure_kind_mapping() {
        let err = HarvestError::structural("bank-history", "期望 7 个单元格，实际 5 个");
        assert_eq!(err.failure_kind(), FailureKind::StructuralMismatch);
        assert!(err.aborts_account());

        let err = HarvestError::transient("download", "超时");
        assert_eq!(err.failure_kind(), FailureKind::TransientUi);
        assert!(!err.aborts_account());

        let err = HarvestError::attention(&PathBuf::from("/tmp/a.pdf"), "没有找到打印控件");
        assert_eq!(err.failure_kind(), FailureKind::NeedsOperatorAttention);
        assert!(err.to_string().contains("/tmp/a.pdf"));

        let err = HarvestError::Config("起始日期晚于结束日期".to_string());
        assert_eq!(err.failure_kind(), FailureKind::Session);
    }
}
