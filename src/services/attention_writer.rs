//! 人工处理清单 - 业务能力层
//!
//! 只负责"写 attention.txt"能力，不关心流程

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{HarvestError, Result};
use crate::models::FailureRecord;

pub const ATTENTION_FILE_NAME: &str = "attention.txt";

/// 人工处理清单
///
/// 职责：
/// - 把需要人工处理的失败追加到 `<root>/attention.txt`
/// - 每条记录带时间、账户和原因，足够手动补救
pub struct AttentionWriter {
    path: PathBuf,
}

impl AttentionWriter {
    /// 在输出根目录下创建
    pub fn new(root: &Path) -> Self {
        Self {
            path: root.join(ATTENTION_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 追加一条记录
    pub fn write(&self, failure: &FailureRecord) -> Result<()> {
        debug!("写入人工处理清单: {} | {}", failure.account_id, failure.message);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| HarvestError::io(&self.path, e))?;

        let line = format!(
            "{} | 账户 {} ({}) | {} | {}\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            failure.account_id,
            failure.account_label,
            failure.kind.label(),
            failure.message
        );

        file.write_all(line.as_bytes())
            .map_err(|e| HarvestError::io(&self.path, e))
    }

    /// 追加多条记录，返回写入条数
    pub fn write_all<'a>(&self, failures: impl IntoIterator<Item = &'a FailureRecord>) -> Result<usize> {
        let mut written = 0;
        for failure in failures {
            self.write(failure)?;
            written += 1;
        }
        Ok(written)
    }
}
