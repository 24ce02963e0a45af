//! 文件存储 - 基础设施层
//!
//! 只提供"文件是否已存在"和"写入文件"两种能力

use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{HarvestError, Result};

/// 文件存储
///
/// 写入时先写临时文件再重命名，中断的运行不会留下半个文件，
/// 下次运行也就不会把它当成已下载
#[derive(Debug, Clone, Default)]
pub struct ArtifactStore;

impl ArtifactStore {
    pub fn new() -> Self {
        Self
    }

    /// 目标文件是否已存在
    pub fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    /// 原样写入文件，返回写入的字节数
    pub fn write(&self, path: &Path, bytes: &[u8]) -> Result<u64> {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        ensure_output_dir(dir)?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| HarvestError::io(dir, e))?;
        tmp.write_all(bytes).map_err(|e| HarvestError::io(path, e))?;
        tmp.flush().map_err(|e| HarvestError::io(path, e))?;
        tmp.as_file_mut()
            .sync_all()
            .map_err(|e| HarvestError::io(path, e))?;
        tmp.persist(path)
            .map_err(|e| HarvestError::io(path, e.error))?;

        debug!("已写入 {} 字节: {}", bytes.len(), path.display());
        Ok(bytes.len() as u64)
    }
}

/// 确保输出目录存在
pub fn ensure_output_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        if !dir.is_dir() {
            return Err(HarvestError::io(
                dir,
                std::io::Error::new(std::io::ErrorKind::Other, "路径不是目录"),
            ));
        }
        return Ok(());
    }
    fs::create_dir_all(dir).map_err(|e| HarvestError::io(dir, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_then_exists() {
        let temp = TempDir::new().unwrap();
        let store = ArtifactStore::new();
        let target = temp.path().join("nested").join("a.pdf");

        assert!(!store.exists(&target));
        let written = store.write(&target, b"%PDF-1.4").unwrap();
        assert_eq!(written, 8);
        assert!(store.exists(&target));
        assert_eq!(fs::read(&target).unwrap(), b"%PDF-1.4");
    }

    #[test]
    fn test_output_dir_that_is_a_file() {
        let temp = TempDir::new().unwrap();
        let file_path = temp.path().join("not_a_dir");
        fs::write(&file_path, "x").unwrap();

        assert!(ensure_output_dir(&file_path).is_err());
        let store = ArtifactStore::new();
        assert!(store.write(&file_path.join("a.pdf"), b"data").is_err());
    }
}
