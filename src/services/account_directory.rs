//! 账户目录 - 业务能力层
//!
//! 提供 `账户ID → 账户` 的映射：
//! - 优先读取 JSON 缓存，任何一条记录无效时整份缓存作废，不做部分合并
//! - 缓存无效或要求刷新时从页面重新发现账户，并重写缓存

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{HarvestError, Result};
use crate::infrastructure::{ArtifactStore, JsExecutor};
use crate::models::{Account, AccountKind};

/// 页面上账户下拉框的分组，顺序对应 `header-0..2`
const ACCOUNT_CATEGORIES: [&str; 3] = ["brokerage", "other", "bank"];

/// 账户目录
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    async fn accounts(&self) -> Result<BTreeMap<String, Account>>;
}

/// 缓存中的一条记录
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    #[serde(default)]
    number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default)]
    nickname: Option<String>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

impl From<&Account> for CacheEntry {
    fn from(account: &Account) -> Self {
        Self {
            number: Some(account.number.clone()),
            name: None,
            nickname: Some(account.display_name.clone()),
            kind: Some(account.kind.tag().to_string()),
        }
    }
}

/// 解析并校验缓存内容
///
/// 任一记录缺少 `number`、`name|nickname` 或 `type`，或类型未知，整份缓存无效
pub fn parse_account_cache(path: &Path, content: &str) -> Result<BTreeMap<String, Account>> {
    let corrupt = |reason: String| HarvestError::CacheCorruption {
        path: path.display().to_string(),
        reason,
    };

    let entries: BTreeMap<String, CacheEntry> =
        serde_json::from_str(content).map_err(|e| corrupt(format!("JSON 无法解析: {}", e)))?;

    let mut accounts = BTreeMap::new();
    for (id, entry) in entries {
        let number = entry
            .number
            .ok_or_else(|| corrupt(format!("账户 {} 缺少 number", id)))?;
        let label = entry
            .name
            .or(entry.nickname)
            .ok_or_else(|| corrupt(format!("账户 {} 缺少 name/nickname", id)))?;
        let tag = entry
            .kind
            .ok_or_else(|| corrupt(format!("账户 {} 缺少 type", id)))?;
        let kind = AccountKind::from_tag(&tag, &number)
            .ok_or_else(|| corrupt(format!("账户 {} 的类型未知: {}", id, tag)))?;

        accounts.insert(
            id.clone(),
            Account {
                id,
                number,
                display_name: label,
                kind,
            },
        );
    }
    Ok(accounts)
}

/// 序列化为缓存内容
pub fn render_account_cache(accounts: &BTreeMap<String, Account>) -> Result<String> {
    let entries: BTreeMap<&str, CacheEntry> = accounts
        .iter()
        .map(|(id, account)| (id.as_str(), CacheEntry::from(account)))
        .collect();
    Ok(serde_json::to_string_pretty(&entries)?)
}

/// 带缓存的账户目录
pub struct CachedAccountDirectory<D> {
    cache_path: PathBuf,
    refresh: bool,
    live: D,
    store: ArtifactStore,
}

impl<D: AccountDirectory> CachedAccountDirectory<D> {
    pub fn new(cache_path: impl Into<PathBuf>, refresh: bool, live: D) -> Self {
        Self {
            cache_path: cache_path.into(),
            refresh,
            live,
            store: ArtifactStore::new(),
        }
    }

    /// 读取缓存；缓存不存在返回 None
    async fn load_cache(&self) -> Result<Option<BTreeMap<String, Account>>> {
        if !self.cache_path.is_file() {
            debug!("账户缓存不存在: {}", self.cache_path.display());
            return Ok(None);
        }
        let content = tokio::fs::read_to_string(&self.cache_path)
            .await
            .map_err(|e| HarvestError::io(&self.cache_path, e))?;
        parse_account_cache(&self.cache_path, &content).map(Some)
    }

    fn save_cache(&self, accounts: &BTreeMap<String, Account>) -> Result<()> {
        let content = render_account_cache(accounts)?;
        self.store.write(&self.cache_path, content.as_bytes())?;
        info!("💾 账户缓存已更新: {}", self.cache_path.display());
        Ok(())
    }
}

#[async_trait]
impl<D: AccountDirectory> AccountDirectory for CachedAccountDirectory<D> {
    async fn accounts(&self) -> Result<BTreeMap<String, Account>> {
        if self.refresh {
            info!("🔄 忽略账户缓存，重新发现账户");
        } else {
            match self.load_cache().await {
                Ok(Some(accounts)) => {
                    info!("✓ 从缓存读取 {} 个账户", accounts.len());
                    return Ok(accounts);
                }
                Ok(None) => {}
                Err(e @ HarvestError::CacheCorruption { .. }) => {
                    warn!("⚠️ {}，改为从页面重新发现", e);
                }
                Err(e) => return Err(e),
            }
        }

        let accounts = self.live.accounts().await?;
        self.save_cache(&accounts)?;
        Ok(accounts)
    }
}

/// 页面脚本返回的一条账户
#[derive(Debug, Deserialize)]
struct DomAccount {
    category: usize,
    nickname: String,
    number: String,
}

/// 从页面的账户下拉框发现账户
pub struct LiveAccountDirectory {
    executor: JsExecutor,
}

impl LiveAccountDirectory {
    pub fn new(executor: JsExecutor) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl AccountDirectory for LiveAccountDirectory {
    async fn accounts(&self) -> Result<BTreeMap<String, Account>> {
        let js_code = format!(
            r#"
            Array.from({{ length: {} }}, (_, i) => i).flatMap(i => {{
                const list = document.querySelector(`ul[aria-labelledby='header-${{i}}']`);
                if (!list) {{ return []; }}
                return Array.from(list.querySelectorAll('a')).map(a => {{
                    const spans = Array.from(a.querySelectorAll('span')).map(s => (s.innerText || '').trim());
                    return {{ category: i, nickname: spans[0] || '', number: spans[1] || '' }};
                }});
            }})
            "#,
            ACCOUNT_CATEGORIES.len()
        );
        let found: Vec<DomAccount> = self.executor.eval_as(js_code).await?;

        let mut accounts = BTreeMap::new();
        for entry in found {
            let category = ACCOUNT_CATEGORIES
                .get(entry.category)
                .copied()
                .unwrap_or("other");
            let number = if entry.number.is_empty() {
                "EAC".to_string()
            } else {
                entry.number
            };
            let Some(kind) = AccountKind::from_tag(category, &number) else {
                continue;
            };
            let account = Account::new(number, entry.nickname, kind);
            debug!("发现账户 {}", account);
            accounts.insert(account.id.clone(), account);
        }

        info!("✓ 从页面发现 {} 个账户", accounts.len());
        Ok(accounts)
    }
}
