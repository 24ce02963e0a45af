//! 程序配置
//!
//! 分层加载：默认值 → TOML 配置文件 → 环境变量 → 命令行参数

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fmt::Display;
use std::path::{Path, PathBuf};

use crate::cli::CliArgs;
use crate::models::{AccountKind, DateRange, DocumentSource};

/// 未指定时尝试读取的配置文件
pub const DEFAULT_CONFIG_FILE: &str = "harvester.toml";

/// 需要下载的文档类型
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DocumentSelection {
    /// 证券 / EAC / DAF 交易详情
    pub transactions: bool,
    /// 银行账户交易详情
    pub checks: bool,
    /// 对账单
    pub docs: bool,
}

impl DocumentSelection {
    pub const ALL: DocumentSelection = DocumentSelection {
        transactions: true,
        checks: true,
        docs: true,
    };

    /// 需要打开的来源，按处理顺序
    pub fn sources(&self) -> Vec<DocumentSource> {
        let mut sources = Vec::new();
        if self.transactions || self.checks {
            sources.push(DocumentSource::History);
        }
        if self.docs {
            sources.push(DocumentSource::Statements);
        }
        sources
    }

    /// 某类账户在某个来源下是否需要处理
    pub fn includes(&self, source: DocumentSource, kind: AccountKind) -> bool {
        match source {
            DocumentSource::History => match kind {
                AccountKind::Bank => self.checks,
                AccountKind::Brokerage | AccountKind::Eac | AccountKind::Daf => self.transactions,
                AccountKind::Statement => false,
            },
            DocumentSource::Statements => self.docs,
        }
    }
}

impl Default for DocumentSelection {
    fn default() -> Self {
        Self::ALL
    }
}

impl Display for DocumentSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names = Vec::new();
        if self.transactions {
            names.push("transactions");
        }
        if self.checks {
            names.push("checks");
        }
        if self.docs {
            names.push("docs");
        }
        write!(f, "{}", names.join(", "))
    }
}

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 输出根目录
    pub root_directory: PathBuf,
    /// 日期窗口
    pub date_range: DateRange,
    /// 浏览器调试端口
    pub browser_debug_port: u16,
    /// 打开的起始页面
    pub target_url: String,
    /// 账户缓存文件
    pub account_cache_path: PathBuf,
    /// 忽略账户缓存
    pub refresh_accounts: bool,
    /// 文档类型
    pub selection: DocumentSelection,
    /// 界面操作后的随机停顿区间（毫秒）
    pub pacing_min_ms: u64,
    pub pacing_max_ms: u64,
    /// 单个控件的等待时间（毫秒）
    pub control_wait_ms: u64,
    /// 等待登录的最长时间（秒）
    pub session_timeout_secs: u64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let today = chrono::Local::now().date_naive();
        Self {
            root_directory: PathBuf::from("schwab_documents"),
            date_range: current_year(today),
            browser_debug_port: 9222,
            target_url: "https://client.schwab.com/clientapps/accounts/summary/".to_string(),
            account_cache_path: PathBuf::from("accounts.json"),
            refresh_accounts: false,
            selection: DocumentSelection::ALL,
            pacing_min_ms: 2000,
            pacing_max_ms: 5000,
            control_wait_ms: 5000,
            session_timeout_secs: 600,
            verbose_logging: false,
            output_log_file: PathBuf::from("output.txt"),
        }
    }
}

/// TOML 配置文件，所有字段可选
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub root_directory: Option<PathBuf>,
    pub year: Option<String>,
    pub date_range: Option<String>,
    pub browser_debug_port: Option<u16>,
    pub target_url: Option<String>,
    pub account_cache_path: Option<PathBuf>,
    pub pacing_min_ms: Option<u64>,
    pub pacing_max_ms: Option<u64>,
    pub control_wait_ms: Option<u64>,
    pub session_timeout_secs: Option<u64>,
    pub verbose_logging: Option<bool>,
    pub output_log_file: Option<PathBuf>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("无法读取配置文件: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("无法解析配置文件: {}", path.display()))
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default().with_env()
    }

    /// 按 默认值 → 配置文件 → 环境变量 → 命令行 的顺序加载
    pub fn load(cli: &CliArgs) -> Result<Self> {
        let mut config = Self::default();

        let file_path = cli
            .config_file
            .clone()
            .or_else(|| std::env::var("HARVESTER_CONFIG").ok().map(PathBuf::from));
        match file_path {
            Some(path) => config = config.with_file(FileConfig::load(&path)?)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                config = config.with_file(FileConfig::load(Path::new(DEFAULT_CONFIG_FILE))?)?
            }
            None => {}
        }

        config.with_env_ranges()?.with_env().with_cli(cli)
    }

    fn with_file(mut self, file: FileConfig) -> Result<Self> {
        if file.date_range.is_some() || file.year.is_some() {
            self.date_range = resolve_range(file.date_range.as_deref(), file.year.as_deref())?;
        }
        if let Some(v) = file.root_directory {
            self.root_directory = v;
        }
        if let Some(v) = file.browser_debug_port {
            self.browser_debug_port = v;
        }
        if let Some(v) = file.target_url {
            self.target_url = v;
        }
        if let Some(v) = file.account_cache_path {
            self.account_cache_path = v;
        }
        if let Some(v) = file.pacing_min_ms {
            self.pacing_min_ms = v;
        }
        if let Some(v) = file.pacing_max_ms {
            self.pacing_max_ms = v;
        }
        if let Some(v) = file.control_wait_ms {
            self.control_wait_ms = v;
        }
        if let Some(v) = file.session_timeout_secs {
            self.session_timeout_secs = v;
        }
        if let Some(v) = file.verbose_logging {
            self.verbose_logging = v;
        }
        if let Some(v) = file.output_log_file {
            self.output_log_file = v;
        }
        Ok(self)
    }

    fn with_env(self) -> Self {
        Self {
            root_directory: std::env::var("HARVESTER_ROOT").map(PathBuf::from).unwrap_or(self.root_directory),
            browser_debug_port: std::env::var("BROWSER_DEBUG_PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(self.browser_debug_port),
            target_url: std::env::var("TARGET_URL").unwrap_or(self.target_url),
            account_cache_path: std::env::var("HARVESTER_ACCOUNT_CACHE").map(PathBuf::from).unwrap_or(self.account_cache_path),
            pacing_min_ms: std::env::var("HARVESTER_PACING_MIN_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(self.pacing_min_ms),
            pacing_max_ms: std::env::var("HARVESTER_PACING_MAX_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(self.pacing_max_ms),
            control_wait_ms: std::env::var("HARVESTER_CONTROL_WAIT_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(self.control_wait_ms),
            session_timeout_secs: std::env::var("HARVESTER_SESSION_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(self.session_timeout_secs),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(self.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").map(PathBuf::from).unwrap_or(self.output_log_file),
            ..self
        }
    }

    fn with_env_ranges(mut self) -> Result<Self> {
        let range = std::env::var("HARVESTER_DATE_RANGE").ok();
        let year = std::env::var("HARVESTER_YEAR").ok();
        if range.is_some() || year.is_some() {
            self.date_range = resolve_range(range.as_deref(), year.as_deref())?;
        }
        Ok(self)
    }

    fn with_cli(mut self, cli: &CliArgs) -> Result<Self> {
        if cli.date_range.is_some() || cli.year.is_some() {
            self.date_range = resolve_range(cli.date_range.as_deref(), cli.year.as_deref())?;
        }
        if let Some(root) = &cli.root {
            self.root_directory = root.clone();
        }
        if let Some(port) = cli.port {
            self.browser_debug_port = port;
        }
        if cli.refresh {
            self.refresh_accounts = true;
        }
        if cli.verbose {
            self.verbose_logging = true;
        }
        self.selection = selection_from(cli);
        Ok(self)
    }
}

/// 没有指定任何文档类型时等同于 --all
pub fn selection_from(cli: &CliArgs) -> DocumentSelection {
    if cli.all || !(cli.transactions || cli.checks || cli.docs) {
        return DocumentSelection::ALL;
    }
    DocumentSelection {
        transactions: cli.transactions,
        checks: cli.checks,
        docs: cli.docs,
    }
}

fn resolve_range(range: Option<&str>, year: Option<&str>) -> Result<DateRange> {
    let today = chrono::Local::now().date_naive();
    DateRange::resolve(range, year, today).context("日期窗口无效")
}

fn current_year(today: chrono::NaiveDate) -> DateRange {
    use chrono::Datelike;
    let start = chrono::NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today);
    let end = chrono::NaiveDate::from_ymd_opt(today.year(), 12, 31).unwrap_or(today);
    DateRange { start, end }
}
