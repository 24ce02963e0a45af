//! 日志工具模块
//!
//! 提供日志初始化和格式化输出的辅助函数

use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Config;
use crate::models::HarvestResult;
use crate::workflow::AccountCtx;

/// 初始化 tracing
///
/// `RUST_LOG` 优先；否则默认 info，verbose 时 debug。
/// 指定日志文件时同时追加写入（无颜色）
pub fn init(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("无法打开日志文件: {}", path.display()))?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(file_layer)
        .try_init()
        .context("日志系统初始化失败")?;
    Ok(())
}

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &Path) -> Result<()> {
    let log_header = format!(
        "{}\n文档采集日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)
        .with_context(|| format!("无法写入日志文件: {}", log_file_path.display()))?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 文档采集模式");
    info!("📁 输出目录: {}", config.root_directory.display());
    info!("📅 日期窗口: {}", config.date_range);
    info!("📋 文档类型: {}", config.selection);
    info!("{}", "=".repeat(60));
}

/// 记录账户加载信息
pub fn log_accounts_loaded(total: usize, selected: usize, source: &str) {
    info!("✓ 共 {} 个账户，{} 个需要处理 {}", total, selected, source);
}

/// 记录账户开始信息
pub fn log_account_start(ctx: &AccountCtx, parser: &str, retrieval: &str) {
    info!("\n{}", "=".repeat(60));
    info!("🏦 开始处理 {}", ctx);
    info!("解析器: {} | 取回方式: {}", parser, retrieval);
    info!("{}", "=".repeat(60));
}

/// 记录账户完成信息
pub fn log_account_complete(ctx: &AccountCtx, result: &HarvestResult) {
    info!("\n{}", "─".repeat(60));
    info!(
        "{} 完成: 下载 {} | 已存在 {} | 超出窗口 {} | 无文档 {} | 失败 {}",
        ctx,
        result.downloaded,
        result.skipped_existing,
        result.skipped_out_of_range,
        result.skipped_no_document,
        result.failed.len()
    );
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
pub fn print_final_stats(result: &HarvestResult, config: &Config) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 下载: {}", result.downloaded);
    info!("⏭️ 已存在: {}", result.skipped_existing);
    info!("📅 超出窗口: {}", result.skipped_out_of_range);
    info!("📭 无文档: {}", result.skipped_no_document);
    info!("❌ 失败: {}", result.failed.len());
    for failure in &result.failed {
        warn!(
            "  - 账户 {} ({}) [{}]: {}",
            failure.account_id,
            failure.account_label,
            failure.kind.label(),
            failure.message
        );
    }
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", config.output_log_file.display());
}
