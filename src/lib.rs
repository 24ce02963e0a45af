//! # Schwab Harvester
//!
//! 从已登录的浏览器会话中批量下载交易详情和对账单的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page、文件系统），只暴露能力
//! - `JsExecutor` - 唯一的 page owner，提供 eval / 点击 / 打印能力
//! - `ArtifactStore` - 文件存在检查与原子写入
//! - `Pacer` - 界面操作之间的随机停顿
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单行 / 单个账户
//! - `RowParser` - 四种行解析器
//! - `ArtifactNamer` - 确定性的文件命名
//! - `RangeTerminationPolicy` - 日期窗口判断
//! - `RetrievalStrategy` - 直接下载 / 渲染并截取
//! - `AccountDirectory` / `AccountSelector` / `Navigator` / `RecordSource` - 页面协作者
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一行记录"的完整处理流程
//! - `AccountCtx` - 上下文封装（账户 + 来源 + 索引）
//! - `SourceRegistry` - 来源 → 协作者
//! - `RecordFlow` - 流程编排（parse → decide → name → exists → fetch）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/app` - 应用入口，管理资源和来源
//! - `orchestrator/harvest_orchestrator` - 账户循环与失败隔离
//!
//! ## 模块结构

pub mod browser;
pub mod cli;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use browser::connect_to_browser_and_page;
pub use config::Config;
pub use error::{HarvestError, Result};
pub use infrastructure::JsExecutor;
pub use models::{Account, AccountKind, DateRange, HarvestResult};
pub use orchestrator::{App, HarvestOrchestrator};
pub use workflow::{AccountCtx, RecordFlow, RowOutcome, SourceRegistry};
