//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责账户级的流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `app` - 应用入口
//! - 管理应用生命周期（初始化、运行）
//! - 管理浏览器资源（Browser、JsExecutor）
//! - 组装注册表，按来源调用编排器
//! - 输出全局统计，写人工处理清单
//!
//! ### `harvest_orchestrator` - 账户采集编排器
//! - 遍历一个来源下的所有账户
//! - 切换账户、翻页，逐行委托 `RecordFlow`
//! - 按账户隔离失败
//!
//! ## 层次关系
//!
//! ```text
//! app (处理 Vec<DocumentSource>)
//!     ↓
//! harvest_orchestrator (处理 Vec<Account>)
//!     ↓
//! workflow::RecordFlow (处理单行)
//!     ↓
//! services (能力层：parse / name / retrieve)
//!     ↓
//! infrastructure (基础设施：JsExecutor / ArtifactStore / Pacer)
//! ```

pub mod app;
pub mod harvest_orchestrator;

// 重新导出主要类型
pub use app::App;
pub use harvest_orchestrator::HarvestOrchestrator;
