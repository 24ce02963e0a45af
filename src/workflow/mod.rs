pub mod account_ctx;
pub mod record_flow;
pub mod registry;

pub use account_ctx::AccountCtx;
pub use record_flow::{RecordFlow, RowOutcome};
pub use registry::{parser_for, ResolvedStrategy, SourceRegistry};
