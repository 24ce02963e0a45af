pub mod account_directory;
pub mod account_selector;
pub mod artifact_namer;
pub mod attention_writer;
pub mod navigator;
pub mod page_surface;
pub mod range_policy;
pub mod record_source;
pub mod retrieval;
pub mod row_parser;

pub use account_directory::{AccountDirectory, CachedAccountDirectory, LiveAccountDirectory};
pub use account_selector::{AccountSelector, DomAccountSelector};
pub use artifact_namer::ArtifactNamer;
pub use attention_writer::AttentionWriter;
pub use navigator::{Navigator, SchwabNavigator};
pub use page_surface::{PageCaptureSurface, SessionDownloader};
pub use range_policy::{OrderGuard, RangeDecision, RangeTerminationPolicy};
pub use record_source::{DomTableSource, RecordSource};
pub use retrieval::{
    CaptureSurface, DirectDownload, Downloader, RenderAndCapture, RetrievalRequest,
    RetrievalStrategy,
};
pub use row_parser::{
    BankHistoryParser, BrokerageHistoryParser, EacHistoryParser, RowParser, StatementParser,
};
