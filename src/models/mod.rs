pub mod account;
pub mod date_range;
pub mod harvest_result;
pub mod record;

pub use account::{Account, AccountKind};
pub use date_range::DateRange;
pub use harvest_result::{FailureKind, FailureRecord, HarvestResult};
pub use record::{
    DetailKind, DocumentSource, ParseOutcome, ParsedRecord, RawRow, RetrievalHandle,
    PINNED_SORT_DATE,
};
