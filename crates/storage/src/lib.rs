//! Persistence of generated question sets as pretty-printed JSON records,
//! one file per processed document.

pub mod error;
pub mod record;
pub mod store;

pub use error::StoreError;
pub use record::{
    McqRecord, QuestionSet, QuestionSummary, RecordMetadata, RecordParams, RecordSummary,
    ResolvedRef,
};
pub use store::{record_filename, McqStore};
