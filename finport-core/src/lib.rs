//! finport-core: shared types for statement importers (schemas, rows, the
//! `Importer` trait and registry) plus date and tokenizer utilities.

pub mod error;
pub mod importer;
pub mod rows;
pub mod schema;
pub mod time;
pub mod tokenize;

pub use error::{ImportError, Result};
pub use importer::{DecodeOptions, Importer, Prospector};
pub use rows::{
    Account, DecodedRow, Holding, RawRow, RejectReason, RejectedRow, Security, SourceMeta,
};
pub use schema::{AllocSchema, DetectResult, SourceFormat, detect_all};
pub use time::{parse_mmddyyyy, parse_time_zone};
