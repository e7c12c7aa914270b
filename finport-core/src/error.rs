use thiserror::Error;

use crate::schema::AllocSchema;

/// Fatal import failures. Per-row problems never surface here; they go to
/// the caller's rejection list instead.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("invalid date format: {0}")]
    InvalidDateFormat(String),

    #[error("invalid time of day (expected HH:MM): {0}")]
    InvalidTimeOfDay(String),

    #[error("invalid timezone: {0}")]
    InvalidTimeZone(String),

    #[error("local time does not exist in {tz}: {local}")]
    InvalidLocalTime { local: String, tz: String },

    #[error("statement header not recognized")]
    HeaderNotRecognized,

    #[error("schema {0} is not produced by importer {1}")]
    UnsupportedSchema(AllocSchema, String),

    #[error("unreadable input: {0}")]
    Unreadable(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, ImportError>;
