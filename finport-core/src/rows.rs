//! Raw, decoded and rejected row types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

use crate::schema::AllocSchema;

/// One tokenized source record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRow {
    /// 1-based source line where the record starts
    pub row_number: u64,
    pub cells: Vec<String>,
}

impl RawRow {
    pub fn new(row_number: u64, cells: Vec<String>) -> Self {
        Self { row_number, cells }
    }

    /// Trimmed cell at `idx`, `None` when absent.
    pub fn cell(&self, idx: usize) -> Option<&str> {
        self.cells.get(idx).map(|c| c.trim())
    }

    /// True when every cell is empty after trimming (e.g. `,,,`).
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|c| c.trim().is_empty())
    }
}

/// Provenance record, one per decoded document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMeta {
    #[serde(rename = "sourceMetaID")]
    pub source_meta_id: String,
    pub url: Option<Url>,
    #[serde(rename = "importerID")]
    pub importer_id: String,
    /// When the brokerage produced the export
    pub exported_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    #[serde(rename = "accountID")]
    pub account_id: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    #[serde(rename = "holdingAccountID")]
    pub holding_account_id: String,
    #[serde(rename = "holdingSecurityID")]
    pub holding_security_id: String,
    pub share_count: f64,
    /// Cost per share
    pub share_basis: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Security {
    #[serde(rename = "securityID")]
    pub security_id: String,
    pub share_price: f64,
    /// Caller-supplied "as of" timestamp
    pub updated_at: Option<DateTime<Utc>>,
}

/// A fully decoded record. Each variant carries its own fixed field set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DecodedRow {
    SourceMeta(SourceMeta),
    Account(Account),
    Holding(Holding),
    Security(Security),
}

impl DecodedRow {
    pub fn schema(&self) -> AllocSchema {
        match self {
            Self::SourceMeta(_) => AllocSchema::MetaSource,
            Self::Account(_) => AllocSchema::Account,
            Self::Holding(_) => AllocSchema::Holding,
            Self::Security(_) => AllocSchema::Security,
        }
    }

    pub fn as_holding(&self) -> Option<&Holding> {
        match self {
            Self::Holding(h) => Some(h),
            _ => None,
        }
    }

    pub fn as_security(&self) -> Option<&Security> {
        match self {
            Self::Security(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_account(&self) -> Option<&Account> {
        match self {
            Self::Account(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_source_meta(&self) -> Option<&SourceMeta> {
        match self {
            Self::SourceMeta(m) => Some(m),
            _ => None,
        }
    }
}

impl From<SourceMeta> for DecodedRow {
    fn from(v: SourceMeta) -> Self {
        Self::SourceMeta(v)
    }
}

impl From<Account> for DecodedRow {
    fn from(v: Account) -> Self {
        Self::Account(v)
    }
}

impl From<Holding> for DecodedRow {
    fn from(v: Holding) -> Self {
        Self::Holding(v)
    }
}

impl From<Security> for DecodedRow {
    fn from(v: Security) -> Self {
        Self::Security(v)
    }
}

/// Why a row was set aside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "camelCase")]
pub enum RejectReason {
    MalformedNumeric { column: String },
    DivisionByZero { column: String },
    MissingCell { column: String },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedNumeric { column } => write!(f, "malformed numeric in '{column}'"),
            Self::DivisionByZero { column } => write!(f, "zero denominator in '{column}'"),
            Self::MissingCell { column } => write!(f, "missing cell '{column}'"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedRow {
    pub row: RawRow,
    pub reason: RejectReason,
}
