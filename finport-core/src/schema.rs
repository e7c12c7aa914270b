//! Schema tags and source formats shared by every importer.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Output kind an importer can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AllocSchema {
    #[serde(rename = "allocMetaSource")]
    MetaSource,
    #[serde(rename = "allocAccount")]
    Account,
    #[serde(rename = "allocHolding")]
    Holding,
    #[serde(rename = "allocSecurity")]
    Security,
}

impl AllocSchema {
    pub const ALL: [AllocSchema; 4] = [
        AllocSchema::MetaSource,
        AllocSchema::Account,
        AllocSchema::Holding,
        AllocSchema::Security,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MetaSource => "allocMetaSource",
            Self::Account => "allocAccount",
            Self::Holding => "allocHolding",
            Self::Security => "allocSecurity",
        }
    }
}

impl fmt::Display for AllocSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AllocSchema {
    type Err = String;

    /// Accepts the tag (`allocHolding`) or the bare kind (`holding`), any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        let key = key.strip_prefix("alloc").unwrap_or(&key);
        match key {
            "metasource" | "meta" | "source" => Ok(Self::MetaSource),
            "account" => Ok(Self::Account),
            "holding" => Ok(Self::Holding),
            "security" => Ok(Self::Security),
            _ => Err(format!("unknown schema: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SourceFormat {
    #[serde(rename = "CSV")]
    Csv,
}

/// Which schemas an importer claims for a given prefix, and from which formats.
///
/// Empty means "not this importer".
pub type DetectResult = BTreeMap<AllocSchema, BTreeSet<SourceFormat>>;

/// Map every schema in `schemas` to every format in `formats`.
pub fn detect_all(schemas: &[AllocSchema], formats: &[SourceFormat]) -> DetectResult {
    let formats: BTreeSet<SourceFormat> = formats.iter().copied().collect();
    schemas.iter().map(|s| (*s, formats.clone())).collect()
}
