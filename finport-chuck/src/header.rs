//! Statement header line parsing.
//!
//! Expected line (optionally quoted):
//!   Positions for account Individual        XXXX-1234 as of 09:59 PM ET, 09/26/2021

use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;
use std::sync::OnceLock;

use finport_core::time::localize;

use crate::types::AccountTitleId;

/// Title and account id. The time portion is not required here.
pub fn account_title_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r#"(?i)^\s*"?\s*positions\s+for\s+account\s+"#,
            r"(?P<title>.+?)\s+",
            r"(?P<id>[a-z0-9-]+)\s+",
            r"as\s+of\b"
        ))
        .expect("invalid account title regex")
    })
}

fn exported_at_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"(?i)\bas\s+of\s+",
            r"(?P<time>\d{1,2}:\d{2})\s*(?P<ampm>[ap]m)\s+",
            r"et\s*,\s*",
            r"(?P<date>\d{1,2}/\d{1,2}/\d{4})"
        ))
        .expect("invalid exported-at regex")
    })
}

/// Extract account title and id from `text` using `pattern`.
///
/// `pattern` must capture `title` and `id`. Returns `None` when the line is
/// not a header of this shape.
pub fn parse_account_title_id(pattern: &Regex, text: &str) -> Option<AccountTitleId> {
    let caps = pattern.captures(text)?;
    let title = caps
        .name("title")?
        .as_str()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let id = caps.name("id")?.as_str().trim().to_string();
    if title.is_empty() || id.is_empty() {
        return None;
    }
    Some(AccountTitleId { title, id })
}

/// Export instant from the header's "as of HH:MM AM/PM ET, MM/DD/YYYY".
///
/// ET is always US Eastern.
pub fn parse_exported_at(text: &str) -> Option<DateTime<Utc>> {
    let caps = exported_at_re().captures(text)?;
    let raw = format!(
        "{} {} {}",
        &caps["date"],
        &caps["time"],
        caps["ampm"].to_ascii_uppercase()
    );
    let ndt = NaiveDateTime::parse_from_str(&raw, "%m/%d/%Y %I:%M %p").ok()?;
    localize(ndt, chrono_tz::America::New_York).ok()
}
