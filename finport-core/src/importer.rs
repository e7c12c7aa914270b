//! The importer seam: detect a prefix, decode a document.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use url::Url;

use crate::error::{ImportError, Result};
use crate::rows::{DecodedRow, RejectedRow};
use crate::schema::{AllocSchema, DetectResult, SourceFormat};
use crate::time::parse_mmddyyyy;

/// Caller-supplied context for one decode call.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeOptions {
    /// Where the document came from, carried into source metadata
    pub url: Option<Url>,
    /// "As of" instant for quotes
    pub timestamp: Option<DateTime<Utc>>,
    /// Zone for dates that carry no zone of their own
    pub time_zone: Tz,
    /// `HH:MM` local time applied to bare dates
    pub def_time_of_day: Option<String>,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            url: None,
            timestamp: None,
            time_zone: chrono_tz::America::New_York,
            def_time_of_day: None,
        }
    }
}

impl DecodeOptions {
    pub fn with_url(mut self, url: Url) -> Self {
        self.url = Some(url);
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_time_zone(mut self, tz: Tz) -> Self {
        self.time_zone = tz;
        self
    }

    pub fn with_time_of_day(mut self, hhmm: impl Into<String>) -> Self {
        self.def_time_of_day = Some(hhmm.into());
        self
    }

    /// Resolve a bare statement date (`MM/DD/YYYY`) in these options' zone
    /// and time of day.
    pub fn resolve_date(&self, date_str: &str) -> Result<DateTime<Utc>> {
        parse_mmddyyyy(date_str, self.def_time_of_day.as_deref(), self.time_zone)
    }
}

pub trait Importer: Send + Sync {
    /// Stable identifier, embedded in source metadata.
    fn id(&self) -> &'static str;

    fn name(&self) -> &'static str;

    fn source_formats(&self) -> &'static [SourceFormat];

    fn output_schemas(&self) -> &'static [AllocSchema];

    /// Which schemas this importer can produce from a document starting with
    /// `data_prefix`. An empty result means "not applicable"; `Err` means the
    /// prefix itself could not be read.
    fn detect(&self, data_prefix: &[u8]) -> Result<DetectResult>;

    /// Decode `data` into records of `schema`. Rows that fail validation are
    /// appended to `rejected_rows` and do not fail the call.
    fn decode(
        &self,
        schema: AllocSchema,
        data: &[u8],
        rejected_rows: &mut Vec<RejectedRow>,
        options: &DecodeOptions,
    ) -> Result<Vec<DecodedRow>>;

    /// [`Importer::decode`], refusing schemas the importer does not declare.
    fn decode_checked(
        &self,
        schema: AllocSchema,
        data: &[u8],
        rejected_rows: &mut Vec<RejectedRow>,
        options: &DecodeOptions,
    ) -> Result<Vec<DecodedRow>> {
        if !self.output_schemas().contains(&schema) {
            return Err(ImportError::UnsupportedSchema(schema, self.id().to_string()));
        }
        self.decode(schema, data, rejected_rows, options)
    }
}

/// Registry that asks every importer whether it claims a prefix.
pub struct Prospector {
    importers: Vec<Box<dyn Importer>>,
}

impl Prospector {
    pub fn new(importers: Vec<Box<dyn Importer>>) -> Self {
        Self { importers }
    }

    pub fn importers(&self) -> impl Iterator<Item = &dyn Importer> {
        self.importers.iter().map(|i| i.as_ref())
    }

    pub fn get(&self, id: &str) -> Option<&dyn Importer> {
        self.importers().find(|i| i.id() == id)
    }

    /// Importers (in registration order) that accept one of `source_formats`
    /// and return a non-empty detection for `data_prefix`.
    pub fn prospect(
        &self,
        source_formats: &[SourceFormat],
        data_prefix: &[u8],
    ) -> Result<Vec<(&dyn Importer, DetectResult)>> {
        let mut out = Vec::new();
        for imp in self.importers() {
            if !imp.source_formats().iter().any(|f| source_formats.contains(f)) {
                continue;
            }
            let result = imp.detect(data_prefix)?;
            if !result.is_empty() {
                out.push((imp, result));
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rows::Account;
    use crate::schema::detect_all;

    /// Claims any prefix starting with its marker.
    struct Marker(&'static str, &'static str);

    impl Importer for Marker {
        fn id(&self) -> &'static str {
            self.0
        }
        fn name(&self) -> &'static str {
            "marker"
        }
        fn source_formats(&self) -> &'static [SourceFormat] {
            &[SourceFormat::Csv]
        }
        fn output_schemas(&self) -> &'static [AllocSchema] {
            &[AllocSchema::Account]
        }
        fn detect(&self, data_prefix: &[u8]) -> Result<DetectResult> {
            if data_prefix.starts_with(self.1.as_bytes()) {
                Ok(detect_all(self.output_schemas(), self.source_formats()))
            } else {
                Ok(DetectResult::new())
            }
        }
        fn decode(
            &self,
            _schema: AllocSchema,
            _data: &[u8],
            _rejected_rows: &mut Vec<RejectedRow>,
            _options: &DecodeOptions,
        ) -> Result<Vec<DecodedRow>> {
            Ok(vec![DecodedRow::from(Account { account_id: "1".into(), title: "t".into() })])
        }
    }

    #[test]
    fn test_prospect_filters_non_matching() {
        let p = Prospector::new(vec![Box::new(Marker("a", "AAA")), Box::new(Marker("b", "BBB"))]);
        let found = p.prospect(&[SourceFormat::Csv], b"BBB,1,2").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0.id(), "b");
        assert!(found[0].1.contains_key(&AllocSchema::Account));
    }

    #[test]
    fn test_prospect_no_formats() {
        let p = Prospector::new(vec![Box::new(Marker("a", "AAA"))]);
        assert!(p.prospect(&[], b"AAA").unwrap().is_empty());
    }

    #[test]
    fn test_decode_checked_rejects_undeclared_schema() {
        let m = Marker("a", "AAA");
        let mut rr = Vec::new();
        let r = m.decode_checked(AllocSchema::Holding, b"AAA", &mut rr, &DecodeOptions::default());
        assert!(matches!(r, Err(ImportError::UnsupportedSchema(AllocSchema::Holding, _))));
        let ok = m.decode_checked(AllocSchema::Account, b"AAA", &mut rr, &DecodeOptions::default());
        assert_eq!(ok.unwrap().len(), 1);
    }

    #[test]
    fn test_resolve_date_uses_options() {
        let opts = DecodeOptions::default()
            .with_time_zone(chrono_tz::America::Denver)
            .with_time_of_day("13:00");
        let dt = opts.resolve_date("03/01/2021").unwrap();
        assert_eq!(dt.to_rfc3339(), "2021-03-01T20:00:00+00:00");
        assert!(opts.resolve_date("2021-03-01").is_err());
    }

    #[test]
    fn test_get_by_id() {
        let p = Prospector::new(vec![Box::new(Marker("a", "AAA"))]);
        assert!(p.get("a").is_some());
        assert!(p.get("z").is_none());
    }
}
