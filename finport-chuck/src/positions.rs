//! Schwab "Positions" CSV export for a single account.
//!
//! Layout:
//!   "Positions for account Individual        XXXX-1234 as of 09:59 PM ET, 09/26/2021"
//!   <blank>
//!   "Symbol","Description","Quantity","Price",...,"Security Type",
//!   "SCHB","SCHWAB US BROAD MARKET ETF","961","$117.42",...
//!   "Cash & Cash Investments","--",...,"$42.82",...
//!   "Account Total","--",...

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use finport_core::tokenize::decode_text;
use finport_core::{
    Account, AllocSchema, DecodeOptions, DecodedRow, DetectResult, Holding, ImportError, Importer,
    RawRow, RejectReason, RejectedRow, Result, Security, SourceFormat, SourceMeta, detect_all,
};

use crate::header::{account_title_re, parse_account_title_id, parse_exported_at};
use crate::numeric::parse_numeric;
use crate::sections::{Sections, split};
use crate::types::{AccountTitleId, RowKind, TableRow};

pub const IMPORTER_ID: &str = "chuck_positions_indiv";

/// Security id given to the cash row.
pub const CASH_SECURITY_ID: &str = "CORE";

pub const COLUMNS: [&str; 25] = [
    "Symbol",
    "Description",
    "Quantity",
    "Price",
    "Price Change $",
    "Price Change %",
    "Market Value",
    "Day Change $",
    "Day Change %",
    "Cost Basis",
    "Gain/Loss $",
    "Gain/Loss %",
    "Reinvest Dividends?",
    "Capital Gains?",
    "% Of Account",
    "Dividend Yield",
    "Last Dividend",
    "Ex-Dividend Date",
    "P/E Ratio",
    "52 Week Low",
    "52 Week High",
    "Volume",
    "Intrinsic Value",
    "In The Money",
    "Security Type",
];

/// A truncated prefix must show at least the columns through "Gain/Loss $".
const MIN_PREFIX_COLUMNS: usize = 11;

const COL_SYMBOL: usize = 0;
const COL_QUANTITY: usize = 2;
const COL_PRICE: usize = 3;
const COL_MARKET_VALUE: usize = 6;
const COL_COST_BASIS: usize = 9;

const SOURCE_FORMATS: &[SourceFormat] = &[SourceFormat::Csv];
const OUTPUT_SCHEMAS: &[AllocSchema] = &[
    AllocSchema::MetaSource,
    AllocSchema::Account,
    AllocSchema::Holding,
    AllocSchema::Security,
];

#[derive(Debug, Clone, Copy, Default)]
pub struct ChuckPositionsIndiv;

impl ChuckPositionsIndiv {
    pub fn new() -> Self {
        Self
    }

    /// Split and identify the document. Fails when the header is not ours.
    fn parse_document<'a>(&self, data: &'a [u8]) -> Result<(Sections<'a>, AccountTitleId)> {
        let text = decode_text(data, false)?;
        let sections = split(text).ok_or(ImportError::HeaderNotRecognized)?;
        let title_id = parse_account_title_id(account_title_re(), sections.header_line)
            .ok_or(ImportError::HeaderNotRecognized)?;
        Ok((sections, title_id))
    }

    pub fn source_meta(&self, data: &[u8], options: &DecodeOptions) -> Result<SourceMeta> {
        let (sections, _) = self.parse_document(data)?;
        Ok(SourceMeta {
            source_meta_id: uuid::Uuid::new_v4().to_string(),
            url: options.url.clone(),
            importer_id: IMPORTER_ID.to_string(),
            exported_at: parse_exported_at(sections.header_line),
        })
    }

    pub fn account(&self, data: &[u8]) -> Result<Account> {
        let (_, title_id) = self.parse_document(data)?;
        Ok(Account {
            account_id: title_id.id,
            title: title_id.title,
        })
    }

    /// One holding per position row plus the cash row; the footer is skipped.
    pub fn holdings(
        &self,
        data: &[u8],
        rejected_rows: &mut Vec<RejectedRow>,
    ) -> Result<Vec<Holding>> {
        let (sections, title_id) = self.parse_document(data)?;
        let mut out = Vec::new();
        let mut rejected = 0usize;

        for row in sections.table_rows()? {
            let decoded = match row.kind {
                RowKind::Footer => continue,
                RowKind::Cash => cash_holding(&title_id.id, &row.raw),
                RowKind::Holding => position_holding(&title_id.id, &row.raw),
            };
            match decoded {
                Ok(h) => out.push(h),
                Err(reason) => {
                    reject(rejected_rows, row, reason);
                    rejected += 1;
                }
            }
        }

        debug!("Decoded {} holdings ({} rejected) for {}", out.len(), rejected, title_id.id);
        Ok(out)
    }

    /// One quote per distinct non-cash symbol; the first decoded occurrence wins.
    pub fn securities(
        &self,
        data: &[u8],
        rejected_rows: &mut Vec<RejectedRow>,
        updated_at: Option<DateTime<Utc>>,
    ) -> Result<Vec<Security>> {
        let (sections, title_id) = self.parse_document(data)?;
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        let mut rejected = 0usize;

        for row in sections.table_rows()? {
            if row.kind != RowKind::Holding {
                continue;
            }
            match security(&row.raw, updated_at) {
                Ok(s) => {
                    if seen.insert(s.security_id.clone()) {
                        out.push(s);
                    } else {
                        debug!(
                            "Skipping duplicate security {} at row {}",
                            s.security_id, row.raw.row_number
                        );
                    }
                }
                Err(reason) => {
                    reject(rejected_rows, row, reason);
                    rejected += 1;
                }
            }
        }

        debug!("Decoded {} securities ({} rejected) for {}", out.len(), rejected, title_id.id);
        Ok(out)
    }
}

impl Importer for ChuckPositionsIndiv {
    fn id(&self) -> &'static str {
        IMPORTER_ID
    }

    fn name(&self) -> &'static str {
        "Chuck Positions (Individual)"
    }

    fn source_formats(&self) -> &'static [SourceFormat] {
        SOURCE_FORMATS
    }

    fn output_schemas(&self) -> &'static [AllocSchema] {
        OUTPUT_SCHEMAS
    }

    fn detect(&self, data_prefix: &[u8]) -> Result<DetectResult> {
        let text = decode_text(data_prefix, true)?;
        let Some(sections) = split(text) else {
            return Ok(DetectResult::new());
        };
        if parse_account_title_id(account_title_re(), sections.header_line).is_none() {
            return Ok(DetectResult::new());
        }
        let Some(column_row) = sections.column_row() else {
            return Ok(DetectResult::new());
        };

        let mut cells = column_row.cells()?;
        if !column_row.last_cell_complete() {
            // the prefix may have cut the last cell short
            cells.pop();
        }
        if !columns_match(&cells, column_row.terminated) {
            return Ok(DetectResult::new());
        }

        Ok(detect_all(OUTPUT_SCHEMAS, SOURCE_FORMATS))
    }

    fn decode(
        &self,
        schema: AllocSchema,
        data: &[u8],
        rejected_rows: &mut Vec<RejectedRow>,
        options: &DecodeOptions,
    ) -> Result<Vec<DecodedRow>> {
        let rows: Vec<DecodedRow> = match schema {
            AllocSchema::MetaSource => vec![self.source_meta(data, options)?.into()],
            AllocSchema::Account => vec![self.account(data)?.into()],
            AllocSchema::Holding => self
                .holdings(data, rejected_rows)?
                .into_iter()
                .map(DecodedRow::from)
                .collect(),
            AllocSchema::Security => self
                .securities(data, rejected_rows, options.timestamp)?
                .into_iter()
                .map(DecodedRow::from)
                .collect(),
        };
        Ok(rows)
    }
}

/// Names must match in order. A complete row needs the whole vocabulary; a
/// truncated one only its leading columns. Extra trailing cells are allowed.
fn columns_match(cells: &[String], complete: bool) -> bool {
    let needed = if complete { COLUMNS.len() } else { MIN_PREFIX_COLUMNS };
    cells.len() >= needed && cells.iter().zip(COLUMNS.iter()).all(|(c, e)| c == e)
}

fn reject(rejected_rows: &mut Vec<RejectedRow>, row: TableRow, reason: RejectReason) {
    warn!("Rejected row {}: {}", row.raw.row_number, reason);
    rejected_rows.push(RejectedRow { row: row.raw, reason });
}

fn text_cell(raw: &RawRow, idx: usize) -> std::result::Result<&str, RejectReason> {
    raw.cell(idx)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| RejectReason::MissingCell { column: COLUMNS[idx].to_string() })
}

fn numeric_cell(raw: &RawRow, idx: usize) -> std::result::Result<f64, RejectReason> {
    let cell = text_cell(raw, idx)?;
    parse_numeric(cell).ok_or_else(|| RejectReason::MalformedNumeric {
        column: COLUMNS[idx].to_string(),
    })
}

/// Uninvested cash as a holding of `CORE` at 1.0 per unit.
fn cash_holding(account_id: &str, raw: &RawRow) -> std::result::Result<Holding, RejectReason> {
    Ok(Holding {
        holding_account_id: account_id.to_string(),
        holding_security_id: CASH_SECURITY_ID.to_string(),
        share_count: numeric_cell(raw, COL_MARKET_VALUE)?,
        share_basis: 1.0,
    })
}

fn position_holding(account_id: &str, raw: &RawRow) -> std::result::Result<Holding, RejectReason> {
    let symbol = text_cell(raw, COL_SYMBOL)?;
    let share_count = numeric_cell(raw, COL_QUANTITY)?;
    let cost_basis = numeric_cell(raw, COL_COST_BASIS)?;
    if share_count == 0.0 {
        return Err(RejectReason::DivisionByZero {
            column: COLUMNS[COL_QUANTITY].to_string(),
        });
    }
    Ok(Holding {
        holding_account_id: account_id.to_string(),
        holding_security_id: symbol.to_string(),
        share_count,
        share_basis: cost_basis / share_count,
    })
}

fn security(
    raw: &RawRow,
    updated_at: Option<DateTime<Utc>>,
) -> std::result::Result<Security, RejectReason> {
    Ok(Security {
        security_id: text_cell(raw, COL_SYMBOL)?.to_string(),
        share_price: numeric_cell(raw, COL_PRICE)?,
        updated_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> RawRow {
        RawRow::new(7, cells.iter().map(|s| s.to_string()).collect())
    }

    fn full_row(
        symbol: &str,
        qty: &str,
        price: &str,
        market_value: &str,
        cost_basis: &str,
    ) -> RawRow {
        let mut cells = vec!["--"; COLUMNS.len()];
        cells[COL_SYMBOL] = symbol;
        cells[COL_QUANTITY] = qty;
        cells[COL_PRICE] = price;
        cells[COL_MARKET_VALUE] = market_value;
        cells[COL_COST_BASIS] = cost_basis;
        row(&cells)
    }

    #[test]
    fn test_position_holding() {
        let r = full_row("SCHB", "961", "$117.42", "$23,230.62", "$100,975.73");
        let h = position_holding("XXXX-1234", &r).unwrap();
        assert_eq!(h.holding_security_id, "SCHB");
        assert_eq!(h.share_count, 961.0);
        assert_eq!(h.share_basis, 100975.73 / 961.0);
    }

    #[test]
    fn test_position_holding_zero_quantity() {
        let r = full_row("VTI", "0", "$200.00", "$0.00", "$10.00");
        let err = position_holding("A", &r).unwrap_err();
        assert_eq!(err, RejectReason::DivisionByZero { column: "Quantity".into() });
    }

    #[test]
    fn test_position_holding_malformed_cost_basis() {
        let r = full_row("VTI", "10", "$200.00", "$2,000.00", "--");
        let err = position_holding("A", &r).unwrap_err();
        assert_eq!(err, RejectReason::MalformedNumeric { column: "Cost Basis".into() });
    }

    #[test]
    fn test_position_holding_short_row() {
        let r = row(&["VTI", "Vanguard", "10"]);
        let err = position_holding("A", &r).unwrap_err();
        assert_eq!(err, RejectReason::MissingCell { column: "Cost Basis".into() });
    }

    #[test]
    fn test_position_holding_empty_symbol() {
        let r = full_row("  ", "10", "$1.00", "$10.00", "$10.00");
        let err = position_holding("A", &r).unwrap_err();
        assert_eq!(err, RejectReason::MissingCell { column: "Symbol".into() });
    }

    #[test]
    fn test_cash_holding() {
        let r = full_row("Cash & Cash Investments", "--", "--", "$42.82", "--");
        let h = cash_holding("XXXX-1234", &r).unwrap();
        assert_eq!(h.holding_security_id, CASH_SECURITY_ID);
        assert_eq!(h.share_count, 42.82);
        assert_eq!(h.share_basis, 1.0);
    }

    #[test]
    fn test_security_uses_timestamp() {
        let ts = DateTime::parse_from_rfc3339("2021-09-27T02:00:00Z").unwrap().with_timezone(&Utc);
        let r = full_row("SCHB", "961", "$117.42", "$23,230.62", "$100,975.73");
        let s = security(&r, Some(ts)).unwrap();
        assert_eq!(s.security_id, "SCHB");
        assert_eq!(s.share_price, 117.42);
        assert_eq!(s.updated_at, Some(ts));
    }

    #[test]
    fn test_columns_match() {
        let full: Vec<String> = COLUMNS.iter().map(|s| s.to_string()).collect();
        assert!(columns_match(&full, true));

        let mut extra = full.clone();
        extra.push("Margin Requirement".into());
        assert!(columns_match(&extra, true));

        let prefix = full[..MIN_PREFIX_COLUMNS].to_vec();
        assert!(columns_match(&prefix, false));
        assert!(!columns_match(&prefix, true));
        assert!(!columns_match(&full[..MIN_PREFIX_COLUMNS - 1], false));

        let mut mutated = full.clone();
        mutated[3] = "Prise".into();
        assert!(!columns_match(&mutated, true));
    }

    #[test]
    fn test_decode_unknown_header_is_fatal() {
        let imp = ChuckPositionsIndiv::new();
        let mut rr = Vec::new();
        let data = b"\"Transactions for account X\"\n\n\"Date\",\"Action\"\n";
        for schema in AllocSchema::ALL {
            let r = imp.decode(schema, data, &mut rr, &DecodeOptions::default());
            assert!(matches!(r, Err(ImportError::HeaderNotRecognized)));
        }
        assert!(rr.is_empty());
    }

    #[test]
    fn test_decode_invalid_utf8_is_fatal() {
        let imp = ChuckPositionsIndiv::new();
        let mut rr = Vec::new();
        let opts = DecodeOptions::default();
        let r = imp.decode(AllocSchema::Account, &[0xFF, 0xFE, 0x00], &mut rr, &opts);
        assert!(matches!(r, Err(ImportError::Unreadable(_))));
    }
}
