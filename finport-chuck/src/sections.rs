//! Split a positions statement into its header line and tabular block.

use finport_core::tokenize::read_rows;
use finport_core::Result;

use crate::types::{RowKind, TableRow};

pub const CASH_MARKER: &str = "Cash & Cash Investments";
pub const FOOTER_MARKER: &str = "Account Total";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sections<'a> {
    /// First non-empty line, newline and surrounding whitespace removed
    pub header_line: &'a str,
    pub header_line_number: u64,
    table: &'a str,
    table_first_line: u64,
}

/// The column-name row as it appears in the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRow<'a> {
    pub line: &'a str,
    pub line_number: u64,
    /// False when the text ended before the row's newline
    pub terminated: bool,
}

impl ColumnRow<'_> {
    pub fn cells(&self) -> Result<Vec<String>> {
        let rows = read_rows(self.line, self.line_number)?;
        Ok(rows.into_iter().next().map(|r| r.cells).unwrap_or_default())
    }

    /// Whether the row's last cell is known to be whole: the row was
    /// terminated, or the text stops right after a closing quote.
    pub fn last_cell_complete(&self) -> bool {
        self.terminated || (self.line.ends_with('"') && self.line.matches('"').count() % 2 == 0)
    }
}

/// Returns `None` when `text` has no non-empty line.
pub fn split(text: &str) -> Option<Sections<'_>> {
    let mut offset = 0;
    for (i, line) in text.split_inclusive('\n').enumerate() {
        offset += line.len();
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let header_line_number = i as u64 + 1;
        return Some(Sections {
            header_line: trimmed,
            header_line_number,
            table: &text[offset..],
            table_first_line: header_line_number + 1,
        });
    }
    None
}

impl<'a> Sections<'a> {
    /// First non-empty line of the tabular block.
    pub fn column_row(&self) -> Option<ColumnRow<'a>> {
        for (i, line) in self.table.split_inclusive('\n').enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            return Some(ColumnRow {
                line: line.trim_end_matches(['\r', '\n']),
                line_number: self.table_first_line + i as u64,
                terminated: line.ends_with('\n'),
            });
        }
        None
    }

    /// Tokenized data rows, classified. The column-name row and all-empty
    /// rows are dropped.
    pub fn table_rows(&self) -> Result<Vec<TableRow>> {
        let rows = read_rows(self.table, self.table_first_line)?;
        Ok(rows
            .into_iter()
            .filter(|r| !r.is_blank())
            .skip(1)
            .map(|raw| TableRow {
                kind: classify(raw.cell(0).unwrap_or("")),
                raw,
            })
            .collect())
    }
}

fn classify(first_cell: &str) -> RowKind {
    if first_cell == FOOTER_MARKER {
        RowKind::Footer
    } else if first_cell == CASH_MARKER {
        RowKind::Cash
    } else {
        RowKind::Holding
    }
}
