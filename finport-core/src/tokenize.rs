//! Bytes → text → `RawRow`s. Thin wrapper over the `csv` crate.

use crate::error::{ImportError, Result};
use crate::rows::RawRow;

const UTF8_BOM: &str = "\u{feff}";

/// Decode bytes as UTF-8, dropping a leading BOM.
///
/// With `truncated`, an incomplete multi-byte sequence at the very end is
/// ignored (the prefix was cut mid-codepoint). Anything else invalid is
/// `Unreadable`.
pub fn decode_text(data: &[u8], truncated: bool) -> Result<&str> {
    let text = match std::str::from_utf8(data) {
        Ok(s) => s,
        Err(e) if truncated && e.error_len().is_none() => {
            // valid_up_to is a char boundary by construction
            std::str::from_utf8(&data[..e.valid_up_to()])
                .map_err(|e| ImportError::Unreadable(e.to_string()))?
        }
        Err(e) => return Err(ImportError::Unreadable(e.to_string())),
    };
    Ok(text.strip_prefix(UTF8_BOM).unwrap_or(text))
}

/// Tokenize CSV text into rows. Width is not enforced and no header row is
/// assumed. `first_line` is the 1-based line number of `text`'s first line in
/// the enclosing document. Blank lines are skipped but still counted, so each
/// row's number is the physical line its record starts on, for `\n` and
/// `\r\n` endings alike.
pub fn read_rows(text: &str, first_line: u64) -> Result<Vec<RawRow>> {
    let mut rows = Vec::new();
    let mut pending = String::new();
    let mut start = first_line;
    let mut quotes = 0;

    for (i, line) in text.split_inclusive('\n').enumerate() {
        if pending.is_empty() {
            if line.trim().is_empty() {
                continue;
            }
            start = first_line + i as u64;
        }
        pending.push_str(line);
        quotes += line.matches('"').count();
        // an odd quote count means a quoted cell runs onto the next line
        if quotes % 2 == 0 {
            rows.extend(read_record(&pending, start)?);
            pending.clear();
            quotes = 0;
        }
    }
    if !pending.is_empty() {
        rows.extend(read_record(&pending, start)?);
    }
    Ok(rows)
}

fn read_record(record: &str, row_number: u64) -> Result<Option<RawRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(record.as_bytes());

    let mut fields = csv::StringRecord::new();
    if !rdr.read_record(&mut fields)? {
        return Ok(None);
    }
    let cells = fields.iter().map(|s| s.to_string()).collect();
    Ok(Some(RawRow::new(row_number, cells)))
}
