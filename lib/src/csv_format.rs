//! CSV reading and writing
//!
//! Covers what Raindrop's export bodies and our two output tables need:
//! RFC 4180 quoting (doubled quotes, embedded delimiters and line breaks),
//! CRLF or LF line endings and a leading UTF-8 BOM.

use crate::error::{ExportError, Result};
use crate::models::bookmark::BookmarkRecord;

const BOM: char = '\u{feff}';

/// A parsed CSV document: header plus rows of the same width
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Turn every row into a record keyed by the header
    ///
    /// Short rows are padded with empty values, surplus cells are dropped.
    pub fn into_records(self) -> Vec<BookmarkRecord> {
        let header = self.header;
        self.rows
            .into_iter()
            .map(|row| {
                let mut cells = row.into_iter();
                BookmarkRecord::from_pairs(
                    header
                        .iter()
                        .map(|column| (column.clone(), cells.next().unwrap_or_default())),
                )
            })
            .collect()
    }
}

/// Parse a CSV document whose first row is the header
///
/// An empty (or whitespace-only) document yields an empty table.
pub fn parse(text: &str) -> Result<Table> {
    let text = text.strip_prefix(BOM).unwrap_or(text);
    let mut rows = parse_rows(text)?.into_iter();

    let header = match rows.next() {
        Some(header) => header.into_iter().map(|h| h.trim().to_string()).collect(),
        None => return Ok(Table::default()),
    };

    Ok(Table {
        header,
        rows: rows.collect(),
    })
}

fn parse_rows(text: &str) -> Result<Vec<Vec<String>>> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    // Distinguishes `""` (an empty field) from nothing at all on a blank line
    let mut field_started = false;
    let mut chars = text.chars().peekable();
    let mut line = 1usize;

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() => {
                in_quotes = true;
                field_started = true;
            }
            ',' => {
                row.push(std::mem::take(&mut field));
                field_started = true;
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' | '\r' => {
                end_row(&mut rows, &mut row, &mut field, field_started);
                field_started = false;
                line += 1;
            }
            _ => {
                field.push(c);
                field_started = true;
            }
        }
    }

    if in_quotes {
        return Err(ExportError::Csv(format!(
            "unterminated quoted field (reached end of input at line {})",
            line
        )));
    }
    end_row(&mut rows, &mut row, &mut field, field_started);

    Ok(rows)
}

fn end_row(
    rows: &mut Vec<Vec<String>>,
    row: &mut Vec<String>,
    field: &mut String,
    field_started: bool,
) {
    if !field_started && row.is_empty() && field.is_empty() {
        // blank line
        return;
    }
    row.push(std::mem::take(field));
    rows.push(std::mem::take(row));
}

/// Quote a field if it contains the delimiter, a quote or a line break
pub fn escape_field(field: &str) -> String {
    let needs_quotes = field.contains(',')
        || field.contains('"')
        || field.contains('\n')
        || field.contains('\r');

    if needs_quotes {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Format one row, without the trailing newline
pub fn format_row<I, S>(fields: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    fields
        .into_iter()
        .map(|f| escape_field(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Format a whole table, one `\n`-terminated line per row
pub fn format_table(table: &Table) -> String {
    let mut output = String::new();
    output.push_str(&format_row(&table.header));
    output.push('\n');
    for row in &table.rows {
        output.push_str(&format_row(row));
        output.push('\n');
    }
    output
}
