//! Delimited-text output for scrape results
//!
//! Transform results are turned into rows through [`IntoRows`] and written
//! as CSV or TSV. Fields are quoted only when they contain the separator,
//! a double quote, or a line break.

use std::io::{self, Write};

/// Conversion of one transform result into zero or more output rows
pub trait IntoRows {
    fn into_rows(self) -> Vec<Vec<String>>;
}

/// A single value becomes a one-column row
impl IntoRows for String {
    fn into_rows(self) -> Vec<Vec<String>> {
        vec![vec![self]]
    }
}

/// A list of values becomes one row
impl IntoRows for Vec<String> {
    fn into_rows(self) -> Vec<Vec<String>> {
        vec![self]
    }
}

/// A table is written as-is
impl IntoRows for Vec<Vec<String>> {
    fn into_rows(self) -> Vec<Vec<String>> {
        self
    }
}

impl<T: IntoRows> IntoRows for Option<T> {
    fn into_rows(self) -> Vec<Vec<String>> {
        self.map(IntoRows::into_rows).unwrap_or_default()
    }
}

fn needs_quotes(field: &str, sep: char) -> bool {
    field.contains(sep) || field.contains('"') || field.contains('\n') || field.contains('\r')
}

/// Writes a single row terminated by a newline
pub fn write_row<W: Write>(mut w: W, row: &[String], sep: char) -> io::Result<()> {
    let mut first = true;
    for cell in row {
        if !first {
            write!(w, "{}", sep)?;
        } else {
            first = false;
        }
        if needs_quotes(cell, sep) {
            write!(w, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            write!(w, "{}", cell)?;
        }
    }
    writeln!(w)
}

/// Writes every result's rows in order and flushes the writer
///
/// Returns the number of rows written.
pub fn write_delimited<W, R>(w: &mut W, results: Vec<R>, sep: char) -> io::Result<usize>
where
    W: Write,
    R: IntoRows,
{
    let mut count = 0;
    for result in results {
        for row in result.into_rows() {
            write_row(&mut *w, &row, sep)?;
            count += 1;
        }
    }
    w.flush()?;
    Ok(count)
}
