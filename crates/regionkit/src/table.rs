//! Table data model
//!
//! [`RawTable`] is what the extractor produces: typed cells straight out of
//! the HTML grid. [`CanonicalTable`] is what the normalizer hands to the
//! catalog: named columns, text-only cells, immutable.

use serde::Serialize;
use std::collections::BTreeMap;

/// A single cell as inferred by the extractor
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RawCell {
    /// Integer-typed cell
    Int(i64),
    /// Float-typed cell (integer columns with gaps end up here)
    Float(f64),
    /// Free text
    Text(String),
    /// Missing value
    Empty,
}

impl RawCell {
    /// Text representation used for filtering and coercion
    pub fn to_text(&self) -> String {
        match self {
            RawCell::Int(n) => n.to_string(),
            RawCell::Float(f) if f.is_finite() && f.fract() == 0.0 => format!("{:.1}", f),
            RawCell::Float(f) => f.to_string(),
            RawCell::Text(s) => s.clone(),
            RawCell::Empty => String::new(),
        }
    }

    /// True for an integer value that has been written as a float, e.g. `2.0`
    pub fn is_float_code(&self) -> bool {
        match self {
            RawCell::Float(f) => f.is_finite() && f.fract() == 0.0,
            RawCell::Text(s) => split_float_code(s.trim()).is_some(),
            _ => false,
        }
    }

    /// Integer value of the cell, if it holds one in any representation
    pub fn integral_value(&self) -> Option<i64> {
        match self {
            RawCell::Int(n) => Some(*n),
            RawCell::Float(f) if f.is_finite() && f.fract() == 0.0 => Some(*f as i64),
            RawCell::Text(s) => {
                let s = s.trim();
                if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
                    s.parse().ok()
                } else {
                    split_float_code(s).and_then(|digits| digits.parse().ok())
                }
            }
            _ => None,
        }
    }
}

/// Returns the integer part of `<digits>.<zeros>`
fn split_float_code(s: &str) -> Option<&str> {
    let (int_part, frac_part) = s.split_once('.')?;
    let valid = !int_part.is_empty()
        && int_part.bytes().all(|b| b.is_ascii_digit())
        && !frac_part.is_empty()
        && frac_part.bytes().all(|b| b == b'0');
    valid.then_some(int_part)
}

/// Generic grid produced by table extraction
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RawTable {
    /// Header labels, when the table has a heading row
    pub header: Option<Vec<String>>,
    /// Data rows in document order
    pub rows: Vec<Vec<RawCell>>,
}

impl RawTable {
    /// Create a table from rows without a header
    pub fn new(rows: Vec<Vec<RawCell>>) -> Self {
        Self { header: None, rows }
    }

    /// Number of columns: the widest of the header and every row
    pub fn width(&self) -> usize {
        let header = self.header.as_ref().map_or(0, Vec::len);
        self.rows.iter().map(Vec::len).fold(header, usize::max)
    }
}

impl From<&CanonicalTable> for RawTable {
    fn from(table: &CanonicalTable) -> Self {
        Self {
            header: Some(table.columns.clone()),
            rows: table
                .rows
                .iter()
                .map(|row| row.iter().cloned().map(RawCell::Text).collect())
                .collect(),
        }
    }
}

/// Cleaned reference table: unique column names, text cells only
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanonicalTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl CanonicalTable {
    /// Every row must have exactly `columns.len()` cells.
    pub(crate) fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        debug_assert!(rows.iter().all(|row| row.len() == columns.len()));
        Self { columns, rows }
    }

    /// Column names in order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows in order, cells aligned with [`columns`](Self::columns)
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True if there are no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by name
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Cell at `row` in the named column
    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| r[idx].as_str())
    }

    /// One row as a column name to value mapping
    pub fn record(&self, row: usize) -> Option<BTreeMap<&str, &str>> {
        let cells = self.rows.get(row)?;
        Some(
            self.columns
                .iter()
                .map(String::as_str)
                .zip(cells.iter().map(String::as_str))
                .collect(),
        )
    }

    /// Distinct values of a column in first-seen order
    pub fn unique_values(&self, column: &str) -> Option<Vec<&str>> {
        let idx = self.column_index(column)?;
        let mut seen = Vec::new();
        for row in &self.rows {
            let value = row[idx].as_str();
            if !seen.contains(&value) {
                seen.push(value);
            }
        }
        Some(seen)
    }
}
