//! Table normalizer
//!
//! Turns a [`RawTable`] into a [`CanonicalTable`]. The steps run in a fixed
//! order: naming, row filtering, code reformatting, then text coercion.
//! Coercion must stay last so code detection still sees typed cells.

use crate::error::TableError;
use crate::table::{CanonicalTable, RawCell, RawTable};
use tracing::debug;

/// Column names applied when none are supplied
pub const DEFAULT_COLUMN_NAMES: [&str; 4] = ["id_region", "region", "id_subregion", "subregion"];

/// Rows with this keyword in any cell are dropped (autonomous cities)
pub const EXCLUDED_ROW_KEYWORD: &str = "ciudad";

/// Width that recovered codes are zero-padded to
pub const CODE_WIDTH: usize = 2;

/// Normalize a raw table with the default column names
pub fn normalize(raw: &RawTable) -> Result<CanonicalTable, TableError> {
    normalize_with_columns(raw, None)
}

/// Normalize a raw table, optionally with custom column names
///
/// Fails with [`TableError::SchemaMismatch`] when the names do not match the
/// table width, and with [`TableError::DuplicateColumn`] when a name repeats.
pub fn normalize_with_columns(
    raw: &RawTable,
    column_names: Option<&[String]>,
) -> Result<CanonicalTable, TableError> {
    let width = raw.width();
    let columns = resolve_columns(column_names, width)?;

    let mut rows: Vec<Vec<RawCell>> = raw
        .rows
        .iter()
        .map(|row| {
            let mut row = row.clone();
            row.resize(width, RawCell::Empty);
            row
        })
        .collect();

    let before = rows.len();
    rows.retain(|row| !is_excluded(row));
    debug!(
        dropped = before - rows.len(),
        kept = rows.len(),
        "Filtered rows"
    );

    for col in 0..width {
        if rows.iter().any(|row| row[col].is_float_code()) {
            debug!(column = %columns[col], "Reformatting float-formatted codes");
            for row in rows.iter_mut() {
                if let Some(code) = row[col].integral_value() {
                    row[col] = RawCell::Text(format!("{:0width$}", code, width = CODE_WIDTH));
                }
            }
        }
    }

    let rows = rows
        .into_iter()
        .map(|row| row.iter().map(RawCell::to_text).collect())
        .collect();

    Ok(CanonicalTable::new(columns, rows))
}

fn resolve_columns(
    column_names: Option<&[String]>,
    width: usize,
) -> Result<Vec<String>, TableError> {
    let columns: Vec<String> = match column_names {
        Some(names) => names.to_vec(),
        None => DEFAULT_COLUMN_NAMES.iter().map(|s| s.to_string()).collect(),
    };

    if columns.len() != width {
        return Err(TableError::SchemaMismatch {
            expected: columns.len(),
            actual: width,
        });
    }

    for (i, name) in columns.iter().enumerate() {
        if columns[..i].contains(name) {
            return Err(TableError::DuplicateColumn(name.clone()));
        }
    }

    Ok(columns)
}

fn is_excluded(row: &[RawCell]) -> bool {
    row.iter()
        .any(|cell| cell.to_text().to_lowercase().contains(EXCLUDED_ROW_KEYWORD))
}
