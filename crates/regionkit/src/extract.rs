//! Table extraction
//!
//! Finds the first `<table>` in a document and turns it into a [`RawTable`].
//! `colspan`/`rowspan` are expanded so every row is a plain grid row, and
//! cell types are inferred per column like a generic table reader would:
//! integer columns with gaps become float columns. Columns holding
//! zero-padded codes stay text so the padding survives.

use crate::error::TableError;
use crate::table::{RawCell, RawTable};
use scraper::{ElementRef, Html, Selector};

/// Upper bound for `colspan`/`rowspan` attributes
const MAX_SPAN: usize = 1000;

/// Extract the first table of an HTML document
pub fn extract_first_table(html: &str) -> Result<RawTable, TableError> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("table").map_err(|_| TableError::NoTable)?;
    let table = document.select(&selector).next().ok_or(TableError::NoTable)?;

    let mut grid = SpanGrid::default();
    let mut header = None;
    let mut rows = Vec::new();

    for (i, tr) in table_rows(table).into_iter().enumerate() {
        let cells = source_cells(tr);
        let all_th = !cells.is_empty() && cells.iter().all(|c| c.is_header);
        let row = grid.place(cells);
        if i == 0 && all_th {
            header = Some(row);
        } else {
            rows.push(row);
        }
    }

    let raw = RawTable {
        header,
        rows: infer_types(rows),
    };
    if raw.width() == 0 {
        return Err(TableError::Empty);
    }
    tracing::debug!(
        rows = raw.rows.len(),
        columns = raw.width(),
        has_header = raw.header.is_some(),
        "Extracted table"
    );
    Ok(raw)
}

/// `<tr>` elements that belong to this table, not to nested tables
fn table_rows(table: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let mut rows = Vec::new();
    for child in table.children().filter_map(ElementRef::wrap) {
        match child.value().name() {
            "tr" => rows.push(child),
            "thead" | "tbody" | "tfoot" => rows.extend(
                child
                    .children()
                    .filter_map(ElementRef::wrap)
                    .filter(|el| el.value().name() == "tr"),
            ),
            _ => {}
        }
    }
    rows
}

struct SourceCell {
    text: String,
    is_header: bool,
    colspan: usize,
    rowspan: usize,
}

fn source_cells(tr: ElementRef<'_>) -> Vec<SourceCell> {
    tr.children()
        .filter_map(ElementRef::wrap)
        .filter(|el| matches!(el.value().name(), "td" | "th"))
        .map(|el| SourceCell {
            text: cell_text(el),
            is_header: el.value().name() == "th",
            colspan: span_attr(el, "colspan"),
            rowspan: span_attr(el, "rowspan"),
        })
        .collect()
}

fn cell_text(el: ElementRef<'_>) -> String {
    el.text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn span_attr(el: ElementRef<'_>, name: &str) -> usize {
    el.value()
        .attr(name)
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(1)
        .clamp(1, MAX_SPAN)
}

/// Tracks cells carried down by `rowspan`
#[derive(Default)]
struct SpanGrid {
    carry: Vec<Option<(String, usize)>>,
}

impl SpanGrid {
    fn place(&mut self, cells: Vec<SourceCell>) -> Vec<String> {
        let mut row: Vec<String> = Vec::new();
        let mut cells = cells.into_iter();

        loop {
            let col = row.len();
            if let Some(slot) = self.carry.get_mut(col) {
                if let Some((text, left)) = slot.take() {
                    if left > 1 {
                        *slot = Some((text.clone(), left - 1));
                    }
                    row.push(text);
                    continue;
                }
            }

            let Some(cell) = cells.next() else {
                // trailing columns still covered by a rowspan from above
                if self.carry.iter().skip(col).any(Option::is_some) {
                    row.push(String::new());
                    continue;
                }
                break;
            };

            for _ in 0..cell.colspan {
                let col = row.len();
                if cell.rowspan > 1 {
                    if self.carry.len() <= col {
                        self.carry.resize(col + 1, None);
                    }
                    self.carry[col] = Some((cell.text.clone(), cell.rowspan - 1));
                }
                row.push(cell.text.clone());
            }
        }

        row
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Int,
    Float,
    Text,
}

fn infer_types(rows: Vec<Vec<String>>) -> Vec<Vec<RawCell>> {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    let kinds: Vec<ColumnKind> = (0..width)
        .map(|col| column_kind(rows.iter().map(|r| r.get(col).map_or("", String::as_str))))
        .collect();

    rows.into_iter()
        .map(|row| {
            row.into_iter()
                .enumerate()
                .map(|(col, text)| typed_cell(text, kinds[col]))
                .collect()
        })
        .collect()
}

fn column_kind<'a>(values: impl Iterator<Item = &'a str>) -> ColumnKind {
    let mut has_gap = false;
    let mut has_value = false;
    let mut all_int = true;

    for value in values {
        let value = value.trim();
        if value.is_empty() {
            has_gap = true;
            continue;
        }
        has_value = true;
        if is_zero_padded_code(value) {
            return ColumnKind::Text;
        }
        if value.parse::<i64>().is_err() {
            all_int = false;
            if !is_plain_float(value) {
                return ColumnKind::Text;
            }
        }
    }

    match (has_value, all_int, has_gap) {
        (false, _, _) => ColumnKind::Text,
        (true, true, false) => ColumnKind::Int,
        _ => ColumnKind::Float,
    }
}

/// `04`, `08`: a code whose leading zero would be lost as a number
fn is_zero_padded_code(value: &str) -> bool {
    value.len() > 1 && value.starts_with('0') && value.bytes().all(|b| b.is_ascii_digit())
}

fn is_plain_float(value: &str) -> bool {
    value
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+'))
        && value.parse::<f64>().is_ok()
}

fn typed_cell(text: String, kind: ColumnKind) -> RawCell {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return RawCell::Empty;
    }
    match kind {
        ColumnKind::Int => trimmed.parse().map(RawCell::Int).unwrap_or(RawCell::Text(text)),
        ColumnKind::Float => trimmed
            .parse()
            .map(RawCell::Float)
            .unwrap_or(RawCell::Text(text)),
        ColumnKind::Text => RawCell::Text(text),
    }
}
