//! Column width hints for tables.
//!
//! Authors can set column widths by making the first body row of a table a
//! row of bracketed percentages, e.g. `| [25] | [25] | [50] |`. This pass
//! turns that row into `style="width: N%;"` on the header cells (or on the
//! next row when the table has no header) and deletes the hint row.
//!
//! The rewrite is one-way: output never starts a table body with a hint row,
//! so running the pass again changes nothing.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, instrument, warn};

use docbinder_shared::{ContentUnit, Result};

use crate::{Element, HtmlDocument};

/// Matches the concatenated cell text of a width hint row: `[25][25][50]`.
static HINT_ROW_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\[\d+\])+$").expect("valid regex"));

/// Return a copy of `unit` with its table width hints applied.
/// Every field other than `html` is carried over unchanged.
pub fn normalize_table_widths(unit: &ContentUnit) -> Result<ContentUnit> {
    let html = normalize_html(&unit.html)?;
    Ok(ContentUnit {
        html,
        ..unit.clone()
    })
}

/// Apply width hints to every table in an HTML fragment.
///
/// Returns the input unchanged (byte for byte) when no table carries a hint
/// row.
#[instrument(skip_all, fields(len = html.len()))]
pub fn normalize_html(html: &str) -> Result<String> {
    let doc = HtmlDocument::parse(html);
    let mut applied = 0usize;

    for table in doc.select("table")? {
        // Consecutive hint rows are consumed one after another so the body
        // never starts with one afterwards.
        while let Some(row) = first_body_row(&table) {
            let Some(widths) = width_hints(&row) else {
                break;
            };
            apply_widths(&table, &row, &widths)?;
            row.remove();
            applied += 1;
        }
    }

    if applied == 0 {
        return Ok(html.to_string());
    }

    debug!(rows = applied, "applied table width hints");
    Ok(doc.to_html())
}

/// First `<tr>` of the first `<tbody>`. Header rows are never inspected.
fn first_body_row(table: &Element) -> Option<Element> {
    let tbody = table.child_elements("tbody").into_iter().next()?;
    tbody.child_elements("tr").into_iter().next()
}

/// Parse a hint row into its width segments, or `None` if the row is
/// ordinary content.
fn width_hints(row: &Element) -> Option<Vec<String>> {
    let cells = row.child_elements("td");
    if cells.is_empty() {
        return None;
    }

    let text: String = cells.iter().map(|cell| cell.text().trim().to_string()).collect();
    if !HINT_ROW_RE.is_match(&text) {
        return None;
    }

    let inner = text
        .strip_prefix('[')
        .and_then(|t| t.strip_suffix(']'))
        .unwrap_or(text.as_str());

    Some(inner.split("][").map(str::to_string).collect())
}

/// Style the header cells, or the cells of the row after the hint row when
/// the table has no header. Widths map to cells by position; extras on
/// either side are skipped.
fn apply_widths(table: &Element, row: &Element, widths: &[String]) -> Result<()> {
    let headers = table.select("th")?;
    let cells = if headers.is_empty() {
        row.next_element_sibling()
            .map(|next| next.child_elements("td"))
            .unwrap_or_default()
    } else {
        headers
    };

    if cells.len() != widths.len() {
        warn!(
            cells = cells.len(),
            widths = widths.len(),
            "width hint count does not match column count"
        );
    }

    for (cell, width) in cells.iter().zip(widths) {
        cell.set_attr("style", format!("width: {width}%;"));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
