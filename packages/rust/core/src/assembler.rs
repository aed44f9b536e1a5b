//! Page assembler.
//!
//! Turns the full content snapshot into the set of physical pages: tables are
//! normalized, collections are merged into their primary's route, and every
//! other unit is wrapped on its own.

use tracing::{debug, info, instrument};

use docbinder_markup::normalize_table_widths;
use docbinder_shared::{ContentUnit, Page, Result};

use crate::grouping::group;
use crate::merge::{merge, wrap_standalone};
use crate::source::ContentSource;

/// Assemble pages from an in-memory snapshot.
///
/// Standalone pages come first in source order, followed by one page per
/// merged collection. Consumers should not rely on this order.
#[instrument(skip_all, fields(units = units.len()))]
pub fn assemble(units: &[ContentUnit]) -> Result<Vec<Page>> {
    let normalized = units
        .iter()
        .map(normalize_table_widths)
        .collect::<Result<Vec<_>>>()?;

    let grouping = group(&normalized);
    let mut pages = Vec::with_capacity(grouping.standalone.len() + grouping.groups.len());

    for unit in &grouping.standalone {
        pages.push(Page {
            path: unit.path.clone(),
            html: wrap_standalone(unit)?,
        });
    }

    for collection in &grouping.groups {
        let primary = collection.primary();
        debug!(
            key = collection.key,
            path = %primary.path,
            members = collection.members.len(),
            "merging collection"
        );
        pages.push(Page {
            path: primary.path.clone(),
            html: merge(collection)?,
        });
    }

    info!(
        pages = pages.len(),
        standalone = grouping.standalone.len(),
        merged = grouping.groups.len(),
        "assembly complete"
    );

    Ok(pages)
}

/// Fetch from a source, then assemble. A failing fetch yields no pages.
#[instrument(skip_all, fields(source = %source.describe()))]
pub fn assemble_from(source: &dyn ContentSource) -> Result<Vec<Page>> {
    let units = source.fetch()?;
    assemble(&units)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
