//! Section shells and collection merging.
//!
//! Every page body is wrapped in a section shell: a sticky side panel with a
//! table of contents built from the body's `h2` headings, followed by the body
//! itself. A merged collection is the concatenation of one shell per member,
//! with each member's first `h1` turned into an in-page anchor.

use std::collections::HashSet;

use tracing::{debug, instrument, warn};

use docbinder_markup::{HtmlDocument, escape_html};
use docbinder_shared::{ContentUnit, Result};

use crate::grouping::Collection;

/// Panel title for a member of a merged collection.
pub const SECTION_TITLE: &str = "In this Section:";

/// Panel title for a standalone page.
pub const PAGE_TITLE: &str = "On this Page:";

/// Class added to the heading that anchors a merged section.
pub const SECTION_ANCHOR_CLASS: &str = "section-anchor";

/// Merge a collection's members, already in order, into one HTML body.
///
/// The first member's anchor fragment is empty (the page itself is the
/// target); every later member is anchored at its route with the `/`
/// separators removed.
#[instrument(skip_all, fields(key = collection.key, members = collection.members.len()))]
pub fn merge(collection: &Collection<'_>) -> Result<String> {
    let mut fragments: HashSet<String> = HashSet::new();
    let mut merged = String::new();

    for (i, member) in collection.members.iter().enumerate() {
        let fragment = if i == 0 {
            String::new()
        } else {
            member.fragment()
        };

        if !fragment.is_empty() && !fragments.insert(fragment.clone()) {
            warn!(
                path = %member.path,
                fragment = %fragment,
                "duplicate section fragment, in-page links will hit the first match"
            );
        }

        let doc = HtmlDocument::parse(&member.html);
        anchor_section(&doc, &fragment, &member.path)?;
        let toc = table_of_contents(&doc)?;
        merged.push_str(&section_shell(SECTION_TITLE, &toc, &doc.to_html()));
    }

    debug!(len = merged.len(), "collection merged");
    Ok(merged)
}

/// Wrap a standalone unit in a section shell. The body is not modified.
pub fn wrap_standalone(unit: &ContentUnit) -> Result<String> {
    let doc = HtmlDocument::parse(&unit.html);
    let toc = table_of_contents(&doc)?;
    Ok(section_shell(PAGE_TITLE, &toc, &unit.html))
}

/// Build the panel's list of links from every `h2` in the document.
///
/// Each link targets the heading's autolink anchor (`a.anchor`), falling back
/// to the heading's own `id`, then to `#`.
pub fn table_of_contents(doc: &HtmlDocument) -> Result<String> {
    let mut items = String::new();

    for heading in doc.select("h2")? {
        let href = match heading.select_first("a.anchor")?.and_then(|a| a.attr("href")) {
            Some(href) => href,
            None => heading
                .attr("id")
                .map(|id| format!("#{id}"))
                .unwrap_or_else(|| "#".to_string()),
        };
        let class = format!("level-{}", heading.tag_name().to_uppercase());

        items.push_str(&format!(
            r#"<li><a href="{}" class="{class}">{}</a></li>"#,
            escape_html(&href),
            escape_html(heading.text().trim()),
        ));
    }

    Ok(format!("<ul>{items}</ul>"))
}

/// The wrapper placed around every page body.
pub fn section_shell(title: &str, toc: &str, body: &str) -> String {
    format!(
        r#"<section><div class="toc"><div class="toc-sticky"><h6>{title}</h6>{toc}</div></div>{body}</section>"#
    )
}

/// Turn the first `h1` into the section's anchor.
///
/// Documents without an `h1` are left unanchored. An empty fragment removes
/// the heading's `id` instead of writing `id=""`.
fn anchor_section(doc: &HtmlDocument, fragment: &str, path: &str) -> Result<()> {
    let Some(heading) = doc.select_first("h1")? else {
        warn!(path, "no h1 in merged member, section left without an anchor");
        return Ok(());
    };

    if fragment.is_empty() {
        heading.remove_attr("id");
    } else {
        heading.set_attr("id", fragment);
    }
    heading.add_class(SECTION_ANCHOR_CLASS);

    // Only in-page links are the heading's own permalink; leave the rest alone.
    for link in heading.select("a")? {
        if link.attr("href").is_some_and(|href| href.starts_with('#')) {
            link.set_attr("href", format!("#{fragment}"));
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
