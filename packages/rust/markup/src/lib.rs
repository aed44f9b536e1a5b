//! HTML document handling for docbinder.
//!
//! [`HtmlDocument`] is a parsed, mutable tree over one fragment of rendered
//! markup. It supports selector queries, attribute edits, subtree removal, and
//! serialization back to a fragment. The [`tables`] module builds on it to
//! rewrite bracket-encoded column width rows into inline styles.

pub mod tables;

use kuchikiki::traits::*;
use kuchikiki::{ElementData, NodeDataRef, NodeRef};

use docbinder_shared::{DocbinderError, Result};

pub use tables::{normalize_html, normalize_table_widths};

// ---------------------------------------------------------------------------
// HtmlDocument
// ---------------------------------------------------------------------------

/// A parsed HTML fragment.
///
/// The parser wraps the fragment in a synthetic `<html><head><body>` shell;
/// [`HtmlDocument::to_html`] strips it again so callers get back a fragment.
/// Edits made through an [`Element`] are visible through the document that
/// produced it.
pub struct HtmlDocument {
    root: NodeRef,
}

impl HtmlDocument {
    /// Parse a fragment of HTML. Parsing never fails; malformed markup is
    /// repaired the way browsers repair it.
    pub fn parse(html: &str) -> Self {
        Self {
            root: kuchikiki::parse_html().one(html),
        }
    }

    /// All elements matching a CSS selector, in document order.
    pub fn select(&self, selector: &str) -> Result<Vec<Element>> {
        select_in(&self.root, selector)
    }

    /// The first element matching a CSS selector.
    pub fn select_first(&self, selector: &str) -> Result<Option<Element>> {
        select_first_in(&self.root, selector)
    }

    /// Serialize the fragment (without the synthetic document shell).
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for container in ["head", "body"] {
            if let Ok(el) = self.root.select_first(container) {
                for child in el.as_node().children() {
                    out.push_str(&child.to_string());
                }
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Element
// ---------------------------------------------------------------------------

/// A handle to one element inside an [`HtmlDocument`].
#[derive(Clone)]
pub struct Element(NodeDataRef<ElementData>);

impl Element {
    /// Lowercase local tag name, e.g. `h2`.
    pub fn tag_name(&self) -> String {
        self.0.name.local.to_string()
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text(&self) -> String {
        self.0.as_node().text_contents()
    }

    pub fn attr(&self, name: &str) -> Option<String> {
        self.0.attributes.borrow().get(name).map(str::to_owned)
    }

    pub fn set_attr(&self, name: &str, value: impl Into<String>) {
        self.0.attributes.borrow_mut().insert(name, value.into());
    }

    pub fn remove_attr(&self, name: &str) {
        self.0.attributes.borrow_mut().remove(name);
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    /// Append a class unless it is already present.
    pub fn add_class(&self, class: &str) {
        if self.has_class(class) {
            return;
        }
        let classes = match self.attr("class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {class}", existing.trim()),
            _ => class.to_string(),
        };
        self.set_attr("class", classes);
    }

    /// Elements matching a selector within this element's subtree
    /// (the element itself included).
    pub fn select(&self, selector: &str) -> Result<Vec<Element>> {
        select_in(self.0.as_node(), selector)
    }

    pub fn select_first(&self, selector: &str) -> Result<Option<Element>> {
        select_first_in(self.0.as_node(), selector)
    }

    /// Direct children with the given tag name.
    pub fn child_elements(&self, tag: &str) -> Vec<Element> {
        self.0
            .as_node()
            .children()
            .elements()
            .filter(|el| &*el.name.local == tag)
            .map(Element)
            .collect()
    }

    /// The next sibling that is an element, skipping text and comments.
    pub fn next_element_sibling(&self) -> Option<Element> {
        self.0
            .as_node()
            .following_siblings()
            .elements()
            .next()
            .map(Element)
    }

    /// Detach this element (and its subtree) from the document.
    pub fn remove(&self) {
        self.0.as_node().detach();
    }
}

impl std::fmt::Debug for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Element").field(&self.tag_name()).finish()
    }
}

fn select_in(node: &NodeRef, selector: &str) -> Result<Vec<Element>> {
    let matches = node
        .select(selector)
        .map_err(|_| DocbinderError::parse(format!("invalid selector '{selector}'")))?;
    Ok(matches.map(Element).collect())
}

fn select_first_in(node: &NodeRef, selector: &str) -> Result<Option<Element>> {
    let mut matches = node
        .select(selector)
        .map_err(|_| DocbinderError::parse(format!("invalid selector '{selector}'")))?;
    Ok(matches.next().map(Element))
}

// ---------------------------------------------------------------------------
// Escaping
// ---------------------------------------------------------------------------

/// Escape text for use in element content or a double-quoted attribute.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragment_roundtrip_drops_document_shell() {
        let doc = HtmlDocument::parse("<h1>Title</h1><p>Body &amp; more</p>");
        let html = doc.to_html();
        assert_eq!(html, "<h1>Title</h1><p>Body &amp; more</p>");
        assert!(!html.contains("<body>"));
    }

    #[test]
    fn empty_input_serializes_to_empty_string() {
        assert_eq!(HtmlDocument::parse("").to_html(), "");
    }

    #[test]
    fn select_returns_document_order() {
        let doc = HtmlDocument::parse("<h2>One</h2><p>x</p><h2>Two</h2>");
        let texts: Vec<_> = doc
            .select("h2")
            .unwrap()
            .iter()
            .map(Element::text)
            .collect();
        assert_eq!(texts, vec!["One", "Two"]);
    }

    #[test]
    fn invalid_selector_is_a_parse_error() {
        let doc = HtmlDocument::parse("<p>x</p>");
        let err = doc.select("p[").unwrap_err();
        assert!(err.to_string().contains("invalid selector"));
    }

    #[test]
    fn attribute_edits_show_up_in_output() {
        let doc = HtmlDocument::parse(r#"<h1 class="title">Hello</h1>"#);
        let h1 = doc.select_first("h1").unwrap().expect("h1");
        h1.set_attr("id", "hello");
        h1.add_class("section-anchor");
        h1.add_class("section-anchor");

        assert_eq!(h1.attr("class").as_deref(), Some("title section-anchor"));
        assert!(h1.has_class("title"));
        let html = doc.to_html();
        assert!(html.contains(r#"id="hello""#));

        h1.remove_attr("id");
        assert!(!doc.to_html().contains("id="));
    }

    #[test]
    fn remove_detaches_subtree() {
        let doc = HtmlDocument::parse("<ul><li>keep</li><li>drop</li></ul>");
        let items = doc.select("li").unwrap();
        items[1].remove();
        assert_eq!(doc.to_html(), "<ul><li>keep</li></ul>");
    }

    #[test]
    fn sibling_and_child_navigation() {
        let doc = HtmlDocument::parse(
            "<table><tbody><tr><td>a</td></tr>\n<tr><td>b</td></tr></tbody></table>",
        );
        let table = doc.select_first("table").unwrap().expect("table");
        let tbody = table.child_elements("tbody");
        assert_eq!(tbody.len(), 1);

        let rows = tbody[0].child_elements("tr");
        assert_eq!(rows.len(), 2);
        let next = rows[0].next_element_sibling().expect("next row");
        assert_eq!(next.text(), "b");
        assert_eq!(next.tag_name(), "tr");
    }

    #[test]
    fn escape_html_covers_markup_characters() {
        assert_eq!(escape_html(r#"a < b & "c" > d"#), "a &lt; b &amp; &quot;c&quot; &gt; d");
        assert_eq!(escape_html("plain"), "plain");
    }
}
