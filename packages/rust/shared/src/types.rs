//! Core domain types for docbinder content assembly.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Current schema version for the site manifest format.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// ContentUnit
// ---------------------------------------------------------------------------

/// One authored document plus its metadata, as returned by the content query.
///
/// Field names follow the camelCase keys of the content metadata. Optional
/// keys may be absent or `null`; non-optional keys fall back to their
/// defaults (`""`, `0`, `false`) when the source leaves them out.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentUnit {
    /// Output route, unique across the site.
    pub path: String,
    /// Collection membership.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_key: Option<String>,
    /// Position within the collection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_index: Option<i64>,
    /// When true, the whole collection renders as one physical page.
    #[serde(default, deserialize_with = "null_as_default")]
    pub collection_merge: bool,
    /// Label shown in navigation.
    #[serde(default, deserialize_with = "null_as_default")]
    pub nav_text: String,
    /// Top-level navigation order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub nav_index: i64,
    /// Heading shown above a grouped navigation entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_title: Option<String>,
    /// Pre-rendered HTML body. Unused by navigation.
    #[serde(default, deserialize_with = "null_as_default")]
    pub html: String,
}

impl ContentUnit {
    /// Create a standalone unit with the given route and navigation label.
    pub fn new(path: impl Into<String>, nav_text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            nav_text: nav_text.into(),
            ..Self::default()
        }
    }

    /// Place the unit in a collection.
    pub fn with_collection(mut self, key: impl Into<String>, index: Option<i64>, merge: bool) -> Self {
        self.collection_key = Some(key.into());
        self.collection_index = index;
        self.collection_merge = merge;
        self
    }

    /// Set the rendered HTML body.
    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.html = html.into();
        self
    }

    /// Set the top-level navigation position.
    pub fn with_nav_index(mut self, nav_index: i64) -> Self {
        self.nav_index = nav_index;
        self
    }

    /// Set the collection heading used by the sidebar.
    pub fn with_collection_title(mut self, title: impl Into<String>) -> Self {
        self.collection_title = Some(title.into());
        self
    }

    /// The collection key, treating an empty string as unset.
    pub fn collection_key(&self) -> Option<&str> {
        self.collection_key.as_deref().filter(|k| !k.is_empty())
    }

    /// True when this unit makes its collection a single merged page.
    pub fn merges(&self) -> bool {
        self.collection_merge && self.collection_key().is_some()
    }

    /// The in-page anchor this unit gets when merged into another page.
    pub fn fragment(&self) -> String {
        fragment_from_path(&self.path)
    }
}

/// Deserialize `null` the same way as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Derive an anchor identifier from a route by removing every `/`.
///
/// Merged pages and the sidebar must agree on this byte for byte, so both go
/// through this function.
pub fn fragment_from_path(path: &str) -> String {
    path.chars().filter(|c| *c != '/').collect()
}

/// Ordering of members inside a collection.
///
/// Units with a `collectionIndex` come before units without one and compare
/// numerically. Units without an index compare by `navText` with accents
/// folded and case ignored (`Émile` before `Zed`), then case-insensitively,
/// then exactly. Callers sort stably, so complete ties keep source order.
pub fn collection_order(a: &ContentUnit, b: &ContentUnit) -> Ordering {
    match (a.collection_index, b.collection_index) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => label_key(&a.nav_text)
            .cmp(&label_key(&b.nav_text))
            .then_with(|| a.nav_text.to_lowercase().cmp(&b.nav_text.to_lowercase()))
            .then_with(|| a.nav_text.cmp(&b.nav_text)),
    }
}

/// Primary sort key for a label: compatibility-decomposed, combining marks
/// dropped, lowercased.
fn label_key(text: &str) -> String {
    text.nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

// ---------------------------------------------------------------------------
// Page
// ---------------------------------------------------------------------------

/// An assembled page ready for the rendering layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Output route.
    pub path: String,
    /// Final HTML body, already wrapped in section shells.
    pub html: String,
}

// ---------------------------------------------------------------------------
// Navigation
// ---------------------------------------------------------------------------

/// A single navigable link in the sidebar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavLink {
    /// Link target. For members of a merged collection this is
    /// `<primary path>#<fragment>`.
    pub path: String,
    /// Link label.
    pub nav_text: String,
    /// Top-level navigation order.
    pub nav_index: i64,
}

/// A titled group of links built from one collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavGroup {
    /// Collection key shared by all members.
    pub key: String,
    /// Heading taken from the primary member.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_title: Option<String>,
    /// Top-level order taken from the primary member.
    pub nav_index: i64,
    /// Whether the members live on one merged page.
    pub merged: bool,
    /// Ordered member links.
    pub members: Vec<NavLink>,
}

/// One top-level entry of the navigation tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NavEntry {
    Link(NavLink),
    Group(NavGroup),
}

impl NavEntry {
    /// Position of this entry in the top-level ordering.
    pub fn nav_index(&self) -> i64 {
        match self {
            Self::Link(link) => link.nav_index,
            Self::Group(group) => group.nav_index,
        }
    }
}

// ---------------------------------------------------------------------------
// SiteManifest
// ---------------------------------------------------------------------------

/// The `manifest.json` written at the root of the output directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteManifest {
    /// Schema version for forward compatibility.
    pub schema_version: u32,
    /// Tool version that produced the build.
    pub tool_version: String,
    /// When the build finished.
    pub built_at: DateTime<Utc>,
    /// Number of pages written.
    pub page_count: usize,
    /// Per-page checksums.
    #[serde(default)]
    pub pages: Vec<ManifestPage>,
}

/// A written page as recorded in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestPage {
    /// Route the page is served at.
    pub path: String,
    /// File path relative to the output directory.
    pub file: String,
    /// SHA-256 of the written file.
    pub sha256: String,
    /// Size of the written file.
    pub size_bytes: usize,
}
