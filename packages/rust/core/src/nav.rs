//! Sidebar navigation tree.
//!
//! Built from content metadata only. Units sharing a collection key become
//! one titled group; members of a merged collection link to anchors inside
//! the merged page instead of their own routes.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use docbinder_markup::escape_html;
use docbinder_shared::{ContentUnit, NavEntry, NavGroup, NavLink, collection_order};

/// Ordered top-level navigation entries. Serializes as a JSON array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NavTree {
    pub entries: Vec<NavEntry>,
}

/// Build the navigation tree.
///
/// 1. Every non-empty collection key becomes a group, members sorted with
///    [`collection_order`]. The first sorted member is the primary: it gives
///    the group its title and position, and is the route of the merged page.
/// 2. In a merged group, every member after the primary links to
///    `<primary path>#<fragment>`.
/// 3. Units with neither a key nor an index are top-level links.
/// 4. Entries are stably sorted by `navIndex`.
#[instrument(skip_all, fields(units = units.len()))]
pub fn build_nav_tree(units: &[ContentUnit]) -> NavTree {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut entries = Vec::new();

    for unit in units {
        let Some(key) = unit.collection_key() else {
            continue;
        };
        if !seen.insert(key) {
            continue;
        }

        let mut members: Vec<&ContentUnit> = units
            .iter()
            .filter(|u| u.collection_key() == Some(key))
            .collect();
        members.sort_by(|a, b| collection_order(a, b));

        let Some(primary) = members.first().copied() else {
            continue;
        };
        // Same rule the grouper uses, so links and merged pages agree.
        let merged = members.iter().any(|m| m.collection_merge);

        let links = members
            .iter()
            .enumerate()
            .map(|(i, member)| NavLink {
                path: if merged && i > 0 {
                    format!("{}#{}", primary.path, member.fragment())
                } else {
                    member.path.clone()
                },
                nav_text: member.nav_text.clone(),
                nav_index: member.nav_index,
            })
            .collect();

        entries.push(NavEntry::Group(NavGroup {
            key: key.to_string(),
            collection_title: primary.collection_title.clone(),
            nav_index: primary.nav_index,
            merged,
            members: links,
        }));
    }

    for unit in units {
        if unit.collection_key().is_some() {
            continue;
        }
        if unit.collection_index.is_some() {
            debug!(path = %unit.path, "indexed unit without a collection key, left out of navigation");
            continue;
        }
        entries.push(NavEntry::Link(NavLink {
            path: unit.path.clone(),
            nav_text: unit.nav_text.clone(),
            nav_index: unit.nav_index,
        }));
    }

    entries.sort_by_key(NavEntry::nav_index);

    debug!(entries = entries.len(), "navigation tree built");
    NavTree { entries }
}

impl NavTree {
    /// Reference sidebar markup. A group is one list of its members, headed
    /// by `<h2>` when it has a title; each ungrouped link is its own list.
    pub fn to_html(&self) -> String {
        let mut out = String::new();

        for entry in &self.entries {
            match entry {
                NavEntry::Group(group) => {
                    if let Some(title) = &group.collection_title {
                        out.push_str(&format!("<h2>{}</h2>", escape_html(title)));
                    }
                    out.push_str("<ul>");
                    for link in &group.members {
                        out.push_str(&list_item(link));
                    }
                    out.push_str("</ul>");
                }
                NavEntry::Link(link) => {
                    out.push_str(&format!("<ul>{}</ul>", list_item(link)));
                }
            }
        }

        out
    }

    /// Every link in display order.
    pub fn links(&self) -> impl Iterator<Item = &NavLink> {
        self.entries.iter().flat_map(|entry| match entry {
            NavEntry::Link(link) => std::slice::from_ref(link).iter(),
            NavEntry::Group(group) => group.members.iter(),
        })
    }
}

fn list_item(link: &NavLink) -> String {
    format!(
        r#"<li><a href="{}">{}</a></li>"#,
        escape_html(&link.path),
        escape_html(&link.nav_text)
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn group_at(tree: &NavTree, i: usize) -> &NavGroup {
        match &tree.entries[i] {
            NavEntry::Group(group) => group,
            other => panic!("expected group at {i}, got {other:?}"),
        }
    }

    fn member_paths(group: &NavGroup) -> Vec<&str> {
        group.members.iter().map(|m| m.path.as_str()).collect()
    }

    #[test]
    fn merged_members_link_to_fragments() {
        let units = vec![
            ContentUnit::new("/a", "A")
                .with_collection("g", Some(1), true)
                .with_collection_title("Group"),
            ContentUnit::new("/b", "B")
                .with_collection("g", Some(2), true)
                .with_collection_title("Group"),
        ];
        let tree = build_nav_tree(&units);

        assert_eq!(tree.entries.len(), 1);
        let group = group_at(&tree, 0);
        assert!(group.merged);
        assert_eq!(group.collection_title.as_deref(), Some("Group"));
        assert_eq!(member_paths(group), vec!["/a", "/a#b"]);
    }

    #[test]
    fn nested_routes_lose_every_separator() {
        let units = vec![
            ContentUnit::new("/docs/intro", "Intro").with_collection("docs", Some(1), true),
            ContentUnit::new("/docs/foo", "Foo").with_collection("docs", Some(2), true),
        ];
        let tree = build_nav_tree(&units);
        assert_eq!(member_paths(group_at(&tree, 0)), vec!["/docs/intro", "/docs/intro#docsfoo"]);
    }

    #[test]
    fn unmerged_groups_keep_routes() {
        let units = vec![
            ContentUnit::new("/ref/b", "B").with_collection("ref", Some(2), false),
            ContentUnit::new("/ref/a", "A").with_collection("ref", Some(1), false),
        ];
        let tree = build_nav_tree(&units);
        let group = group_at(&tree, 0);
        assert!(!group.merged);
        assert_eq!(member_paths(group), vec!["/ref/a", "/ref/b"]);
    }

    #[test]
    fn index_always_wins_over_text() {
        let units = vec![
            ContentUnit::new("/z", "aaa").with_collection("g", Some(2), false),
            ContentUnit::new("/y", "zzz").with_collection("g", Some(1), false),
            ContentUnit::new("/x", "AAA first by text").with_collection("g", None, false),
            ContentUnit::new("/w", "ten").with_collection("g", Some(10), false),
        ];
        let tree = build_nav_tree(&units);
        // 10 after 2 (numeric, not "10" < "2"); index-less units come last.
        assert_eq!(member_paths(group_at(&tree, 0)), vec!["/y", "/z", "/w", "/x"]);
    }

    #[test]
    fn index_less_members_sort_by_label_ignoring_case() {
        let units = vec![
            ContentUnit::new("/c", "charlie").with_collection("g", None, false),
            ContentUnit::new("/b", "Bravo").with_collection("g", None, false),
            ContentUnit::new("/a", "alpha").with_collection("g", None, false),
        ];
        let tree = build_nav_tree(&units);
        assert_eq!(member_paths(group_at(&tree, 0)), vec!["/a", "/b", "/c"]);
    }

    #[test]
    fn accented_labels_sort_with_their_base_letter() {
        let units = vec![
            ContentUnit::new("/g/zed", "Zed").with_collection("g", None, false),
            ContentUnit::new("/g/emile", "Émile").with_collection("g", None, false),
        ];
        let tree = build_nav_tree(&units);
        let labels: Vec<&str> = tree.links().map(|l| l.nav_text.as_str()).collect();
        assert_eq!(labels, vec!["Émile", "Zed"]);
    }

    #[test]
    fn primary_is_first_in_order_not_first_seen() {
        let units = vec![
            ContentUnit::new("/g/two", "Two")
                .with_collection("g", Some(2), true)
                .with_collection_title("Second's title")
                .with_nav_index(7),
            ContentUnit::new("/g/one", "One")
                .with_collection("g", Some(1), true)
                .with_collection_title("Guide")
                .with_nav_index(3),
        ];
        let tree = build_nav_tree(&units);
        let group = group_at(&tree, 0);
        assert_eq!(group.collection_title.as_deref(), Some("Guide"));
        assert_eq!(group.nav_index, 3);
        assert_eq!(member_paths(group), vec!["/g/one", "/g/one#gtwo"]);
    }

    #[test]
    fn ungrouped_entries_and_top_level_order() {
        let units = vec![
            ContentUnit::new("/about", "About").with_nav_index(9),
            ContentUnit::new("/", "Home").with_nav_index(0),
            ContentUnit::new("/g/1", "One")
                .with_collection("g", Some(1), true)
                .with_collection_title("Guide")
                .with_nav_index(2),
            ContentUnit {
                collection_index: Some(4),
                ..ContentUnit::new("/orphan", "Orphan")
            },
        ];
        let tree = build_nav_tree(&units);

        let order: Vec<i64> = tree.entries.iter().map(NavEntry::nav_index).collect();
        assert_eq!(order, vec![0, 2, 9]);
        assert!(
            tree.links().all(|l| l.path != "/orphan"),
            "indexed unit without key is not listed"
        );
    }

    #[test]
    fn equal_nav_index_keeps_groups_first() {
        let units = vec![
            ContentUnit::new("/solo", "Solo").with_nav_index(1),
            ContentUnit::new("/g/1", "One")
                .with_collection("g", Some(1), false)
                .with_nav_index(1),
        ];
        let tree = build_nav_tree(&units);
        assert!(matches!(tree.entries[0], NavEntry::Group(_)));
        assert!(matches!(tree.entries[1], NavEntry::Link(_)));
    }

    #[test]
    fn renders_reference_markup() {
        let units = vec![
            ContentUnit::new("/", "Home & Start"),
            ContentUnit::new("/a", "A")
                .with_collection("g", Some(1), true)
                .with_collection_title("Guide")
                .with_nav_index(1),
            ContentUnit::new("/b", "B")
                .with_collection("g", Some(2), true)
                .with_nav_index(1),
        ];
        let html = build_nav_tree(&units).to_html();
        assert_eq!(
            html,
            concat!(
                r#"<ul><li><a href="/">Home &amp; Start</a></li></ul>"#,
                r#"<h2>Guide</h2><ul><li><a href="/a">A</a></li><li><a href="/a#b">B</a></li></ul>"#,
            )
        );
    }

    #[test]
    fn untitled_group_renders_members_in_one_list() {
        let units = vec![
            ContentUnit::new("/r/a", "A").with_collection("r", Some(1), false),
            ContentUnit::new("/r/b", "B").with_collection("r", Some(2), false),
        ];
        let html = build_nav_tree(&units).to_html();
        assert_eq!(
            html,
            r#"<ul><li><a href="/r/a">A</a></li><li><a href="/r/b">B</a></li></ul>"#
        );
    }

    #[test]
    fn serializes_as_array() {
        let tree = build_nav_tree(&[ContentUnit::new("/", "Home")]);
        let json = serde_json::to_string(&tree).expect("serialize");
        assert!(json.starts_with('['), "{json}");
        let parsed: NavTree = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, tree);
    }
}
