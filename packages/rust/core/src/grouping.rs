//! Partition content units into merged collections and standalone units.

use std::collections::HashSet;

use tracing::{debug, instrument};

use docbinder_shared::{ContentUnit, collection_order};

/// Units sharing a collection key that render as one page.
#[derive(Debug, Clone)]
pub struct Collection<'a> {
    /// The shared collection key.
    pub key: &'a str,
    /// Members in [`collection_order`]. Never empty.
    pub members: Vec<&'a ContentUnit>,
}

impl<'a> Collection<'a> {
    /// The member whose route and position the merged page takes.
    pub fn primary(&self) -> &'a ContentUnit {
        self.members[0]
    }
}

/// Result of [`group`]: every input unit lands in exactly one of the two lists.
#[derive(Debug, Clone, Default)]
pub struct Grouping<'a> {
    /// One collection per distinct key among merging units, in order of
    /// first appearance.
    pub groups: Vec<Collection<'a>>,
    /// Units not captured by any collection, in source order.
    pub standalone: Vec<&'a ContentUnit>,
}

/// Group units into collections.
///
/// A collection is started by the first unit with `collectionMerge` set and a
/// non-empty key; it then holds every unit sharing that key, whatever their
/// own merge flag. Units sharing a key without any merging member stay
/// standalone.
#[instrument(skip_all, fields(units = units.len()))]
pub fn group(units: &[ContentUnit]) -> Grouping<'_> {
    let mut captured = vec![false; units.len()];
    let mut seen: HashSet<&str> = HashSet::new();
    let mut groups = Vec::new();

    for unit in units {
        if !unit.merges() {
            continue;
        }
        let Some(key) = unit.collection_key() else {
            continue;
        };
        if !seen.insert(key) {
            continue;
        }

        let mut members: Vec<(usize, &ContentUnit)> = units
            .iter()
            .enumerate()
            .filter(|(_, u)| u.collection_key() == Some(key))
            .collect();
        members.sort_by(|a, b| collection_order(a.1, b.1));

        for (i, _) in &members {
            captured[*i] = true;
        }

        debug!(key, members = members.len(), "collection grouped");
        groups.push(Collection {
            key,
            members: members.into_iter().map(|(_, u)| u).collect(),
        });
    }

    let standalone = units
        .iter()
        .zip(&captured)
        .filter(|(_, captured)| !**captured)
        .map(|(unit, _)| unit)
        .collect();

    Grouping { groups, standalone }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
