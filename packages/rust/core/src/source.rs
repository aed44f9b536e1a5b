//! Content sources.
//!
//! A [`ContentSource`] stands in for the content query: it yields the full
//! list of units or fails. A failure is always fatal to a build.

use std::path::PathBuf;

use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use docbinder_shared::{ContentUnit, DocbinderError, Result};

/// Where content units come from.
pub trait ContentSource {
    /// Short human-readable description, used in logs and progress output.
    fn describe(&self) -> String;

    /// Fetch every content unit.
    fn fetch(&self) -> Result<Vec<ContentUnit>>;
}

// ---------------------------------------------------------------------------
// MemorySource
// ---------------------------------------------------------------------------

/// A source backed by an in-memory list.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    units: Vec<ContentUnit>,
}

impl MemorySource {
    pub fn new(units: Vec<ContentUnit>) -> Self {
        Self { units }
    }
}

impl ContentSource for MemorySource {
    fn describe(&self) -> String {
        format!("memory ({} units)", self.units.len())
    }

    fn fetch(&self) -> Result<Vec<ContentUnit>> {
        Ok(self.units.clone())
    }
}

// ---------------------------------------------------------------------------
// SnapshotSource
// ---------------------------------------------------------------------------

/// A source that reads a JSON snapshot of a content query result.
///
/// The snapshot is either a bare array of units or an envelope
/// `{ "units": [...], "errors": [...] }`. Any reported error fails the fetch.
#[derive(Debug, Clone)]
pub struct SnapshotSource {
    path: PathBuf,
    max_units: usize,
}

impl SnapshotSource {
    pub fn new(path: impl Into<PathBuf>, max_units: usize) -> Self {
        Self {
            path: path.into(),
            max_units,
        }
    }
}

impl ContentSource for SnapshotSource {
    fn describe(&self) -> String {
        format!("snapshot {}", self.path.display())
    }

    #[instrument(skip_all, fields(path = %self.path.display(), max_units = self.max_units))]
    fn fetch(&self) -> Result<Vec<ContentUnit>> {
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| DocbinderError::io(&self.path, e))?;

        let mut units = parse_snapshot(&content)?;

        if units.len() > self.max_units {
            warn!(
                total = units.len(),
                limit = self.max_units,
                "content query exceeded unit limit, truncating"
            );
            units.truncate(self.max_units);
        }

        info!(units = units.len(), "content snapshot loaded");
        Ok(units)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Snapshot {
    Bare(Vec<ContentUnit>),
    Envelope {
        #[serde(default)]
        units: Vec<ContentUnit>,
        #[serde(default)]
        errors: Vec<serde_json::Value>,
    },
}

/// Decode snapshot JSON into content units.
pub fn parse_snapshot(json: &str) -> Result<Vec<ContentUnit>> {
    let snapshot: Snapshot = serde_json::from_str(json)
        .map_err(|e| DocbinderError::query(format!("invalid content snapshot: {e}")))?;

    match snapshot {
        Snapshot::Bare(units) => Ok(units),
        Snapshot::Envelope { units, errors } => {
            if !errors.is_empty() {
                let first = errors
                    .first()
                    .map(describe_query_error)
                    .unwrap_or_default();
                return Err(DocbinderError::query(format!(
                    "content query reported {} error(s): {first}",
                    errors.len()
                )));
            }
            debug!(units = units.len(), "decoded snapshot envelope");
            Ok(units)
        }
    }
}

fn describe_query_error(error: &serde_json::Value) -> String {
    match error {
        serde_json::Value::String(message) => message.clone(),
        serde_json::Value::Object(map) => map
            .get("message")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string()),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    fn fixture_path() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures/json/content.fixture.json")
    }

    fn temp_file(contents: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("docbinder-source-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("content.json");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn reads_fixture_snapshot() {
        let source = SnapshotSource::new(fixture_path(), 1000);
        let units = source.fetch().unwrap();
        assert_eq!(units.len(), 6);
        assert_eq!(units[0].path, "/");
        assert!(source.describe().starts_with("snapshot "));
    }

    #[test]
    fn truncates_to_limit() {
        let source = SnapshotSource::new(fixture_path(), 2);
        let units = source.fetch().unwrap();
        assert_eq!(units.len(), 2);
    }

    #[test]
    fn envelope_without_errors() {
        let units = parse_snapshot(r#"{"units": [{"path": "/a", "navText": "A"}], "errors": []}"#).unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].nav_text, "A");
    }

    #[test]
    fn reported_errors_fail_the_fetch() {
        let err = parse_snapshot(r#"{"units": [], "errors": [{"message": "Cannot query field"}]}"#)
            .unwrap_err();
        assert!(matches!(err, DocbinderError::Query { .. }));
        assert!(err.to_string().contains("Cannot query field"));
    }

    #[test]
    fn undecodable_snapshot_is_query_error() {
        let err = parse_snapshot("{not json").unwrap_err();
        assert!(matches!(err, DocbinderError::Query { .. }));
    }

    #[test]
    fn missing_snapshot_is_io_error() {
        let source = SnapshotSource::new("/nonexistent/docbinder/content.json", 10);
        assert!(matches!(source.fetch(), Err(DocbinderError::Io { .. })));
    }

    #[test]
    fn snapshot_file_round_trip() {
        let path = temp_file(r#"[{"path": "/x", "navText": "X", "collectionKey": null}]"#);
        let units = SnapshotSource::new(&path, 10).fetch().unwrap();
        assert_eq!(units[0].path, "/x");
        assert_eq!(units[0].collection_key(), None);
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn memory_source_returns_units() {
        let source = MemorySource::new(vec![ContentUnit::new("/", "Home")]);
        assert_eq!(source.fetch().unwrap().len(), 1);
        assert_eq!(source.describe(), "memory (1 units)");
    }
}
