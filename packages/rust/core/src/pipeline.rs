//! End-to-end build: content source → assemble → navigation → site.

use std::path::PathBuf;
use std::time::Instant;

use tracing::{info, instrument};

use docbinder_shared::Result;

use crate::assembler::assemble;
use crate::nav::{NavTree, build_nav_tree};
use crate::output::{WriteConfig, write_site_reporting};
use crate::source::ContentSource;

/// Configuration for a site build.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Output directory.
    pub out_dir: PathBuf,
    /// Optional page template.
    pub template: Option<PathBuf>,
    /// Tool version string.
    pub tool_version: String,
}

/// Result of a site build.
#[derive(Debug)]
pub struct BuildResult {
    pub out_dir: PathBuf,
    /// Content units read from the source.
    pub unit_count: usize,
    /// Physical pages written.
    pub page_count: usize,
    /// Top-level navigation entries.
    pub nav_entries: usize,
    pub elapsed: std::time::Duration,
}

/// Progress callback for reporting build status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each page file is written.
    fn page_written(&self, path: &str, current: usize, total: usize);
    /// Called when the build completes.
    fn done(&self, result: &BuildResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn page_written(&self, _path: &str, _current: usize, _total: usize) {}
    fn done(&self, _result: &BuildResult) {}
}

/// Run the full build.
///
/// 1. Fetch content units (a failure aborts before anything is written)
/// 2. Assemble pages
/// 3. Build the navigation tree
/// 4. Write pages, `nav.json` and `manifest.json`
#[instrument(skip_all, fields(source = %source.describe(), out_dir = %config.out_dir.display()))]
pub fn build_site(
    config: &BuildConfig,
    source: &dyn ContentSource,
    progress: &dyn ProgressReporter,
) -> Result<BuildResult> {
    let start = Instant::now();

    progress.phase("Fetching content");
    let units = source.fetch()?;

    progress.phase("Assembling pages");
    let pages = assemble(&units)?;

    progress.phase("Building navigation");
    let nav: NavTree = build_nav_tree(&units);

    progress.phase("Writing site");
    let write_config = WriteConfig {
        out_dir: config.out_dir.clone(),
        template: config.template.clone(),
        tool_version: config.tool_version.clone(),
    };
    let written = write_site_reporting(&write_config, &pages, &nav, progress)?;

    let result = BuildResult {
        out_dir: written.out_dir,
        unit_count: units.len(),
        page_count: written.page_count,
        nav_entries: nav.entries.len(),
        elapsed: start.elapsed(),
    };

    info!(
        units = result.unit_count,
        pages = result.page_count,
        elapsed_ms = result.elapsed.as_millis() as u64,
        "build complete"
    );

    progress.done(&result);
    Ok(result)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Mutex;

    use docbinder_shared::{ContentUnit, DocbinderError};

    use super::*;
    use crate::output::validate_site;
    use crate::source::{MemorySource, SnapshotSource};

    #[derive(Default)]
    struct RecordingProgress {
        events: Mutex<Vec<String>>,
    }

    impl ProgressReporter for RecordingProgress {
        fn phase(&self, name: &str) {
            self.events.lock().unwrap().push(format!("phase:{name}"));
        }
        fn page_written(&self, path: &str, current: usize, total: usize) {
            self.events
                .lock()
                .unwrap()
                .push(format!("page:{path}:{current}/{total}"));
        }
        fn done(&self, result: &BuildResult) {
            self.events
                .lock()
                .unwrap()
                .push(format!("done:{}", result.page_count));
        }
    }

    struct BrokenSource;

    impl ContentSource for BrokenSource {
        fn describe(&self) -> String {
            "broken".into()
        }
        fn fetch(&self) -> Result<Vec<ContentUnit>> {
            Err(DocbinderError::query("upstream unavailable"))
        }
    }

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("docbinder-pipeline-test-{}", uuid::Uuid::now_v7()))
    }

    fn build_config(out_dir: &Path) -> BuildConfig {
        BuildConfig {
            out_dir: out_dir.to_path_buf(),
            template: None,
            tool_version: "0.1.0-test".into(),
        }
    }

    #[test]
    fn builds_fixture_site() {
        let out = temp_dir();
        let fixture =
            Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures/json/content.fixture.json");
        let progress = RecordingProgress::default();

        let result = build_site(
            &build_config(&out),
            &SnapshotSource::new(fixture, 1000),
            &progress,
        )
        .unwrap();

        assert_eq!(result.unit_count, 6);
        assert_eq!(result.page_count, 4);
        // Home, guide, reference, about.
        assert_eq!(result.nav_entries, 4);
        assert!(out.join("guide/intro/index.html").exists());
        assert!(!out.join("guide/setup/index.html").exists());

        let manifest = validate_site(&out).unwrap();
        assert_eq!(manifest.page_count, 4);

        let events = progress.events.lock().unwrap();
        assert_eq!(events.first().map(String::as_str), Some("phase:Fetching content"));
        assert_eq!(events.last().map(String::as_str), Some("done:4"));
        assert_eq!(events.iter().filter(|e| e.starts_with("page:")).count(), 4);

        let _ = std::fs::remove_dir_all(&out);
    }

    #[test]
    fn source_failure_writes_nothing() {
        let out = temp_dir();
        let err = build_site(&build_config(&out), &BrokenSource, &SilentProgress).unwrap_err();
        assert!(matches!(err, DocbinderError::Query { .. }));
        assert!(!out.exists());
    }

    #[test]
    fn colliding_routes_write_nothing() {
        let out = temp_dir();
        // A merged collection takes its primary's route, which a standalone
        // unit already claims.
        let source = MemorySource::new(vec![
            ContentUnit::new("/a", "A")
                .with_collection("g", Some(1), true)
                .with_html("<h1>A</h1>"),
            ContentUnit::new("/b", "B")
                .with_collection("g", Some(2), true)
                .with_html("<h1>B</h1>"),
            ContentUnit::new("/a", "Other A").with_html("<p>clash</p>"),
        ]);

        let err = build_site(&build_config(&out), &source, &SilentProgress).unwrap_err();
        assert!(matches!(err, DocbinderError::Validation { .. }));
        assert!(!out.exists());
    }
}
