//! Site writer.
//!
//! Hands assembled pages to the rendering layer: each page becomes a
//! [`PageRequest`], is rendered through a template and written to
//! `<out>/<route>/index.html`. The navigation tree and a checksummed
//! manifest are written next to the pages.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};

use docbinder_shared::{
    CURRENT_SCHEMA_VERSION, DocbinderError, ManifestPage, Page, Result, SiteManifest,
};

use crate::nav::NavTree;
use crate::pipeline::{ProgressReporter, SilentProgress};

pub const MANIFEST_FILE: &str = "manifest.json";
pub const NAV_FILE: &str = "nav.json";

/// Template reference used when no template file is configured.
pub const DEFAULT_TEMPLATE: &str = "default";

const HTML_SLOT: &str = "{{ html }}";
const NAV_SLOT: &str = "{{ nav }}";

const DEFAULT_LAYOUT: &str = "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"></head>\n<body>\n<nav>{{ nav }}</nav>\n<main>{{ html }}</main>\n</body>\n</html>\n";

/// Render context for one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContext {
    pub html: String,
}

/// One page handed to the rendering layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub path: String,
    /// Template reference: a template file path or [`DEFAULT_TEMPLATE`].
    pub template: String,
    pub context: PageContext,
}

/// Build page requests for a set of assembled pages.
pub fn page_requests(pages: &[Page], template: &str) -> Vec<PageRequest> {
    pages
        .iter()
        .map(|page| PageRequest {
            path: page.path.clone(),
            template: template.to_string(),
            context: PageContext {
                html: page.html.clone(),
            },
        })
        .collect()
}

/// Configuration for writing a site.
#[derive(Debug, Clone)]
pub struct WriteConfig {
    /// Output directory.
    pub out_dir: PathBuf,
    /// Optional page template containing `{{ html }}` and optionally `{{ nav }}`.
    pub template: Option<PathBuf>,
    /// Tool version string recorded in the manifest.
    pub tool_version: String,
}

/// Output from a successful site write.
#[derive(Debug, Clone)]
pub struct WriteResult {
    pub out_dir: PathBuf,
    pub page_count: usize,
    pub manifest: SiteManifest,
}

/// Write every page, `nav.json` and `manifest.json`.
///
/// Duplicate routes and unusable templates are rejected before anything is
/// written.
pub fn write_site(config: &WriteConfig, pages: &[Page], nav: &NavTree) -> Result<WriteResult> {
    write_site_reporting(config, pages, nav, &SilentProgress)
}

/// [`write_site`], reporting each written page.
#[instrument(skip_all, fields(out_dir = %config.out_dir.display(), pages = pages.len()))]
pub fn write_site_reporting(
    config: &WriteConfig,
    pages: &[Page],
    nav: &NavTree,
    progress: &dyn ProgressReporter,
) -> Result<WriteResult> {
    let (reference, layout) = match &config.template {
        Some(path) => (path.display().to_string(), load_template(path)?),
        None => (DEFAULT_TEMPLATE.to_string(), DEFAULT_LAYOUT.to_string()),
    };

    // Resolve every target before touching the filesystem.
    let requests = page_requests(pages, &reference);
    let targets = requests
        .iter()
        .map(|request| route_file(&request.path))
        .collect::<Result<Vec<_>>>()?;
    check_unique_targets(&requests, &targets)?;

    std::fs::create_dir_all(&config.out_dir)
        .map_err(|e| DocbinderError::io(&config.out_dir, e))?;

    let nav_html = nav.to_html();
    let total = requests.len();
    let mut entries = Vec::with_capacity(total);

    for (i, (request, relative)) in requests.iter().zip(&targets).enumerate() {
        let rendered = render(&layout, &request.context.html, &nav_html);
        let target = config.out_dir.join(relative);
        write_atomic(&target, rendered.as_bytes())?;

        entries.push(ManifestPage {
            path: request.path.clone(),
            file: manifest_file_name(relative),
            sha256: sha256_hex(rendered.as_bytes()),
            size_bytes: rendered.len(),
        });

        debug!(path = %request.path, file = %target.display(), "wrote page");
        progress.page_written(&request.path, i + 1, total);
    }

    write_json(&config.out_dir.join(NAV_FILE), nav)?;

    let manifest = SiteManifest {
        schema_version: CURRENT_SCHEMA_VERSION,
        tool_version: config.tool_version.clone(),
        built_at: Utc::now(),
        page_count: entries.len(),
        pages: entries,
    };
    write_json(&config.out_dir.join(MANIFEST_FILE), &manifest)?;

    info!(
        page_count = manifest.page_count,
        path = %config.out_dir.display(),
        "site written"
    );

    Ok(WriteResult {
        out_dir: config.out_dir.clone(),
        page_count: manifest.page_count,
        manifest,
    })
}

/// Verify that an output directory is well-formed.
///
/// Checks the manifest schema, the navigation file, and that every listed
/// page exists with the recorded checksum.
#[instrument(skip_all, fields(out_dir = %out_dir.display()))]
pub fn validate_site(out_dir: &Path) -> Result<SiteManifest> {
    let manifest_path = out_dir.join(MANIFEST_FILE);
    let nav_path = out_dir.join(NAV_FILE);

    if !manifest_path.exists() {
        return Err(DocbinderError::validation(format!("missing {MANIFEST_FILE}")));
    }
    if !nav_path.exists() {
        return Err(DocbinderError::validation(format!("missing {NAV_FILE}")));
    }

    let content = std::fs::read_to_string(&manifest_path)
        .map_err(|e| DocbinderError::io(&manifest_path, e))?;
    let manifest: SiteManifest = serde_json::from_str(&content)
        .map_err(|e| DocbinderError::validation(format!("invalid {MANIFEST_FILE}: {e}")))?;

    if manifest.schema_version != CURRENT_SCHEMA_VERSION {
        return Err(DocbinderError::validation(format!(
            "unsupported schema_version: {} (expected {})",
            manifest.schema_version, CURRENT_SCHEMA_VERSION
        )));
    }
    if manifest.page_count != manifest.pages.len() {
        return Err(DocbinderError::validation(format!(
            "page_count {} does not match {} listed pages",
            manifest.page_count,
            manifest.pages.len()
        )));
    }

    let nav_content =
        std::fs::read_to_string(&nav_path).map_err(|e| DocbinderError::io(&nav_path, e))?;
    serde_json::from_str::<NavTree>(&nav_content)
        .map_err(|e| DocbinderError::validation(format!("invalid {NAV_FILE}: {e}")))?;

    for page in &manifest.pages {
        let file = out_dir.join(&page.file);
        let bytes = std::fs::read(&file).map_err(|e| DocbinderError::io(&file, e))?;
        if sha256_hex(&bytes) != page.sha256 {
            return Err(DocbinderError::validation(format!(
                "checksum mismatch for {} ({})",
                page.path, page.file
            )));
        }
    }

    debug!(pages = manifest.pages.len(), "site validated");
    Ok(manifest)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Routes collide when they resolve to the same file (`/a`, `/a/` and `a`
/// all land in `a/index.html`), or when a page would shadow a site file.
fn check_unique_targets(requests: &[PageRequest], targets: &[PathBuf]) -> Result<()> {
    let mut seen: HashMap<&Path, &str> = HashMap::new();
    for (request, target) in requests.iter().zip(targets) {
        if target.starts_with(MANIFEST_FILE) || target.starts_with(NAV_FILE) {
            return Err(DocbinderError::validation(format!(
                "route {} collides with {}",
                request.path,
                target.display()
            )));
        }
        if let Some(first) = seen.insert(target.as_path(), request.path.as_str()) {
            return Err(DocbinderError::validation(format!(
                "duplicate output route: {} and {} both write {}",
                first,
                request.path,
                target.display()
            )));
        }
    }
    Ok(())
}

/// Relative output file for a route: `/` is `index.html`, `/a/b` is
/// `a/b/index.html`.
pub fn route_file(route: &str) -> Result<PathBuf> {
    let mut file = PathBuf::new();
    for segment in route.split('/').filter(|s| !s.is_empty()) {
        if segment == ".." || segment == "." || segment.contains('\\') {
            return Err(DocbinderError::validation(format!(
                "route escapes the output directory: {route}"
            )));
        }
        file.push(segment);
    }
    file.push("index.html");
    Ok(file)
}

fn manifest_file_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn load_template(path: &Path) -> Result<String> {
    let template = std::fs::read_to_string(path).map_err(|e| DocbinderError::io(path, e))?;
    if !template.contains(HTML_SLOT) {
        return Err(DocbinderError::config(format!(
            "template {} has no {HTML_SLOT} placeholder",
            path.display()
        )));
    }
    Ok(template)
}

/// Fill the first `{{ html }}` with the body and every `{{ nav }}` with the
/// sidebar. Neither substitution sees the other's output.
fn render(layout: &str, html: &str, nav: &str) -> String {
    match layout.split_once(HTML_SLOT) {
        Some((before, after)) => format!(
            "{}{html}{}",
            before.replace(NAV_SLOT, nav),
            after.replace(NAV_SLOT, nav)
        ),
        None => layout.replace(NAV_SLOT, nav),
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Write to a sibling temp file, then rename over the target.
fn write_atomic(target: &Path, bytes: &[u8]) -> Result<()> {
    let parent = target
        .parent()
        .ok_or_else(|| DocbinderError::validation(format!("no parent for {}", target.display())))?;
    std::fs::create_dir_all(parent).map_err(|e| DocbinderError::io(parent, e))?;

    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp = parent.join(format!(".{name}.tmp"));

    std::fs::write(&temp, bytes).map_err(|e| DocbinderError::io(&temp, e))?;
    std::fs::rename(&temp, target).map_err(|e| DocbinderError::io(target, e))?;
    Ok(())
}

fn write_json<T: serde::Serialize>(path: &Path, data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| DocbinderError::validation(format!("JSON serialization failed: {e}")))?;
    write_atomic(path, json.as_bytes())?;
    debug!(path = %path.display(), "wrote JSON file");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
