//! Site configuration for docbinder.
//!
//! Config lives in `docbinder.toml` at the project root.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DocbinderError, Result};

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "docbinder.toml";

// ---------------------------------------------------------------------------
// Config structs (matching docbinder.toml schema)
// ---------------------------------------------------------------------------

/// Top-level site config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Where content comes from.
    #[serde(default)]
    pub content: ContentConfig,

    /// Where assembled pages go.
    #[serde(default)]
    pub output: OutputConfig,
}

/// `[content]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentConfig {
    /// Path to the JSON content snapshot.
    #[serde(default = "default_snapshot")]
    pub snapshot: String,

    /// Maximum number of units taken from the content query.
    /// Anything beyond this is dropped.
    #[serde(default = "default_max_units")]
    pub max_units: usize,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            snapshot: default_snapshot(),
            max_units: default_max_units(),
        }
    }
}

fn default_snapshot() -> String {
    "content.json".into()
}
fn default_max_units() -> usize {
    1000
}

/// `[output]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output directory for rendered pages.
    #[serde(default = "default_output_dir")]
    pub dir: String,

    /// Page template with `{{ html }}` and optional `{{ nav }}` placeholders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            template: None,
        }
    }
}

fn default_output_dir() -> String {
    "public".into()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the site config. Without an explicit path, `docbinder.toml` in the
/// current directory is used. Returns defaults if the file does not exist.
pub fn load_config(path: Option<&Path>) -> Result<SiteConfig> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => PathBuf::from(CONFIG_FILE_NAME),
    };

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(SiteConfig::default());
    }

    load_config_from(&path)
}

/// Load the site config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<SiteConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| DocbinderError::io(path, e))?;

    let config: SiteConfig = toml::from_str(&content).map_err(|e| {
        DocbinderError::config(format!("failed to parse {}: {e}", path.display()))
    })?;

    if config.content.max_units == 0 {
        return Err(DocbinderError::config(format!(
            "{}: content.max_units must be at least 1",
            path.display()
        )));
    }

    Ok(config)
}

/// Write a default config file into `dir`. Returns the path to the created file.
pub fn init_config(dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).map_err(|e| DocbinderError::io(dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    if path.exists() {
        return Err(DocbinderError::config(format!(
            "{} already exists",
            path.display()
        )));
    }

    let config = SiteConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| DocbinderError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| DocbinderError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
