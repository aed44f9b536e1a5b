//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use docbinder_core::pipeline::{BuildConfig, BuildResult, ProgressReporter, build_site};
use docbinder_core::source::{ContentSource, SnapshotSource};
use docbinder_core::{build_nav_tree, validate_site};
use docbinder_shared::{SiteConfig, init_config, load_config};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// docbinder: merge documentation collections into pages with a sidebar.
#[derive(Parser)]
#[command(
    name = "docbinder",
    version,
    about = "Assemble documentation content into merged pages and a navigation tree.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file (defaults to ./docbinder.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Assemble pages from a content snapshot and write the site.
    Build {
        /// Content snapshot (JSON). Overrides `content.snapshot`.
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Output directory. Overrides `output.dir`.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Print the navigation tree for a content snapshot.
    Nav {
        /// Content snapshot (JSON). Overrides `content.snapshot`.
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Print the reference HTML rendering instead of JSON.
        #[arg(long)]
        html: bool,
    },

    /// Validate a previously written site.
    Check {
        /// Output directory. Overrides `output.dir`.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "docbinder=info",
        1 => "docbinder=debug",
        _ => "docbinder=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Build { snapshot, out } => {
            cmd_build(config_path, snapshot.as_deref(), out.as_deref())
        }
        Command::Nav { snapshot, html } => cmd_nav(config_path, snapshot.as_deref(), html),
        Command::Check { out } => cmd_check(config_path, out.as_deref()),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(config_path),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn snapshot_source(config: &SiteConfig, snapshot: Option<&Path>) -> SnapshotSource {
    let path = snapshot
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(&config.content.snapshot));
    SnapshotSource::new(path, config.content.max_units)
}

fn cmd_build(config_path: Option<&Path>, snapshot: Option<&Path>, out: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let source = snapshot_source(&config, snapshot);

    let build_config = BuildConfig {
        out_dir: out
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(&config.output.dir)),
        template: config.output.template.as_ref().map(PathBuf::from),
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
    };

    info!(
        source = %source.describe(),
        out = %build_config.out_dir.display(),
        "building site"
    );

    let reporter = CliProgress::new();
    let result = build_site(&build_config, &source, &reporter)?;

    println!();
    println!("  Site built successfully!");
    println!("  Units:  {}", result.unit_count);
    println!("  Pages:  {}", result.page_count);
    println!("  Nav:    {} entries", result.nav_entries);
    println!("  Path:   {}", result.out_dir.display());
    println!("  Time:   {:.1}s", result.elapsed.as_secs_f64());
    println!();

    Ok(())
}

fn cmd_nav(config_path: Option<&Path>, snapshot: Option<&Path>, html: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let units = snapshot_source(&config, snapshot).fetch()?;
    let nav = build_nav_tree(&units);

    if html {
        println!("{}", nav.to_html());
    } else {
        println!("{}", serde_json::to_string_pretty(&nav)?);
    }
    Ok(())
}

fn cmd_check(config_path: Option<&Path>, out: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let out_dir = out
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(&config.output.dir));

    if !out_dir.is_dir() {
        return Err(eyre!("output directory not found: {}", out_dir.display()));
    }

    let manifest = validate_site(&out_dir)?;
    println!(
        "{}: ok ({} pages, built {} by docbinder {})",
        out_dir.display(),
        manifest.page_count,
        manifest.built_at.to_rfc3339(),
        manifest.tool_version
    );
    Ok(())
}

fn cmd_config_init(config_path: Option<&Path>) -> Result<()> {
    // `--config some/dir/docbinder.toml` initializes `some/dir`.
    let dir = match config_path.and_then(Path::parent) {
        Some(parent) => parent.to_path_buf(),
        None => std::env::current_dir()?,
    };
    let path = init_config(&dir)?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config: SiteConfig = load_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn page_written(&self, path: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Writing [{current}/{total}] {path}"));
    }

    fn done(&self, _result: &BuildResult) {
        self.spinner.finish_and_clear();
    }
}
