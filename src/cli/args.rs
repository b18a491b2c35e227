//! CLI argument definitions
//!
//! All Clap derive structs for `classguide` command-line parsing.

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use crate::config::{
    DEFAULT_STATE_FILE, DEFAULT_WIKI_BASE, DEFAULT_WIKI_URL, GuideConfig, parse_duration,
};
use crate::observability::LogFormat;

// ============================================================================
// Root CLI
// ============================================================================

/// Progression-aware class setups from the Terraria wiki.
#[derive(Parser, Debug)]
#[command(name = "classguide", author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-error output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output control.
    #[arg(long, default_value = "auto", global = true, env = "CLASSGUIDE_COLOR")]
    pub color: ColorChoice,

    /// Log line format on stderr.
    #[arg(long, default_value = "human", global = true, env = "CLASSGUIDE_LOG_FORMAT")]
    pub log_format: LogFormat,

    /// Settings shared by every command.
    #[command(flatten)]
    pub config: ConfigArgs,
}

/// Settings with environment fallbacks.
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Guide page to scrape.
    #[arg(long, global = true, env = "CLASSGUIDE_WIKI_URL", default_value = DEFAULT_WIKI_URL)]
    pub wiki_url: String,

    /// Base URL for relative item links.
    #[arg(long, global = true, env = "CLASSGUIDE_WIKI_BASE", default_value = DEFAULT_WIKI_BASE)]
    pub wiki_base: String,

    /// How long a parsed catalog stays fresh.
    #[arg(
        long,
        global = true,
        env = "CLASSGUIDE_CACHE_TTL",
        default_value = "1h",
        value_parser = parse_duration
    )]
    pub cache_ttl: Duration,

    /// Minimum wait between refresh attempts after a failure.
    #[arg(
        long,
        global = true,
        env = "CLASSGUIDE_RETRY_AFTER",
        default_value = "60s",
        value_parser = parse_duration
    )]
    pub retry_after: Duration,

    /// Bound on one page download.
    #[arg(
        long,
        global = true,
        env = "CLASSGUIDE_TIMEOUT",
        default_value = "15s",
        value_parser = parse_duration
    )]
    pub timeout: Duration,

    /// Phase selection file.
    #[arg(long, global = true, env = "CLASSGUIDE_STATE_FILE", default_value = DEFAULT_STATE_FILE)]
    pub state_file: PathBuf,

    /// Expose Prometheus metrics on 127.0.0.1:<port>.
    #[arg(long, global = true, env = "CLASSGUIDE_METRICS_PORT")]
    pub metrics_port: Option<u16>,
}

impl ConfigArgs {
    /// Merges the flags over the remaining defaults.
    #[must_use]
    pub fn to_config(&self) -> GuideConfig {
        GuideConfig {
            wiki_url: self.wiki_url.clone(),
            wiki_base: self.wiki_base.clone(),
            cache_ttl: self.cache_ttl,
            retry_after: self.retry_after,
            timeout: self.timeout,
            state_file: self.state_file.clone(),
            metrics_port: self.metrics_port,
            ..GuideConfig::default()
        }
    }
}

// ============================================================================
// Top-Level Commands
// ============================================================================

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show or change a server's progression phase.
    Phase(PhaseCommand),

    /// Show the class setup for a server's current phase.
    Setup(SetupArgs),

    /// Inspect the parsed guide page.
    Catalog(CatalogCommand),

    /// Answer newline-delimited JSON requests on stdin.
    Serve(ServeArgs),

    /// Generate shell completion scripts.
    Completions(CompletionsArgs),

    /// Display version and build information.
    Version(VersionArgs),
}

// ============================================================================
// Phase Command
// ============================================================================

/// Phase management commands.
#[derive(Args, Debug)]
pub struct PhaseCommand {
    /// Phase subcommand.
    #[command(subcommand)]
    pub subcommand: PhaseSubcommand,
}

/// Phase subcommands.
#[derive(Subcommand, Debug)]
pub enum PhaseSubcommand {
    /// Print the phase a server has selected.
    Get(PhaseGetArgs),

    /// Select a phase for a server.
    Set(PhaseSetArgs),

    /// List every server's selection.
    List(PhaseListArgs),
}

/// Arguments for `phase get`.
#[derive(Args, Debug)]
pub struct PhaseGetArgs {
    /// Server identifier.
    #[arg(short, long)]
    pub server: String,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

/// Arguments for `phase set`.
#[derive(Args, Debug)]
pub struct PhaseSetArgs {
    /// Server identifier.
    #[arg(short, long)]
    pub server: String,

    /// Phase name; close misspellings are accepted.
    #[arg(required = true, num_args = 1..)]
    pub phase: Vec<String>,
}

/// Arguments for `phase list`.
#[derive(Args, Debug)]
pub struct PhaseListArgs {
    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

// ============================================================================
// Setup Command
// ============================================================================

/// Arguments for `setup`.
#[derive(Args, Debug)]
pub struct SetupArgs {
    /// Server identifier.
    #[arg(short, long)]
    pub server: String,

    /// Class to show; overrides role detection.
    #[arg(short, long)]
    pub class: Option<String>,

    /// Role names of the member asking (repeatable).
    #[arg(short, long = "role")]
    pub roles: Vec<String>,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

// ============================================================================
// Catalog Command
// ============================================================================

/// Catalog inspection commands.
#[derive(Args, Debug)]
pub struct CatalogCommand {
    /// Catalog subcommand.
    #[command(subcommand)]
    pub subcommand: CatalogSubcommand,
}

/// Catalog subcommands.
#[derive(Subcommand, Debug)]
pub enum CatalogSubcommand {
    /// Download, parse and print the catalog.
    Show(CatalogShowArgs),

    /// Parse a saved copy of the guide page and report what was found.
    Validate(CatalogValidateArgs),

    /// Force a download of the guide page and report the cache state.
    Refresh(CatalogRefreshArgs),
}

/// Arguments for `catalog show`.
#[derive(Args, Debug)]
pub struct CatalogShowArgs {
    /// Only this phase.
    #[arg(short, long)]
    pub phase: Option<String>,

    /// Only this class.
    #[arg(short, long)]
    pub class: Option<String>,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

/// Arguments for `catalog validate`.
#[derive(Args, Debug)]
pub struct CatalogValidateArgs {
    /// Saved HTML page.
    pub file: PathBuf,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

/// Arguments for `catalog refresh`.
#[derive(Args, Debug)]
pub struct CatalogRefreshArgs {
    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

// ============================================================================
// Serve / Completions / Version
// ============================================================================

/// Arguments for `serve`.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Fetch the guide page before reading requests.
    #[arg(long)]
    pub warm: bool,
}

/// Arguments for shell completion generation.
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell for completion script.
    pub shell: clap_complete::Shell,
}

/// Arguments for version display.
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

// ============================================================================
// CLI-Local Enums
// ============================================================================

/// Color output choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorChoice {
    /// Auto-detect terminal support.
    #[default]
    Auto,
    /// Always use color.
    Always,
    /// Never use color.
    Never,
}

/// Output format for structured output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output.
    #[default]
    Human,
    /// JSON output.
    Json,
}

// ============================================================================
// Tests
// ============================================================================
