//! Logging setup.
//!
//! Everything goes to stderr: `setup --format json`, `catalog show` and the
//! `serve` protocol own stdout. `-v` raises this crate's level first; the
//! HTTP stack stays at `warn` until `-vvv`.
//! `CLASSGUIDE_LOG_LEVEL` replaces the computed filter entirely.

use std::io::IsTerminal;

use tracing_subscriber::EnvFilter;

use crate::cli::args::ColorChoice;

const LOG_LEVEL_ENV: &str = "CLASSGUIDE_LOG_LEVEL";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with optional ANSI colors.
    #[default]
    Human,
    /// Newline-delimited JSON for machine consumption.
    Json,
}

/// Filter directives for a `-v` count.
///
/// ```
/// use classguide::observability::logging::directives;
///
/// assert_eq!(directives(0), "warn");
/// assert_eq!(directives(2), "warn,classguide=debug");
/// ```
#[must_use]
pub fn directives(verbosity: u8) -> String {
    match verbosity {
        0 => "warn".to_string(),
        1 => "warn,classguide=info".to_string(),
        2 => "warn,classguide=debug".to_string(),
        _ => "debug,classguide=trace".to_string(),
    }
}

fn ansi_enabled(color: ColorChoice) -> bool {
    match color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => {
            std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none()
        }
    }
}

/// Installs the global subscriber. Later calls are no-ops.
pub fn init_logging(format: LogFormat, verbosity: u8, color: ColorChoice) {
    let filter = EnvFilter::try_from_env(LOG_LEVEL_ENV)
        .unwrap_or_else(|_| EnvFilter::new(directives(verbosity)));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbosity >= 2)
        .with_writer(std::io::stderr);

    let _ = match format {
        LogFormat::Human => builder.with_ansi(ansi_enabled(color)).try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
