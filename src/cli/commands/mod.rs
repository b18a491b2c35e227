//! CLI command dispatch and handlers
//!
//! Routes parsed CLI arguments to the appropriate command handler.

pub mod catalog;
pub mod completions;
pub mod phase;
pub mod serve;
pub mod setup;
pub mod version;

use std::sync::Arc;

use crate::catalog::{CatalogCache, PageParser, WikiFetcher};
use crate::cli::args::{CatalogSubcommand, Cli, Commands, PhaseSubcommand};
use crate::config::GuideConfig;
use crate::error::GuideError;
use crate::phase::PhaseStore;
use crate::query::PresetService;

/// Dispatch a parsed CLI invocation to the appropriate command handler.
///
/// # Errors
///
/// Returns an error if the dispatched command handler fails.
pub async fn dispatch(cli: Cli) -> Result<(), GuideError> {
    let config = cli.config.to_config();
    match cli.command {
        Commands::Phase(cmd) => match cmd.subcommand {
            PhaseSubcommand::Get(args) => phase::get(&args, &config),
            PhaseSubcommand::Set(args) => phase::set(&args, &config),
            PhaseSubcommand::List(args) => phase::list(&args, &config),
        },
        Commands::Setup(args) => setup::run(&args, &config).await,
        Commands::Catalog(cmd) => match cmd.subcommand {
            CatalogSubcommand::Show(args) => catalog::show(&args, &config).await,
            CatalogSubcommand::Validate(args) => catalog::validate(&args, &config),
            CatalogSubcommand::Refresh(args) => catalog::refresh(&args, &config).await,
        },
        Commands::Serve(args) => serve::run(&args, &config).await,
        Commands::Completions(args) => {
            completions::run(&args);
            Ok(())
        }
        Commands::Version(args) => version::run(&args),
    }
}

/// Wires the phase store, fetcher, parser and cache described by `config`.
///
/// Nothing is downloaded here; the first lookup fills the cache.
///
/// # Errors
///
/// Returns a config error for invalid settings or an unreadable state
/// file, and a fetch error if the HTTP client cannot be built.
pub fn build_service(config: &GuideConfig) -> Result<PresetService, GuideError> {
    config.validate()?;
    if let Some(port) = config.metrics_port {
        crate::observability::init_metrics(Some(port))?;
        tracing::info!(port, "Prometheus metrics endpoint started");
    }

    let phases = PhaseStore::open(&config.state_file)?;
    let fetcher = WikiFetcher::new(&config.wiki_url, config.timeout, config.max_page_size)?;
    let cache = CatalogCache::new(
        Arc::new(fetcher),
        PageParser::new(&config.wiki_base),
        config.cache_settings(),
    );
    Ok(PresetService::new(Arc::new(phases), Arc::new(cache)))
}

/// Opens only the phase store, for commands that never touch the wiki.
///
/// # Errors
///
/// Returns a config error for invalid settings or an unreadable state file.
pub fn open_phase_store(config: &GuideConfig) -> Result<PhaseStore, GuideError> {
    config.validate()?;
    Ok(PhaseStore::open(&config.state_file)?)
}
