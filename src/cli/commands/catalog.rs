//! `catalog show`, `catalog validate` and `catalog refresh`.

use std::fmt::Write as _;

use serde::Serialize;

use crate::catalog::{PageParser, Presets};
use crate::cli::args::{CatalogRefreshArgs, CatalogShowArgs, CatalogValidateArgs, OutputFormat};
use crate::cli::commands::build_service;
use crate::cli::commands::setup::render;
use crate::config::GuideConfig;
use crate::error::{GuideError, QueryError};
use crate::model::{ClassRole, Phase};
use crate::phase::resolve_phase;
use crate::query::Preset;

/// Download (or reuse), parse and print the catalog.
///
/// # Errors
///
/// Returns a query error for an unknown `--phase`/`--class` filter, or a
/// catalog error if the page cannot be fetched or parsed.
pub async fn show(args: &CatalogShowArgs, config: &GuideConfig) -> Result<(), GuideError> {
    let phase = args.phase.as_deref().map(resolve_phase).transpose()?;
    let class = args
        .class
        .as_deref()
        .map(|name| {
            ClassRole::from_role_name(name).ok_or_else(|| QueryError::UnknownClass {
                input: name.to_string(),
            })
        })
        .transpose()?;

    let service = build_service(config)?;
    let catalog = service.catalog().get().await?;

    let presets: Vec<Preset> = catalog
        .presets
        .iter()
        .filter(|(p, c, _)| phase.is_none_or(|want| want == *p) && class.is_none_or(|want| want == *c))
        .map(|(phase, class, items)| Preset {
            phase,
            class,
            items: items.to_vec(),
        })
        .collect();

    match args.format {
        OutputFormat::Human => {
            println!(
                "Fetched {} from {}",
                catalog.fetched_at.to_rfc3339(),
                config.wiki_url
            );
            for preset in &presets {
                print!("\n{}", render(preset));
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&presets)?),
    }
    Ok(())
}

/// Force a download and print the resulting cache status.
///
/// # Errors
///
/// Returns a catalog error if the page cannot be fetched or parsed.
pub async fn refresh(args: &CatalogRefreshArgs, config: &GuideConfig) -> Result<(), GuideError> {
    let service = build_service(config)?;
    let catalog = service.catalog().refresh().await?;
    let status = service.catalog().status().await;

    match args.format {
        OutputFormat::Human => println!(
            "Fetched {} items from {} at {}",
            catalog.presets.total_items(),
            config.wiki_url,
            catalog.fetched_at.to_rfc3339()
        ),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&status)?),
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct EntryCount {
    phase: Phase,
    class: ClassRole,
    items: usize,
}

#[derive(Debug, Serialize)]
struct ValidationReport {
    valid: bool,
    total_items: usize,
    entries: Vec<EntryCount>,
}

impl ValidationReport {
    fn from_presets(presets: &Presets) -> Self {
        Self {
            valid: true,
            total_items: presets.total_items(),
            entries: presets
                .iter()
                .map(|(phase, class, items)| EntryCount {
                    phase,
                    class,
                    items: items.len(),
                })
                .collect(),
        }
    }

    fn render(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            let _ = writeln!(
                out,
                "{:<13} {:<9} {:>3} items",
                entry.phase.name(),
                entry.class.name(),
                entry.items
            );
        }
        let _ = writeln!(
            out,
            "OK: {} entries, {} items",
            self.entries.len(),
            self.total_items
        );
        out
    }
}

/// Parse a saved guide page and report per-entry item counts.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be read, or the parse error
/// that rejected the page.
pub fn validate(args: &CatalogValidateArgs, config: &GuideConfig) -> Result<(), GuideError> {
    let markup = std::fs::read_to_string(&args.file)?;
    tracing::info!(file = %args.file.display(), bytes = markup.len(), "validating page");

    let presets = PageParser::new(&config.wiki_base).parse(&markup)?;
    let report = ValidationReport::from_presets(&presets);

    match args.format {
        OutputFormat::Human => print!("{}", report.render()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}
