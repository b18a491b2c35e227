//! `setup`: the class setup for a server's current phase.

use std::fmt::Write as _;

use crate::cli::args::{OutputFormat, SetupArgs};
use crate::cli::commands::build_service;
use crate::config::GuideConfig;
use crate::error::GuideError;
use crate::query::Preset;

/// Print the preset for a member of `args.server`.
///
/// # Errors
///
/// Returns a query error if the server has no phase or no class can be
/// determined, or a catalog error if the guide page is unavailable.
pub async fn run(args: &SetupArgs, config: &GuideConfig) -> Result<(), GuideError> {
    let service = build_service(config)?;
    let preset = service
        .lookup_for_member(&args.server, args.class.as_deref(), &args.roles)
        .await?;

    match args.format {
        OutputFormat::Human => print!("{}", render(&preset)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&preset)?),
    }
    Ok(())
}

/// Renders a preset grouped by category, one linked item per line.
#[must_use]
pub fn render(preset: &Preset) -> String {
    let mut out = format!("{} setup for {}\n", preset.class, preset.phase);
    if preset.items.is_empty() {
        out.push_str("\nThe guide lists no items for this class and phase.\n");
        return out;
    }
    for group in preset.grouped() {
        let _ = write!(out, "\n{}:\n", group.category);
        for item in group.items {
            let _ = writeln!(out, "  {} <{}>", item.name, item.url);
        }
    }
    out
}
