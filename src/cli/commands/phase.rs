//! `phase get`, `phase set` and `phase list`.

use serde_json::json;

use crate::cli::args::{OutputFormat, PhaseGetArgs, PhaseListArgs, PhaseSetArgs};
use crate::cli::commands::open_phase_store;
use crate::config::GuideConfig;
use crate::error::{GuideError, QueryError};
use crate::phase::resolve_phase;

/// Print the phase a server has selected.
///
/// # Errors
///
/// Returns `QueryError::PhaseNotConfigured` if the server has none.
pub fn get(args: &PhaseGetArgs, config: &GuideConfig) -> Result<(), GuideError> {
    let store = open_phase_store(config)?;
    let phase = store
        .get(&args.server)
        .ok_or_else(|| QueryError::PhaseNotConfigured {
            server: args.server.clone(),
        })?;

    match args.format {
        OutputFormat::Human => println!("{phase}"),
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string(&json!({ "server": args.server, "phase": phase }))?
        ),
    }
    Ok(())
}

/// Select a phase for a server.
///
/// Words are joined with spaces, so `phase set pre mech` works unquoted.
///
/// # Errors
///
/// Returns `QueryError::UnknownPhase` for unrecognised input, or a store
/// error if the selection cannot be written.
pub fn set(args: &PhaseSetArgs, config: &GuideConfig) -> Result<(), GuideError> {
    let input = args.phase.join(" ");
    let phase = resolve_phase(&input)?;
    let store = open_phase_store(config)?;
    store.set(&args.server, phase)?;
    println!("Phase for server '{}' set to {phase}.", args.server);
    Ok(())
}

/// List every server's selection.
///
/// # Errors
///
/// Returns a store error if the state file cannot be read.
pub fn list(args: &PhaseListArgs, config: &GuideConfig) -> Result<(), GuideError> {
    let store = open_phase_store(config)?;
    let selections = store.snapshot();

    match args.format {
        OutputFormat::Human => {
            if selections.is_empty() {
                println!("No server has selected a phase.");
            }
            let width = selections.keys().map(String::len).max().unwrap_or(0);
            for (server, phase) in &selections {
                println!("{server:<width$}  {phase}");
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&selections)?),
    }
    Ok(())
}
