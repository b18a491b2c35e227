//! `serve`: newline-delimited JSON requests on stdin, responses on stdout.

use tokio::io::BufReader;

use crate::cli::args::ServeArgs;
use crate::cli::commands::build_service;
use crate::config::{GuideConfig, env_or};
use crate::error::GuideError;
use crate::serve::{self, DEFAULT_MAX_REQUEST_SIZE};

/// Run the request loop until stdin closes.
///
/// # Errors
///
/// Returns a config error if the service cannot be built, or an I/O error
/// if stdin or stdout fail.
pub async fn run(args: &ServeArgs, config: &GuideConfig) -> Result<(), GuideError> {
    let service = build_service(config)?;

    if args.warm {
        // a failed warm-up is retried by the first lookup
        if let Err(e) = service.catalog().refresh().await {
            tracing::warn!(error = %e, "catalog warm-up failed");
        }
    }

    let max_request = env_or("CLASSGUIDE_MAX_REQUEST_SIZE", DEFAULT_MAX_REQUEST_SIZE);
    tracing::info!(max_request, "serving requests on stdin");
    serve::run(
        service,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
        max_request,
    )
    .await?;
    tracing::info!("stdin closed, exiting");
    Ok(())
}
