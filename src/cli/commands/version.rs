//! Version information display.

use serde_json::json;

use crate::cli::args::{OutputFormat, VersionArgs};
use crate::config::DEFAULT_WIKI_URL;
use crate::error::GuideError;

/// Print version and build information.
///
/// # Errors
///
/// Returns a JSON error if the JSON form cannot be serialized.
pub fn run(args: &VersionArgs) -> Result<(), GuideError> {
    let name = env!("CARGO_PKG_NAME");
    let version = env!("CARGO_PKG_VERSION");

    match args.format {
        OutputFormat::Human => {
            println!("{name} {version}");
        }
        OutputFormat::Json => {
            let info = json!({
                "name": name,
                "version": version,
                "default_wiki_url": DEFAULT_WIKI_URL,
            });
            println!("{}", serde_json::to_string(&info)?);
        }
    }
    Ok(())
}
