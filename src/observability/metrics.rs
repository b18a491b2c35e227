//! Metrics for catalog refreshes and lookups.
//!
//! Recording goes through the `metrics` facade and is a no-op until a
//! recorder is installed with [`init_metrics`].

use std::sync::atomic::{AtomicBool, Ordering};

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error::ConfigError;

/// Guard to prevent double-initialization of the metrics recorder.
static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initializes the global metrics recorder.
///
/// When `port` is `Some`, a Prometheus HTTP listener is started on
/// `127.0.0.1:<port>`. When `None`, the recorder is installed without an
/// HTTP endpoint.
///
/// # Errors
///
/// Returns `ConfigError::Metrics` if the recorder or HTTP listener cannot
/// be installed (e.g. port already in use).
pub fn init_metrics(port: Option<u16>) -> Result<(), ConfigError> {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        tracing::debug!("metrics already initialized, skipping");
        return Ok(());
    }
    port.map_or_else(
        || PrometheusBuilder::new().install_recorder().map(|_| ()),
        |p| {
            PrometheusBuilder::new()
                .with_http_listener(([127, 0, 0, 1], p))
                .install()
        },
    )
    .map_err(|e| ConfigError::Metrics(e.to_string()))?;

    describe_metrics();
    Ok(())
}

fn describe_metrics() {
    describe_counter!(
        "classguide_catalog_refresh_total",
        "Catalog refresh attempts by outcome"
    );
    describe_counter!(
        "classguide_catalog_stale_served_total",
        "Reads answered with a catalog past its freshness window"
    );
    describe_gauge!(
        "classguide_catalog_items",
        "Item references in the current catalog"
    );
    describe_counter!("classguide_lookups_total", "Preset lookups by outcome");
}

/// Records a catalog refresh attempt.
///
/// `outcome` is one of `success`, `fetch_error`, `parse_error`.
pub fn record_catalog_refresh(outcome: &'static str) {
    counter!("classguide_catalog_refresh_total", "outcome" => outcome).increment(1);
}

/// Records a read served from a stale catalog.
pub fn record_stale_served() {
    counter!("classguide_catalog_stale_served_total").increment(1);
}

/// Sets the item count of the current catalog.
#[allow(clippy::cast_precision_loss)]
pub fn set_catalog_items(items: usize) {
    gauge!("classguide_catalog_items").set(items as f64);
}

/// Records a lookup.
///
/// `outcome` is one of `found`, `empty`, `phase_not_configured`,
/// `unavailable`.
pub fn record_lookup(outcome: &'static str) {
    counter!("classguide_lookups_total", "outcome" => outcome).increment(1);
}
