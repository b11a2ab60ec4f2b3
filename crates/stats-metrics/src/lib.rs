pub mod config;
pub mod counters;
pub mod histograms;

pub use config::MetricsConfig;

use metrics_exporter_prometheus::PrometheusBuilder;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("Invalid metrics configuration: {0}")]
    Config(String),

    #[error("Recorder error: {0}")]
    Recorder(String),
}

pub type Result<T> = std::result::Result<T, MetricsError>;

/// Install the Prometheus recorder and its scrape endpoint.
///
/// Without an installed recorder every metric call is a no-op, so a run with
/// no port configured simply skips this. Must be called inside a tokio runtime.
pub fn install(config: &MetricsConfig) -> Result<()> {
    let Some(addr) = config.socket_addr()? else {
        return Ok(());
    };

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| MetricsError::Recorder(e.to_string()))?;

    counters::init();
    histograms::init();

    info!(address = %addr, "Metrics exporter listening");
    Ok(())
}
