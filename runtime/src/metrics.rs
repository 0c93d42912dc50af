//! Prometheus metrics for observability and monitoring.
//!
//! The Store records:
//! - `store.commands.total`: actions reduced
//! - `store.reducer.duration_seconds`: reducer latency
//! - `store.effects.executed{type}`: effects run, by kind
//! - `store.shutdown.*`: shutdown lifecycle
//!
//! The retry helper records `retry.attempts.total`, `retry.successes.total`
//! and `retry.exhausted.total`.
//!
//! # Example
//!
//! ```rust,no_run
//! use todo_store_runtime::metrics::MetricsServer;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut server = MetricsServer::new();
//! server.start()?;
//! println!("{}", server.render().unwrap_or_default());
//! # Ok(())
//! # }
//! ```

use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use thiserror::Error;

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Prometheus recorder holder.
///
/// Installs the global recorder and renders the scrape text on demand.
#[derive(Default)]
pub struct MetricsServer {
    handle: Option<PrometheusHandle>,
}

impl MetricsServer {
    /// Create a server that has not installed a recorder yet.
    #[must_use]
    pub const fn new() -> Self {
        Self { handle: None }
    }

    /// Register metric descriptions and install the Prometheus recorder.
    ///
    /// # Errors
    ///
    /// Returns error if the exporter cannot be built or installed. A recorder
    /// that is already installed (common in tests) is not an error.
    pub fn start(&mut self) -> Result<(), MetricsError> {
        register_metrics();

        let builder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[0.000_1, 0.000_5, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        match builder.install_recorder() {
            Ok(handle) => {
                self.handle = Some(handle);
                tracing::info!("Metrics recorder installed");
                Ok(())
            },
            Err(e) => {
                let err_msg = e.to_string();
                if err_msg.contains("already initialized") {
                    tracing::warn!("Metrics recorder already initialized, skipping re-initialization");
                    Ok(())
                } else {
                    Err(MetricsError::Install(err_msg))
                }
            },
        }
    }

    /// Render current metrics in Prometheus format.
    ///
    /// Returns `None` if this instance did not install the recorder.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

fn register_metrics() {
    describe_counter!("store.commands.total", "Total number of actions reduced by the store");
    describe_histogram!(
        "store.reducer.duration_seconds",
        "Time taken to run the reducer for one action"
    );
    describe_counter!("store.effects.executed", "Effects executed, labelled by type");
    describe_counter!("store.shutdown.initiated", "Graceful shutdowns started");
    describe_counter!("store.shutdown.completed", "Graceful shutdowns that drained all effects");
    describe_counter!("store.shutdown.timeout", "Graceful shutdowns that timed out");
    describe_counter!("store.shutdown.rejected_actions", "Actions rejected during shutdown");

    describe_counter!("retry.attempts.total", "Total number of retry attempts");
    describe_counter!("retry.successes.total", "Operations that succeeded after a retry");
    describe_counter!("retry.exhausted.total", "Operations that exhausted their retries");
}

/// Retry metrics recorder.
pub struct RetryMetrics;

impl RetryMetrics {
    /// Record a retry attempt.
    pub fn record_attempt() {
        metrics::counter!("retry.attempts.total").increment(1);
    }

    /// Record a successful retry.
    pub fn record_success() {
        metrics::counter!("retry.successes.total").increment(1);
    }

    /// Record exhausted retries.
    pub fn record_exhausted() {
        metrics::counter!("retry.exhausted.total").increment(1);
    }
}
