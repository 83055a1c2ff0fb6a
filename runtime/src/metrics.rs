//! Prometheus metrics for the store runtime.
//!
//! The store records through the `metrics` facade; nothing is exported
//! until a recorder is installed. [`MetricsServer`] installs the Prometheus
//! recorder, registers metric descriptions and serves the scrape endpoint
//! over HTTP on its address.
//!
//! # Example
//!
//! ```rust,no_run
//! use plugg_runtime::metrics::MetricsServer;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut server = MetricsServer::new("0.0.0.0:9090".parse()?);
//! server.start()?;
//! // Prometheus can now scrape http://0.0.0.0:9090/metrics
//!
//! if let Some(text) = server.render() {
//!     println!("{text}");
//! }
//! # Ok(())
//! # }
//! ```

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::time::Duration;
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

/// Prometheus metrics server.
pub struct MetricsServer {
    addr: SocketAddr,
    handle: Option<PrometheusHandle>,
}

impl MetricsServer {
    /// Create a new metrics server.
    ///
    /// # Arguments
    ///
    /// * `addr` - Address the scrape endpoint listens on (e.g., `0.0.0.0:9090`)
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self { addr, handle: None }
    }

    /// Register metric descriptions, install the Prometheus recorder and
    /// spawn the HTTP listener on the current Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns error if called outside a Tokio runtime, if the address
    /// cannot be bound, or if the recorder cannot be installed.
    ///
    /// If a recorder is already installed (e.g., by another test), this
    /// logs a warning and succeeds without a handle or listener.
    pub fn start(&mut self) -> Result<(), MetricsError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| MetricsError::Install(e.to_string()))?;
        register_metrics();

        let builder = PrometheusBuilder::new()
            .with_http_listener(self.addr)
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[
                    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
                ],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        let (recorder, exporter) = builder.build().map_err(|e| MetricsError::Build(e.to_string()))?;
        let handle = recorder.handle();

        // The only failure is a recorder installed earlier; the unused
        // exporter is dropped, which releases the address
        if metrics::set_global_recorder(recorder).is_err() {
            tracing::warn!("Metrics recorder already initialized, skipping re-initialization");
            return Ok(());
        }

        let addr = self.addr;
        runtime.spawn(async move {
            if exporter.await.is_err() {
                tracing::error!(addr = %addr, "Metrics listener stopped");
            }
        });
        self.handle = Some(handle);
        tracing::info!(addr = %self.addr, "Metrics served over HTTP");
        Ok(())
    }

    /// Get the metrics handle for rendering.
    #[must_use]
    pub const fn handle(&self) -> Option<&PrometheusHandle> {
        self.handle.as_ref()
    }

    /// Render current metrics in Prometheus format.
    ///
    /// Returns `None` if this server did not install the recorder.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

/// Register all metric descriptions.
fn register_metrics() {
    // Store
    describe_counter!("store.commands.total", "Total number of actions sent to the store");
    describe_histogram!(
        "store.reducer.duration_seconds",
        "Time taken by one reducer call"
    );
    describe_histogram!("store.effects.count", "Number of effects returned per action");
    describe_counter!("store.effects.executed", "Effects executed, by effect type");

    // Shutdown
    describe_counter!("store.shutdown.initiated", "Graceful shutdowns initiated");
    describe_counter!("store.shutdown.completed", "Graceful shutdowns that drained all effects");
    describe_counter!("store.shutdown.timeout", "Graceful shutdowns that timed out");
    describe_counter!(
        "store.shutdown.rejected_actions",
        "Actions rejected because the store was shutting down"
    );

    // Async actions
    describe_counter!("store.async.started", "Async actions started, by action kind");
    describe_counter!("store.async.settled", "Async actions settled, by settled kind");
    describe_histogram!(
        "store.async.duration_seconds",
        "Time from Started to the settled signal"
    );
}

/// Async action metrics recorder.
pub struct AsyncActionMetrics;

impl AsyncActionMetrics {
    /// Record a Started signal.
    pub fn record_started(kind: &str) {
        counter!("store.async.started", "action" => kind.to_string()).increment(1);
    }

    /// Record a settled signal and the time it took.
    pub fn record_settled(kind: &str, duration: Duration) {
        counter!("store.async.settled", "action" => kind.to_string()).increment(1);
        histogram!("store.async.duration_seconds", "action" => kind.to_string())
            .record(duration.as_secs_f64());
    }
}
