//! Prometheus metrics for the airdrop tool.
//!
//! All metrics are aggregated in the [`Metrics`] struct.

use action::{SubmitError, SubmitOutcome};
use lifecycle::LifecycleError;
use metrics::{counter, describe_counter, describe_gauge, gauge};

/// Aggregated metrics for submissions.
///
/// Metrics are registered with the global metrics registry on creation and
/// are no-ops until an exporter is installed.
#[derive(Debug, Clone)]
pub struct Metrics {
    _private: (),
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    /// Create a new metrics instance and register all metric descriptions.
    pub fn new() -> Self {
        Self::register_descriptions();
        Self { _private: () }
    }

    fn register_descriptions() {
        describe_counter!(
            "airdrop_submissions_total",
            "Total number of submissions started"
        );
        describe_counter!(
            "airdrop_submissions_refused_total",
            "Total number of submissions refused before they started, by reason"
        );
        describe_counter!(
            "airdrop_submissions_success_total",
            "Total number of submissions whose transfer was confirmed"
        );
        describe_counter!(
            "airdrop_submissions_failure_total",
            "Total number of failed submissions by reason"
        );
        describe_counter!(
            "airdrop_submissions_cancelled_total",
            "Total number of submissions the wallet never answered"
        );
        describe_counter!(
            "airdrop_approvals_total",
            "Total number of confirmed approvals"
        );
        describe_gauge!(
            "airdrop_last_recipients",
            "Number of recipients in the last submission"
        );
    }

    /// Record how a submission of `recipients` transfers ended.
    ///
    /// A refused submission never started and is only counted as refused.
    pub fn record_outcome(&self, recipients: usize, outcome: &Result<SubmitOutcome, SubmitError>) {
        if let Err(e) = outcome {
            if e.is_refused() {
                counter!("airdrop_submissions_refused_total", "reason" => reason(e)).increment(1);
                return;
            }
        }

        counter!("airdrop_submissions_total").increment(1);
        gauge!("airdrop_last_recipients").set(recipients as f64);

        match outcome {
            Ok(SubmitOutcome::Confirmed { approval, .. }) => {
                if approval.is_some() {
                    counter!("airdrop_approvals_total").increment(1);
                }
                counter!("airdrop_submissions_success_total").increment(1);
            }
            Ok(SubmitOutcome::Cancelled) => {
                counter!("airdrop_submissions_cancelled_total").increment(1);
            }
            Err(e) => {
                counter!("airdrop_submissions_failure_total", "reason" => reason(e)).increment(1);
            }
        }
    }
}

const fn reason(error: &SubmitError) -> &'static str {
    match error {
        SubmitError::UnsupportedChain(_) => "unsupported_chain",
        SubmitError::NotReady(_) => "not_ready",
        SubmitError::Lifecycle(LifecycleError::Busy(_)) => "busy",
        SubmitError::Lifecycle(LifecycleError::NoRuntime) => "no_runtime",
        SubmitError::Preflight(_) => "preflight",
        SubmitError::Reverted { .. } => "reverted",
        SubmitError::Chain(_) => "chain",
    }
}

/// Install the Prometheus metrics exporter and start the HTTP server.
///
/// Returns an error if the server fails to bind to the specified port.
pub fn install_prometheus_exporter(port: u16) -> eyre::Result<()> {
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::net::SocketAddr;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| eyre::eyre!("Failed to install Prometheus exporter: {}", e))?;

    Ok(())
}
