//! Prometheus metrics for the token console.
//!
//! All metrics are aggregated in the [`Metrics`] struct. Without an installed
//! exporter the recording calls are no-ops.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use session::{ActionKind, SessionState};
use std::time::Duration;

/// Aggregated metrics for the console.
///
/// Metrics are registered with the global metrics registry on creation.
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
        // Transaction metrics
        describe_counter!(
            "token_console_actions_total",
            "Total transfers and approvals by action and outcome"
        );
        describe_histogram!(
            "token_console_action_duration_seconds",
            "Time from submission to confirmation in seconds"
        );

        // Read metrics
        describe_counter!(
            "token_console_reads_total",
            "Total balance, allowance and lookup reads by kind and outcome"
        );

        // Balance metrics (gauges - current values)
        describe_gauge!(
            "token_console_token_balance",
            "Connected account token balance in token units"
        );
        describe_gauge!(
            "token_console_native_balance",
            "Connected account native balance in ether"
        );
        describe_gauge!(
            "token_console_pending_actions",
            "Transactions waiting for confirmation"
        );
    }

    /// Record a finished transfer or approval.
    pub fn record_action(&self, kind: ActionKind, success: bool, duration: Duration) {
        counter!(
            "token_console_actions_total",
            "action" => kind.to_string(),
            "outcome" => outcome(success)
        )
        .increment(1);
        histogram!("token_console_action_duration_seconds", "action" => kind.to_string())
            .record(duration.as_secs_f64());
    }

    /// Record a read such as `refresh`, `allowance` or `lookup`.
    pub fn record_read(&self, kind: &'static str, success: bool) {
        counter!("token_console_reads_total", "kind" => kind, "outcome" => outcome(success))
            .increment(1);
    }

    /// Publish the balances and pending flags of a snapshot.
    pub fn observe_state(&self, state: &SessionState) {
        if let Ok(balance) = state.token_balance.parse::<f64>() {
            gauge!("token_console_token_balance").set(balance);
        }
        if let Ok(balance) = state.native_balance.parse::<f64>() {
            gauge!("token_console_native_balance").set(balance);
        }

        let pending = u8::from(state.pending.transfer) + u8::from(state.pending.approve);
        gauge!("token_console_pending_actions").set(f64::from(pending));
    }
}

const fn outcome(success: bool) -> &'static str {
    if success {
        "success"
    } else {
        "failure"
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
