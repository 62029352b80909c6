//! Metrics collection.
//!
//! # Metrics
//! - `wallet_bridge_signing_requests_total` (counter): by provider, outcome
//! - `wallet_bridge_transactions_signed_total` (counter): by provider
//! - `wallet_bridge_submissions_total` (counter): by outcome
//! - `wallet_bridge_node_health` (gauge): 1=healthy, 0=unhealthy, by endpoint
//!
//! Recording goes through the `metrics` facade; the host decides on an exporter.

use std::sync::atomic::{AtomicBool, Ordering};

use metrics::{counter, gauge};

static ENABLED: AtomicBool = AtomicBool::new(true);

/// Turn metric recording on or off process-wide.
pub fn set_enabled(enabled: bool) {
    ENABLED.store(enabled, Ordering::Relaxed);
}

pub fn enabled() -> bool {
    ENABLED.load(Ordering::Relaxed)
}

/// Record the outcome of one signing request sent to a provider.
pub fn record_signing_request(provider: &str, outcome: &'static str) {
    if !enabled() {
        return;
    }
    counter!(
        "wallet_bridge_signing_requests_total",
        "provider" => provider.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_transactions_signed(provider: &str, count: usize) {
    if !enabled() {
        return;
    }
    counter!(
        "wallet_bridge_transactions_signed_total",
        "provider" => provider.to_string()
    )
    .increment(count as u64);
}

/// Record a submission outcome (`accepted`, `rejected`, `confirmed`, `timeout`).
pub fn record_submission(outcome: &'static str) {
    if !enabled() {
        return;
    }
    counter!("wallet_bridge_submissions_total", "outcome" => outcome).increment(1);
}

pub fn record_node_health(endpoint: &str, healthy: bool) {
    if !enabled() {
        return;
    }
    gauge!("wallet_bridge_node_health", "endpoint" => endpoint.to_string())
        .set(if healthy { 1.0 } else { 0.0 });
}
