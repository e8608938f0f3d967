// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for the traefik2dns controller.
//!
//! All metrics use the `traefik2dns_` prefix and are exposed on `/metrics` by the
//! binary's HTTP server.
//!
//! # Example
//!
//! ```rust,no_run
//! use traefik2dns::metrics::{gather_metrics, record_route_event};
//!
//! record_route_event("added");
//! let text = gather_metrics().unwrap();
//! assert!(text.contains("traefik2dns_route_events_total"));
//! ```

use prometheus::{CounterVec, Encoder, IntCounter, IntGauge, Opts, Registry, TextEncoder};
use std::sync::LazyLock;

// ============================================================================
// Metric Name Constants
// ============================================================================

/// Namespace prefix for all metrics (prometheus-safe)
const METRICS_NAMESPACE: &str = "traefik2dns";

/// `operation` label value for record creation
pub const OPERATION_CREATE: &str = "create";

/// `operation` label value for record deletion
pub const OPERATION_DELETE: &str = "delete";

/// `outcome` label value: the call changed the record
pub const OUTCOME_SUCCESS: &str = "success";

/// `outcome` label value: the record was already in the desired state
pub const OUTCOME_NOOP: &str = "noop";

/// `outcome` label value: the call failed
pub const OUTCOME_ERROR: &str = "error";

// ============================================================================
// Global Metrics Registry
// ============================================================================

/// Global Prometheus metrics registry
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

/// Route events handled, by kind (`added`, `updated`, `deleted`)
pub static ROUTE_EVENTS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_route_events_total"),
        "Total number of IngressRoute events handled by kind",
    );
    let counter = CounterVec::new(opts, &["event"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Record API calls by operation and outcome
pub static RECORD_OPERATIONS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_record_operations_total"),
        "Total number of DNSEndpoint operations by operation and outcome",
    );
    let counter = CounterVec::new(opts, &["operation", "outcome"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Delete calls repeated because of a write conflict
pub static DELETE_CONFLICT_RETRIES_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    let counter = IntCounter::new(
        format!("{METRICS_NAMESPACE}_delete_conflict_retries_total"),
        "Total number of write-conflict retries",
    )
    .unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Number of addresses resolved at startup
pub static RESOLVED_ADDRESSES: LazyLock<IntGauge> = LazyLock::new(|| {
    let gauge = IntGauge::new(
        format!("{METRICS_NAMESPACE}_resolved_addresses"),
        "Number of load balancer addresses used as record targets",
    )
    .unwrap();
    METRICS_REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

/// Record a handled route event
pub fn record_route_event(event: &str) {
    ROUTE_EVENTS_TOTAL.with_label_values(&[event]).inc();
}

/// Record the outcome of a record API call
///
/// # Arguments
/// * `operation` - [`OPERATION_CREATE`] or [`OPERATION_DELETE`]
/// * `outcome` - [`OUTCOME_SUCCESS`], [`OUTCOME_NOOP`] or [`OUTCOME_ERROR`]
pub fn record_operation(operation: &str, outcome: &str) {
    RECORD_OPERATIONS_TOTAL
        .with_label_values(&[operation, outcome])
        .inc();
}

/// Record one conflict retry
pub fn record_conflict_retry() {
    DELETE_CONFLICT_RETRIES_TOTAL.inc();
}

/// Record the size of the resolved address set
pub fn record_resolved_addresses(count: usize) {
    RESOLVED_ADDRESSES.set(i64::try_from(count).unwrap_or(i64::MAX));
}

/// Gather all metrics in Prometheus text format
///
/// # Errors
///
/// Returns an error if encoding fails
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}
