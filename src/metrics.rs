// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for the Columbus service.
//!
//! All metrics carry the `columbus_` namespace prefix and are exposed on
//! `/metrics`.
//!
//! # Metrics Categories
//!
//! - **Refresh Metrics** - dispatches, refresh outcomes, dropped demand
//! - **Lookup Metrics** - read-query outcomes per endpoint
//! - **Abuse Metrics** - blacklist insertions

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::LazyLock;

/// Namespace prefix for all Columbus metrics
const METRICS_NAMESPACE: &str = "columbus";

/// Global Prometheus metrics registry
///
/// All metrics are registered in this registry and exposed via the
/// `/metrics` endpoint.
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

/// Demand-channel enqueues dropped because the channel was full.
///
/// The HTTP edge never blocks on the refresh pipeline; a sustained non-zero
/// rate here means `DomainBuffer` or `DNSWorker` is undersized.
pub static DEMAND_DROPPED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    let counter = IntCounter::with_opts(Opts::new(
        format!("{METRICS_NAMESPACE}_demand_dropped_total"),
        "Demand-channel enqueues dropped because the channel was full",
    ))
    .unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// FQDNs handed to the reconciler by the scheduler.
pub static REFRESH_DISPATCHED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    let counter = IntCounter::with_opts(Opts::new(
        format!("{METRICS_NAMESPACE}_refresh_dispatched_total"),
        "FQDNs dispatched to the refresh reconciler",
    ))
    .unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Refresh outcomes.
///
/// Labels:
/// - `status`: `success`, `cooldown`, `error`
pub static REFRESH_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_refresh_total"),
        "Refresh runs by outcome",
    );
    let counter = IntCounterVec::new(opts, &["status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Lookup outcomes.
///
/// Labels:
/// - `endpoint`: `lookup`, `history`, `starts`, `tld`, `search`
/// - `outcome`: `hit`, `miss`
pub static LOOKUP_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_lookup_total"),
        "Read queries by endpoint and outcome",
    );
    let counter = IntCounterVec::new(opts, &["endpoint", "outcome"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Client IPs put on the blacklist.
pub static BLACKLIST_BLOCKS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    let counter = IntCounter::with_opts(Opts::new(
        format!("{METRICS_NAMESPACE}_blacklist_blocks_total"),
        "Client IPs added to the blacklist",
    ))
    .unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Record a dropped demand-channel enqueue.
pub fn record_demand_dropped() {
    DEMAND_DROPPED_TOTAL.inc();
}

/// Record one dispatched FQDN.
pub fn record_dispatch() {
    REFRESH_DISPATCHED_TOTAL.inc();
}

/// Record a refresh outcome.
///
/// # Arguments
/// * `status` - one of `success`, `cooldown`, `error`
pub fn record_refresh(status: &str) {
    REFRESH_TOTAL.with_label_values(&[status]).inc();
}

/// Record a read-query outcome.
///
/// # Arguments
/// * `endpoint` - the logical endpoint name
/// * `hit` - whether the query produced results
pub fn record_lookup(endpoint: &str, hit: bool) {
    let outcome = if hit { "hit" } else { "miss" };
    LOOKUP_TOTAL.with_label_values(&[endpoint, outcome]).inc();
}

/// Record a blacklist insertion.
pub fn record_blacklist_block() {
    BLACKLIST_BLOCKS_TOTAL.inc();
}

/// Gather and encode all metrics in Prometheus text format
///
/// # Returns
/// Prometheus-formatted metrics as a String
///
/// # Errors
/// Returns error if encoding fails
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}
