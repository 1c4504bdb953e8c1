//! Prometheus metrics for the orchestrator
//!
//! Exposed on the /metrics endpoint for scraping.

#![allow(dead_code)]

use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_gauge, register_gauge_vec, CounterVec, Gauge, GaugeVec,
};

lazy_static! {
    // Chain observation metrics
    pub static ref ETH_LATEST_HEIGHT: Gauge = register_gauge!(
        "orchestrator_eth_latest_height",
        "Latest observed Ethereum block height"
    ).unwrap();

    pub static ref COSMOS_LATEST_HEIGHT: Gauge = register_gauge!(
        "orchestrator_cosmos_latest_height",
        "Latest observed Cosmos block height"
    ).unwrap();

    pub static ref ORACLE_BLOCK: Gauge = register_gauge!(
        "orchestrator_oracle_block",
        "Highest Ethereum block the oracle has scanned and handed off"
    ).unwrap();

    // Event and confirmation metrics
    pub static ref EVENTS_OBSERVED: CounterVec = register_counter_vec!(
        "orchestrator_events_observed_total",
        "Total finalized bridge events observed",
        &["kind"]
    ).unwrap();

    pub static ref CONFIRMS_RELAYED: CounterVec = register_counter_vec!(
        "orchestrator_confirms_relayed_total",
        "Total commitment confirmations handed to the signer",
        &["kind", "status"]
    ).unwrap();

    pub static ref DENOM_CACHE_ENTRIES: Gauge = register_gauge!(
        "orchestrator_denom_cache_entries",
        "Populated entries in the ERC20-to-denom cache"
    ).unwrap();

    // Error metrics
    pub static ref ERRORS: CounterVec = register_counter_vec!(
        "orchestrator_errors_total",
        "Total number of errors",
        &["component", "type"]
    ).unwrap();

    // Health metrics
    pub static ref UP: Gauge = register_gauge!(
        "orchestrator_up",
        "Whether the orchestrator is up and running"
    ).unwrap();

    pub static ref LAST_SUCCESSFUL_POLL: GaugeVec = register_gauge_vec!(
        "orchestrator_last_successful_poll_timestamp",
        "Unix timestamp of last successful poll",
        &["component"]
    ).unwrap();
}

/// Record the latest Ethereum height
pub fn record_eth_height(height: u64) {
    ETH_LATEST_HEIGHT.set(height as f64);
}

/// Record the latest Cosmos height
pub fn record_cosmos_height(height: u64) {
    COSMOS_LATEST_HEIGHT.set(height as f64);
}

/// Record oracle cursor advancement
pub fn record_oracle_block(block: u64) {
    ORACLE_BLOCK.set(block as f64);
}

/// Record an observed bridge event
pub fn record_event_observed(kind: &str) {
    EVENTS_OBSERVED.with_label_values(&[kind]).inc();
}

/// Record a confirmation hand-off
pub fn record_confirm_relayed(kind: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    CONFIRMS_RELAYED.with_label_values(&[kind, status]).inc();
}

/// Update the denom cache size gauge
pub fn set_denom_cache_entries(count: usize) {
    DENOM_CACHE_ENTRIES.set(count as f64);
}

/// Record an error
pub fn record_error(component: &str, error_type: &str) {
    ERRORS.with_label_values(&[component, error_type]).inc();
}

/// Record last successful poll
pub fn record_successful_poll(component: &str) {
    use std::time::{SystemTime, UNIX_EPOCH};
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0);
    LAST_SUCCESSFUL_POLL
        .with_label_values(&[component])
        .set(timestamp);
}
