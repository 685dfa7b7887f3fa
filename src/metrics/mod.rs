//! Prometheus metrics for template registration and rendering.
//!
//! - Registration metrics (templates registered and overwritten per engine)
//! - Render metrics (renders by pipeline and outcome, render latency)
//! - Fetch metrics (content source failures)

mod helpers;

pub use helpers::{encode_metrics, FetchMetrics, RegistrationMetrics, RenderMetrics};

use lazy_static::lazy_static;
use prometheus::{register_histogram_vec, register_int_counter_vec, HistogramVec, IntCounterVec};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "ara_transformer";

lazy_static! {
    // ============================================================================
    // Registration Metrics
    // ============================================================================

    /// Templates registered, by engine
    pub static ref TEMPLATES_REGISTERED_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_templates_registered_total", METRIC_PREFIX),
        "Total templates registered",
        &["engine"]
    ).unwrap();

    /// Registrations that replaced an existing key, by engine
    pub static ref TEMPLATES_OVERWRITTEN_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_templates_overwritten_total", METRIC_PREFIX),
        "Total registrations that replaced an existing template key",
        &["engine"]
    ).unwrap();

    // ============================================================================
    // Render Metrics
    // ============================================================================

    /// Renders by pipeline and outcome
    pub static ref RENDERS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_renders_total", METRIC_PREFIX),
        "Total render calls",
        &["pipeline", "outcome"]
    ).unwrap();

    /// Render latency by pipeline
    pub static ref RENDER_LATENCY: HistogramVec = register_histogram_vec!(
        format!("{}_render_latency_seconds", METRIC_PREFIX),
        "Template render latency in seconds",
        &["pipeline"],
        vec![0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1]
    ).unwrap();

    // ============================================================================
    // Fetch Metrics
    // ============================================================================

    /// Content fetch failures by source kind
    pub static ref FETCH_FAILURES_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_fetch_failures_total", METRIC_PREFIX),
        "Total manifest or template fetch failures",
        &["kind"]
    ).unwrap();
}
