//! Metrics helper structs for convenient metric recording

use std::time::Duration;

use prometheus::{Encoder, TextEncoder};

use super::{
    FETCH_FAILURES_TOTAL, RENDERS_TOTAL, RENDER_LATENCY, TEMPLATES_OVERWRITTEN_TOTAL,
    TEMPLATES_REGISTERED_TOTAL,
};
use crate::source::FetchError;
use crate::template::{TemplateError, TemplateErrorKind, TemplateType};

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording registration metrics
pub struct RegistrationMetrics;

impl RegistrationMetrics {
    /// Record a template registration
    pub fn record_registered(engine: TemplateType, overwritten: bool) {
        TEMPLATES_REGISTERED_TOTAL
            .with_label_values(&[engine.as_str()])
            .inc();
        if overwritten {
            TEMPLATES_OVERWRITTEN_TOTAL
                .with_label_values(&[engine.as_str()])
                .inc();
        }
    }
}

/// Helper struct for recording render metrics
pub struct RenderMetrics;

impl RenderMetrics {
    /// Record the outcome and latency of a render call
    pub fn record<T>(pipeline: &str, result: &Result<T, TemplateError>, elapsed: Duration) {
        let outcome = match result {
            Ok(_) => "success",
            Err(e) => match e.kind() {
                TemplateErrorKind::TemplateNotFound => "template_not_found",
                TemplateErrorKind::TemplateEngineNotFound => "engine_not_found",
                _ => "render_error",
            },
        };
        RENDERS_TOTAL.with_label_values(&[pipeline, outcome]).inc();
        RENDER_LATENCY
            .with_label_values(&[pipeline])
            .observe(elapsed.as_secs_f64());
    }
}

/// Helper struct for recording fetch metrics
pub struct FetchMetrics;

impl FetchMetrics {
    /// Record a failed fetch
    pub fn record_failure(error: &FetchError) {
        let kind = match error {
            FetchError::NotFound(_) => "not_found",
            FetchError::AccessDenied(_) => "access_denied",
            FetchError::Status { .. } => "status",
            FetchError::Io(_) => "io",
            FetchError::Http(_) => "http",
        };
        FETCH_FAILURES_TOTAL.with_label_values(&[kind]).inc();
    }
}
