//! Observability infrastructure for the webhook
//!
//! Provides:
//! - Prometheus metrics (admission outcomes and latency, backend query latency and failures)
//! - Structured JSON logging with tracing

use crate::error::QueryError;
use crate::models::{RecommendationSource, ResourceRecommendation};
use crate::quantity::ResourceKind;
use prometheus::{
    register_histogram, register_histogram_vec, register_int_counter_vec, Histogram, HistogramVec,
    IntCounterVec,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Default histogram buckets for latency measurements (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<WebhookMetricsInner> = OnceLock::new();

/// Final outcome of an admission review
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionOutcome {
    /// Allowed with a resource requests patch
    Patched,
    /// Allowed without a patch
    Unchanged,
    /// Rejected at the transport boundary (malformed review)
    Rejected,
}

impl AdmissionOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdmissionOutcome::Patched => "patched",
            AdmissionOutcome::Unchanged => "unchanged",
            AdmissionOutcome::Rejected => "rejected",
        }
    }
}

struct WebhookMetricsInner {
    admission_reviews: IntCounterVec,
    admission_latency_seconds: Histogram,
    query_latency_seconds: HistogramVec,
    query_failures: IntCounterVec,
    fallback_recommendations: IntCounterVec,
}

impl WebhookMetricsInner {
    fn new() -> Self {
        Self {
            admission_reviews: register_int_counter_vec!(
                "resource_webhook_admission_reviews_total",
                "Admission reviews handled, by outcome",
                &["outcome"]
            )
            .expect("Failed to register admission_reviews_total"),

            admission_latency_seconds: register_histogram!(
                "resource_webhook_admission_latency_seconds",
                "Time spent answering an admission review",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register admission_latency_seconds"),

            query_latency_seconds: register_histogram_vec!(
                "resource_webhook_metrics_query_latency_seconds",
                "Time spent querying the metrics backend",
                &["resource"],
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register metrics_query_latency_seconds"),

            query_failures: register_int_counter_vec!(
                "resource_webhook_metrics_query_failures_total",
                "Metrics backend queries that failed or timed out",
                &["resource"]
            )
            .expect("Failed to register metrics_query_failures_total"),

            fallback_recommendations: register_int_counter_vec!(
                "resource_webhook_fallback_recommendations_total",
                "Recommendations that kept the declared request for lack of data",
                &["resource"]
            )
            .expect("Failed to register fallback_recommendations_total"),
        }
    }
}

/// Webhook metrics for Prometheus exposition
///
/// Lightweight handle to the global metrics instance; clones share the same
/// underlying metrics.
#[derive(Clone)]
pub struct WebhookMetrics {
    _private: (),
}

impl Default for WebhookMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl WebhookMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(WebhookMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &WebhookMetricsInner {
        GLOBAL_METRICS.get_or_init(WebhookMetricsInner::new)
    }

    /// Record a handled admission review
    pub fn observe_admission(&self, outcome: AdmissionOutcome, duration_secs: f64) {
        let inner = self.inner();
        inner
            .admission_reviews
            .with_label_values(&[outcome.as_str()])
            .inc();
        inner.admission_latency_seconds.observe(duration_secs);
    }

    /// Record a metrics backend query latency observation
    pub fn observe_query_latency(&self, kind: ResourceKind, duration_secs: f64) {
        self.inner()
            .query_latency_seconds
            .with_label_values(&[kind.as_str()])
            .observe(duration_secs);
    }

    /// Increment failed query counter
    pub fn inc_query_failures(&self, kind: ResourceKind) {
        self.inner()
            .query_failures
            .with_label_values(&[kind.as_str()])
            .inc();
    }

    /// Increment counter of recommendations that fell back to the declared request
    pub fn inc_fallback(&self, kind: ResourceKind) {
        self.inner()
            .fallback_recommendations
            .with_label_values(&[kind.as_str()])
            .inc();
    }
}

/// Structured logger for webhook events
///
/// Provides consistent JSON-formatted logging for admissions,
/// recommendations and metrics backend failures.
#[derive(Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    /// Log webhook startup
    pub fn log_startup(&self, version: &str, addr: &str, tls: bool) {
        info!(
            event = "webhook_started",
            instance = %self.instance,
            version = %version,
            addr = %addr,
            tls = tls,
            "Resource webhook started"
        );
    }

    /// Log webhook shutdown
    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "webhook_shutdown",
            instance = %self.instance,
            reason = %reason,
            "Resource webhook shutting down"
        );
    }

    /// Log the decision for one admission review
    pub fn log_admission(
        &self,
        uid: &str,
        namespace: &str,
        pod_name: &str,
        container_index: Option<usize>,
        patched: bool,
    ) {
        info!(
            event = "admission_reviewed",
            instance = %self.instance,
            uid = %uid,
            namespace = %namespace,
            pod_name = %pod_name,
            container_index = ?container_index,
            patched = patched,
            "Admission review answered"
        );
    }

    /// Log a computed recommendation for one resource kind
    pub fn log_recommendation(
        &self,
        namespace: &str,
        container: &str,
        recommendation: &ResourceRecommendation,
    ) {
        match recommendation.source {
            RecommendationSource::DeclaredRequest => {
                info!(
                    event = "recommendation_computed",
                    instance = %self.instance,
                    namespace = %namespace,
                    container = %container,
                    resource = %recommendation.kind,
                    current_request = recommendation.current_request,
                    limit = recommendation.limit,
                    recommended = recommendation.recommended,
                    source = "declared_request",
                    "No usage data, keeping declared request"
                );
            }
            source => {
                let clamped = source == RecommendationSource::ClampedToLimit;
                info!(
                    event = "recommendation_computed",
                    instance = %self.instance,
                    namespace = %namespace,
                    container = %container,
                    resource = %recommendation.kind,
                    current_request = recommendation.current_request,
                    limit = recommendation.limit,
                    observed = ?recommendation.observed,
                    recommended = recommendation.recommended,
                    clamped = clamped,
                    "Computed request from usage percentile"
                );
            }
        }
    }

    /// Log a failed metrics backend query
    pub fn log_query_failure(&self, namespace: &str, kind: ResourceKind, error: &QueryError) {
        warn!(
            event = "metrics_query_failed",
            instance = %self.instance,
            namespace = %namespace,
            resource = %kind,
            error = %error,
            "Metrics backend query failed, treating usage as unavailable"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webhook_metrics_creation() {
        let metrics = WebhookMetrics::new();

        metrics.observe_admission(AdmissionOutcome::Patched, 0.004);
        metrics.observe_admission(AdmissionOutcome::Unchanged, 0.001);
        metrics.observe_query_latency(ResourceKind::Cpu, 0.02);
        metrics.inc_query_failures(ResourceKind::Memory);
        metrics.inc_fallback(ResourceKind::Memory);

        let families = prometheus::gather();
        assert!(families
            .iter()
            .any(|f| f.get_name() == "resource_webhook_admission_reviews_total"));
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("webhook-0");
        assert_eq!(logger.instance, "webhook-0");
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(AdmissionOutcome::Patched.as_str(), "patched");
        assert_eq!(AdmissionOutcome::Unchanged.as_str(), "unchanged");
        assert_eq!(AdmissionOutcome::Rejected.as_str(), "rejected");
    }
}
