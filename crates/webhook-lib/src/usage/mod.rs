//! Usage percentiles from the metrics backend
//!
//! The recommender only sees the `UsageSource` capability. Backend failures
//! never cross it: any error collapses into an absent observation.

mod fixed;
mod prometheus;
pub mod promql;

pub use fixed::FixedUsage;
pub use self::prometheus::{PrometheusClient, DEFAULT_PROMETHEUS_URL, DEFAULT_QUERY_TIMEOUT};
pub use promql::WorkloadSelector;

use crate::quantity::ResourceKind;
use async_trait::async_trait;

/// Source of 95th percentile usage observations for a namespace
#[async_trait]
pub trait UsageSource: Send + Sync {
    /// Percentile for a resource kind (CPU in cores, memory in bytes), or
    /// `None` when no data is available
    async fn percentile(&self, namespace: &str, kind: ResourceKind) -> Option<f64>;
}
