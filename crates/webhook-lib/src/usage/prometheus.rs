//! Prometheus HTTP API client
//!
//! Issues instant queries against `/api/v1/query` and reads the first sample
//! of the returned vector. Every query is bounded by a timeout and never
//! retried; the admission path cannot wait on a slow backend.

use super::promql::{percentile_query, WorkloadSelector};
use super::UsageSource;
use crate::error::QueryError;
use crate::health::HealthRegistry;
use crate::observability::{StructuredLogger, WebhookMetrics};
use crate::quantity::ResourceKind;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::debug;
use url::Url;

/// Upper bound for a single percentile query
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(3);

/// In-cluster address of the metrics backend
pub const DEFAULT_PROMETHEUS_URL: &str = "http://prometheus-server.monitoring.svc.cluster.local";

const QUERY_PATH: &str = "api/v1/query";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResponse {
    status: String,
    #[serde(default)]
    data: Option<QueryData>,
    #[serde(default)]
    error_type: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QueryData {
    #[serde(default)]
    result: Vec<Sample>,
}

#[derive(Debug, Deserialize)]
struct Sample {
    /// `[unix_timestamp, "value"]`
    value: (serde_json::Value, String),
}

/// Metrics backend client speaking the Prometheus HTTP API
pub struct PrometheusClient {
    client: Client,
    query_url: Url,
    selector: WorkloadSelector,
    timeout: Duration,
    metrics: WebhookMetrics,
    logger: StructuredLogger,
    health: Option<HealthRegistry>,
}

impl PrometheusClient {
    /// Create a client for the backend at `base_url`
    pub fn new(
        base_url: &str,
        selector: WorkloadSelector,
        timeout: Duration,
    ) -> Result<Self, QueryError> {
        // Url::join drops the last path segment unless the base ends in '/'
        let base = if base_url.ends_with('/') {
            Url::parse(base_url)?
        } else {
            Url::parse(&format!("{}/", base_url))?
        };
        let query_url = base.join(QUERY_PATH)?;

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            query_url,
            selector,
            timeout,
            metrics: WebhookMetrics::new(),
            logger: StructuredLogger::new("prometheus-client"),
            health: None,
        })
    }

    /// Report query outcomes to a health registry
    pub fn with_health(mut self, health: HealthRegistry) -> Self {
        self.health = Some(health);
        self
    }

    pub fn with_logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn query_url(&self) -> &Url {
        &self.query_url
    }

    /// Run an instant query and return the first sample's value
    ///
    /// `Ok(None)` means the query succeeded with an empty result set.
    pub async fn query(&self, promql: &str) -> Result<Option<f64>, QueryError> {
        tokio::time::timeout(self.timeout, self.fetch(promql))
            .await
            .map_err(|_| QueryError::Timeout(self.timeout))?
    }

    /// Query the usage percentile for a namespace, surfacing errors
    pub async fn query_percentile(
        &self,
        namespace: &str,
        kind: ResourceKind,
    ) -> Result<Option<f64>, QueryError> {
        let promql = percentile_query(namespace, kind, &self.selector);
        debug!(
            namespace = %namespace,
            resource = %kind,
            query = %promql,
            "Querying usage percentile"
        );
        self.query(&promql).await
    }

    async fn fetch(&self, promql: &str) -> Result<Option<f64>, QueryError> {
        let response = self
            .client
            .get(self.query_url.clone())
            .query(&[("query", promql)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(QueryError::HttpStatus(status.as_u16()));
        }

        let body: QueryResponse = response.json().await?;
        if body.status != "success" {
            return Err(QueryError::Backend {
                error_type: body.error_type.unwrap_or_else(|| body.status.clone()),
                error: body.error.unwrap_or_default(),
            });
        }

        let Some(sample) = body.data.and_then(|d| d.result.into_iter().next()) else {
            return Ok(None);
        };
        let raw = sample.value.1;
        raw.trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| QueryError::InvalidValue(raw))
    }
}

#[async_trait]
impl UsageSource for PrometheusClient {
    async fn percentile(&self, namespace: &str, kind: ResourceKind) -> Option<f64> {
        let start = Instant::now();
        let result = self.query_percentile(namespace, kind).await;
        self.metrics
            .observe_query_latency(kind, start.elapsed().as_secs_f64());

        match result {
            Ok(value) => {
                if let Some(health) = &self.health {
                    health.report_query(None).await;
                }
                value
            }
            Err(e) => {
                self.metrics.inc_query_failures(kind);
                self.logger.log_query_failure(namespace, kind, &e);
                if let Some(health) = &self.health {
                    health.report_query(Some(&e.to_string())).await;
                }
                None
            }
        }
    }
}
