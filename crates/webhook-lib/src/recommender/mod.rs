//! Resource request recommendation
//!
//! Per resource kind, the recommended request is the observed 95th percentile
//! capped at the declared limit. Without an observation the declared request
//! is kept as is. Nothing is remembered between calls: the result depends only
//! on the container spec and the current observations.

mod policy;

pub use policy::{
    Policy, ResourceDefaults, DEFAULT_CPU_LIMIT, DEFAULT_CPU_REQUEST, DEFAULT_MEMORY_LIMIT,
    DEFAULT_MEMORY_REQUEST,
};

use crate::models::{
    Container, Observations, Recommendation, RecommendationSource, ResourceRecommendation,
};
use crate::observability::{StructuredLogger, WebhookMetrics};
use crate::quantity::ResourceKind;
use crate::usage::UsageSource;
use std::sync::Arc;

/// Compute the recommendation for one resource kind
pub fn recommend_resource(
    kind: ResourceKind,
    container: &Container,
    observation: Option<f64>,
    policy: &Policy,
) -> ResourceRecommendation {
    let defaults = policy.defaults_for(kind);
    let current_request =
        kind.parse(container.request(kind).unwrap_or(defaults.request.as_str()));
    // A limit of 0 (unset or unparsable) means "no limit"
    let limit = kind.parse(container.limit(kind).unwrap_or(defaults.limit.as_str()));
    let observed = observation.and_then(|raw| kind.from_observation(raw));

    let (recommended, source) = match observed {
        // A defaulted request can exceed a small declared limit
        None if limit > 0 => (current_request.min(limit), RecommendationSource::DeclaredRequest),
        None => (current_request, RecommendationSource::DeclaredRequest),
        Some(value) if limit > 0 && value > limit => (limit, RecommendationSource::ClampedToLimit),
        Some(value) => (value, RecommendationSource::Observed),
    };

    ResourceRecommendation {
        kind,
        current_request,
        limit,
        observed,
        recommended,
        source,
    }
}

/// Compute CPU and memory recommendations for a container
pub fn recommend(
    container: &Container,
    observations: &Observations,
    policy: &Policy,
) -> Recommendation {
    Recommendation {
        cpu: recommend_resource(
            ResourceKind::Cpu,
            container,
            observations.get(ResourceKind::Cpu),
            policy,
        ),
        memory: recommend_resource(
            ResourceKind::Memory,
            container,
            observations.get(ResourceKind::Memory),
            policy,
        ),
    }
}

/// Recommendation engine bound to a usage source
pub struct Recommender {
    usage: Arc<dyn UsageSource>,
    policy: Policy,
    metrics: WebhookMetrics,
    logger: StructuredLogger,
}

impl Recommender {
    pub fn new(usage: Arc<dyn UsageSource>, policy: Policy) -> Self {
        Self {
            usage,
            policy,
            metrics: WebhookMetrics::new(),
            logger: StructuredLogger::new("recommender"),
        }
    }

    pub fn with_logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Fetch CPU and memory percentiles for a namespace concurrently
    ///
    /// Without a namespace there is nothing to query and both are absent.
    pub async fn observe(&self, namespace: Option<&str>) -> Observations {
        let Some(namespace) = namespace else {
            return Observations::default();
        };

        let (cpu_cores, memory_bytes) = tokio::join!(
            self.usage.percentile(namespace, ResourceKind::Cpu),
            self.usage.percentile(namespace, ResourceKind::Memory),
        );

        Observations {
            cpu_cores,
            memory_bytes,
        }
    }

    /// Observe usage for the namespace and compute the container's recommendation
    pub async fn recommend_for(
        &self,
        namespace: Option<&str>,
        container: &Container,
    ) -> Recommendation {
        let observations = self.observe(namespace).await;
        let recommendation = recommend(container, &observations, &self.policy);

        for resource in [&recommendation.cpu, &recommendation.memory] {
            if resource.source == RecommendationSource::DeclaredRequest {
                self.metrics.inc_fallback(resource.kind);
            }
            self.logger
                .log_recommendation(namespace.unwrap_or(""), &container.name, resource);
        }

        recommendation
    }
}
