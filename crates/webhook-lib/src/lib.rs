//! Resource request webhook library
//!
//! This crate provides the core functionality for:
//! - Kubernetes quantity conversion
//! - Usage percentiles from a Prometheus-compatible backend
//! - Target container selection and request recommendation
//! - AdmissionReview handling and JSON Patch encoding
//! - Health checks and observability

pub mod admission;
pub mod error;
pub mod health;
pub mod models;
pub mod observability;
pub mod quantity;
pub mod recommender;
pub mod selector;
pub mod usage;

pub use admission::{AdmissionRequest, AdmissionResponse, AdmissionReview, Mutator};
pub use error::{AdmissionError, QueryError};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{AdmissionOutcome, StructuredLogger, WebhookMetrics};
pub use quantity::ResourceKind;
pub use recommender::{Policy, Recommender};
pub use usage::{FixedUsage, PrometheusClient, UsageSource, WorkloadSelector};
