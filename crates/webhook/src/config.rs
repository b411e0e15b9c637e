//! Webhook configuration

use anyhow::{Context, Result};
use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;
use webhook_lib::recommender::{
    Policy, ResourceDefaults, DEFAULT_CPU_LIMIT, DEFAULT_CPU_REQUEST, DEFAULT_MEMORY_LIMIT,
    DEFAULT_MEMORY_REQUEST,
};
use webhook_lib::selector::DEFAULT_IMAGE_MARKER;
use webhook_lib::usage::{DEFAULT_PROMETHEUS_URL, DEFAULT_QUERY_TIMEOUT};
use webhook_lib::WorkloadSelector;

/// Environment variable prefix, e.g. `WEBHOOK_PROMETHEUS_URL`
pub const ENV_PREFIX: &str = "WEBHOOK";

/// Optional config file, read before the environment
pub const CONFIG_FILE_ENV: &str = "WEBHOOK_CONFIG_FILE";

/// Webhook configuration
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookConfig {
    /// Instance name used in structured logs
    #[serde(default = "default_instance")]
    pub instance: String,

    /// HTTPS listen port
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// Serve plain HTTP when false (local development only)
    #[serde(default = "default_tls_enabled")]
    pub tls_enabled: bool,

    #[serde(default = "default_tls_cert_path")]
    pub tls_cert_path: String,

    #[serde(default = "default_tls_key_path")]
    pub tls_key_path: String,

    /// Base URL of the Prometheus-compatible metrics backend
    #[serde(default = "default_prometheus_url")]
    pub prometheus_url: String,

    /// Per-query timeout in milliseconds
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,

    /// Image substring selecting the container to resize
    #[serde(default = "default_image_marker")]
    pub image_marker: String,

    /// Regex over pod names included in the usage percentile
    #[serde(default = "default_pod_pattern")]
    pub pod_pattern: String,

    /// Regex over container names excluded from the usage percentile
    #[serde(default = "default_excluded_containers")]
    pub excluded_containers: String,

    #[serde(default = "default_cpu_request")]
    pub default_cpu_request: String,

    #[serde(default = "default_cpu_limit")]
    pub default_cpu_limit: String,

    #[serde(default = "default_memory_request")]
    pub default_memory_request: String,

    #[serde(default = "default_memory_limit")]
    pub default_memory_limit: String,
}

fn default_instance() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "resource-webhook".to_string())
}

fn default_listen_port() -> u16 {
    443
}

fn default_tls_enabled() -> bool {
    true
}

fn default_tls_cert_path() -> String {
    "/certs/tls.crt".to_string()
}

fn default_tls_key_path() -> String {
    "/certs/tls.key".to_string()
}

fn default_prometheus_url() -> String {
    DEFAULT_PROMETHEUS_URL.to_string()
}

fn default_query_timeout_ms() -> u64 {
    DEFAULT_QUERY_TIMEOUT.as_millis() as u64
}

fn default_image_marker() -> String {
    DEFAULT_IMAGE_MARKER.to_string()
}

fn default_pod_pattern() -> String {
    WorkloadSelector::default().pod_pattern
}

fn default_excluded_containers() -> String {
    WorkloadSelector::default().excluded_containers
}

fn default_cpu_request() -> String {
    DEFAULT_CPU_REQUEST.to_string()
}

fn default_cpu_limit() -> String {
    DEFAULT_CPU_LIMIT.to_string()
}

fn default_memory_request() -> String {
    DEFAULT_MEMORY_REQUEST.to_string()
}

fn default_memory_limit() -> String {
    DEFAULT_MEMORY_LIMIT.to_string()
}

impl WebhookConfig {
    /// Load configuration from the optional config file and the environment
    pub fn load() -> Result<Self> {
        let file = std::env::var(CONFIG_FILE_ENV).ok();
        Self::from_sources(file.as_deref(), config::Environment::with_prefix(ENV_PREFIX))
    }

    /// Environment values override file values
    pub fn from_sources(file: Option<&str>, env: config::Environment) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(config::File::with_name(path));
        }

        builder
            .add_source(env)
            .build()
            .context("Failed to read webhook configuration")?
            .try_deserialize()
            .context("Invalid webhook configuration")
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.listen_port))
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    pub fn selector(&self) -> WorkloadSelector {
        WorkloadSelector {
            pod_pattern: self.pod_pattern.clone(),
            excluded_containers: self.excluded_containers.clone(),
        }
    }

    pub fn policy(&self) -> Policy {
        Policy {
            image_marker: self.image_marker.clone(),
            cpu: ResourceDefaults {
                request: self.default_cpu_request.clone(),
                limit: self.default_cpu_limit.clone(),
            },
            memory: ResourceDefaults {
                request: self.default_memory_request.clone(),
                limit: self.default_memory_limit.clone(),
            },
        }
    }
}
