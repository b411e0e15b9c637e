//! CLI subcommands

pub mod recommend;
pub mod review;

use anyhow::{Context, Result};
use std::time::Duration;
use webhook_lib::{PrometheusClient, WorkloadSelector};

/// Metrics backend settings shared by the subcommands
pub struct Backend {
    pub url: String,
    pub timeout: Duration,
    pub verbose: bool,
}

impl Backend {
    pub fn client(&self, selector: WorkloadSelector) -> Result<PrometheusClient> {
        PrometheusClient::new(&self.url, selector, self.timeout)
            .with_context(|| format!("Invalid metrics backend URL: {}", self.url))
    }
}
