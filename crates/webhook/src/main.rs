//! Resource Webhook - mutating admission webhook for container requests
//!
//! Runs as a Deployment behind a MutatingWebhookConfiguration and sets the
//! target container's resource requests from recent namespace usage.

use anyhow::{Context, Result};
use resource_webhook::{api, config::WebhookConfig};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use webhook_lib::{
    health::{components, HealthRegistry},
    Mutator, PrometheusClient, Recommender, StructuredLogger, WebhookMetrics,
};

const WEBHOOK_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting resource-webhook");

    let config = WebhookConfig::load()?;
    info!(
        instance = %config.instance,
        prometheus_url = %config.prometheus_url,
        image_marker = %config.image_marker,
        "Webhook configured"
    );

    let health_registry = HealthRegistry::new();
    health_registry.register(components::SERVER).await;
    health_registry.register(components::METRICS_BACKEND).await;

    let metrics = WebhookMetrics::new();
    let logger = StructuredLogger::new(&config.instance);

    let usage = PrometheusClient::new(
        &config.prometheus_url,
        config.selector(),
        config.query_timeout(),
    )
    .context("Failed to create metrics backend client")?
    .with_health(health_registry.clone())
    .with_logger(logger.clone());

    let recommender =
        Recommender::new(Arc::new(usage), config.policy()).with_logger(logger.clone());
    let mutator = Mutator::new(recommender).with_logger(logger.clone());
    let app_state = Arc::new(api::AppState::new(mutator, health_registry.clone(), metrics));

    health_registry.set_ready(true).await;
    logger.log_startup(
        WEBHOOK_VERSION,
        &config.listen_addr().to_string(),
        config.tls_enabled,
    );

    let server = tokio::spawn(api::serve(config, app_state));

    tokio::select! {
        result = server => {
            result.context("Server task panicked")??;
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            logger.log_shutdown("SIGINT received");
        }
    }

    info!("Shutting down");
    Ok(())
}
