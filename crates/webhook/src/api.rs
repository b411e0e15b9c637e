//! HTTP API: admission endpoint, health checks and Prometheus metrics

use crate::config::WebhookConfig;
use anyhow::Context;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use axum_server::tls_rustls::RustlsConfig;
use prometheus::{Encoder, TextEncoder};
use std::sync::Arc;
use tracing::{error, info, warn};
use webhook_lib::{
    health::{components, ComponentStatus, HealthRegistry},
    Mutator, WebhookMetrics,
};

/// Shared application state
pub struct AppState {
    pub mutator: Mutator,
    pub health_registry: HealthRegistry,
    pub metrics: WebhookMetrics,
}

impl AppState {
    pub fn new(mutator: Mutator, health_registry: HealthRegistry, metrics: WebhookMetrics) -> Self {
        Self {
            mutator,
            health_registry,
            metrics,
        }
    }
}

/// Admission endpoint; 400 with no AdmissionReview when the body is malformed
async fn mutate(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    match state.mutator.review_json(&body).await {
        Ok(review) => (StatusCode::OK, Json(review)).into_response(),
        Err(e) => {
            warn!(error = %e, "Rejecting malformed admission review");
            (StatusCode::BAD_REQUEST, "Bad request").into_response()
        }
    }
}

/// Health check response - returns 200 if healthy, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy => StatusCode::OK,
        // Admissions still succeed on the fallback path
        ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/mutate", post(mutate))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Start the API server, over TLS unless disabled
pub async fn serve(config: WebhookConfig, state: Arc<AppState>) -> anyhow::Result<()> {
    let health = state.health_registry.clone();
    let app = create_router(state);
    let addr = config.listen_addr();

    if config.tls_enabled {
        let tls = match RustlsConfig::from_pem_file(&config.tls_cert_path, &config.tls_key_path)
            .await
        {
            Ok(tls) => tls,
            Err(e) => {
                health
                    .set_unhealthy(components::SERVER, format!("TLS material unreadable: {}", e))
                    .await;
                return Err(e).with_context(|| {
                    format!(
                        "Failed to load TLS certificate {} and key {}",
                        config.tls_cert_path, config.tls_key_path
                    )
                });
            }
        };

        info!(addr = %addr, cert = %config.tls_cert_path, "Starting HTTPS server");
        axum_server::bind_rustls(addr, tls)
            .serve(app.into_make_service())
            .await
            .context("HTTPS server failed")?;
    } else {
        warn!(addr = %addr, "TLS disabled, serving plain HTTP");
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;
        axum::serve(listener, app).await.context("HTTP server failed")?;
    }

    Ok(())
}
