//! Mutating admission handler
//!
//! Turns an inbound AdmissionReview into the outbound one. Every review that
//! parses is allowed; the only rejection is a malformed body.

use super::{requests_patch, AdmissionRequest, AdmissionResponse, AdmissionReview};
use crate::error::AdmissionError;
use crate::observability::{AdmissionOutcome, StructuredLogger, WebhookMetrics};
use crate::recommender::Recommender;
use crate::selector::select_target;
use std::time::Instant;
use tracing::{debug, error};

pub struct Mutator {
    recommender: Recommender,
    metrics: WebhookMetrics,
    logger: StructuredLogger,
}

impl Mutator {
    pub fn new(recommender: Recommender) -> Self {
        Self {
            recommender,
            metrics: WebhookMetrics::new(),
            logger: StructuredLogger::new("mutator"),
        }
    }

    pub fn with_logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = logger;
        self
    }

    /// Answer a raw AdmissionReview body
    pub async fn review_json(&self, body: &[u8]) -> Result<AdmissionReview, AdmissionError> {
        let start = Instant::now();
        let result = match serde_json::from_slice::<AdmissionReview>(body) {
            Ok(review) => self.review(review).await,
            Err(e) => Err(AdmissionError::from(e)),
        };

        let outcome = match &result {
            Ok(review) => match review.response.as_ref().and_then(|r| r.patch.as_ref()) {
                Some(_) => AdmissionOutcome::Patched,
                None => AdmissionOutcome::Unchanged,
            },
            Err(_) => AdmissionOutcome::Rejected,
        };
        self.metrics
            .observe_admission(outcome, start.elapsed().as_secs_f64());

        result
    }

    /// Answer a parsed AdmissionReview
    pub async fn review(&self, review: AdmissionReview) -> Result<AdmissionReview, AdmissionError> {
        let request = review.request.ok_or(AdmissionError::MissingRequest)?;
        let response = self.mutate(&request).await;
        Ok(AdmissionReview::from_response(response))
    }

    /// Build the admission decision for a request
    pub async fn mutate(&self, request: &AdmissionRequest) -> AdmissionResponse {
        let allow = AdmissionResponse::allow(request.uid.as_str());
        let namespace = request.target_namespace();

        let Some(pod) = request.object.as_ref() else {
            debug!(uid = %request.uid, "Admission request carries no object");
            return allow;
        };

        let Some((index, container)) =
            select_target(&pod.spec.containers, &self.recommender.policy().image_marker)
        else {
            self.logger.log_admission(
                &request.uid,
                namespace.unwrap_or(""),
                pod.display_name(),
                None,
                false,
            );
            return allow;
        };

        let recommendation = self.recommender.recommend_for(namespace, container).await;
        let operations = requests_patch(index, &recommendation);

        match allow.clone().with_patch(&operations) {
            Ok(patched) => {
                self.logger.log_admission(
                    &request.uid,
                    namespace.unwrap_or(""),
                    pod.display_name(),
                    Some(index),
                    true,
                );
                patched
            }
            Err(e) => {
                error!(
                    uid = %request.uid,
                    error = %e,
                    "Failed to encode patch, admitting unchanged"
                );
                allow
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admission::{decode_patch, PatchOperation};
    use crate::recommender::Policy;
    use crate::usage::FixedUsage;
    use serde_json::json;
    use std::sync::Arc;

    const MIB: f64 = 1024.0 * 1024.0;

    fn mutator(usage: FixedUsage) -> Mutator {
        Mutator::new(Recommender::new(Arc::new(usage), Policy::default()))
    }

    fn review_body(uid: &str, containers: serde_json::Value) -> Vec<u8> {
        json!({
            "apiVersion": "admission.k8s.io/v1",
            "kind": "AdmissionReview",
            "request": {
                "uid": uid,
                "operation": "CREATE",
                "namespace": "team-a",
                "object": {
                    "metadata": { "name": "jupyter-alice", "namespace": "team-a" },
                    "spec": { "containers": containers }
                }
            }
        })
        .to_string()
        .into_bytes()
    }

    fn notebook(limit_cpu: &str) -> serde_json::Value {
        json!({
            "name": "notebook",
            "image": "gcr.io/x/user-images:latest",
            "resources": {
                "requests": { "cpu": "100m", "memory": "256Mi" },
                "limits": { "cpu": limit_cpu, "memory": "4096Mi" }
            }
        })
    }

    fn patched_requests(review: &AdmissionReview) -> (String, serde_json::Value) {
        let response = review.response.as_ref().unwrap();
        assert_eq!(response.patch_type.as_deref(), Some("JSONPatch"));
        let ops = decode_patch(response.patch.as_ref().unwrap()).unwrap();
        assert_eq!(ops.len(), 1);
        let PatchOperation::Add { path, value } = ops.into_iter().next().unwrap();
        (path, value)
    }

    #[tokio::test]
    async fn test_observed_usage_sets_requests() {
        let m = mutator(FixedUsage::new(Some(0.3), Some(300.0 * MIB)));
        let review = m
            .review_json(&review_body("uid-1", json!([notebook("1000m")])))
            .await
            .unwrap();

        let (path, value) = patched_requests(&review);
        assert_eq!(path, "/spec/containers/0/resources/requests");
        assert_eq!(value, json!({ "cpu": "300m", "memory": "300Mi" }));
        assert_eq!(review.response.unwrap().uid, "uid-1");
    }

    #[tokio::test]
    async fn test_cpu_clamped_to_limit() {
        let m = mutator(FixedUsage::new(Some(0.5), Some(300.0 * MIB)));
        let review = m
            .review_json(&review_body("uid-2", json!([notebook("200m")])))
            .await
            .unwrap();

        let (_, value) = patched_requests(&review);
        assert_eq!(value["cpu"], "200m");
    }

    #[tokio::test]
    async fn test_no_usage_keeps_requests() {
        let m = mutator(FixedUsage::empty());
        let review = m
            .review_json(&review_body("uid-3", json!([notebook("1000m")])))
            .await
            .unwrap();

        let (_, value) = patched_requests(&review);
        assert_eq!(value, json!({ "cpu": "100m", "memory": "256Mi" }));
    }

    #[tokio::test]
    async fn test_no_matching_container_admits_unchanged() {
        let m = mutator(FixedUsage::new(Some(0.3), Some(300.0 * MIB)));
        let containers = json!([{ "name": "coredns", "image": "registry.k8s.io/coredns:v1.11" }]);
        let review = m
            .review_json(&review_body("uid-4", containers))
            .await
            .unwrap();

        let value = serde_json::to_value(&review).unwrap();
        assert_eq!(value["response"]["allowed"], true);
        assert!(value["response"].get("patch").is_none());
        assert!(value["response"].get("patchType").is_none());
    }

    #[tokio::test]
    async fn test_patch_path_uses_original_index() {
        let m = mutator(FixedUsage::empty());
        let containers = json!([
            { "name": "istio-proxy", "image": "istio/proxyv2:1.20" },
            { "name": "sync", "image": "busybox" },
            notebook("1")
        ]);
        let review = m
            .review_json(&review_body("uid-5", containers))
            .await
            .unwrap();

        let (path, _) = patched_requests(&review);
        assert_eq!(path, "/spec/containers/2/resources/requests");
    }

    #[tokio::test]
    async fn test_uid_echoed_verbatim() {
        let m = mutator(FixedUsage::empty());
        for uid in ["", "705ab4f5-6393-11e8-b7cc-42010a800002", "ünïcödé uid/with spaces"] {
            let review = m
                .review_json(&review_body(uid, json!([])))
                .await
                .unwrap();
            assert_eq!(review.response.unwrap().uid, uid);
        }
    }

    #[tokio::test]
    async fn test_request_without_object_is_allowed() {
        let m = mutator(FixedUsage::empty());
        let body = json!({ "request": { "uid": "uid-6", "operation": "DELETE" } }).to_string();

        let review = m.review_json(body.as_bytes()).await.unwrap();
        let response = review.response.unwrap();
        assert!(response.allowed);
        assert!(response.patch.is_none());
    }

    #[tokio::test]
    async fn test_malformed_body_is_rejected() {
        let m = mutator(FixedUsage::empty());

        assert!(matches!(
            m.review_json(b"{not json").await,
            Err(AdmissionError::Malformed(_))
        ));
        assert!(matches!(
            m.review_json(br#"{"apiVersion":"admission.k8s.io/v1"}"#).await,
            Err(AdmissionError::MissingRequest)
        ));
    }
}
