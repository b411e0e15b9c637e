//! JSON Patch construction and encoding

use crate::models::Recommendation;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// A JSON Patch (RFC 6902) operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOperation {
    /// Creates the member, or replaces it if present
    Add {
        path: String,
        value: serde_json::Value,
    },
}

/// Patch setting the requests of the container at `index`
///
/// `index` must be the container's position in the original request.
pub fn requests_patch(index: usize, recommendation: &Recommendation) -> Vec<PatchOperation> {
    let requests = recommendation.to_resource_list();
    vec![PatchOperation::Add {
        path: format!("/spec/containers/{}/resources/requests", index),
        value: serde_json::json!({
            "cpu": requests.cpu,
            "memory": requests.memory,
        }),
    }]
}

/// Serialize operations to JSON and base64-encode them
pub fn encode_patch(operations: &[PatchOperation]) -> Result<String, serde_json::Error> {
    let json = serde_json::to_vec(operations)?;
    Ok(STANDARD.encode(json))
}

/// Inverse of `encode_patch`, for tooling and tests
pub fn decode_patch(encoded: &str) -> anyhow::Result<Vec<PatchOperation>> {
    let json = STANDARD.decode(encoded)?;
    Ok(serde_json::from_slice(&json)?)
}
