//! AdmissionReview schema and the mutating handler
//!
//! Only the fields this webhook reads or writes are modeled.

mod handler;
mod patch;

pub use handler::Mutator;
pub use patch::{decode_patch, encode_patch, requests_patch, PatchOperation};

use crate::models::Pod;
use serde::{Deserialize, Serialize};

pub const ADMISSION_API_VERSION: &str = "admission.k8s.io/v1";
pub const ADMISSION_KIND: &str = "AdmissionReview";
pub const JSON_PATCH: &str = "JSONPatch";

fn default_api_version() -> String {
    ADMISSION_API_VERSION.to_string()
}

fn default_kind() -> String {
    ADMISSION_KIND.to_string()
}

/// AdmissionReview envelope, used for both directions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionReview {
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_kind")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<AdmissionRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<AdmissionResponse>,
}

impl AdmissionReview {
    /// Wrap a response in an outgoing review
    pub fn from_response(response: AdmissionResponse) -> Self {
        Self {
            api_version: default_api_version(),
            kind: default_kind(),
            request: None,
            response: Some(response),
        }
    }
}

/// Inbound admission request; `uid` is the only required field
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionRequest {
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<Pod>,
}

impl AdmissionRequest {
    /// Namespace to size against: the pod's own, else the request's
    pub fn target_namespace(&self) -> Option<&str> {
        self.object
            .as_ref()
            .and_then(|pod| pod.metadata.namespace.as_deref())
            .or(self.namespace.as_deref())
            .filter(|ns| !ns.is_empty())
    }
}

/// Admission decision; always allowed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionResponse {
    pub uid: String,
    pub allowed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch_type: Option<String>,
    /// Base64 of the JSON Patch document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<String>,
}

impl AdmissionResponse {
    /// Allow without changes, echoing the request uid
    pub fn allow(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            allowed: true,
            patch_type: None,
            patch: None,
        }
    }

    /// Attach a JSON Patch
    pub fn with_patch(mut self, operations: &[PatchOperation]) -> Result<Self, serde_json::Error> {
        self.patch = Some(encode_patch(operations)?);
        self.patch_type = Some(JSON_PATCH.to_string());
        Ok(self)
    }
}
