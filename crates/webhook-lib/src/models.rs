//! Core data models for the webhook
//!
//! Only the parts of the Pod schema the webhook reads are modeled; unknown
//! fields are ignored on deserialization.

use crate::quantity::ResourceKind;
use serde::{Deserialize, Serialize};

/// Pod object carried in an admission request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Pod {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: PodSpec,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generate_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PodSpec {
    #[serde(default)]
    pub containers: Vec<Container>,
}

/// A single container of a pod spec
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Container {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub resources: ResourceRequirements,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceRequirements {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests: Option<ResourceList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limits: Option<ResourceList>,
}

/// CPU and memory quantities as written in the pod spec
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceList {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,
}

impl ResourceList {
    pub fn get(&self, kind: ResourceKind) -> Option<&str> {
        match kind {
            ResourceKind::Cpu => self.cpu.as_deref(),
            ResourceKind::Memory => self.memory.as_deref(),
        }
    }
}

impl Container {
    /// Declared request quantity for a resource kind, if any
    pub fn request(&self, kind: ResourceKind) -> Option<&str> {
        self.resources.requests.as_ref().and_then(|r| r.get(kind))
    }

    /// Declared limit quantity for a resource kind, if any
    pub fn limit(&self, kind: ResourceKind) -> Option<&str> {
        self.resources.limits.as_ref().and_then(|l| l.get(kind))
    }
}

impl Pod {
    /// Pod name, falling back to the generate-name prefix for controller-created pods
    pub fn display_name(&self) -> &str {
        self.metadata
            .name
            .as_deref()
            .or(self.metadata.generate_name.as_deref())
            .unwrap_or("")
    }
}

/// Raw percentile observations for one pod's namespace
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Observations {
    /// 95th percentile CPU usage in cores
    pub cpu_cores: Option<f64>,
    /// 95th percentile resident memory in bytes
    pub memory_bytes: Option<f64>,
}

impl Observations {
    pub fn get(&self, kind: ResourceKind) -> Option<f64> {
        match kind {
            ResourceKind::Cpu => self.cpu_cores,
            ResourceKind::Memory => self.memory_bytes,
        }
    }
}

/// Where a recommended value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationSource {
    /// Observed percentile, within the limit
    Observed,
    /// Observed percentile exceeded the declared limit
    ClampedToLimit,
    /// No observation; declared request kept
    DeclaredRequest,
}

/// Recommended request for a single resource kind, in canonical units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRecommendation {
    pub kind: ResourceKind,
    pub current_request: u64,
    pub limit: u64,
    pub observed: Option<u64>,
    pub recommended: u64,
    pub source: RecommendationSource,
}

/// Recommended requests for a container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub cpu: ResourceRecommendation,
    pub memory: ResourceRecommendation,
}

impl Recommendation {
    /// Requests in the string form written into the patch
    pub fn to_resource_list(&self) -> ResourceList {
        ResourceList {
            cpu: Some(ResourceKind::Cpu.format(self.cpu.recommended)),
            memory: Some(ResourceKind::Memory.format(self.memory.recommended)),
        }
    }
}
