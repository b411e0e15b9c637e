//! Sizing policy constants
//!
//! Every default the engine substitutes for a missing quantity lives here.

use crate::quantity::ResourceKind;
use crate::selector::DEFAULT_IMAGE_MARKER;

/// CPU request assumed when the container declares none
pub const DEFAULT_CPU_REQUEST: &str = "100m";

/// CPU limit assumed when the container declares none
pub const DEFAULT_CPU_LIMIT: &str = "1";

/// Memory request assumed when the container declares none
pub const DEFAULT_MEMORY_REQUEST: &str = "256Mi";

/// Memory limit assumed when the container declares none
pub const DEFAULT_MEMORY_LIMIT: &str = "4Gi";

/// Quantities substituted for an absent request or limit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDefaults {
    pub request: String,
    pub limit: String,
}

/// Policy applied to every admission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    /// Substring of the image that marks the container to resize
    pub image_marker: String,
    pub cpu: ResourceDefaults,
    pub memory: ResourceDefaults,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            image_marker: DEFAULT_IMAGE_MARKER.to_string(),
            cpu: ResourceDefaults {
                request: DEFAULT_CPU_REQUEST.to_string(),
                limit: DEFAULT_CPU_LIMIT.to_string(),
            },
            memory: ResourceDefaults {
                request: DEFAULT_MEMORY_REQUEST.to_string(),
                limit: DEFAULT_MEMORY_LIMIT.to_string(),
            },
        }
    }
}

impl Policy {
    pub fn defaults_for(&self, kind: ResourceKind) -> &ResourceDefaults {
        match kind {
            ResourceKind::Cpu => &self.cpu,
            ResourceKind::Memory => &self.memory,
        }
    }
}
