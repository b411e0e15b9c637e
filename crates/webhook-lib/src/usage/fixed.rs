//! Fixed-value usage source
//!
//! Returns the same observations for every namespace. Used by tests and by
//! the CLI dry-run, where no live backend is involved.

use super::UsageSource;
use crate::models::Observations;
use crate::quantity::ResourceKind;
use async_trait::async_trait;

#[derive(Debug, Clone, Copy, Default)]
pub struct FixedUsage {
    observations: Observations,
}

impl FixedUsage {
    /// `cpu_cores` in cores, `memory_bytes` in bytes
    pub fn new(cpu_cores: Option<f64>, memory_bytes: Option<f64>) -> Self {
        Self {
            observations: Observations {
                cpu_cores,
                memory_bytes,
            },
        }
    }

    /// A backend with no series for any query
    pub fn empty() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UsageSource for FixedUsage {
    async fn percentile(&self, _namespace: &str, kind: ResourceKind) -> Option<f64> {
        self.observations.get(kind)
    }
}
