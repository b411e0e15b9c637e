//! Kubernetes quantity conversion
//!
//! CPU quantities are normalized to integer millicores and memory quantities
//! to integer mebibytes. Malformed input converts to 0 instead of failing,
//! so a bad quantity in a pod spec can never block an admission decision.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Millicores per CPU core
pub const MILLICORES_PER_CORE: f64 = 1000.0;

/// Mebibytes per gibibyte
pub const MEBIBYTES_PER_GIBIBYTE: f64 = 1024.0;

/// Bytes per mebibyte (2^20)
pub const BYTES_PER_MEBIBYTE: f64 = 1_048_576.0;

/// Resource kinds the webhook sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Cpu,
    Memory,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 2] = [ResourceKind::Cpu, ResourceKind::Memory];

    /// Label used in metrics, logs and resource lists
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Cpu => "cpu",
            ResourceKind::Memory => "memory",
        }
    }

    /// Parse a quantity string into canonical units for this kind
    pub fn parse(&self, quantity: &str) -> u64 {
        match self {
            ResourceKind::Cpu => parse_cpu(quantity),
            ResourceKind::Memory => parse_memory(quantity),
        }
    }

    /// Format canonical units back into a quantity string
    pub fn format(&self, value: u64) -> String {
        match self {
            ResourceKind::Cpu => format_cpu(value),
            ResourceKind::Memory => format_memory(value),
        }
    }

    /// Convert a raw backend observation into canonical units
    ///
    /// CPU observations are in cores, memory observations in bytes. Fractions
    /// are truncated, as when parsing quantity strings. NaN, infinite and
    /// negative values yield `None`.
    pub fn from_observation(&self, raw: f64) -> Option<u64> {
        if !raw.is_finite() || raw < 0.0 {
            return None;
        }
        let canonical = match self {
            ResourceKind::Cpu => raw * MILLICORES_PER_CORE,
            ResourceKind::Memory => raw / BYTES_PER_MEBIBYTE,
        };
        Some(canonical.trunc() as u64)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a CPU quantity into millicores
///
/// `"500m"` is 500 millicores, `"2.5"` is 2500. Anything else is 0.
pub fn parse_cpu(quantity: &str) -> u64 {
    let quantity = quantity.trim();
    if let Some(millis) = quantity.strip_suffix('m') {
        return millis.parse::<u64>().unwrap_or(0);
    }
    match quantity.parse::<f64>() {
        Ok(cores) if cores.is_finite() && cores >= 0.0 => (cores * MILLICORES_PER_CORE) as u64,
        _ => 0,
    }
}

/// Parse a memory quantity into mebibytes
///
/// Only `Mi` and `Gi` suffixes are understood; everything else is 0.
pub fn parse_memory(quantity: &str) -> u64 {
    let quantity = quantity.trim();
    if let Some(mebibytes) = quantity.strip_suffix("Mi") {
        return mebibytes.parse::<u64>().unwrap_or(0);
    }
    if let Some(gibibytes) = quantity.strip_suffix("Gi") {
        return match gibibytes.parse::<f64>() {
            Ok(g) if g.is_finite() && g >= 0.0 => (g * MEBIBYTES_PER_GIBIBYTE) as u64,
            _ => 0,
        };
    }
    0
}

/// Format millicores as `"<n>m"`
pub fn format_cpu(millicores: u64) -> String {
    format!("{}m", millicores)
}

/// Format mebibytes as `"<n>Mi"`
pub fn format_memory(mebibytes: u64) -> String {
    format!("{}Mi", mebibytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cpu_millicores() {
        assert_eq!(parse_cpu("500m"), 500);
        assert_eq!(parse_cpu("0m"), 0);
    }

    #[test]
    fn test_parse_cpu_cores() {
        assert_eq!(parse_cpu("1"), 1000);
        assert_eq!(parse_cpu("2.5"), 2500);
        assert_eq!(parse_cpu("0.1"), 100);
    }

    #[test]
    fn test_parse_cpu_malformed_is_zero() {
        assert_eq!(parse_cpu(""), 0);
        assert_eq!(parse_cpu("abc"), 0);
        assert_eq!(parse_cpu("1.5m"), 0);
        assert_eq!(parse_cpu("-2"), 0);
    }

    #[test]
    fn test_parse_memory() {
        assert_eq!(parse_memory("256Mi"), 256);
        assert_eq!(parse_memory("1Gi"), 1024);
        assert_eq!(parse_memory("4Gi"), 4096);
        assert_eq!(parse_memory("1.5Gi"), 1536);
    }

    #[test]
    fn test_parse_memory_unknown_suffix_is_zero() {
        assert_eq!(parse_memory("512"), 0);
        assert_eq!(parse_memory("512M"), 0);
        assert_eq!(parse_memory("1Ki"), 0);
        assert_eq!(parse_memory("xMi"), 0);
    }

    #[test]
    fn test_format() {
        assert_eq!(format_cpu(300), "300m");
        assert_eq!(format_memory(300), "300Mi");
        assert_eq!(ResourceKind::Cpu.format(1000), "1000m");
        assert_eq!(ResourceKind::Memory.format(4096), "4096Mi");
    }

    #[test]
    fn test_from_observation() {
        assert_eq!(ResourceKind::Cpu.from_observation(0.3), Some(300));
        assert_eq!(ResourceKind::Cpu.from_observation(0.5), Some(500));
        assert_eq!(
            ResourceKind::Memory.from_observation(300.0 * 1024.0 * 1024.0),
            Some(300)
        );
        assert_eq!(ResourceKind::Cpu.from_observation(0.2996), Some(299));
        assert_eq!(
            ResourceKind::Memory.from_observation(300.9 * 1024.0 * 1024.0),
            Some(300)
        );
        assert_eq!(ResourceKind::Cpu.from_observation(f64::NAN), None);
        assert_eq!(ResourceKind::Memory.from_observation(-1.0), None);
    }
}
