//! PromQL for namespace usage percentiles

use crate::quantity::ResourceKind;

/// Quantile reported to the recommender
pub const PERCENTILE: f64 = 0.95;

/// Window each pod's usage is averaged over
pub const LOOKBACK_WINDOW: &str = "15m";

/// Subquery resolution inside the lookback window
pub const RESOLUTION: &str = "1m";

/// Rate window for the cumulative CPU counter
pub const CPU_RATE_WINDOW: &str = "5m";

const CPU_METRIC: &str = "container_cpu_usage_seconds_total";
const MEMORY_METRIC: &str = "container_memory_rss";

/// Which pods and containers count towards the percentile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadSelector {
    /// Regex over pod names of the target workload class
    pub pod_pattern: String,
    /// Regex over container names to leave out (sidecars, pause containers)
    pub excluded_containers: String,
}

impl Default for WorkloadSelector {
    fn default() -> Self {
        Self {
            pod_pattern: "jupyter-.*".to_string(),
            excluded_containers: "POD|istio-proxy|linkerd-proxy".to_string(),
        }
    }
}

/// Build the percentile query for a namespace and resource kind
pub fn percentile_query(
    namespace: &str,
    kind: ResourceKind,
    selector: &WorkloadSelector,
) -> String {
    let matchers = label_matchers(namespace, selector);
    let per_pod = match kind {
        ResourceKind::Cpu => format!(
            "sum by (pod) (rate({CPU_METRIC}{{{matchers}}}[{CPU_RATE_WINDOW}]))"
        ),
        ResourceKind::Memory => format!("sum by (pod) ({MEMORY_METRIC}{{{matchers}}})"),
    };
    format!(
        "quantile({PERCENTILE}, avg_over_time({per_pod}[{LOOKBACK_WINDOW}:{RESOLUTION}]))"
    )
}

fn label_matchers(namespace: &str, selector: &WorkloadSelector) -> String {
    format!(
        r#"namespace="{}",pod=~"{}",container!="",container!~"{}""#,
        escape_label_value(namespace),
        escape_label_value(&selector.pod_pattern),
        escape_label_value(&selector.excluded_containers),
    )
}

/// Escape a value for a double-quoted PromQL string literal
fn escape_label_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str(r"\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str(r"\n"),
            _ => escaped.push(c),
        }
    }
    escaped
}
