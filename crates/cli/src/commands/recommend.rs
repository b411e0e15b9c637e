//! Usage percentile preview for a namespace

use anyhow::Result;
use serde::Serialize;
use tabled::Tabled;
use webhook_lib::usage::promql::percentile_query;
use webhook_lib::{QueryError, ResourceKind, WorkloadSelector};

use super::Backend;
use crate::output::{print_info, print_json, print_table, print_warning, OutputFormat};

#[derive(Debug, Serialize)]
struct PercentileReport {
    namespace: String,
    resource: ResourceKind,
    /// Raw sample as returned by the backend (cores or bytes)
    raw: Option<f64>,
    /// Raw sample in canonical units, as the webhook would use it
    recommended: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Tabled)]
struct PercentileRow {
    #[tabled(rename = "Resource")]
    resource: String,
    #[tabled(rename = "p95 (raw)")]
    raw: String,
    #[tabled(rename = "Request")]
    recommended: String,
}

fn report(
    namespace: &str,
    kind: ResourceKind,
    result: Result<Option<f64>, QueryError>,
) -> PercentileReport {
    let (raw, error) = match result {
        Ok(raw) => (raw, None),
        Err(e) => (None, Some(e.to_string())),
    };

    PercentileReport {
        namespace: namespace.to_string(),
        resource: kind,
        raw,
        recommended: raw
            .and_then(|value| kind.from_observation(value))
            .map(|value| kind.format(value)),
        error,
    }
}

/// Query both percentiles for a namespace and print them
pub async fn show_percentiles(
    backend: &Backend,
    namespace: &str,
    pod_pattern: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let mut selector = WorkloadSelector::default();
    if let Some(pattern) = pod_pattern {
        selector.pod_pattern = pattern;
    }

    if backend.verbose {
        for kind in ResourceKind::ALL {
            print_info(&percentile_query(namespace, kind, &selector));
        }
    }

    let client = backend.client(selector)?;
    let (cpu, memory) = tokio::join!(
        client.query_percentile(namespace, ResourceKind::Cpu),
        client.query_percentile(namespace, ResourceKind::Memory),
    );

    let reports = vec![
        report(namespace, ResourceKind::Cpu, cpu),
        report(namespace, ResourceKind::Memory, memory),
    ];

    match format {
        OutputFormat::Json => print_json(&reports)?,
        OutputFormat::Table => {
            for r in &reports {
                if let Some(error) = &r.error {
                    print_warning(&format!("{} query failed: {}", r.resource, error));
                } else if r.raw.is_none() {
                    print_warning(&format!(
                        "No {} usage in namespace {}, the declared request would be kept",
                        r.resource, namespace
                    ));
                }
            }

            let rows = reports
                .iter()
                .map(|r| PercentileRow {
                    resource: r.resource.to_string(),
                    raw: r.raw.map(|v| format!("{:.4}", v)).unwrap_or_else(|| "-".to_string()),
                    recommended: r.recommended.clone().unwrap_or_else(|| "-".to_string()),
                })
                .collect();
            print_table(rows);
        }
    }

    Ok(())
}
