//! Dry-run of an AdmissionReview document

use anyhow::{Context, Result};
use serde::Serialize;
use std::sync::Arc;
use tabled::Tabled;
use webhook_lib::admission::{decode_patch, PatchOperation};
use webhook_lib::recommender::recommend;
use webhook_lib::selector::select_target;
use webhook_lib::{
    AdmissionReview, FixedUsage, Mutator, Observations, Policy, Recommendation, Recommender,
    ResourceRecommendation, UsageSource, WorkloadSelector,
};

use super::Backend;
use crate::output::{
    color_source, print_info, print_json, print_success, print_table, print_warning, OutputFormat,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReviewReport {
    review: AdmissionReview,
    #[serde(skip_serializing_if = "Option::is_none")]
    target_container: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    recommendation: Option<Recommendation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    patch: Option<Vec<PatchOperation>>,
}

#[derive(Tabled)]
struct ResourceRow {
    #[tabled(rename = "Resource")]
    resource: String,
    #[tabled(rename = "Declared")]
    declared: String,
    #[tabled(rename = "Limit")]
    limit: String,
    #[tabled(rename = "Observed")]
    observed: String,
    #[tabled(rename = "Recommended")]
    recommended: String,
    #[tabled(rename = "Source")]
    source: String,
}

impl From<&ResourceRecommendation> for ResourceRow {
    fn from(r: &ResourceRecommendation) -> Self {
        Self {
            resource: r.kind.to_string(),
            declared: r.kind.format(r.current_request),
            limit: if r.limit > 0 {
                r.kind.format(r.limit)
            } else {
                "none".to_string()
            },
            observed: r
                .observed
                .map(|v| r.kind.format(v))
                .unwrap_or_else(|| "-".to_string()),
            recommended: r.kind.format(r.recommended),
            source: color_source(r.source),
        }
    }
}

/// Build the report for a review, given the usage source to observe through
async fn build_report(
    review: AdmissionReview,
    usage: Arc<dyn UsageSource>,
    policy: Policy,
) -> Result<ReviewReport> {
    let request = review
        .request
        .as_ref()
        .context("AdmissionReview has no request")?;
    let namespace = request.target_namespace();

    let target = request
        .object
        .as_ref()
        .and_then(|pod| select_target(&pod.spec.containers, &policy.image_marker));

    let recommender = Recommender::new(usage, policy.clone());
    let observations = match target {
        Some(_) => recommender.observe(namespace).await,
        None => Observations::default(),
    };
    let recommendation = target.map(|(_, container)| recommend(container, &observations, &policy));

    // Replay the observations so the response matches the table exactly
    let replay = FixedUsage::new(observations.cpu_cores, observations.memory_bytes);
    let mutator = Mutator::new(Recommender::new(Arc::new(replay), policy));
    let outgoing = mutator.review(review.clone()).await?;

    let patch = match outgoing.response.as_ref().and_then(|r| r.patch.as_deref()) {
        Some(encoded) => Some(decode_patch(encoded)?),
        None => None,
    };

    Ok(ReviewReport {
        review: outgoing,
        target_container: target.map(|(index, _)| index),
        recommendation,
        patch,
    })
}

/// Run an AdmissionReview file through the recommendation logic and print the outcome
pub async fn review_file(
    backend: &Backend,
    file: &str,
    cpu_cores: Option<f64>,
    memory_bytes: Option<f64>,
    image_marker: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let content =
        std::fs::read_to_string(file).with_context(|| format!("Failed to read {}", file))?;
    let review: AdmissionReview = serde_json::from_str(&content)
        .with_context(|| format!("{} is not an AdmissionReview", file))?;

    let mut policy = Policy::default();
    if let Some(marker) = image_marker {
        policy.image_marker = marker;
    }

    let usage: Arc<dyn UsageSource> = if cpu_cores.is_some() || memory_bytes.is_some() {
        Arc::new(FixedUsage::new(cpu_cores, memory_bytes))
    } else {
        if backend.verbose {
            print_info(&format!("Querying {}", backend.url));
        }
        Arc::new(backend.client(WorkloadSelector::default())?)
    };

    let report = build_report(review, usage, policy).await?;

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Table => print_report(&report),
    }

    Ok(())
}

fn print_report(report: &ReviewReport) {
    let uid = report
        .review
        .response
        .as_ref()
        .map(|r| r.uid.as_str())
        .unwrap_or_default();

    let (Some(index), Some(recommendation)) = (report.target_container, &report.recommendation)
    else {
        print_warning(&format!(
            "No target container in request {}, pod would be admitted unchanged",
            uid
        ));
        return;
    };

    println!("Request: {}", uid);
    println!("Target container: #{}", index);
    print_table(vec![
        ResourceRow::from(&recommendation.cpu),
        ResourceRow::from(&recommendation.memory),
    ]);

    if let Some(ops) = &report.patch {
        for op in ops {
            let PatchOperation::Add { path, value } = op;
            println!("\nadd {} {}", path, value);
        }
    }
    print_success("Pod would be admitted with patched requests");
}
