//! Resource Webhook CLI
//!
//! Operator tool for previewing what the webhook would do: the usage
//! percentiles it would see for a namespace, and the patch it would return
//! for a given AdmissionReview.

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{recommend, review};
use webhook_lib::usage::{DEFAULT_PROMETHEUS_URL, DEFAULT_QUERY_TIMEOUT};

/// Resource Webhook CLI
#[derive(Debug, Parser)]
#[command(name = "rsw")]
#[command(author, version, about = "CLI for the resource request webhook", long_about = None)]
pub struct Cli {
    /// Metrics backend URL (can also be set via RSW_PROMETHEUS_URL env var)
    #[arg(long, global = true, env = "RSW_PROMETHEUS_URL", default_value = DEFAULT_PROMETHEUS_URL)]
    pub prometheus_url: String,

    /// Per-query timeout in milliseconds
    #[arg(long, global = true, default_value_t = DEFAULT_QUERY_TIMEOUT.as_millis() as u64)]
    pub timeout_ms: u64,

    /// Output format
    #[arg(long, short, global = true, default_value = "table")]
    pub format: output::OutputFormat,

    /// Print the PromQL sent to the backend
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show the usage percentiles the webhook would see for a namespace
    Recommend {
        /// Namespace to query
        #[arg(long, short)]
        namespace: String,

        /// Regex over pod names included in the percentile
        #[arg(long)]
        pod_pattern: Option<String>,
    },

    /// Run an AdmissionReview file through the webhook logic
    Review {
        /// Path to an AdmissionReview JSON document
        file: String,

        /// Fixed CPU observation in cores instead of querying the backend
        #[arg(long)]
        cpu_cores: Option<f64>,

        /// Fixed memory observation in bytes instead of querying the backend
        #[arg(long)]
        memory_bytes: Option<f64>,

        /// Image substring selecting the target container
        #[arg(long)]
        image_marker: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let backend = commands::Backend {
        url: cli.prometheus_url.clone(),
        timeout: std::time::Duration::from_millis(cli.timeout_ms),
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Recommend {
            namespace,
            pod_pattern,
        } => {
            recommend::show_percentiles(&backend, &namespace, pod_pattern, cli.format).await?;
        }
        Commands::Review {
            file,
            cpu_cores,
            memory_bytes,
            image_marker,
        } => {
            review::review_file(
                &backend,
                &file,
                cpu_cores,
                memory_bytes,
                image_marker,
                cli.format,
            )
            .await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recommend_requires_namespace() {
        assert!(Cli::try_parse_from(["rsw", "recommend"]).is_err());

        let cli = Cli::try_parse_from(["rsw", "recommend", "--namespace", "team-a"]).unwrap();
        assert_eq!(cli.prometheus_url, DEFAULT_PROMETHEUS_URL);
        assert_eq!(cli.timeout_ms, 3000);
        assert!(matches!(
            cli.command,
            Commands::Recommend { ref namespace, pod_pattern: None } if namespace == "team-a"
        ));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "rsw",
            "recommend",
            "-n",
            "team-a",
            "--prometheus-url",
            "http://localhost:9090",
            "--format",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.prometheus_url, "http://localhost:9090");
        assert!(matches!(cli.format, output::OutputFormat::Json));
    }

    #[test]
    fn test_review_fixed_observations() {
        let cli = Cli::try_parse_from([
            "rsw",
            "review",
            "pod.json",
            "--cpu-cores",
            "0.25",
            "--memory-bytes",
            "268435456",
        ])
        .unwrap();

        match cli.command {
            Commands::Review {
                file,
                cpu_cores,
                memory_bytes,
                image_marker,
            } => {
                assert_eq!(file, "pod.json");
                assert_eq!(cpu_cores, Some(0.25));
                assert_eq!(memory_bytes, Some(268435456.0));
                assert!(image_marker.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_review_rejects_non_numeric_observation() {
        assert!(Cli::try_parse_from(["rsw", "review", "pod.json", "--cpu-cores", "lots"]).is_err());
    }
}
