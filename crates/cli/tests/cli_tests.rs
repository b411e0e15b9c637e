//! CLI integration tests

use std::io::Write;
use std::process::Command;

fn rsw() -> Command {
    Command::new(env!("CARGO_BIN_EXE_rsw"))
}

fn review_file() -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write!(
        file,
        r#"{{
            "apiVersion": "admission.k8s.io/v1",
            "kind": "AdmissionReview",
            "request": {{
                "uid": "cli-it-1",
                "namespace": "team-a",
                "object": {{
                    "metadata": {{ "name": "jupyter-dave" }},
                    "spec": {{ "containers": [{{
                        "name": "notebook",
                        "image": "user-images/datascience:3",
                        "resources": {{
                            "requests": {{ "cpu": "100m", "memory": "256Mi" }},
                            "limits": {{ "cpu": "1", "memory": "4Gi" }}
                        }}
                    }}] }}
                }}
            }}
        }}"#
    )
    .unwrap();
    file
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = rsw().arg("--help").output().expect("Failed to execute rsw");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(stdout.contains("recommend"), "Should show recommend command");
    assert!(stdout.contains("review"), "Should show review command");
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = rsw().arg("--version").output().expect("Failed to execute rsw");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("rsw"), "Should show binary name");
}

#[test]
fn test_review_with_fixed_observations_prints_patch() {
    let file = review_file();

    let output = rsw()
        .args(["review", file.path().to_str().unwrap()])
        .args(["--cpu-cores", "0.35", "--memory-bytes", "536870912"])
        .args(["--format", "json"])
        .output()
        .expect("Failed to execute rsw");

    assert!(output.status.success(), "review should succeed");

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["review"]["response"]["uid"], "cli-it-1");
    assert_eq!(report["review"]["response"]["allowed"], true);
    assert_eq!(report["targetContainer"], 0);
    assert_eq!(
        report["patch"][0]["path"],
        "/spec/containers/0/resources/requests"
    );
    assert_eq!(report["patch"][0]["value"]["cpu"], "350m");
    assert_eq!(report["patch"][0]["value"]["memory"], "512Mi");
}

#[test]
fn test_review_missing_file_fails() {
    let output = rsw()
        .args(["review", "/nonexistent/review.json", "--cpu-cores", "1"])
        .output()
        .expect("Failed to execute rsw");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to read"));
}

#[test]
fn test_recommend_against_mock_backend() {
    let mut server = mockito::Server::new();
    let _m = server
        .mock("GET", "/api/v1/query")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"status":"success","data":{"resultType":"vector","result":[{"metric":{},"value":[1700000000,"0.125"]}]}}"#,
        )
        .expect(2)
        .create();

    let output = rsw()
        .args(["recommend", "--namespace", "team-a"])
        .args(["--prometheus-url", &server.url(), "--format", "json"])
        .output()
        .expect("Failed to execute rsw");

    assert!(output.status.success(), "recommend should succeed");

    let reports: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(reports[0]["resource"], "cpu");
    assert_eq!(reports[0]["recommended"], "125m");
    assert_eq!(reports[1]["resource"], "memory");
    assert_eq!(reports[1]["recommended"], "0Mi");
}

#[test]
fn test_recommend_reports_backend_error() {
    let mut server = mockito::Server::new();
    let _m = server
        .mock("GET", "/api/v1/query")
        .match_query(mockito::Matcher::Any)
        .with_status(503)
        .create();

    let output = rsw()
        .args(["recommend", "-n", "team-a"])
        .args(["--prometheus-url", &server.url(), "--format", "json"])
        .output()
        .expect("Failed to execute rsw");

    assert!(output.status.success(), "query failures are reported, not fatal");

    let reports: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(reports[0]["raw"].is_null());
    assert!(reports[0]["error"].as_str().unwrap().contains("503"));
}
