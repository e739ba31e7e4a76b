//! Validation runner integration tests: built-in checks against the mock
//! subprocess runner, report assembly, and policy evaluation.

use std::sync::Arc;

use bosun::config::ValidateConfig;
use bosun::subprocess::{MockProcessRunner, ProcessRunner};
use bosun::validate::{
    built_in_checks, CheckContext, FailurePolicy, ParallelValidationRunner,
};

fn runner_pair() -> (Arc<dyn ProcessRunner>, MockProcessRunner) {
    let mock = MockProcessRunner::new();
    (Arc::new(mock.clone()) as Arc<dyn ProcessRunner>, mock)
}

fn ctx() -> CheckContext {
    CheckContext {
        src: std::env::temp_dir(),
    }
}

fn stub_all_clean(mock: &MockProcessRunner) {
    mock.stub_success("yamllint", "");
    mock.stub_success("mdl", "");
    mock.stub_success("detect-secrets", r#"{"results": {}}"#);
    mock.stub_success("pre-commit", "");
}

#[tokio::test]
async fn clean_repository_passes_any_policy() {
    let (runner, mock) = runner_pair();
    stub_all_clean(&mock);

    let config = ValidateConfig {
        pre_commit: true,
        ..ValidateConfig::default()
    };
    let checks = built_in_checks(&runner, &config);
    let outcome = ParallelValidationRunner::new(4)
        .run(checks, ctx(), &FailurePolicy::Any)
        .await;

    assert!(outcome.error.is_none());
    assert_eq!(outcome.results.len(), 4);
    // All four tools were invoked despite running concurrently.
    for program in ["yamllint", "mdl", "detect-secrets", "pre-commit"] {
        assert_eq!(mock.calls_for(program), 1, "{program}");
    }
}

#[tokio::test]
async fn report_sections_follow_check_order() {
    let (runner, mock) = runner_pair();
    mock.stub_success("yamllint", "./a.yaml:1:1: [warning] line too long (line-length)");
    mock.stub_failure("mdl", 1, "README.md:3: MD013 Line length");
    mock.stub_success("detect-secrets", r#"{"results": {}}"#);

    let checks = built_in_checks(&runner, &ValidateConfig::default());
    let outcome = ParallelValidationRunner::new(4)
        .run(checks, ctx(), &FailurePolicy::None)
        .await;

    let yaml_at = outcome.report.find("=== YAML Lint Results ===").unwrap();
    let markdown_at = outcome.report.find("=== Markdown Lint Results ===").unwrap();
    let secrets_at = outcome.report.find("=== Secret Scan Results ===").unwrap();
    assert!(yaml_at < markdown_at && markdown_at < secrets_at);
    // Disabled pre-commit check contributes no section.
    assert!(!outcome.report.contains("Pre-Commit"));
    assert!(outcome.report.contains("MD013"));
}

#[tokio::test]
async fn error_level_policy_distinguishes_yaml_markers() {
    let (runner, mock) = runner_pair();
    mock.stub_success("yamllint", "./a.yaml:1:1: [warning] line too long (line-length)");
    mock.stub_success("mdl", "");
    mock.stub_success("detect-secrets", r#"{"results": {}}"#);

    let checks = built_in_checks(&runner, &ValidateConfig::default());
    let outcome = ParallelValidationRunner::new(4)
        .run(checks, ctx(), &FailurePolicy::ErrorLevel)
        .await;
    // Warnings alone do not trip the error-level policy.
    assert!(outcome.error.is_none());

    let (runner, mock) = runner_pair();
    mock.stub_failure("yamllint", 1, "./a.yaml:1:1: [error] syntax error");
    mock.stub_success("mdl", "");
    mock.stub_success("detect-secrets", r#"{"results": {}}"#);

    let checks = built_in_checks(&runner, &ValidateConfig::default());
    let outcome = ParallelValidationRunner::new(4)
        .run(checks, ctx(), &FailurePolicy::ErrorLevel)
        .await;
    let err = outcome.error.expect("error marker must trip the policy");
    assert!(err.to_string().contains("[error] syntax error"));
}

#[tokio::test]
async fn named_check_policy_ignores_other_findings() {
    let (runner, mock) = runner_pair();
    mock.stub_success("yamllint", "./a.yaml:1:1: [error] syntax error");
    mock.stub_success("mdl", "");
    mock.stub_success("detect-secrets", r#"{"results": {}}"#);

    let checks = built_in_checks(&runner, &ValidateConfig::default());
    let outcome = ParallelValidationRunner::new(4)
        .run(checks, ctx(), &FailurePolicy::Check("markdown".to_string()))
        .await;
    assert!(outcome.error.is_none());
}

#[tokio::test]
async fn missing_tool_becomes_a_finding_not_a_crash() {
    let (runner, mock) = runner_pair();
    // Only yamllint is stubbed; the other tools are "not installed" as far
    // as the mock is concerned.
    mock.stub_success("yamllint", "");

    let checks = built_in_checks(&runner, &ValidateConfig::default());
    let outcome = ParallelValidationRunner::new(4)
        .run(checks, ctx(), &FailurePolicy::None)
        .await;

    // All three enabled checks reported, two of them with captured errors.
    assert_eq!(outcome.results.len(), 3);
    assert!(outcome.results["markdown"].content.contains("failed"));
    assert!(outcome.results["secrets"].content.contains("failed"));
    assert!(outcome.results["yaml"].content.is_empty());
}
