//! Check specifications and the built-in lint checks
//!
//! Each check drives one external lint tool and reports its findings as a
//! plain string: empty means clean. Tool failures that still produce output
//! (lint tools exit non-zero when they find something) become findings, not
//! errors; only a broken invocation surfaces as an error, which the runner
//! then captures as content so one faulty check cannot abort the barrier.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::ValidateConfig;
use crate::error::Result;
use crate::subprocess::{ProcessCommandBuilder, ProcessRunner};

/// Shared inputs handed to every check.
#[derive(Debug, Clone)]
pub struct CheckContext {
    /// Directory under validation.
    pub src: PathBuf,
}

/// The runnable part of a check.
#[async_trait]
pub trait CheckRun: Send + Sync {
    async fn run(&self, ctx: &CheckContext) -> Result<String>;
}

/// One independently runnable validator.
pub struct CheckSpec {
    pub key: &'static str,
    pub display_name: &'static str,
    pub enabled: bool,
    /// Whether this check's output carries `[error]`/`[warning]` severity
    /// markers; all other checks are all-or-nothing.
    pub marker_aware: bool,
    pub run: Arc<dyn CheckRun>,
}

/// Write-once result of one check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub key: String,
    pub content: String,
    pub ran_at: DateTime<Utc>,
}

/// The built-in check set, in report order.
pub fn built_in_checks(runner: &Arc<dyn ProcessRunner>, config: &ValidateConfig) -> Vec<CheckSpec> {
    vec![
        CheckSpec {
            key: "yaml",
            display_name: "YAML Lint",
            enabled: config.yaml,
            marker_aware: true,
            run: Arc::new(YamlLint {
                runner: Arc::clone(runner),
                config_path: config.yaml_config.clone(),
            }),
        },
        CheckSpec {
            key: "markdown",
            display_name: "Markdown Lint",
            enabled: config.markdown,
            marker_aware: false,
            run: Arc::new(MarkdownLint {
                runner: Arc::clone(runner),
                config_path: config.markdown_config.clone(),
            }),
        },
        CheckSpec {
            key: "secrets",
            display_name: "Secret Scan",
            enabled: config.secrets,
            marker_aware: false,
            run: Arc::new(SecretScan {
                runner: Arc::clone(runner),
                exclude_files: config.secrets_exclude.clone(),
            }),
        },
        CheckSpec {
            key: "pre-commit",
            display_name: "Pre-Commit Hooks",
            enabled: config.pre_commit,
            marker_aware: false,
            run: Arc::new(PreCommit {
                runner: Arc::clone(runner),
                config_path: config.pre_commit_config.clone(),
                skip_hooks: config.skip_hooks.clone(),
            }),
        },
    ]
}

fn config_arg(ctx: &CheckContext, flag: &str, relative: &str) -> Vec<String> {
    if ctx.src.join(relative).is_file() {
        vec![flag.to_string(), relative.to_string()]
    } else {
        Vec::new()
    }
}

/// `yamllint` in parsable format. Output lines carry `[error]`/`[warning]`
/// markers, so findings are whatever the tool printed, regardless of exit
/// status.
pub struct YamlLint {
    runner: Arc<dyn ProcessRunner>,
    config_path: String,
}

#[async_trait]
impl CheckRun for YamlLint {
    async fn run(&self, ctx: &CheckContext) -> Result<String> {
        let command = ProcessCommandBuilder::new("yamllint")
            .args(config_arg(ctx, "-c", &self.config_path))
            .args(["-f", "parsable", "."])
            .current_dir(&ctx.src)
            .build();
        let output = self.runner.run(command).await?;
        Ok(output.combined())
    }
}

/// `mdl` over the tree. Clean on exit 0; findings otherwise.
pub struct MarkdownLint {
    runner: Arc<dyn ProcessRunner>,
    config_path: String,
}

#[async_trait]
impl CheckRun for MarkdownLint {
    async fn run(&self, ctx: &CheckContext) -> Result<String> {
        let command = ProcessCommandBuilder::new("mdl")
            .args(config_arg(ctx, "-c", &self.config_path))
            .arg(".")
            .current_dir(&ctx.src)
            .build();
        let output = self.runner.run(command).await?;
        if output.success() {
            Ok(String::new())
        } else {
            Ok(output.combined())
        }
    }
}

/// `detect-secrets scan`. The tool always emits a JSON report; findings are
/// the `results` object when it is non-empty.
pub struct SecretScan {
    runner: Arc<dyn ProcessRunner>,
    exclude_files: Option<String>,
}

#[async_trait]
impl CheckRun for SecretScan {
    async fn run(&self, ctx: &CheckContext) -> Result<String> {
        let mut builder = ProcessCommandBuilder::new("detect-secrets")
            .args(["scan", "--all-files"]);
        if let Some(pattern) = &self.exclude_files {
            builder = builder.args(["--exclude-files", pattern]);
        }
        let command = builder.current_dir(&ctx.src).build();
        let output = self.runner.run(command).await?;

        match serde_json::from_str::<serde_json::Value>(&output.stdout) {
            Ok(report) => {
                let results = &report["results"];
                if results.as_object().is_some_and(|r| !r.is_empty()) {
                    Ok(serde_json::to_string_pretty(results).unwrap_or_default())
                } else {
                    Ok(String::new())
                }
            }
            // Unparseable output is itself a finding.
            Err(_) => Ok(output.combined()),
        }
    }
}

/// `pre-commit run --all-files`, with hook ids skipped via the SKIP
/// environment variable.
pub struct PreCommit {
    runner: Arc<dyn ProcessRunner>,
    config_path: String,
    skip_hooks: Vec<String>,
}

#[async_trait]
impl CheckRun for PreCommit {
    async fn run(&self, ctx: &CheckContext) -> Result<String> {
        let mut builder = ProcessCommandBuilder::new("pre-commit")
            .args(["run", "--all-files"])
            .args(config_arg(ctx, "-c", &self.config_path));
        if !self.skip_hooks.is_empty() {
            builder = builder.env("SKIP", &self.skip_hooks.join(","));
        }
        let command = builder.current_dir(&ctx.src).build();
        let output = self.runner.run(command).await?;
        if output.success() {
            Ok(String::new())
        } else {
            Ok(output.combined())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subprocess::MockProcessRunner;

    fn ctx() -> CheckContext {
        CheckContext {
            src: PathBuf::from("/repo"),
        }
    }

    fn runner_pair() -> (Arc<dyn ProcessRunner>, MockProcessRunner) {
        let mock = MockProcessRunner::new();
        (Arc::new(mock.clone()) as Arc<dyn ProcessRunner>, mock)
    }

    #[tokio::test]
    async fn test_yamllint_reports_output_even_on_success() {
        let (runner, mock) = runner_pair();
        mock.stub_success("yamllint", "./a.yaml:3:1: [warning] too long (line-length)\n");
        let check = YamlLint {
            runner,
            config_path: ".yamllint".to_string(),
        };

        let content = check.run(&ctx()).await.unwrap();
        assert!(content.contains("[warning]"));
    }

    #[tokio::test]
    async fn test_markdown_clean_on_exit_zero() {
        let (runner, mock) = runner_pair();
        mock.stub_success("mdl", "");
        let check = MarkdownLint {
            runner,
            config_path: ".mdlrc".to_string(),
        };
        assert_eq!(check.run(&ctx()).await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_markdown_findings_on_failure() {
        let (runner, mock) = runner_pair();
        mock.stub_failure("mdl", 1, "README.md:12: MD013 Line length");
        let check = MarkdownLint {
            runner,
            config_path: ".mdlrc".to_string(),
        };
        let content = check.run(&ctx()).await.unwrap();
        assert!(content.contains("MD013"));
    }

    #[tokio::test]
    async fn test_secret_scan_empty_results_is_clean() {
        let (runner, mock) = runner_pair();
        mock.stub_success(
            "detect-secrets",
            r#"{"version": "1.5.0", "results": {}, "generated_at": "2026-08-07T00:00:00Z"}"#,
        );
        let check = SecretScan {
            runner,
            exclude_files: None,
        };
        assert_eq!(check.run(&ctx()).await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_secret_scan_surfaces_results() {
        let (runner, mock) = runner_pair();
        mock.stub_success(
            "detect-secrets",
            r#"{"results": {"config.yaml": [{"type": "Secret Keyword", "line_number": 4}]}}"#,
        );
        let check = SecretScan {
            runner,
            exclude_files: None,
        };
        let content = check.run(&ctx()).await.unwrap();
        assert!(content.contains("config.yaml"));
        assert!(content.contains("Secret Keyword"));
    }

    #[tokio::test]
    async fn test_pre_commit_skips_hooks_via_env() {
        let (runner, mock) = runner_pair();
        mock.stub_success("pre-commit", "");
        let check = PreCommit {
            runner,
            config_path: ".pre-commit-config.yaml".to_string(),
            skip_hooks: vec!["no-commit-to-branch".to_string(), "check-json".to_string()],
        };
        check.run(&ctx()).await.unwrap();

        let call = &mock.call_history()[0];
        assert_eq!(
            call.env.get("SKIP").unwrap(),
            "no-commit-to-branch,check-json"
        );
    }

    #[test]
    fn test_built_in_checks_order_and_flags() {
        let (runner, _mock) = runner_pair();
        let config = ValidateConfig::default();
        let checks = built_in_checks(&runner, &config);

        let keys: Vec<&str> = checks.iter().map(|c| c.key).collect();
        assert_eq!(keys, vec!["yaml", "markdown", "secrets", "pre-commit"]);
        assert!(checks[0].marker_aware);
        assert!(checks.iter().skip(1).all(|c| !c.marker_aware));
        // Pre-commit is opt-in.
        assert!(!checks[3].enabled);
    }
}
