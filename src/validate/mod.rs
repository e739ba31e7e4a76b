//! Parallel fan-out validation runner
//!
//! Launches every enabled check concurrently, collects results into a
//! mutex-guarded map, and only after all checks have finished assembles the
//! report and evaluates the failure policy. One check's internal failure is
//! captured as its content; it never cancels or starves the others.

pub mod checks;
pub mod policy;

pub use checks::{built_in_checks, CheckContext, CheckResult, CheckRun, CheckSpec};
pub use policy::{evaluate_failure_policy, FailurePolicy, ERROR_MARKER, WARNING_MARKER};

use chrono::Utc;
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, Semaphore};
use tracing::{debug, warn};

use crate::error::BosunError;

/// Result of one validation run.
pub struct ValidationOutcome {
    /// Labeled report sections in fixed check order.
    pub report: String,
    pub results: HashMap<String, CheckResult>,
    pub error: Option<BosunError>,
}

pub struct ParallelValidationRunner {
    max_parallel: usize,
}

impl ParallelValidationRunner {
    pub fn new(max_parallel: usize) -> Self {
        Self {
            max_parallel: max_parallel.max(1),
        }
    }

    /// Fan out all enabled checks, join them all, then report and evaluate.
    pub async fn run(
        &self,
        specs: Vec<CheckSpec>,
        ctx: CheckContext,
        policy: &FailurePolicy,
    ) -> ValidationOutcome {
        let results: Arc<Mutex<HashMap<String, CheckResult>>> =
            Arc::new(Mutex::new(HashMap::new()));
        let semaphore = Arc::new(Semaphore::new(self.max_parallel));
        let ctx = Arc::new(ctx);
        let mut futures = FuturesUnordered::new();

        for spec in specs.iter().filter(|s| s.enabled) {
            let permit = semaphore.clone().acquire_owned().await.unwrap();
            let key = spec.key;
            let display_name = spec.display_name;
            let run = Arc::clone(&spec.run);
            let results = Arc::clone(&results);
            let ctx = Arc::clone(&ctx);

            futures.push(tokio::spawn(async move {
                // An internal failure becomes content rather than aborting
                // the barrier.
                let content = match run.run(&ctx).await {
                    Ok(content) => content,
                    Err(err) => format!("{display_name} failed: {err}"),
                };
                let result = CheckResult {
                    key: key.to_string(),
                    content,
                    ran_at: Utc::now(),
                };
                results.lock().await.insert(key.to_string(), result);
                drop(permit);
                key
            }));
        }

        // Barrier: every launched check finishes before anything is read.
        while let Some(joined) = futures.next().await {
            match joined {
                Ok(key) => debug!("check '{key}' finished"),
                Err(err) => warn!("check task panicked: {err}"),
            }
        }

        let results = results.lock().await.clone();
        let report = render_report(&specs, &results);
        let error = evaluate_failure_policy(policy, &specs, &results);

        ValidationOutcome {
            report,
            results,
            error,
        }
    }
}

/// Merge results into labeled sections, iterating the caller-defined spec
/// order: identical results always produce byte-identical reports.
fn render_report(specs: &[CheckSpec], results: &HashMap<String, CheckResult>) -> String {
    let mut sections = Vec::new();
    for spec in specs {
        if let Some(result) = results.get(spec.key) {
            let body = if result.content.trim().is_empty() {
                "No findings"
            } else {
                result.content.trim_end()
            };
            sections.push(format!("=== {} Results ===\n{}", spec.display_name, body));
        }
    }
    sections.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::time::Duration;

    struct StaticCheck {
        content: String,
        delay: Duration,
    }

    #[async_trait]
    impl CheckRun for StaticCheck {
        async fn run(&self, _ctx: &CheckContext) -> crate::error::Result<String> {
            tokio::time::sleep(self.delay).await;
            Ok(self.content.clone())
        }
    }

    struct FailingCheck;

    #[async_trait]
    impl CheckRun for FailingCheck {
        async fn run(&self, _ctx: &CheckContext) -> crate::error::Result<String> {
            Err(BosunError::collaborator("mdl", "executable not found"))
        }
    }

    fn spec_with(
        key: &'static str,
        display_name: &'static str,
        enabled: bool,
        run: Arc<dyn CheckRun>,
    ) -> CheckSpec {
        CheckSpec {
            key,
            display_name,
            enabled,
            marker_aware: false,
            run,
        }
    }

    fn static_spec(key: &'static str, content: &str, delay_ms: u64) -> CheckSpec {
        spec_with(
            key,
            key,
            true,
            Arc::new(StaticCheck {
                content: content.to_string(),
                delay: Duration::from_millis(delay_ms),
            }),
        )
    }

    fn ctx() -> CheckContext {
        CheckContext {
            src: std::path::PathBuf::from("."),
        }
    }

    #[tokio::test]
    async fn test_report_order_is_spec_order_not_completion_order() {
        // The first check finishes last; the report still leads with it.
        let specs = vec![
            static_spec("slow", "slow findings", 50),
            static_spec("fast", "fast findings", 0),
        ];
        let runner = ParallelValidationRunner::new(4);
        let outcome = runner.run(specs, ctx(), &FailurePolicy::None).await;

        let slow_at = outcome.report.find("slow findings").unwrap();
        let fast_at = outcome.report.find("fast findings").unwrap();
        assert!(slow_at < fast_at);
        assert!(outcome.error.is_none());
    }

    #[tokio::test]
    async fn test_disabled_checks_never_run_or_report() {
        let specs = vec![
            static_spec("yaml", "", 0),
            spec_with("pre-commit", "Pre-Commit Hooks", false, Arc::new(FailingCheck)),
        ];
        let runner = ParallelValidationRunner::new(4);
        let outcome = runner.run(specs, ctx(), &FailurePolicy::Any).await;

        assert!(!outcome.results.contains_key("pre-commit"));
        assert!(!outcome.report.contains("Pre-Commit"));
        assert!(outcome.error.is_none());
    }

    #[tokio::test]
    async fn test_failing_check_is_captured_not_fatal() {
        let specs = vec![
            spec_with("markdown", "Markdown Lint", true, Arc::new(FailingCheck)),
            static_spec("yaml", "", 20),
        ];
        let runner = ParallelValidationRunner::new(4);
        let outcome = runner.run(specs, ctx(), &FailurePolicy::None).await;

        // Both checks completed; the failure became content.
        assert_eq!(outcome.results.len(), 2);
        let markdown = &outcome.results["markdown"];
        assert!(markdown.content.contains("executable not found"));
    }

    #[tokio::test]
    async fn test_policy_any_fails_with_embedded_findings() {
        let specs = vec![
            static_spec("yaml", "", 0),
            static_spec("markdown", "found issue", 0),
        ];
        let runner = ParallelValidationRunner::new(4);
        let outcome = runner.run(specs, ctx(), &FailurePolicy::Any).await;

        let err = outcome.error.unwrap();
        assert!(err.to_string().contains("markdown"));
        assert!(err.to_string().contains("found issue"));
    }

    #[tokio::test]
    async fn test_clean_run_passes_any_policy() {
        let specs = vec![static_spec("yaml", "", 0), static_spec("markdown", "", 0)];
        let runner = ParallelValidationRunner::new(4);
        let outcome = runner.run(specs, ctx(), &FailurePolicy::Any).await;

        assert!(outcome.error.is_none());
        assert!(outcome.report.contains("No findings"));
    }

    #[tokio::test]
    async fn test_identical_results_render_identically() {
        let build = || {
            vec![
                static_spec("yaml", "y", 0),
                static_spec("markdown", "m", 0),
                static_spec("secrets", "s", 0),
            ]
        };
        let runner = ParallelValidationRunner::new(2);
        let first = runner.run(build(), ctx(), &FailurePolicy::None).await;
        let second = runner.run(build(), ctx(), &FailurePolicy::None).await;
        assert_eq!(first.report, second.report);
    }
}
