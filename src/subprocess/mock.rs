use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::error::ProcessError;
use super::runner::{ExitStatus, ProcessCommand, ProcessOutput, ProcessRunner};

/// Test double for [`ProcessRunner`].
///
/// Responses are queued per program name. The last queued response for a
/// program is sticky, so a single stub covers repeated invocations (polling
/// loops) while multiple stubs replay in order (fail, fail, succeed).
#[derive(Clone, Default)]
pub struct MockProcessRunner {
    responses: Arc<Mutex<HashMap<String, VecDeque<ProcessOutput>>>>,
    call_history: Arc<Mutex<Vec<ProcessCommand>>>,
}

impl MockProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful invocation with the given stdout.
    pub fn stub_success(&self, program: &str, stdout: &str) {
        self.stub(
            program,
            ProcessOutput {
                status: ExitStatus::Success,
                stdout: stdout.to_string(),
                stderr: String::new(),
                duration: Duration::from_millis(10),
            },
        );
    }

    /// Queue a failing invocation with the given exit code and stderr.
    pub fn stub_failure(&self, program: &str, code: i32, stderr: &str) {
        self.stub(
            program,
            ProcessOutput {
                status: ExitStatus::Error(code),
                stdout: String::new(),
                stderr: stderr.to_string(),
                duration: Duration::from_millis(10),
            },
        );
    }

    pub fn stub(&self, program: &str, output: ProcessOutput) {
        self.responses
            .lock()
            .unwrap()
            .entry(program.to_string())
            .or_default()
            .push_back(output);
    }

    pub fn call_history(&self) -> Vec<ProcessCommand> {
        self.call_history.lock().unwrap().clone()
    }

    pub fn calls_for(&self, program: &str) -> usize {
        self.call_history
            .lock()
            .unwrap()
            .iter()
            .filter(|cmd| cmd.program == program)
            .count()
    }
}

#[async_trait]
impl ProcessRunner for MockProcessRunner {
    async fn run(&self, command: ProcessCommand) -> Result<ProcessOutput, ProcessError> {
        self.call_history.lock().unwrap().push(command.clone());

        let mut responses = self.responses.lock().unwrap();
        let queue = responses.get_mut(&command.program).ok_or_else(|| {
            ProcessError::MockExpectationNotMet(format!(
                "no response stubbed for '{}'",
                command.program
            ))
        })?;

        if queue.len() > 1 {
            Ok(queue.pop_front().unwrap())
        } else {
            queue
                .front()
                .cloned()
                .ok_or_else(|| {
                    ProcessError::MockExpectationNotMet(format!(
                        "responses for '{}' exhausted",
                        command.program
                    ))
                })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subprocess::ProcessCommandBuilder;

    #[tokio::test]
    async fn test_mock_replays_then_sticks() {
        let mock = MockProcessRunner::new();
        mock.stub_failure("flux", 1, "not ready");
        mock.stub_success("flux", "all checks passed");

        let cmd = || ProcessCommandBuilder::new("flux").arg("check").build();
        assert!(!mock.run(cmd()).await.unwrap().success());
        assert!(mock.run(cmd()).await.unwrap().success());
        // Last response is sticky.
        assert!(mock.run(cmd()).await.unwrap().success());
        assert_eq!(mock.calls_for("flux"), 3);
    }

    #[tokio::test]
    async fn test_mock_rejects_unstubbed_program() {
        let mock = MockProcessRunner::new();
        let err = mock
            .run(ProcessCommandBuilder::new("kubectl").build())
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessError::MockExpectationNotMet(_)));
    }
}
