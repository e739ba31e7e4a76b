use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;

use super::error::ProcessError;

/// A fully specified subprocess invocation.
#[derive(Debug, Clone)]
pub struct ProcessCommand {
    pub program: String,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
    pub working_dir: Option<PathBuf>,
    pub timeout: Option<Duration>,
    pub stdin: Option<String>,
}

impl ProcessCommand {
    /// Rendered program + args, used in error messages and logs.
    pub fn display(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Stdout and stderr concatenated, the way lint tools are reported.
    pub fn combined(&self) -> String {
        match (self.stdout.trim().is_empty(), self.stderr.trim().is_empty()) {
            (false, false) => format!("{}\n{}", self.stdout.trim_end(), self.stderr.trim_end()),
            (false, true) => self.stdout.trim_end().to_string(),
            (true, false) => self.stderr.trim_end().to_string(),
            (true, true) => String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    Error(i32),
    Timeout,
    Signal(i32),
}

impl ExitStatus {
    pub fn success(&self) -> bool {
        matches!(self, ExitStatus::Success)
    }

    pub fn code(&self) -> Option<i32> {
        match self {
            ExitStatus::Success => Some(0),
            ExitStatus::Error(code) => Some(*code),
            _ => None,
        }
    }
}

#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, command: ProcessCommand) -> Result<ProcessOutput, ProcessError>;
}

/// Production runner backed by `tokio::process`.
pub struct TokioProcessRunner;

impl TokioProcessRunner {
    fn configure(command: &ProcessCommand) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&command.program);
        cmd.args(&command.args);
        for (key, value) in &command.env {
            cmd.env(key, value);
        }
        if let Some(dir) = &command.working_dir {
            cmd.current_dir(dir);
        }
        cmd.stdin(if command.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);
        cmd
    }

    fn convert_exit_status(status: std::process::ExitStatus) -> ExitStatus {
        if status.success() {
            return ExitStatus::Success;
        }
        match status.code() {
            Some(code) => ExitStatus::Error(code),
            None => {
                #[cfg(unix)]
                {
                    use std::os::unix::process::ExitStatusExt;
                    ExitStatus::Signal(status.signal().unwrap_or(-1))
                }
                #[cfg(not(unix))]
                {
                    ExitStatus::Error(-1)
                }
            }
        }
    }
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(&self, command: ProcessCommand) -> Result<ProcessOutput, ProcessError> {
        tracing::debug!("Executing subprocess: {}", command.display());

        let start = Instant::now();
        let mut cmd = Self::configure(&command);

        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ProcessError::CommandNotFound(command.program.clone())
            } else {
                ProcessError::Io {
                    command: command.display(),
                    source: e,
                }
            }
        })?;

        if let Some(input) = &command.stdin {
            if let Some(mut stdin) = child.stdin.take() {
                stdin
                    .write_all(input.as_bytes())
                    .await
                    .map_err(|e| ProcessError::Io {
                        command: command.display(),
                        source: e,
                    })?;
                drop(stdin);
            }
        }

        let output = if let Some(timeout) = command.timeout {
            match tokio::time::timeout(timeout, child.wait_with_output()).await {
                Ok(result) => result.map_err(|e| ProcessError::Io {
                    command: command.display(),
                    source: e,
                })?,
                Err(_) => {
                    return Err(ProcessError::Timeout {
                        command: command.display(),
                        timeout,
                    })
                }
            }
        } else {
            child
                .wait_with_output()
                .await
                .map_err(|e| ProcessError::Io {
                    command: command.display(),
                    source: e,
                })?
        };

        Ok(ProcessOutput {
            status: Self::convert_exit_status(output.status),
            stdout: String::from_utf8(output.stdout)?,
            stderr: String::from_utf8(output.stderr)?,
            duration: start.elapsed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subprocess::ProcessCommandBuilder;

    #[tokio::test]
    async fn test_run_captures_stdout() {
        let command = ProcessCommandBuilder::new("echo").arg("hello").build();
        let output = TokioProcessRunner.run(command).await.unwrap();
        assert!(output.success());
        assert_eq!(output.stdout.trim(), "hello");
    }

    #[tokio::test]
    async fn test_run_command_not_found() {
        let command = ProcessCommandBuilder::new("bosun-no-such-tool").build();
        let err = TokioProcessRunner.run(command).await.unwrap_err();
        assert!(matches!(err, ProcessError::CommandNotFound(_)));
    }

    #[tokio::test]
    async fn test_run_nonzero_exit() {
        let command = ProcessCommandBuilder::new("sh")
            .args(["-c", "echo findings >&2; exit 3"])
            .build();
        let output = TokioProcessRunner.run(command).await.unwrap();
        assert_eq!(output.status, ExitStatus::Error(3));
        assert!(output.stderr.contains("findings"));
    }

    #[tokio::test]
    async fn test_run_pipes_stdin() {
        let command = ProcessCommandBuilder::new("cat")
            .stdin("piped content".to_string())
            .build();
        let output = TokioProcessRunner.run(command).await.unwrap();
        assert_eq!(output.stdout, "piped content");
    }

    #[test]
    fn test_combined_output_ordering() {
        let output = ProcessOutput {
            status: ExitStatus::Error(1),
            stdout: "out\n".to_string(),
            stderr: "err\n".to_string(),
            duration: Duration::from_millis(1),
        };
        assert_eq!(output.combined(), "out\nerr");
    }
}
