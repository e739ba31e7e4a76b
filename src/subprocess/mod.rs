//! Unified subprocess abstraction layer
//!
//! All external tools (kcl, sops, kubectl, git, helmfile, flux, the lint
//! tools) are driven through the [`ProcessRunner`] trait so that every
//! collaborator can be exercised against [`MockProcessRunner`] in tests.

pub mod builder;
pub mod error;
pub mod mock;
pub mod runner;

pub use builder::ProcessCommandBuilder;
pub use error::ProcessError;
pub use mock::MockProcessRunner;
pub use runner::{ExitStatus, ProcessCommand, ProcessOutput, ProcessRunner, TokioProcessRunner};

use std::sync::Arc;

/// Entry point for spawning subprocesses with a swappable runner.
#[derive(Clone)]
pub struct SubprocessManager {
    runner: Arc<dyn ProcessRunner>,
}

impl SubprocessManager {
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self { runner }
    }

    /// Runner backed by real tokio child processes.
    pub fn production() -> Self {
        Self::new(Arc::new(TokioProcessRunner))
    }

    /// Mock-backed manager plus a handle for stubbing responses.
    pub fn mock() -> (Self, MockProcessRunner) {
        let mock = MockProcessRunner::new();
        let runner = Arc::new(mock.clone()) as Arc<dyn ProcessRunner>;
        (Self::new(runner), mock)
    }

    pub fn runner(&self) -> Arc<dyn ProcessRunner> {
        Arc::clone(&self.runner)
    }
}
