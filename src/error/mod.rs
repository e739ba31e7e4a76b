//! Error taxonomy for bootstrap and validation runs
//!
//! Configuration problems are detected before any collaborator is invoked
//! and are always fatal. Collaborator failures carry the tool name; their
//! severity is decided by the phase or check that triggered them. Policy
//! violations embed the offending findings so a failed run is actionable
//! without the separate report artifact.

use thiserror::Error;

use crate::subprocess::ProcessError;

pub type Result<T> = std::result::Result<T, BosunError>;

#[derive(Debug, Error)]
pub enum BosunError {
    /// Missing or inconsistent input for an enabled phase.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// An external tool invocation failed.
    #[error("{tool}: {message}")]
    Collaborator {
        tool: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A pipeline phase failed; wraps the underlying cause with its index.
    #[error("phase {index} ({name}): {source}")]
    Phase {
        index: usize,
        name: String,
        #[source]
        source: Box<BosunError>,
    },

    /// The validation failure policy rejected the merged results.
    #[error("validation failed (policy '{policy}'):\n{findings}")]
    PolicyViolation { policy: String, findings: String },

    /// Secrets extracted from rendered documents were not found in-cluster.
    #[error("{} secret(s) missing: {}", .names.len(), .names.join(", "))]
    MissingSecrets { names: Vec<String> },

    /// The operation was cancelled from the outside (signal) mid-wait.
    #[error("operation cancelled")]
    Cancelled,
}

impl BosunError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn collaborator(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Collaborator {
            tool: tool.into(),
            message: message.into(),
            source: None,
        }
    }

    pub fn phase(index: usize, name: &str, source: BosunError) -> Self {
        Self::Phase {
            index,
            name: name.to_string(),
            source: Box::new(source),
        }
    }

    /// True when the failure is the version-control "nothing to commit"
    /// sentinel, which callers downgrade to an informational outcome.
    pub fn is_idempotent_noop(&self) -> bool {
        matches!(self, Self::Collaborator { message, .. } if message.contains(crate::ops::git::NOTHING_TO_COMMIT))
    }
}

impl From<ProcessError> for BosunError {
    fn from(err: ProcessError) -> Self {
        let tool = match &err {
            ProcessError::CommandNotFound(program) => program.clone(),
            ProcessError::Timeout { command, .. } | ProcessError::Io { command, .. } => command
                .split_whitespace()
                .next()
                .unwrap_or("subprocess")
                .to_string(),
            _ => "subprocess".to_string(),
        };
        Self::Collaborator {
            tool,
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_error_names_origin() {
        let err = BosunError::phase(3, "commit", BosunError::collaborator("git", "push rejected"));
        let rendered = err.to_string();
        assert!(rendered.contains("phase 3"));
        assert!(rendered.contains("commit"));
        assert!(rendered.contains("git: push rejected"));
    }

    #[test]
    fn test_missing_secrets_enumerates_names() {
        let err = BosunError::MissingSecrets {
            names: vec!["sops-age".to_string(), "git-auth".to_string()],
        };
        assert_eq!(err.to_string(), "2 secret(s) missing: sops-age, git-auth");
    }

    #[test]
    fn test_idempotent_noop_detection() {
        let noop = BosunError::collaborator("git", "nothing to commit, working tree clean");
        assert!(noop.is_idempotent_noop());
        let real = BosunError::collaborator("git", "remote rejected push");
        assert!(!real.is_idempotent_noop());
    }
}
