//! Phase specifications and the run log
//!
//! The pipeline shape is data: each phase carries its severity and an
//! enablement predicate over the immutable run configuration plus the
//! artifacts produced so far. This keeps the sequence unit-testable without
//! executing any side-effecting action.

use crate::config::BootstrapConfig;
use crate::error::BosunError;
use crate::manifest::DocumentSet;

/// Whether a phase failure aborts the remaining pipeline or is recorded only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Fatal,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseStatus {
    Skipped,
    Succeeded,
    Failed,
}

/// Decision of a phase's enablement predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseDecision {
    Run,
    Skip(String),
}

/// Artifacts accumulated across phases within one run.
#[derive(Debug, Default)]
pub struct PhaseState {
    /// Classified documents from the render phase.
    pub documents: DocumentSet,
    /// Encrypted secret blob, when the encryption phase ran.
    pub encrypted_secrets: Option<String>,
}

impl PhaseState {
    /// Secret content destined for the git commit: the encrypted blob when
    /// present, otherwise the plain secret documents.
    pub fn secrets_for_commit(&self) -> Option<String> {
        if let Some(encrypted) = &self.encrypted_secrets {
            return Some(encrypted.clone());
        }
        if self.documents.has_secrets() {
            return Some(self.documents.secret_content());
        }
        None
    }
}

/// One step of the fixed pipeline.
pub struct PhaseSpec {
    pub index: usize,
    pub name: &'static str,
    pub severity: Severity,
    pub enabled: fn(&BootstrapConfig, &PhaseState) -> PhaseDecision,
}

/// The fixed phase sequence. Phase 6 (apply-secrets) depends on phase 4
/// (deploy-operator) having run or been skipped first; the sequential index
/// order is what guarantees that.
pub fn pipeline() -> Vec<PhaseSpec> {
    use PhaseDecision::{Run, Skip};

    vec![
        PhaseSpec {
            index: 0,
            name: "validate-keys",
            severity: Severity::Fatal,
            enabled: |cfg, _| {
                if cfg.age_private_key.is_some() && cfg.age_public_key.is_some() {
                    Run
                } else {
                    Skip("age private or public key not provided".to_string())
                }
            },
        },
        PhaseSpec {
            index: 1,
            name: "render",
            severity: Severity::Fatal,
            enabled: |_, _| Run,
        },
        PhaseSpec {
            index: 2,
            name: "encrypt",
            severity: Severity::Fatal,
            enabled: |cfg, state| {
                if !cfg.encrypt_secrets {
                    Skip("encryption not requested".to_string())
                } else if !state.documents.has_secrets() {
                    Skip("no secret documents to encrypt".to_string())
                } else {
                    Run
                }
            },
        },
        PhaseSpec {
            index: 3,
            name: "commit",
            severity: Severity::Fatal,
            enabled: |cfg, _| {
                if cfg.commit_to_git {
                    Run
                } else {
                    Skip("commit to git not requested".to_string())
                }
            },
        },
        PhaseSpec {
            index: 4,
            name: "deploy-operator",
            severity: Severity::Fatal,
            enabled: |cfg, _| {
                if cfg.deploy_operator {
                    Run
                } else {
                    Skip("operator deployment not requested".to_string())
                }
            },
        },
        PhaseSpec {
            index: 5,
            name: "apply-config",
            severity: Severity::Fatal,
            enabled: |cfg, state| {
                if cfg.apply_config && state.documents.has_config() {
                    Run
                } else {
                    Skip("config apply not requested or no config documents".to_string())
                }
            },
        },
        PhaseSpec {
            index: 6,
            name: "apply-secrets",
            severity: Severity::Fatal,
            enabled: |cfg, state| {
                if cfg.apply_secrets && state.documents.has_secrets() {
                    Run
                } else {
                    Skip("secret apply not requested or no secret documents".to_string())
                }
            },
        },
        PhaseSpec {
            index: 7,
            name: "verify-secrets",
            severity: Severity::Warning,
            enabled: |cfg, state| {
                if cfg.apply_secrets && state.documents.has_secrets() {
                    Run
                } else {
                    Skip("no secrets to verify".to_string())
                }
            },
        },
        PhaseSpec {
            index: 8,
            name: "wait-reconciliation",
            severity: Severity::Fatal,
            enabled: |cfg, _| {
                if cfg.wait_for_reconciliation {
                    Run
                } else {
                    Skip("reconciliation wait not requested".to_string())
                }
            },
        },
    ]
}

/// One phase's recorded result.
#[derive(Debug, Clone)]
pub struct PhaseOutcome {
    pub index: usize,
    pub name: &'static str,
    pub status: PhaseStatus,
    pub message: String,
    pub error: Option<String>,
}

impl PhaseOutcome {
    pub fn skipped(spec: &PhaseSpec, reason: String) -> Self {
        Self {
            index: spec.index,
            name: spec.name,
            status: PhaseStatus::Skipped,
            message: format!("Skipped ({reason})"),
            error: None,
        }
    }

    pub fn succeeded(spec: &PhaseSpec, message: String) -> Self {
        Self {
            index: spec.index,
            name: spec.name,
            status: PhaseStatus::Succeeded,
            message,
            error: None,
        }
    }

    pub fn failed(spec: &PhaseSpec, error: &BosunError) -> Self {
        let label = match spec.severity {
            Severity::Fatal => "Failed",
            Severity::Warning => "Warning",
        };
        Self {
            index: spec.index,
            name: spec.name,
            status: PhaseStatus::Failed,
            message: format!("{label} - {error}"),
            error: Some(error.to_string()),
        }
    }
}

/// Append-only log of phase outcomes, in phase index order. A fatal failure
/// truncates it: later phases never append.
#[derive(Debug, Default)]
pub struct RunLog {
    outcomes: Vec<PhaseOutcome>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, outcome: PhaseOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn outcomes(&self) -> &[PhaseOutcome] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// One line per attempted phase.
    pub fn render(&self) -> String {
        self.outcomes
            .iter()
            .map(|o| format!("Phase {}: {}", o.index, o.message))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
