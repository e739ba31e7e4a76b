//! GitOps bootstrap pipeline
//!
//! A fixed, dependency-ordered sequence of phases that renders controller
//! configuration, protects and publishes it, deploys the reconciling
//! operator, and waits for convergence. The phase table lives in [`phase`];
//! the engine walking it lives in [`orchestrator`].

pub mod orchestrator;
pub mod phase;
pub mod verify;
pub mod wait;

pub use orchestrator::{
    param_keys, renderer_params, BootstrapOrchestrator, BootstrapOutcome, Collaborators,
};
pub use phase::{
    pipeline, PhaseDecision, PhaseOutcome, PhaseSpec, PhaseState, PhaseStatus, RunLog, Severity,
};
pub use verify::SecretVerifier;
pub use wait::{ReconciliationWaiter, RECONCILE_POLL_INTERVAL};
