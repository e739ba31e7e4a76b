//! Mock collaborators
//!
//! Plain configurable structs: set the public fields, wrap in `Arc`, hand
//! to the engine under test. All invocations land in the shared recorder in
//! call order.

use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::{BosunError, Result};
use crate::ops::{
    ClusterControl, CommitRequest, DeploymentTool, EncryptionOracle, KeyDerivationTool,
    ReconcilerProbe, Renderer, VersionControlHost,
};

/// Shared, ordered record of collaborator invocations.
#[derive(Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    pub fn record(&self, event: impl Into<String>) {
        self.events.lock().unwrap().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    /// Position of the first event equal to `needle`, if recorded.
    pub fn position(&self, needle: &str) -> Option<usize> {
        self.events.lock().unwrap().iter().position(|e| e == needle)
    }
}

pub struct MockRenderer {
    pub output: String,
    pub fail: bool,
    pub recorder: Recorder,
}

#[async_trait]
impl Renderer for MockRenderer {
    async fn render(&self, _template_ref: &str, _entrypoint: &str, _params: &str) -> Result<String> {
        self.recorder.record("render");
        if self.fail {
            return Err(BosunError::collaborator("kcl", "render failed"));
        }
        Ok(self.output.clone())
    }
}

pub struct MockEncryption {
    pub fail: bool,
    pub recorder: Recorder,
}

#[async_trait]
impl EncryptionOracle for MockEncryption {
    async fn encrypt(
        &self,
        plaintext: &str,
        _public_key: &str,
        _policy_file: Option<&Path>,
    ) -> Result<String> {
        self.recorder.record("encrypt");
        if self.fail {
            return Err(BosunError::collaborator("sops", "encryption failed"));
        }
        Ok(format!("ENC({plaintext})"))
    }
}

pub struct MockCluster {
    /// Secret names the cluster reports as existing.
    pub existing: Vec<String>,
    pub fail_apply: bool,
    pub recorder: Recorder,
}

#[async_trait]
impl ClusterControl for MockCluster {
    async fn apply(&self, manifests: &str, _namespace: &str) -> Result<String> {
        if manifests.contains("kind: Secret") {
            self.recorder.record("apply-secrets");
        } else {
            self.recorder.record("apply-config");
        }
        if self.fail_apply {
            return Err(BosunError::collaborator("kubectl", "apply failed"));
        }
        Ok("applied".to_string())
    }

    async fn query_exists(&self, _kind: &str, name: &str, _namespace: &str) -> Result<bool> {
        self.recorder.record(format!("query:{name}"));
        Ok(self.existing.iter().any(|n| n == name))
    }
}

pub struct MockVcs {
    /// When set, commit fails with this message (may carry the
    /// "nothing to commit" sentinel).
    pub error_message: Option<String>,
    pub recorder: Recorder,
}

#[async_trait]
impl VersionControlHost for MockVcs {
    async fn commit(&self, request: &CommitRequest, _token: &str) -> Result<String> {
        self.recorder.record("commit");
        if let Some(message) = &self.error_message {
            return Err(BosunError::collaborator("git", message.clone()));
        }
        Ok(format!(
            "Committed to {} branch {} at {}",
            request.repository, request.branch, request.destination_path
        ))
    }
}

pub struct MockDeployer {
    pub fail: bool,
    pub recorder: Recorder,
}

#[async_trait]
impl DeploymentTool for MockDeployer {
    async fn apply(&self, _src: Option<&Path>, _reference: &str, _operation: &str) -> Result<()> {
        self.recorder.record("deploy");
        if self.fail {
            return Err(BosunError::collaborator("helmfile", "deploy failed"));
        }
        Ok(())
    }
}

pub struct MockKeygen {
    /// Public key the derivation reports.
    pub derived: String,
    pub recorder: Recorder,
}

#[async_trait]
impl KeyDerivationTool for MockKeygen {
    async fn derive_public_key(&self, _private_key: &str) -> Result<String> {
        self.recorder.record("derive-key");
        Ok(self.derived.clone())
    }
}

pub struct MockProbe {
    /// Number of initial readiness checks that fail before success.
    pub fail_checks: usize,
    pub fail_followups: bool,
    pub recorder: Recorder,
    pub checks_seen: AtomicUsize,
}

impl MockProbe {
    pub fn new(recorder: Recorder) -> Self {
        Self {
            fail_checks: 0,
            fail_followups: false,
            recorder,
            checks_seen: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ReconcilerProbe for MockProbe {
    async fn check(&self) -> Result<String> {
        self.recorder.record("probe-check");
        let seen = self.checks_seen.fetch_add(1, Ordering::SeqCst);
        if seen < self.fail_checks {
            return Err(BosunError::collaborator("flux", "controller not ready"));
        }
        Ok("all checks passed".to_string())
    }

    async fn reconcile_source(&self, _namespace: &str) -> Result<String> {
        self.recorder.record("reconcile");
        if self.fail_followups {
            return Err(BosunError::collaborator("flux", "reconcile timed out"));
        }
        Ok("source reconciled".to_string())
    }

    async fn list_resources(&self, _namespace: &str) -> Result<String> {
        self.recorder.record("get-all");
        if self.fail_followups {
            return Err(BosunError::collaborator("flux", "listing failed"));
        }
        Ok("kustomization/flux-system Ready".to_string())
    }
}
