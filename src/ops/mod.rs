//! Collaborator contracts and their CLI-tool adapters
//!
//! The pipeline engines only ever talk to these traits; each adapter drives
//! one external tool through the subprocess layer. Tests swap in the mocks
//! from `crate::testing` (engines) or stub `MockProcessRunner` (adapters).

pub mod age;
pub mod flux;
pub mod git;
pub mod helmfile;
pub mod kcl;
pub mod kubectl;
pub mod sops;

pub use age::AgeKeygen;
pub use flux::FluxProbe;
pub use git::GitCommitter;
pub use helmfile::HelmfileDeployer;
pub use kcl::KclRenderer;
pub use kubectl::KubectlCluster;
pub use sops::SopsEncryptor;

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

use crate::error::{BosunError, Result};
use crate::subprocess::{ProcessCommand, ProcessOutput, ProcessRunner};

/// Renders configuration documents from a template reference and parameters.
/// Assumed deterministic for identical inputs.
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, template_ref: &str, entrypoint: &str, params: &str) -> Result<String>;
}

/// Encrypts secret material for at-rest storage in git.
#[async_trait]
pub trait EncryptionOracle: Send + Sync {
    async fn encrypt(
        &self,
        plaintext: &str,
        public_key: &str,
        policy_file: Option<&Path>,
    ) -> Result<String>;
}

/// Applies manifests to and queries resources from the cluster.
#[async_trait]
pub trait ClusterControl: Send + Sync {
    async fn apply(&self, manifests: &str, namespace: &str) -> Result<String>;
    async fn query_exists(&self, kind: &str, name: &str, namespace: &str) -> Result<bool>;
}

/// One set of rendered artifacts to commit.
#[derive(Debug, Clone)]
pub struct CommitRequest {
    /// Repository in "owner/repo" form.
    pub repository: String,
    pub branch: String,
    pub message: String,
    /// Destination directory within the repository.
    pub destination_path: String,
    /// (file name, content) pairs written below the destination path.
    pub files: Vec<(String, String)>,
}

/// Commits artifacts to the version-control host. A failure whose message
/// contains [`git::NOTHING_TO_COMMIT`] signals the idempotent no-op case.
#[async_trait]
pub trait VersionControlHost: Send + Sync {
    async fn commit(&self, request: &CommitRequest, token: &str) -> Result<String>;
}

/// Deploys or upgrades the reconciling operator.
#[async_trait]
pub trait DeploymentTool: Send + Sync {
    async fn apply(&self, src: Option<&Path>, reference: &str, operation: &str) -> Result<()>;
}

/// Derives the public half of an asymmetric key pair.
#[async_trait]
pub trait KeyDerivationTool: Send + Sync {
    async fn derive_public_key(&self, private_key: &str) -> Result<String>;
}

/// Readiness and follow-up probes against the deployed controller.
#[async_trait]
pub trait ReconcilerProbe: Send + Sync {
    async fn check(&self) -> Result<String>;
    async fn reconcile_source(&self, namespace: &str) -> Result<String>;
    async fn list_resources(&self, namespace: &str) -> Result<String>;
}

/// Run a command and translate a non-zero exit into a collaborator error
/// carrying the tool's own output.
pub(crate) async fn run_checked(
    runner: &Arc<dyn ProcessRunner>,
    tool: &str,
    command: ProcessCommand,
) -> Result<ProcessOutput> {
    let output = runner.run(command).await?;
    if output.success() {
        Ok(output)
    } else {
        let combined = output.combined();
        let message = if combined.is_empty() {
            format!("exited with code {}", output.status.code().unwrap_or(-1))
        } else {
            combined
        };
        Err(BosunError::collaborator(tool, message))
    }
}
