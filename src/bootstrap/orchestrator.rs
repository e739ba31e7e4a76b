//! Sequential dependency-ordered bootstrap orchestrator
//!
//! Walks the fixed phase sequence, evaluating each phase's enablement
//! predicate against the immutable run configuration and the artifacts
//! produced so far. A fatal failure stops the pipeline immediately; a
//! warning failure is recorded and execution continues. The accumulated run
//! log is returned even when the pipeline aborts.

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

use super::phase::{pipeline, PhaseDecision, PhaseOutcome, PhaseState, RunLog, Severity};
use super::verify::SecretVerifier;
use super::wait::ReconciliationWaiter;
use crate::config::BootstrapConfig;
use crate::error::{BosunError, Result};
use crate::manifest;
use crate::ops::{
    AgeKeygen, ClusterControl, CommitRequest, DeploymentTool, EncryptionOracle, FluxProbe,
    GitCommitter, HelmfileDeployer, KclRenderer, KeyDerivationTool, KubectlCluster,
    ReconcilerProbe, Renderer, SopsEncryptor, VersionControlHost,
};
use crate::subprocess::SubprocessManager;

/// External collaborators the pipeline drives.
pub struct Collaborators {
    pub renderer: Arc<dyn Renderer>,
    pub encryption: Arc<dyn EncryptionOracle>,
    pub cluster: Arc<dyn ClusterControl>,
    pub vcs: Arc<dyn VersionControlHost>,
    pub deployer: Arc<dyn DeploymentTool>,
    pub keygen: Arc<dyn KeyDerivationTool>,
    pub probe: Arc<dyn ReconcilerProbe>,
}

impl Collaborators {
    /// Adapters backed by the real CLI tools.
    pub fn production(subprocess: &SubprocessManager, kubeconfig: Option<PathBuf>) -> Self {
        let runner = subprocess.runner();
        Self {
            renderer: Arc::new(KclRenderer::new(Arc::clone(&runner))),
            encryption: Arc::new(SopsEncryptor::new(Arc::clone(&runner))),
            cluster: Arc::new(KubectlCluster::new(Arc::clone(&runner), kubeconfig.clone())),
            vcs: Arc::new(GitCommitter::new(Arc::clone(&runner))),
            deployer: Arc::new(HelmfileDeployer::new(Arc::clone(&runner), kubeconfig.clone())),
            keygen: Arc::new(AgeKeygen::new(Arc::clone(&runner))),
            probe: Arc::new(FluxProbe::new(runner, kubeconfig)),
        }
    }
}

/// Result of one orchestrator invocation: the rendered report, the full run
/// log, and the terminating error when the pipeline aborted.
pub struct BootstrapOutcome {
    pub report: String,
    pub log: RunLog,
    pub error: Option<BosunError>,
}

pub struct BootstrapOrchestrator {
    config: BootstrapConfig,
    collaborators: Collaborators,
    state: PhaseState,
    shutdown: Option<watch::Receiver<bool>>,
}

impl BootstrapOrchestrator {
    pub fn new(config: BootstrapConfig, collaborators: Collaborators) -> Self {
        Self {
            config,
            collaborators,
            state: PhaseState::default(),
            shutdown: None,
        }
    }

    /// Wire a shutdown signal into the reconciliation wait.
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Run the full pipeline. Consumes the orchestrator: each invocation
    /// owns a fresh run log and phase state.
    pub async fn run(mut self) -> BootstrapOutcome {
        let mut log = RunLog::new();

        for spec in pipeline() {
            match (spec.enabled)(&self.config, &self.state) {
                PhaseDecision::Skip(reason) => {
                    info!("phase {} ({}) skipped: {reason}", spec.index, spec.name);
                    log.push(PhaseOutcome::skipped(&spec, reason));
                    continue;
                }
                PhaseDecision::Run => {}
            }

            info!("phase {} ({}) starting", spec.index, spec.name);
            match self.run_phase(spec.index).await {
                Ok(message) => {
                    info!("phase {} ({}) succeeded", spec.index, spec.name);
                    log.push(PhaseOutcome::succeeded(&spec, message));
                }
                Err(err) => match spec.severity {
                    Severity::Fatal => {
                        warn!("phase {} ({}) failed: {err}", spec.index, spec.name);
                        log.push(PhaseOutcome::failed(&spec, &err));
                        let error = BosunError::phase(spec.index, spec.name, err);
                        return BootstrapOutcome {
                            report: log.render(),
                            log,
                            error: Some(error),
                        };
                    }
                    Severity::Warning => {
                        warn!(
                            "phase {} ({}) failed (advisory): {err}",
                            spec.index, spec.name
                        );
                        log.push(PhaseOutcome::failed(&spec, &err));
                    }
                },
            }
        }

        BootstrapOutcome {
            report: log.render(),
            log,
            error: None,
        }
    }

    async fn run_phase(&mut self, index: usize) -> Result<String> {
        match index {
            0 => self.validate_key_pair().await,
            1 => self.render_and_classify().await,
            2 => self.encrypt_secrets().await,
            3 => self.commit_artifacts().await,
            4 => self.deploy_operator().await,
            5 => self.apply_config().await,
            6 => self.apply_secrets().await,
            7 => self.verify_secrets().await,
            8 => self.wait_for_reconciliation().await,
            other => Err(BosunError::config(format!("unknown phase index {other}"))),
        }
    }

    /// Phase 0: derive the public key from the private half and compare.
    async fn validate_key_pair(&self) -> Result<String> {
        let private_key = self
            .config
            .age_private_key
            .as_deref()
            .ok_or_else(|| BosunError::config("key validation requires the private key"))?;
        let public_key = self
            .config
            .age_public_key
            .as_deref()
            .ok_or_else(|| BosunError::config("key validation requires the public key"))?
            .trim();

        let derived = self.collaborators.keygen.derive_public_key(private_key).await?;
        if derived != public_key {
            return Err(BosunError::config(format!(
                "derived public key {derived:?} does not match provided {public_key:?}"
            )));
        }
        Ok(format!("AGE key pair valid: {derived}"))
    }

    /// Phase 1: render the configuration documents and classify them.
    async fn render_and_classify(&mut self) -> Result<String> {
        let params = renderer_params(&self.config);
        let rendered = self
            .collaborators
            .renderer
            .render(&self.config.template_ref, &self.config.entrypoint, &params)
            .await?;
        self.state.documents = manifest::classify(&rendered);

        // Only parameter keys are logged; values may carry credentials.
        Ok(format!(
            "Rendered {} config doc(s) and {} secret doc(s) (parameter keys: {})",
            self.state.documents.config.len(),
            self.state.documents.secrets.len(),
            param_keys(&params).join(", ")
        ))
    }

    /// Phase 2: encrypt the secret documents for at-rest storage.
    async fn encrypt_secrets(&mut self) -> Result<String> {
        let public_key = self
            .config
            .age_public_key
            .as_deref()
            .ok_or_else(|| {
                BosunError::config("encryption requested but no public key supplied")
            })?
            .trim();

        let encrypted = self
            .collaborators
            .encryption
            .encrypt(
                &self.state.documents.secret_content(),
                public_key,
                self.config.sops_config.as_deref(),
            )
            .await?;
        self.state.encrypted_secrets = Some(encrypted);
        Ok("Secret documents encrypted".to_string())
    }

    /// Phase 3: commit rendered artifacts; an empty commit is a success.
    async fn commit_artifacts(&mut self) -> Result<String> {
        if self.config.repository.is_empty() {
            return Err(BosunError::config(
                "commit requested but no repository configured",
            ));
        }
        let token = self
            .config
            .git_token
            .as_deref()
            .ok_or_else(|| BosunError::config("commit requested but no git token supplied"))?;

        let mut files = vec![(
            "config.yaml".to_string(),
            self.state.documents.config_content(),
        )];
        if let Some(secrets) = self.state.secrets_for_commit() {
            files.push(("secrets.yaml".to_string(), secrets));
        }

        let request = CommitRequest {
            repository: self.config.repository.clone(),
            branch: self.config.branch.clone(),
            message: "Add rendered controller configuration".to_string(),
            destination_path: self.config.destination_path.clone(),
            files,
        };

        match self.collaborators.vcs.commit(&request, token).await {
            Ok(message) => Ok(message),
            Err(err) if err.is_idempotent_noop() => Ok(format!(
                "No changes to commit (config already up-to-date in {})",
                self.config.repository
            )),
            Err(err) => Err(err),
        }
    }

    /// Phase 4: deploy the reconciling operator.
    async fn deploy_operator(&self) -> Result<String> {
        self.collaborators
            .deployer
            .apply(
                self.config.helmfile_src.as_deref(),
                &self.config.helmfile_ref,
                "apply",
            )
            .await?;
        Ok("Operator deployed via helmfile".to_string())
    }

    /// Phase 5: apply config documents, preceded by the target namespace.
    async fn apply_config(&self) -> Result<String> {
        let namespace_doc = format!(
            "apiVersion: v1\nkind: Namespace\nmetadata:\n  name: {}",
            self.config.namespace
        );
        let content = format!(
            "{namespace_doc}\n---\n{}",
            self.state.documents.config_content()
        );
        self.collaborators
            .cluster
            .apply(&content, &self.config.namespace)
            .await?;
        Ok("Config documents applied to cluster".to_string())
    }

    /// Phase 6: apply secret documents. The operator consuming them has
    /// already been deployed or explicitly skipped at this point.
    async fn apply_secrets(&self) -> Result<String> {
        self.collaborators
            .cluster
            .apply(
                &self.state.documents.secret_content(),
                &self.config.namespace,
            )
            .await?;
        Ok("Secret documents applied to cluster".to_string())
    }

    /// Phase 7: advisory existence check for the applied secrets.
    async fn verify_secrets(&self) -> Result<String> {
        let verifier = SecretVerifier::new(Arc::clone(&self.collaborators.cluster));
        let (report, error) = verifier
            .verify(&self.state.documents.secrets, &self.config.namespace)
            .await;
        match error {
            Some(err) => Err(err),
            None => Ok(report),
        }
    }

    /// Phase 8: wait for the controller to reconcile.
    async fn wait_for_reconciliation(&self) -> Result<String> {
        ReconciliationWaiter::new(Arc::clone(&self.collaborators.probe))
            .wait(
                &self.config.namespace,
                self.config.reconciliation_timeout,
                self.shutdown.clone(),
            )
            .await
    }
}

/// Assemble the renderer parameter string from the run configuration.
pub fn renderer_params(config: &BootstrapConfig) -> String {
    let mut params = format!(
        "name=flux,namespace={},version={}",
        config.namespace, config.controller_version
    );
    if !config.repository.is_empty() {
        params.push_str(&format!(",gitUrl=https://github.com/{}", config.repository));
    }
    if !config.destination_path.is_empty() {
        params.push_str(&format!(",gitPath={}", config.destination_path));
    }
    if !config.git_ref.is_empty() {
        params.push_str(&format!(",gitRef={}", config.git_ref));
    }
    if !config.config_parameters.is_empty() {
        params.push_str(&format!(",{}", config.config_parameters));
    }
    if config.render_secrets {
        params.push_str(",renderSecrets=true");
        if let Some(username) = &config.git_username {
            params.push_str(&format!(",gitUsername={username}"));
        }
        if let Some(password) = &config.git_password {
            params.push_str(&format!(",gitPassword={password}"));
        }
        if let Some(key) = &config.age_private_key {
            params.push_str(&format!(",sopsAgeKey={key}"));
        }
    }
    params
}

/// Parameter keys only, safe for logging.
pub fn param_keys(params: &str) -> Vec<String> {
    params
        .split(',')
        .filter_map(|pair| pair.split_once('=').map(|(key, _)| key.to_string()))
        .collect()
}
