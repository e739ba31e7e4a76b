//! Run configuration
//!
//! A bootstrap or validation invocation is driven by one immutable config
//! value built from CLI flags (or loaded from a YAML file). Phase and check
//! enablement are pure predicates over these values, so the pipeline shape
//! can be unit tested without touching any external tool.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{BosunError, Result};

/// Fallback when a reconciliation timeout string fails to parse.
pub const DEFAULT_RECONCILIATION_TIMEOUT: Duration = Duration::from_secs(300);

/// Inputs for one `bosun bootstrap` run. Constructed once, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BootstrapConfig {
    /// OCI module reference for the configuration renderer.
    pub template_ref: String,
    /// Renderer entrypoint file.
    pub entrypoint: String,
    /// Extra comma-separated key=value renderer parameters.
    pub config_parameters: String,
    /// Version of the reconciling controller to render.
    pub controller_version: String,
    pub namespace: String,
    /// Repository in "owner/repo" form; empty when git is not involved.
    pub repository: String,
    pub branch: String,
    /// Destination path for committed artifacts within the repository.
    pub destination_path: String,
    /// Git reference the controller should track (e.g. refs/heads/main).
    pub git_ref: String,
    /// Whether the renderer should also emit Secret documents.
    pub render_secrets: bool,
    pub helmfile_ref: String,
    pub helmfile_src: Option<PathBuf>,
    pub kubeconfig: Option<PathBuf>,
    pub sops_config: Option<PathBuf>,

    pub encrypt_secrets: bool,
    pub commit_to_git: bool,
    pub deploy_operator: bool,
    pub apply_config: bool,
    pub apply_secrets: bool,
    pub wait_for_reconciliation: bool,
    #[serde(with = "humantime_serde")]
    pub reconciliation_timeout: Duration,

    // Credentials arrive via environment or flags; never serialized back out.
    #[serde(skip_serializing)]
    pub git_username: Option<String>,
    #[serde(skip_serializing)]
    pub git_password: Option<String>,
    #[serde(skip_serializing)]
    pub git_token: Option<String>,
    #[serde(skip_serializing)]
    pub age_private_key: Option<String>,
    #[serde(skip_serializing)]
    pub age_public_key: Option<String>,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            template_ref: "oci://ghcr.io/stuttgart-things/kcl-flux-instance:0.3.3".to_string(),
            entrypoint: "main.k".to_string(),
            config_parameters: String::new(),
            controller_version: "2.4.0".to_string(),
            namespace: "flux-system".to_string(),
            repository: String::new(),
            branch: "main".to_string(),
            destination_path: "clusters/".to_string(),
            git_ref: "refs/heads/main".to_string(),
            render_secrets: false,
            helmfile_ref: "helmfile.yaml".to_string(),
            helmfile_src: None,
            kubeconfig: None,
            sops_config: None,
            encrypt_secrets: false,
            commit_to_git: false,
            deploy_operator: true,
            apply_config: false,
            apply_secrets: true,
            wait_for_reconciliation: true,
            reconciliation_timeout: DEFAULT_RECONCILIATION_TIMEOUT,
            git_username: None,
            git_password: None,
            git_token: None,
            age_private_key: None,
            age_public_key: None,
        }
    }
}

impl BootstrapConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            BosunError::config(format!("cannot read config file {}: {e}", path.display()))
        })?;
        serde_yaml::from_str(&raw).map_err(|e| {
            BosunError::config(format!("cannot parse config file {}: {e}", path.display()))
        })
    }

    /// Parse a human duration ("5m", "300s"), falling back to the default on
    /// malformed input rather than failing the run.
    pub fn parse_timeout(raw: &str) -> Duration {
        humantime_serde::re::humantime::parse_duration(raw)
            .unwrap_or(DEFAULT_RECONCILIATION_TIMEOUT)
    }
}

/// Inputs for one `bosun validate` run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ValidateConfig {
    /// Directory to validate.
    pub src: PathBuf,
    pub yaml: bool,
    pub yaml_config: String,
    pub markdown: bool,
    pub markdown_config: String,
    pub secrets: bool,
    /// Regex of files the secret scan should skip.
    pub secrets_exclude: Option<String>,
    pub pre_commit: bool,
    pub pre_commit_config: String,
    /// Hook ids the pre-commit check should skip.
    pub skip_hooks: Vec<String>,
    /// Failure policy evaluated after all checks complete.
    pub fail_on: String,
    /// Optional file to write the merged report to.
    pub output: Option<PathBuf>,
    /// Upper bound on concurrently running checks.
    pub max_parallel: usize,
}

impl Default for ValidateConfig {
    fn default() -> Self {
        Self {
            src: PathBuf::from("."),
            yaml: true,
            yaml_config: ".yamllint".to_string(),
            markdown: true,
            markdown_config: ".mdlrc".to_string(),
            secrets: true,
            secrets_exclude: None,
            pre_commit: false,
            pre_commit_config: ".pre-commit-config.yaml".to_string(),
            skip_hooks: Vec::new(),
            fail_on: "none".to_string(),
            output: None,
            max_parallel: 4,
        }
    }
}

impl ValidateConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            BosunError::config(format!("cannot read config file {}: {e}", path.display()))
        })?;
        serde_yaml::from_str(&raw).map_err(|e| {
            BosunError::config(format!("cannot parse config file {}: {e}", path.display()))
        })
    }
}
