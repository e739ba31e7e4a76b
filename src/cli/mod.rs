//! CLI argument parsing
//!
//! Flags map onto the immutable run configurations in [`crate::config`].
//! Credentials are never accepted as flags; they are read from the
//! environment so they stay out of shell history and process listings.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{BootstrapConfig, ValidateConfig};

/// Environment variables carrying credentials.
pub const ENV_AGE_PRIVATE_KEY: &str = "BOSUN_AGE_KEY";
pub const ENV_AGE_PUBLIC_KEY: &str = "BOSUN_AGE_PUBLIC_KEY";
pub const ENV_GIT_TOKEN: &str = "BOSUN_GIT_TOKEN";
pub const ENV_GIT_USERNAME: &str = "BOSUN_GIT_USERNAME";
pub const ENV_GIT_PASSWORD: &str = "BOSUN_GIT_PASSWORD";

/// Bootstrap GitOps controllers and validate repositories
#[derive(Parser)]
#[command(name = "bosun")]
#[command(about = "Bootstrap GitOps controllers onto clusters and run policy-driven repository validation", long_about = None)]
pub struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace, -vvv for all)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full bootstrap pipeline against a cluster
    Bootstrap(BootstrapArgs),
    /// Render controller configuration and print the classified summary
    Render(RenderArgs),
    /// Verify that Secrets from a manifest file exist in-cluster
    VerifySecrets(VerifySecretsArgs),
    /// Run repository checks concurrently and evaluate a failure policy
    Validate(ValidateArgs),
}

#[derive(Parser, Debug)]
pub struct BootstrapArgs {
    /// Load configuration from a YAML file; flags override nothing when set
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// OCI module reference for the configuration renderer
    #[arg(long)]
    pub template_ref: Option<String>,

    /// Renderer entrypoint file
    #[arg(long, default_value = "main.k")]
    pub entrypoint: String,

    /// Extra comma-separated key=value renderer parameters
    #[arg(long, default_value = "")]
    pub config_parameters: String,

    /// Controller version to render
    #[arg(long, default_value = "2.4.0")]
    pub controller_version: String,

    /// Target namespace
    #[arg(short, long, default_value = "flux-system")]
    pub namespace: String,

    /// Repository in "owner/repo" form
    #[arg(long, default_value = "")]
    pub repository: String,

    /// Branch for git operations
    #[arg(long, default_value = "main")]
    pub branch: String,

    /// Destination path within the repository
    #[arg(long, default_value = "clusters/")]
    pub destination_path: String,

    /// Git reference the controller should track
    #[arg(long, default_value = "refs/heads/main")]
    pub git_ref: String,

    /// Render Secret documents as well
    #[arg(long)]
    pub render_secrets: bool,

    /// Helmfile reference for operator deployment
    #[arg(long, default_value = "helmfile.yaml")]
    pub helmfile_ref: String,

    /// Directory containing the helmfile
    #[arg(long)]
    pub helmfile_src: Option<PathBuf>,

    /// Kubeconfig path (falls back to the ambient KUBECONFIG)
    #[arg(long)]
    pub kubeconfig: Option<PathBuf>,

    /// SOPS config file (.sops.yaml)
    #[arg(long)]
    pub sops_config: Option<PathBuf>,

    /// Encrypt secret documents before committing
    #[arg(long)]
    pub encrypt_secrets: bool,

    /// Commit rendered artifacts to git
    #[arg(long)]
    pub commit_to_git: bool,

    /// Deploy the reconciling operator
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub deploy_operator: bool,

    /// Apply rendered config documents to the cluster
    #[arg(long)]
    pub apply_config: bool,

    /// Apply rendered secret documents to the cluster
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub apply_secrets: bool,

    /// Wait for the controller to reconcile
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub wait: bool,

    /// Reconciliation timeout ("5m", "300s"); malformed values fall back to
    /// the default
    #[arg(long, default_value = "5m")]
    pub reconciliation_timeout: String,
}

impl BootstrapArgs {
    /// Build the immutable run configuration, merging in credentials from
    /// the environment.
    pub fn into_config(self) -> crate::error::Result<BootstrapConfig> {
        let mut config = match &self.config {
            Some(path) => BootstrapConfig::from_file(path)?,
            None => BootstrapConfig {
                template_ref: self
                    .template_ref
                    .unwrap_or_else(|| BootstrapConfig::default().template_ref),
                entrypoint: self.entrypoint,
                config_parameters: self.config_parameters,
                controller_version: self.controller_version,
                namespace: self.namespace,
                repository: self.repository,
                branch: self.branch,
                destination_path: self.destination_path,
                git_ref: self.git_ref,
                render_secrets: self.render_secrets,
                helmfile_ref: self.helmfile_ref,
                helmfile_src: self.helmfile_src,
                kubeconfig: self.kubeconfig,
                sops_config: self.sops_config,
                encrypt_secrets: self.encrypt_secrets,
                commit_to_git: self.commit_to_git,
                deploy_operator: self.deploy_operator,
                apply_config: self.apply_config,
                apply_secrets: self.apply_secrets,
                wait_for_reconciliation: self.wait,
                reconciliation_timeout: BootstrapConfig::parse_timeout(
                    &self.reconciliation_timeout,
                ),
                ..BootstrapConfig::default()
            },
        };

        config.age_private_key = env_var(ENV_AGE_PRIVATE_KEY);
        config.age_public_key = env_var(ENV_AGE_PUBLIC_KEY);
        config.git_token = env_var(ENV_GIT_TOKEN);
        config.git_username = env_var(ENV_GIT_USERNAME);
        config.git_password = env_var(ENV_GIT_PASSWORD);
        Ok(config)
    }
}

#[derive(Parser, Debug)]
pub struct RenderArgs {
    /// OCI module reference for the configuration renderer
    #[arg(long)]
    pub template_ref: Option<String>,

    /// Renderer entrypoint file
    #[arg(long, default_value = "main.k")]
    pub entrypoint: String,

    /// Comma-separated key=value renderer parameters
    #[arg(long, default_value = "")]
    pub config_parameters: String,

    /// Controller version to render
    #[arg(long, default_value = "2.4.0")]
    pub controller_version: String,

    /// Target namespace
    #[arg(short, long, default_value = "flux-system")]
    pub namespace: String,

    /// Print the raw rendered documents instead of the classified summary
    #[arg(long)]
    pub raw: bool,
}

#[derive(Parser, Debug)]
pub struct VerifySecretsArgs {
    /// Manifest file containing Secret documents
    #[arg(short, long)]
    pub file: PathBuf,

    /// Namespace to check against
    #[arg(short, long, default_value = "flux-system")]
    pub namespace: String,

    /// Kubeconfig path
    #[arg(long)]
    pub kubeconfig: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Load configuration from a YAML file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory to validate
    #[arg(long, default_value = ".")]
    pub src: PathBuf,

    /// Run the YAML lint check
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub yaml: bool,

    /// Run the Markdown lint check
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub markdown: bool,

    /// Run the secret scan check
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub secrets: bool,

    /// Run the pre-commit hooks check
    #[arg(long)]
    pub pre_commit: bool,

    /// Hook ids the pre-commit check should skip
    #[arg(long)]
    pub skip_hooks: Vec<String>,

    /// Regex of files the secret scan should skip
    #[arg(long)]
    pub exclude_files: Option<String>,

    /// Failure policy: none, any, error-level, warning-level, or a check key
    #[arg(long, default_value = "none")]
    pub fail_on: String,

    /// Write the merged report to this file as well
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl ValidateArgs {
    pub fn into_config(self) -> crate::error::Result<ValidateConfig> {
        if let Some(path) = &self.config {
            return ValidateConfig::from_file(path);
        }
        Ok(ValidateConfig {
            src: self.src,
            yaml: self.yaml,
            markdown: self.markdown,
            secrets: self.secrets,
            secrets_exclude: self.exclude_files,
            pre_commit: self.pre_commit,
            skip_hooks: self.skip_hooks,
            fail_on: self.fail_on,
            output: self.output,
            ..ValidateConfig::default()
        })
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bootstrap_args_defaults() {
        let cli = Cli::try_parse_from(["bosun", "bootstrap"]).unwrap();
        let Commands::Bootstrap(args) = cli.command else {
            panic!("expected bootstrap command");
        };
        let config = args.into_config().unwrap();
        assert!(config.deploy_operator);
        assert!(config.apply_secrets);
        assert!(config.wait_for_reconciliation);
        assert!(!config.commit_to_git);
        assert_eq!(config.reconciliation_timeout.as_secs(), 300);
    }

    #[test]
    fn test_bootstrap_boolean_flags_take_values() {
        let cli = Cli::try_parse_from([
            "bosun",
            "bootstrap",
            "--deploy-operator",
            "false",
            "--apply-config",
            "--reconciliation-timeout",
            "90s",
        ])
        .unwrap();
        let Commands::Bootstrap(args) = cli.command else {
            panic!("expected bootstrap command");
        };
        let config = args.into_config().unwrap();
        assert!(!config.deploy_operator);
        assert!(config.apply_config);
        assert_eq!(config.reconciliation_timeout.as_secs(), 90);
    }

    #[test]
    fn test_validate_args_map_to_config() {
        let cli = Cli::try_parse_from([
            "bosun",
            "validate",
            "--src",
            "/repo",
            "--markdown",
            "false",
            "--fail-on",
            "any",
            "--skip-hooks",
            "check-json",
        ])
        .unwrap();
        let Commands::Validate(args) = cli.command else {
            panic!("expected validate command");
        };
        let config = args.into_config().unwrap();
        assert_eq!(config.src, PathBuf::from("/repo"));
        assert!(!config.markdown);
        assert_eq!(config.fail_on, "any");
        assert_eq!(config.skip_hooks, vec!["check-json"]);
    }
}
