use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{run_checked, DeploymentTool};
use crate::error::Result;
use crate::subprocess::{ProcessCommandBuilder, ProcessRunner};

/// Deploys the reconciling operator via `helmfile`.
pub struct HelmfileDeployer {
    runner: Arc<dyn ProcessRunner>,
    kubeconfig: Option<PathBuf>,
}

impl HelmfileDeployer {
    pub fn new(runner: Arc<dyn ProcessRunner>, kubeconfig: Option<PathBuf>) -> Self {
        Self { runner, kubeconfig }
    }
}

#[async_trait]
impl DeploymentTool for HelmfileDeployer {
    async fn apply(&self, src: Option<&Path>, reference: &str, operation: &str) -> Result<()> {
        let mut builder = ProcessCommandBuilder::new("helmfile").args(["-f", reference, operation]);
        if let Some(dir) = src {
            builder = builder.current_dir(dir);
        }
        if let Some(path) = &self.kubeconfig {
            builder = builder.env("KUBECONFIG", &path.to_string_lossy());
        }
        run_checked(&self.runner, "helmfile", builder.build()).await?;
        Ok(())
    }
}
