use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

use super::{run_checked, ReconcilerProbe};
use crate::error::Result;
use crate::subprocess::{ProcessCommandBuilder, ProcessRunner};

/// Probes the deployed controller through the `flux` CLI.
pub struct FluxProbe {
    runner: Arc<dyn ProcessRunner>,
    kubeconfig: Option<PathBuf>,
}

impl FluxProbe {
    pub fn new(runner: Arc<dyn ProcessRunner>, kubeconfig: Option<PathBuf>) -> Self {
        Self { runner, kubeconfig }
    }

    async fn flux(&self, args: &[&str]) -> Result<String> {
        let mut builder = ProcessCommandBuilder::new("flux").args(args);
        if let Some(path) = &self.kubeconfig {
            builder = builder.env("KUBECONFIG", &path.to_string_lossy());
        }
        let output = run_checked(&self.runner, "flux", builder.build()).await?;
        Ok(output.combined())
    }
}

#[async_trait]
impl ReconcilerProbe for FluxProbe {
    async fn check(&self) -> Result<String> {
        self.flux(&["check"]).await
    }

    async fn reconcile_source(&self, namespace: &str) -> Result<String> {
        self.flux(&["reconcile", "source", "git", "flux-system", "-n", namespace])
            .await
    }

    async fn list_resources(&self, namespace: &str) -> Result<String> {
        self.flux(&["get", "all", "-n", namespace]).await
    }
}
