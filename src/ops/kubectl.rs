use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

use super::{run_checked, ClusterControl};
use crate::error::Result;
use crate::subprocess::{ProcessCommandBuilder, ProcessRunner};

/// Applies manifests and queries resources through `kubectl`.
pub struct KubectlCluster {
    runner: Arc<dyn ProcessRunner>,
    kubeconfig: Option<PathBuf>,
}

impl KubectlCluster {
    pub fn new(runner: Arc<dyn ProcessRunner>, kubeconfig: Option<PathBuf>) -> Self {
        Self { runner, kubeconfig }
    }

    fn builder(&self) -> ProcessCommandBuilder {
        let builder = ProcessCommandBuilder::new("kubectl");
        match &self.kubeconfig {
            Some(path) => builder.env("KUBECONFIG", &path.to_string_lossy()),
            None => builder,
        }
    }
}

#[async_trait]
impl ClusterControl for KubectlCluster {
    async fn apply(&self, manifests: &str, namespace: &str) -> Result<String> {
        let command = self
            .builder()
            .args(["apply", "-f", "-", "-n", namespace])
            .stdin(manifests.to_string())
            .build();
        let output = run_checked(&self.runner, "kubectl", command).await?;
        Ok(output.stdout)
    }

    async fn query_exists(&self, kind: &str, name: &str, namespace: &str) -> Result<bool> {
        let command = self
            .builder()
            .args(["get", kind, name, "-n", namespace, "-o", "name"])
            .build();
        // Read-only probe: a non-zero exit means "not found", not a failure.
        let output = self.runner.run(command).await?;
        Ok(output.success())
    }
}
