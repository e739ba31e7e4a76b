use async_trait::async_trait;
use std::sync::Arc;

use super::{run_checked, Renderer};
use crate::error::Result;
use crate::subprocess::{ProcessCommandBuilder, ProcessRunner};

/// Renders multi-document YAML from a KCL module via `kcl run`.
pub struct KclRenderer {
    runner: Arc<dyn ProcessRunner>,
}

impl KclRenderer {
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl Renderer for KclRenderer {
    async fn render(&self, template_ref: &str, entrypoint: &str, params: &str) -> Result<String> {
        let mut builder = ProcessCommandBuilder::new("kcl")
            .arg("run")
            .arg(template_ref)
            .arg(entrypoint)
            .args(["--format", "yaml"]);

        // Comma-separated key=value pairs become individual -D arguments.
        for pair in params.split(',').filter(|p| !p.trim().is_empty()) {
            builder = builder.args(["-D", pair.trim()]);
        }

        let output = run_checked(&self.runner, "kcl", builder.build()).await?;
        Ok(output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subprocess::MockProcessRunner;

    #[tokio::test]
    async fn test_render_passes_parameters_individually() {
        let mock = MockProcessRunner::new();
        mock.stub_success("kcl", "kind: ConfigMap\n");
        let renderer = KclRenderer::new(Arc::new(mock.clone()));

        let rendered = renderer
            .render(
                "oci://ghcr.io/acme/module:1.0.0",
                "main.k",
                "name=flux,namespace=flux-system",
            )
            .await
            .unwrap();
        assert!(rendered.contains("ConfigMap"));

        let call = &mock.call_history()[0];
        assert_eq!(call.args[0], "run");
        assert_eq!(call.args[1], "oci://ghcr.io/acme/module:1.0.0");
        assert!(call.args.windows(2).any(|w| w == ["-D", "name=flux"]));
        assert!(call
            .args
            .windows(2)
            .any(|w| w == ["-D", "namespace=flux-system"]));
    }
}
