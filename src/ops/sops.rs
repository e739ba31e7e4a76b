use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

use super::{run_checked, EncryptionOracle};
use crate::error::Result;
use crate::subprocess::{ProcessCommandBuilder, ProcessRunner};

/// Encrypts YAML content with SOPS using an AGE recipient.
pub struct SopsEncryptor {
    runner: Arc<dyn ProcessRunner>,
}

impl SopsEncryptor {
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl EncryptionOracle for SopsEncryptor {
    async fn encrypt(
        &self,
        plaintext: &str,
        public_key: &str,
        policy_file: Option<&Path>,
    ) -> Result<String> {
        let mut builder = ProcessCommandBuilder::new("sops")
            .args(["--encrypt", "--age", public_key])
            .args(["--input-type", "yaml", "--output-type", "yaml"]);
        if let Some(config) = policy_file {
            let config = config.to_string_lossy();
            builder = builder.args(["--config", &*config]);
        }
        let command = builder
            .arg("/dev/stdin")
            .stdin(plaintext.to_string())
            .build();

        let output = run_checked(&self.runner, "sops", command).await?;
        Ok(output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subprocess::MockProcessRunner;

    #[tokio::test]
    async fn test_encrypt_pipes_plaintext() {
        let mock = MockProcessRunner::new();
        mock.stub_success("sops", "encrypted: blob\n");
        let sops = SopsEncryptor::new(Arc::new(mock.clone()));

        let ciphertext = sops
            .encrypt("kind: Secret\n", "age1recipient", None)
            .await
            .unwrap();
        assert_eq!(ciphertext, "encrypted: blob\n");

        let call = &mock.call_history()[0];
        assert!(call.args.windows(2).any(|w| w == ["--age", "age1recipient"]));
        assert_eq!(call.stdin.as_deref(), Some("kind: Secret\n"));
    }
}
