use async_trait::async_trait;
use std::sync::Arc;

use super::{run_checked, KeyDerivationTool};
use crate::error::Result;
use crate::subprocess::{ProcessCommandBuilder, ProcessRunner};

/// Derives AGE public keys via `age-keygen -y`.
pub struct AgeKeygen {
    runner: Arc<dyn ProcessRunner>,
}

impl AgeKeygen {
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl KeyDerivationTool for AgeKeygen {
    async fn derive_public_key(&self, private_key: &str) -> Result<String> {
        let command = ProcessCommandBuilder::new("age-keygen")
            .arg("-y")
            .stdin(private_key.to_string())
            .build();
        let output = run_checked(&self.runner, "age-keygen", command).await?;
        Ok(output.stdout.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subprocess::MockProcessRunner;

    #[tokio::test]
    async fn test_derive_trims_output() {
        let mock = MockProcessRunner::new();
        mock.stub_success("age-keygen", "age1qxyz\n");
        let keygen = AgeKeygen::new(Arc::new(mock.clone()));

        let derived = keygen.derive_public_key("AGE-SECRET-KEY-1AAAA").await.unwrap();
        assert_eq!(derived, "age1qxyz");

        let call = &mock.call_history()[0];
        assert_eq!(call.args, vec!["-y"]);
        assert_eq!(call.stdin.as_deref(), Some("AGE-SECRET-KEY-1AAAA"));
    }
}
