//! Best-effort verification that applied Secrets exist in-cluster
//!
//! Resource propagation takes time, so callers treat a verification failure
//! as advisory rather than fatal.

use std::sync::Arc;

use crate::error::BosunError;
use crate::manifest::extract_secret_names;
use crate::ops::ClusterControl;

pub struct SecretVerifier {
    cluster: Arc<dyn ClusterControl>,
}

impl SecretVerifier {
    pub fn new(cluster: Arc<dyn ClusterControl>) -> Self {
        Self { cluster }
    }

    /// Check every extracted secret name against the cluster.
    ///
    /// Returns a report plus, when any name is missing, an error enumerating
    /// the missing names. A query failure counts as missing.
    pub async fn verify(
        &self,
        secret_docs: &[String],
        namespace: &str,
    ) -> (String, Option<BosunError>) {
        let names = extract_secret_names(secret_docs);
        if names.is_empty() {
            return ("No secret names found in documents".to_string(), None);
        }

        let mut found = Vec::new();
        let mut missing = Vec::new();
        for name in names {
            match self.cluster.query_exists("secret", &name, namespace).await {
                Ok(true) => found.push(name),
                Ok(false) | Err(_) => missing.push(name),
            }
        }

        let mut lines = Vec::new();
        if !found.is_empty() {
            lines.push(format!("Found secrets: {}", found.join(", ")));
        }
        if !missing.is_empty() {
            lines.push(format!("Missing secrets: {}", missing.join(", ")));
            return (
                lines.join("\n"),
                Some(BosunError::MissingSecrets { names: missing }),
            );
        }

        (lines.join("\n"), None)
    }
}
