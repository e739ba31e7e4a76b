//! Multi-document manifest handling
//!
//! The renderer emits one YAML blob containing many documents. This module
//! splits that blob and classifies each document as configuration or Secret,
//! which decides how later pipeline phases treat it (encrypt, commit, apply).

pub mod secrets;

pub use secrets::extract_secret_names;

/// Marker that classifies a document as a Secret.
pub const SECRET_DISCRIMINANT: &str = "kind: Secret";

/// Classified documents from one render, in original per-category order.
///
/// The original interleaving across the two categories is not recoverable
/// from this value; callers that need exact original order must keep the
/// rendered blob.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentSet {
    pub config: Vec<String>,
    pub secrets: Vec<String>,
}

impl DocumentSet {
    pub fn has_secrets(&self) -> bool {
        !self.secrets.is_empty()
    }

    pub fn has_config(&self) -> bool {
        !self.config.is_empty()
    }

    /// Config documents re-joined into a multi-document blob.
    pub fn config_content(&self) -> String {
        self.config.join("\n---\n")
    }

    /// Secret documents re-joined into a multi-document blob.
    pub fn secret_content(&self) -> String {
        self.secrets.join("\n---\n")
    }
}

/// Split a blob on document separator lines (`---`), drop chunks that are
/// empty after trimming, and classify the rest.
///
/// Never fails: a blob with no documents yields an empty set.
pub fn classify(blob: &str) -> DocumentSet {
    let mut set = DocumentSet::default();

    for chunk in split_documents(blob) {
        if chunk.contains(SECRET_DISCRIMINANT) {
            set.secrets.push(chunk);
        } else {
            set.config.push(chunk);
        }
    }

    set
}

/// Split on lines consisting solely of the separator token, trimming each
/// resulting chunk and discarding empty ones.
pub fn split_documents(blob: &str) -> Vec<String> {
    let mut docs = Vec::new();
    let mut current = String::new();

    for line in blob.lines() {
        if line.trim_end() == "---" {
            push_trimmed(&mut docs, &current);
            current.clear();
        } else {
            current.push_str(line);
            current.push('\n');
        }
    }
    push_trimmed(&mut docs, &current);

    docs
}

fn push_trimmed(docs: &mut Vec<String>, chunk: &str) {
    let trimmed = chunk.trim();
    if !trimmed.is_empty() {
        docs.push(trimmed.to_string());
    }
}
