//! Secret name extraction
//!
//! A deliberately shallow line scanner, not a structural YAML parser: the
//! documents come from a trusted renderer, and a malformed metadata block
//! must yield no name rather than an error.

use super::SECRET_DISCRIMINANT;

/// Extract the first `metadata.name` of each Secret document.
///
/// Documents without the Secret discriminant are skipped. Within a document,
/// scanning enters the metadata block at a line whose trimmed content is
/// exactly `metadata:`; the first `name:` line inside the block wins, and a
/// non-indented line ends the block without capturing anything.
pub fn extract_secret_names(secret_docs: &[String]) -> Vec<String> {
    let mut names = Vec::new();

    for doc in secret_docs {
        if !doc.contains(SECRET_DISCRIMINANT) {
            continue;
        }

        let mut in_metadata = false;
        for line in doc.lines() {
            let trimmed = line.trim();
            if trimmed == "metadata:" {
                in_metadata = true;
                continue;
            }
            if in_metadata {
                if let Some(rest) = trimmed.strip_prefix("name:") {
                    let name = rest.trim().trim_matches(|c| c == '"' || c == '\'');
                    if !name.is_empty() {
                        names.push(name.to_string());
                    }
                    break;
                }
                // A non-indented, non-empty line means the metadata block
                // ended without a name field.
                if !line.starts_with(' ') && !line.starts_with('\t') && !trimmed.is_empty() {
                    in_metadata = false;
                }
            }
        }
    }

    names
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_extracts_first_name_per_document() {
        let names = extract_secret_names(&docs(&[
            "apiVersion: v1\nkind: Secret\nmetadata:\n  name: sops-age\n  namespace: flux-system",
            "kind: Secret\nmetadata:\n  name: git-auth",
        ]));
        assert_eq!(names, vec!["sops-age", "git-auth"]);
    }

    #[test]
    fn test_strips_surrounding_quotes() {
        let names = extract_secret_names(&docs(&[
            "kind: Secret\nmetadata:\n  name: \"quoted\"",
            "kind: Secret\nmetadata:\n  name: 'single'",
        ]));
        assert_eq!(names, vec!["quoted", "single"]);
    }

    #[test]
    fn test_skips_non_secret_documents() {
        let names = extract_secret_names(&docs(&["kind: ConfigMap\nmetadata:\n  name: not-a-secret"]));
        assert!(names.is_empty());
    }

    #[test]
    fn test_metadata_block_without_name_yields_nothing() {
        // The block ends at the next top-level key without a name field.
        let names = extract_secret_names(&docs(&[
            "kind: Secret\nmetadata:\n  namespace: flux-system\ndata:\n  key: dmFsdWU=",
        ]));
        assert!(names.is_empty());
    }

    #[test]
    fn test_only_first_name_captured() {
        let names = extract_secret_names(&docs(&[
            "kind: Secret\nmetadata:\n  name: first\n  name: second",
        ]));
        assert_eq!(names, vec!["first"]);
    }

    #[test]
    fn test_name_outside_metadata_ignored() {
        let names = extract_secret_names(&docs(&["kind: Secret\nname: stray\ndata: {}"]));
        assert!(names.is_empty());
    }
}
