//! Failure policy evaluation
//!
//! Runs once, after every launched check has finished. The resulting error
//! embeds the offending findings themselves: on failure the report artifact
//! may not be separately retrievable, so a bare pass/fail would strand the
//! caller.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use super::checks::{CheckResult, CheckSpec};
use crate::error::BosunError;

pub const ERROR_MARKER: &str = "[error]";
pub const WARNING_MARKER: &str = "[warning]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Always passes.
    None,
    /// Fails when any enabled check produced findings.
    Any,
    /// Fails when the named check produced findings; a no-op if that check
    /// did not run.
    Check(String),
    /// Fails on findings at error level.
    ErrorLevel,
    /// Fails on findings at warning level or above.
    WarningLevel,
}

impl FailurePolicy {
    /// Parse a `--fail-on` flag value. Unrecognized values name a check.
    pub fn from_flag(flag: &str) -> Self {
        flag.parse().unwrap_or(Self::None)
    }
}

impl FromStr for FailurePolicy {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "none" => Self::None,
            "any" => Self::Any,
            "error-level" => Self::ErrorLevel,
            "warning-level" => Self::WarningLevel,
            key => Self::Check(key.to_string()),
        })
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Any => write!(f, "any"),
            Self::Check(key) => write!(f, "{key}"),
            Self::ErrorLevel => write!(f, "error-level"),
            Self::WarningLevel => write!(f, "warning-level"),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Level {
    Warning,
    Error,
}

/// Evaluate the policy against the full result map, iterating checks in the
/// caller-defined spec order for deterministic messages.
pub fn evaluate_failure_policy(
    policy: &FailurePolicy,
    specs: &[CheckSpec],
    results: &HashMap<String, CheckResult>,
) -> Option<BosunError> {
    let offending: Vec<(&CheckSpec, &CheckResult)> = match policy {
        FailurePolicy::None => Vec::new(),
        FailurePolicy::Any => findings(specs, results, |_, _| true),
        FailurePolicy::Check(key) => findings(specs, results, |spec, _| spec.key == key),
        FailurePolicy::ErrorLevel => {
            findings(specs, results, |spec, result| at_level(spec, result, Level::Error))
        }
        FailurePolicy::WarningLevel => findings(specs, results, |spec, result| {
            at_level(spec, result, Level::Warning)
        }),
    };

    if offending.is_empty() {
        return None;
    }

    let details = offending
        .iter()
        .map(|(spec, result)| format!("{} ({}):\n{}", spec.display_name, spec.key, result.content))
        .collect::<Vec<_>>()
        .join("\n\n");

    Some(BosunError::PolicyViolation {
        policy: policy.to_string(),
        findings: details,
    })
}

fn findings<'a>(
    specs: &'a [CheckSpec],
    results: &'a HashMap<String, CheckResult>,
    matches: impl Fn(&CheckSpec, &CheckResult) -> bool,
) -> Vec<(&'a CheckSpec, &'a CheckResult)> {
    specs
        .iter()
        .filter_map(|spec| results.get(spec.key).map(|result| (spec, result)))
        .filter(|(_, result)| !result.content.trim().is_empty())
        .filter(|(spec, result)| matches(spec, result))
        .collect()
}

/// Marker-aware checks are graded by the markers in their output; all other
/// checks treat any finding as error level.
fn at_level(spec: &CheckSpec, result: &CheckResult, requested: Level) -> bool {
    if !spec.marker_aware {
        return true;
    }
    match requested {
        Level::Error => result.content.contains(ERROR_MARKER),
        Level::Warning => {
            result.content.contains(WARNING_MARKER) || result.content.contains(ERROR_MARKER)
        }
    }
}
