//! Path rules that decide whether a push is performance-relevant.
//!
//! Only paths are inspected. A push is relevant as soon as one changed path
//! matches one rule in [`RULES`]; the remaining paths are not examined.
use crate::changeset::ChangeSet;
use serde::Serialize;
use std::fmt;

/// A single predicate over a changed path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "pattern", rename_all = "snake_case")]
pub enum Rule {
    /// The base filename ends with this text.
    FileSuffix(&'static str),
    /// The full path starts with this text.
    PathPrefix(&'static str),
}

/// Rules evaluated, in order, against every changed path.
///
/// `config` has no leading dot: any basename ending in `config` counts,
/// including `.cargo/config` and names like `kconfig`.
pub const RULES: &[Rule] = &[
    Rule::FileSuffix(".rs"),
    Rule::FileSuffix(".toml"),
    Rule::FileSuffix(".lock"),
    Rule::FileSuffix("config"),
    Rule::PathPrefix("resources/seccomp/"),
];

impl Rule {
    pub fn matches(&self, path: &str) -> bool {
        match self {
            Rule::FileSuffix(suffix) => base_name(path).ends_with(suffix),
            Rule::PathPrefix(prefix) => path.starts_with(prefix),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::FileSuffix(suffix) => write!(f, "basename ends with {suffix:?}"),
            Rule::PathPrefix(prefix) => write!(f, "path starts with {prefix:?}"),
        }
    }
}

/// The first path that made a change set relevant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleMatch {
    pub path: String,
    pub rule: Rule,
}

/// Outcome of classifying one change set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub relevant: bool,
    /// Number of paths looked at before deciding.
    pub examined: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched: Option<RuleMatch>,
}

/// Classify a change set against [`RULES`].
pub fn classify(changes: &ChangeSet) -> Classification {
    classify_with(changes, RULES)
}

/// Classify a change set against an explicit rule table.
pub fn classify_with(changes: &ChangeSet, rules: &[Rule]) -> Classification {
    for (index, path) in changes.iter().enumerate() {
        if let Some(rule) = rules.iter().find(|rule| rule.matches(path)) {
            tracing::debug!(path, rule = %rule, "performance-relevant path");
            return Classification {
                relevant: true,
                examined: index + 1,
                matched: Some(RuleMatch {
                    path: path.to_string(),
                    rule: *rule,
                }),
            };
        }
    }
    Classification {
        relevant: false,
        examined: changes.len(),
        matched: None,
    }
}

/// Text after the last `/`; the whole path when there is none.
fn base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

#[cfg(test)]
#[path = "classify_tests.rs"]
mod tests;
