//! Branches whose pushes are eligible for A/B triggering.
use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

/// Branch patterns watched by default.
///
/// `*` matches within one path segment, so `feature/*` covers `feature/x`
/// but not `feature/x/y`.
pub const DEFAULT_BRANCH_PATTERNS: &[&str] = &["main", "firecracker-v*", "feature/*"];

/// Compiled allow-list of branch patterns.
#[derive(Debug)]
pub struct BranchFilter {
    patterns: GlobSet,
}

impl BranchFilter {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let pattern = pattern.as_ref();
            let glob = GlobBuilder::new(pattern)
                .literal_separator(true)
                .build()
                .with_context(|| format!("compile branch pattern {pattern:?}"))?;
            builder.add(glob);
        }
        let patterns = builder.build().context("build branch pattern set")?;
        Ok(Self { patterns })
    }

    pub fn default_filter() -> Result<Self> {
        Self::new(DEFAULT_BRANCH_PATTERNS)
    }

    pub fn allows(&self, branch: &str) -> bool {
        self.patterns.is_match(branch)
    }
}
