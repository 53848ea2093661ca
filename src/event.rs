//! Push events that start a run.
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const BRANCH_REF_PREFIX: &str = "refs/heads/";

/// The inputs of one run: a push to `branch` moving it from `before` to `after`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PushEvent {
    pub before: String,
    pub after: String,
    pub branch: String,
    pub forced: bool,
}

/// The subset of a CI push webhook payload this tool reads.
#[derive(Debug, Deserialize)]
struct PushPayload {
    before: String,
    after: String,
    #[serde(rename = "ref")]
    git_ref: String,
    #[serde(default)]
    forced: bool,
}

impl PushEvent {
    /// Load a push event from a webhook payload file.
    pub fn from_event_file(path: &Path) -> Result<Self> {
        let text =
            fs::read_to_string(path).with_context(|| format!("read event {}", path.display()))?;
        Self::from_event_json(&text).with_context(|| format!("parse event {}", path.display()))
    }

    pub fn from_event_json(text: &str) -> Result<Self> {
        let payload: PushPayload = serde_json::from_str(text).context("parse push event JSON")?;
        let branch = payload
            .git_ref
            .strip_prefix(BRANCH_REF_PREFIX)
            .ok_or_else(|| anyhow!("push ref {:?} is not a branch", payload.git_ref))?
            .to_string();
        Ok(Self {
            before: payload.before,
            after: payload.after,
            branch,
            forced: payload.forced,
        })
    }

    /// Branch and both revisions must be non-empty.
    pub fn validate(&self) -> Result<()> {
        for (label, value) in [
            ("branch", &self.branch),
            ("before revision", &self.before),
            ("after revision", &self.after),
        ] {
            if value.trim().is_empty() {
                return Err(anyhow!("{label} must be non-empty"));
            }
        }
        Ok(())
    }
}
