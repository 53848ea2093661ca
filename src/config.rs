//! Build API configuration.
//!
//! Values resolve in order: built-in defaults, a JSON config file, then
//! `AB_TRIGGER_*` environment overrides. The CLI applies flag overrides last.
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.buildkite.com/v2";
pub const DEFAULT_ORGANIZATION: &str = "firecracker";
pub const DEFAULT_PIPELINE: &str = "performance-a-b-tests";
pub const DEFAULT_TOKEN_ENV: &str = "BUILDKITE_TOKEN";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const CONFIG_DIR_NAME: &str = "ab-trigger";
const CONFIG_FILE_NAME: &str = "config.json";

/// Where and how to reach the build API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TriggerConfig {
    pub api_base: String,
    pub organization: String,
    pub pipeline: String,
    /// Name of the environment variable holding the bearer token.
    pub token_env: String,
    pub timeout_secs: u64,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            organization: DEFAULT_ORGANIZATION.to_string(),
            pipeline: DEFAULT_PIPELINE.to_string(),
            token_env: DEFAULT_TOKEN_ENV.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl TriggerConfig {
    /// `{api_base}/organizations/{organization}/pipelines/{pipeline}/builds`
    pub fn builds_url(&self) -> String {
        format!(
            "{}/organizations/{}/pipelines/{}/builds",
            self.api_base.trim_end_matches('/'),
            self.organization,
            self.pipeline
        )
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Apply `AB_TRIGGER_*` overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(value) = lookup("AB_TRIGGER_API_BASE") {
            self.api_base = value;
        }
        if let Some(value) = lookup("AB_TRIGGER_ORGANIZATION") {
            self.organization = value;
        }
        if let Some(value) = lookup("AB_TRIGGER_PIPELINE") {
            self.pipeline = value;
        }
    }
}

/// Default config location: `<config dir>/ab-trigger/config.json`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Load config from `path`, or from the default location when it exists.
///
/// An explicit path must exist; a missing default file yields defaults.
pub fn load_config(path: Option<&Path>) -> Result<TriggerConfig> {
    let mut config = match path {
        Some(path) => read_config(path)?,
        None => match default_config_path().filter(|p| p.is_file()) {
            Some(path) => read_config(&path)?,
            None => TriggerConfig::default(),
        },
    };
    config.apply_env();
    Ok(config)
}

fn read_config(path: &Path) -> Result<TriggerConfig> {
    let bytes = fs::read(path).with_context(|| format!("read config {}", path.display()))?;
    let config: TriggerConfig = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse config JSON {}", path.display()))?;
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(config)
}

/// Reject configs that cannot produce a usable request.
pub fn validate_config(config: &TriggerConfig) -> Result<()> {
    let api_base = config.api_base.trim();
    if api_base.is_empty() {
        return Err(anyhow!("api_base must be non-empty"));
    }
    if !api_base.starts_with("https://") && !api_base.starts_with("http://") {
        return Err(anyhow!("api_base must be an http(s) URL (got {api_base:?})"));
    }
    validate_segment(&config.organization, "organization")?;
    validate_segment(&config.pipeline, "pipeline")?;
    if config.token_env.trim().is_empty() {
        return Err(anyhow!("token_env must be non-empty"));
    }
    if config.timeout_secs == 0 {
        return Err(anyhow!("timeout_secs must be greater than zero"));
    }
    Ok(())
}

fn validate_segment(value: &str, label: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(anyhow!("{label} must be non-empty"));
    }
    if value.contains(['/', '?', '#']) || value.chars().any(char::is_whitespace) {
        return Err(anyhow!("{label} must be a single URL path segment (got {value:?})"));
    }
    Ok(())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
