//! Build API notification for performance-relevant pushes.
//!
//! A run sends at most one request. [`Trigger::fire`] consumes the trigger,
//! and transport errors and non-2xx statuses are returned to the caller
//! without retrying.
use crate::config::TriggerConfig;
use crate::event::PushEvent;
use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::time::Instant;

/// Commit marker telling the build API to build the branch head.
pub const HEAD_COMMIT: &str = "HEAD";

/// Bearer credential for the build API. Never printed.
#[derive(Clone)]
pub struct ApiToken(String);

impl ApiToken {
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(anyhow!("build API token is empty"));
        }
        Ok(Self(token))
    }

    /// Read the token from the environment variable `var`.
    pub fn from_env(var: &str) -> Result<Self> {
        let token = env::var(var)
            .with_context(|| format!("build API token missing: set {var}"))?;
        Self::new(token).with_context(|| format!("invalid token in {var}"))
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiToken(<redacted>)")
    }
}

/// One build request for the A/B pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerRequest {
    pub commit: String,
    pub branch: String,
    pub revision_before: String,
    pub revision_after: String,
}

impl TriggerRequest {
    pub fn for_push(event: &PushEvent) -> Self {
        Self {
            commit: HEAD_COMMIT.to_string(),
            branch: event.branch.clone(),
            revision_before: event.before.clone(),
            revision_after: event.after.clone(),
        }
    }

    pub fn payload(&self) -> BuildPayload {
        let mut env = BTreeMap::new();
        env.insert("REVISION_A".to_string(), self.revision_before.clone());
        env.insert("REVISION_B".to_string(), self.revision_after.clone());
        BuildPayload {
            commit: self.commit.clone(),
            branch: self.branch.clone(),
            env,
        }
    }
}

/// JSON body of a create-build call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildPayload {
    pub commit: String,
    pub branch: String,
    pub env: BTreeMap<String, String>,
}

/// Something that can create a build.
pub trait BuildApi {
    fn create_build(&self, payload: &BuildPayload) -> Result<()>;
}

/// Create-build calls over HTTPS with bearer auth.
pub struct HttpBuildApi {
    agent: ureq::Agent,
    url: String,
    token: ApiToken,
}

impl HttpBuildApi {
    pub fn new(config: &TriggerConfig, token: ApiToken) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(config.timeout()))
            .http_status_as_error(false)
            .build()
            .into();
        Self {
            agent,
            url: config.builds_url(),
            token,
        }
    }
}

impl BuildApi for HttpBuildApi {
    fn create_build(&self, payload: &BuildPayload) -> Result<()> {
        let start = Instant::now();
        let response = self
            .agent
            .post(self.url.as_str())
            .header("Authorization", self.token.bearer())
            .header("Content-Type", "application/json")
            .send_json(payload)
            .with_context(|| format!("POST {}", self.url))?;
        let status = response.status();
        tracing::info!(
            elapsed_ms = start.elapsed().as_millis(),
            status = status.as_u16(),
            url = %self.url,
            "build API responded"
        );
        if !status.is_success() {
            return Err(anyhow!(
                "build API returned status {} for POST {}",
                status.as_u16(),
                self.url
            ));
        }
        Ok(())
    }
}

/// Per-run trigger state. `Triggered` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Triggered,
}

/// A request waiting to be sent, holding the only handle that can send it.
#[derive(Debug)]
pub struct Trigger {
    request: TriggerRequest,
}

impl Trigger {
    pub fn new(request: TriggerRequest) -> Self {
        Self { request }
    }

    pub fn request(&self) -> &TriggerRequest {
        &self.request
    }

    /// Send the request if `relevant`; otherwise stay idle without any call.
    pub fn fire(self, relevant: bool, api: &dyn BuildApi) -> Result<RunState> {
        if !relevant {
            return Ok(RunState::Idle);
        }
        let payload = self.request.payload();
        tracing::info!(
            branch = %self.request.branch,
            revision_a = %self.request.revision_before,
            revision_b = %self.request.revision_after,
            "triggering A/B build"
        );
        api.create_build(&payload)?;
        Ok(RunState::Triggered)
    }
}
