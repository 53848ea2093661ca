//! The `ab-trigger run` command: one push in, zero or one build out.

use crate::branches::BranchFilter;
use crate::classify::{classify, Classification};
use crate::cli::{EventArgs, RunArgs};
use crate::config::{load_config, validate_config, TriggerConfig};
use crate::event::PushEvent;
use crate::git::{ChangeSource, GitRepo};
use crate::trigger::{ApiToken, BuildApi, HttpBuildApi, RunState, Trigger, TriggerRequest};
use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::env;
use std::path::PathBuf;

const EVENT_PATH_ENV: &str = "GITHUB_EVENT_PATH";

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// Forced push; nothing was inspected.
    SkippedForced,
    /// Branch is outside the allow-list.
    SkippedBranch,
    NotRelevant,
    /// Relevant, but the request was only printed.
    DryRun,
    Triggered,
}

/// Machine-readable summary of one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub event: PushEvent,
    pub outcome: RunOutcome,
    pub state: RunState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changed_paths: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<Classification>,
}

impl RunReport {
    fn skipped(event: &PushEvent, outcome: RunOutcome) -> Self {
        Self {
            event: event.clone(),
            outcome,
            state: RunState::Idle,
            changed_paths: None,
            classification: None,
        }
    }
}

/// Entry point for `ab-trigger run`.
pub fn run_run(args: &RunArgs) -> Result<()> {
    let event = load_event(&args.event, env::var_os(EVENT_PATH_ENV).map(PathBuf::from))?;
    let filter = if args.any_branch {
        None
    } else {
        Some(BranchFilter::default_filter()?)
    };

    // Skipped pushes succeed whatever the configuration looks like.
    if let Some(outcome) = skip_reason(&event, filter.as_ref()) {
        return print_report(&RunReport::skipped(&event, outcome), args.json);
    }

    let mut config = load_config(args.config.as_deref())?;
    apply_flag_overrides(&mut config, args);
    validate_config(&config)?;

    // Credential and repository are preconditions of a run that may trigger.
    let api = if args.dry_run {
        None
    } else {
        let token = ApiToken::from_env(&config.token_env)?;
        Some(HttpBuildApi::new(&config, token))
    };
    let repo = GitRepo::open(&args.repo)?;
    let report = execute(
        &event,
        filter.as_ref(),
        &repo,
        api.as_ref().map(|api| api as &dyn BuildApi),
    )?;

    print_report(&report, args.json)
}

/// Run the gate for one push event.
///
/// `api` of `None` means dry run: the request is built and logged, not sent.
pub fn execute(
    event: &PushEvent,
    filter: Option<&BranchFilter>,
    source: &dyn ChangeSource,
    api: Option<&dyn BuildApi>,
) -> Result<RunReport> {
    if let Some(outcome) = skip_reason(event, filter) {
        return Ok(RunReport::skipped(event, outcome));
    }
    event.validate()?;

    let changes = source
        .changed_paths(&event.before, &event.after)
        .with_context(|| format!("list changes {}..{}", event.before, event.after))?;
    let classification = classify(&changes);
    tracing::info!(
        changed = changes.len(),
        examined = classification.examined,
        relevant = classification.relevant,
        "classified push"
    );

    let trigger = Trigger::new(TriggerRequest::for_push(event));
    let (outcome, state) = match api {
        Some(api) => match trigger.fire(classification.relevant, api)? {
            RunState::Triggered => (RunOutcome::Triggered, RunState::Triggered),
            RunState::Idle => (RunOutcome::NotRelevant, RunState::Idle),
        },
        None if classification.relevant => {
            let payload = serde_json::to_string(&trigger.request().payload())
                .context("serialize build payload")?;
            tracing::info!(%payload, "dry run, not sending build request");
            (RunOutcome::DryRun, RunState::Idle)
        }
        None => (RunOutcome::NotRelevant, RunState::Idle),
    };

    Ok(RunReport {
        event: event.clone(),
        outcome,
        state,
        changed_paths: Some(changes.len()),
        classification: Some(classification),
    })
}

/// Forced pushes and unwatched branches end the run before any work.
fn skip_reason(event: &PushEvent, filter: Option<&BranchFilter>) -> Option<RunOutcome> {
    if event.forced {
        tracing::info!(branch = %event.branch, "forced push, skipping");
        return Some(RunOutcome::SkippedForced);
    }
    if filter.is_some_and(|filter| !filter.allows(&event.branch)) {
        tracing::info!(branch = %event.branch, "branch not watched, skipping");
        return Some(RunOutcome::SkippedBranch);
    }
    None
}

/// Build the push event from `--event`, the revision flags, or the file named
/// by `GITHUB_EVENT_PATH` (passed in as `env_event_path`), in that order.
///
/// `--forced` marks the push forced whichever source supplied it.
fn load_event(args: &EventArgs, env_event_path: Option<PathBuf>) -> Result<PushEvent> {
    let mut event = if let Some(path) = &args.event {
        PushEvent::from_event_file(path)?
    } else {
        match (&args.before, &args.after, &args.branch) {
            (Some(before), Some(after), Some(branch)) => PushEvent {
                before: before.clone(),
                after: after.clone(),
                branch: branch.clone(),
                forced: false,
            },
            _ => {
                let path = env_event_path.ok_or_else(|| {
                    anyhow!(
                        "no push event: pass --event, --before/--after/--branch, \
                         or set {EVENT_PATH_ENV}"
                    )
                })?;
                PushEvent::from_event_file(&path)?
            }
        }
    };
    event.forced |= args.forced;
    Ok(event)
}

fn apply_flag_overrides(config: &mut TriggerConfig, args: &RunArgs) {
    if let Some(api_base) = &args.api_base {
        config.api_base = api_base.clone();
    }
    if let Some(pipeline) = &args.pipeline {
        config.pipeline = pipeline.clone();
    }
}

fn print_report(report: &RunReport, json: bool) -> Result<()> {
    if json {
        let text = serde_json::to_string_pretty(report)?;
        println!("{text}");
        return Ok(());
    }
    let summary = match report.outcome {
        RunOutcome::SkippedForced => "skipped: forced push".to_string(),
        RunOutcome::SkippedBranch => {
            format!("skipped: branch {} is not watched", report.event.branch)
        }
        RunOutcome::NotRelevant => "no performance-relevant changes".to_string(),
        RunOutcome::DryRun => "performance-relevant (dry run, build not requested)".to_string(),
        RunOutcome::Triggered => "performance-relevant: A/B build requested".to_string(),
    };
    println!("{summary}");
    if let Some(matched) = report.classification.as_ref().and_then(|c| c.matched.as_ref()) {
        println!("  matched {} ({})", matched.path, matched.rule);
    }
    Ok(())
}
