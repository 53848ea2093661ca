//! CLI argument parsing for the A/B trigger gate.
//!
//! The CLI stays thin: it gathers the push event and config, then hands off
//! to the workflow module.
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "ab-trigger",
    version,
    about = "Trigger A/B performance builds for performance-relevant pushes",
    after_help = "Examples:\n  ab-trigger run --event \"$GITHUB_EVENT_PATH\"\n  ab-trigger run --before <sha> --after <sha> --branch main\n  ab-trigger classify src/lib.rs docs/README.md\n  ab-trigger classify --before HEAD~3 --after HEAD --json\n  ab-trigger rules",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    /// Emit debug-level logs (overridden by RUST_LOG)
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    Run(RunArgs),
    Classify(ClassifyArgs),
    Rules(RulesArgs),
}

/// Push event given as a webhook payload file or as explicit flags.
#[derive(Args, Debug, Clone, Default)]
pub struct EventArgs {
    /// Push webhook payload (defaults to $GITHUB_EVENT_PATH when no flags are given)
    #[arg(long, value_name = "PATH", conflicts_with_all = ["before", "after", "branch", "forced"])]
    pub event: Option<PathBuf>,

    /// Revision before the push
    #[arg(long, value_name = "REV", requires_all = ["after", "branch"])]
    pub before: Option<String>,

    /// Revision after the push
    #[arg(long, value_name = "REV", requires_all = ["before", "branch"])]
    pub after: Option<String>,

    /// Branch that was pushed
    #[arg(long, value_name = "NAME", requires_all = ["before", "after"])]
    pub branch: Option<String>,

    /// The push rewrote history
    #[arg(long)]
    pub forced: bool,
}

/// Run the full gate for one push.
#[derive(Parser, Debug)]
#[command(about = "Classify a push and trigger the A/B build when relevant")]
pub struct RunArgs {
    #[command(flatten)]
    pub event: EventArgs,

    /// Repository checkout with full history
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub repo: PathBuf,

    /// Config file (defaults to <config dir>/ab-trigger/config.json)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the build API base URL
    #[arg(long, value_name = "URL")]
    pub api_base: Option<String>,

    /// Override the target pipeline
    #[arg(long, value_name = "NAME")]
    pub pipeline: Option<String>,

    /// Build the request but do not send it
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the branch allow-list (when an upstream scheduler filters)
    #[arg(long)]
    pub any_branch: bool,

    /// Emit the run report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Classify paths without triggering anything.
#[derive(Parser, Debug)]
#[command(about = "Report whether a set of paths is performance-relevant")]
pub struct ClassifyArgs {
    /// Paths to classify (instead of a revision range)
    #[arg(value_name = "PATH", conflicts_with_all = ["before", "after"])]
    pub paths: Vec<String>,

    /// Start of the revision range to diff
    #[arg(long, value_name = "REV", requires = "after")]
    pub before: Option<String>,

    /// End of the revision range to diff
    #[arg(long, value_name = "REV", requires = "before")]
    pub after: Option<String>,

    /// Repository checkout used with --before/--after
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub repo: PathBuf,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}

/// List the classification rules.
#[derive(Parser, Debug)]
#[command(about = "Print the path rules used to classify pushes")]
pub struct RulesArgs {
    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}
