use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod branches;
mod changeset;
mod classify;
mod cli;
mod config;
mod event;
mod git;
mod trigger;
mod workflow;

use cli::{Command, RootArgs};

fn main() -> Result<()> {
    let args = RootArgs::parse();
    init_tracing(args.verbose);

    match &args.command {
        Command::Run(run) => workflow::run_run(run),
        Command::Classify(classify) => workflow::run_classify(classify),
        Command::Rules(rules) => workflow::run_rules(rules),
    }
}

/// Logs go to stderr so stdout stays parseable with `--json`.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
