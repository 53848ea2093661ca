//! The `classify` and `rules` commands: inspect the gate without triggering.
use crate::changeset::ChangeSet;
use crate::classify::{classify, RULES};
use crate::cli::{ClassifyArgs, RulesArgs};
use crate::git::{ChangeSource, GitRepo};
use anyhow::Result;

/// Classify explicit paths or a revision range and print the result.
pub fn run_classify(args: &ClassifyArgs) -> Result<()> {
    let changes = match (&args.before, &args.after) {
        (Some(before), Some(after)) => GitRepo::open(&args.repo)?.changed_paths(before, after)?,
        _ => ChangeSet::new(args.paths.clone()),
    };
    let classification = classify(&changes);

    if args.json {
        let text = serde_json::to_string_pretty(&classification)?;
        println!("{text}");
        return Ok(());
    }
    match &classification.matched {
        Some(matched) => println!("relevant: {} ({})", matched.path, matched.rule),
        None if changes.is_empty() => println!("not relevant (no changed paths)"),
        None => println!("not relevant ({} paths examined)", classification.examined),
    }
    Ok(())
}

/// Print the rule table in evaluation order.
pub fn run_rules(args: &RulesArgs) -> Result<()> {
    if args.json {
        let text = serde_json::to_string_pretty(RULES)?;
        println!("{text}");
        return Ok(());
    }
    for rule in RULES {
        println!("{rule}");
    }
    Ok(())
}
