//! Git access for listing the paths a push changed.
//!
//! Both revisions must resolve to commits in the local clone before diffing.
//! A shallow checkout, or the all-zero `before` id CI reports for a branch's
//! first push, fails here rather than producing a partial change set.
use crate::changeset::ChangeSet;
use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

/// Source of change sets between two revisions.
pub trait ChangeSource {
    fn changed_paths(&self, before: &str, after: &str) -> Result<ChangeSet>;
}

/// A local git checkout driven through the `git` binary.
#[derive(Debug)]
pub struct GitRepo {
    git: PathBuf,
    root: PathBuf,
}

impl GitRepo {
    /// Open the repository at `root`, locating `git` on `PATH`.
    pub fn open(root: &Path) -> Result<Self> {
        let git = which::which("git").context("locate git on PATH")?;
        let repo = Self {
            git,
            root: root.to_path_buf(),
        };
        repo.run(&["rev-parse", "--git-dir"])
            .with_context(|| format!("{} is not a git repository", root.display()))?;
        Ok(repo)
    }

    /// Resolve `rev` to a full commit id.
    pub fn resolve_commit(&self, rev: &str) -> Result<String> {
        if is_null_revision(rev) {
            return Err(anyhow!(
                "revision {rev} is the null commit id (first push to a new branch?)"
            ));
        }
        let spec = format!("{rev}^{{commit}}");
        let output = self
            .run(&["rev-parse", "--verify", "--quiet", &spec])
            .with_context(|| {
                format!("resolve revision {rev} (is the checkout shallow? fetch full history)")
            })?;
        Ok(output.trim().to_string())
    }

    fn run(&self, args: &[&str]) -> Result<String> {
        let stdout = self.run_raw(args)?;
        String::from_utf8(stdout).context("decode git stdout as UTF-8")
    }

    fn run_raw(&self, args: &[&str]) -> Result<Vec<u8>> {
        let output = Command::new(&self.git)
            .arg("--no-pager")
            .args(args)
            .current_dir(&self.root)
            .output()
            .with_context(|| format!("spawn {}", self.git.display()))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!(
                "git {} failed with status {}: {}",
                args.join(" "),
                output.status,
                stderr.trim()
            ));
        }
        Ok(output.stdout)
    }
}

impl ChangeSource for GitRepo {
    fn changed_paths(&self, before: &str, after: &str) -> Result<ChangeSet> {
        let before = self.resolve_commit(before)?;
        let after = self.resolve_commit(after)?;
        let start = Instant::now();
        // -z keeps paths unquoted, whatever bytes they contain.
        let output = self
            .run_raw(&["diff", "--name-only", "-z", &before, &after])
            .with_context(|| format!("git diff {before} {after}"))?;
        let changes = ChangeSet::from_name_only_z(&output);
        tracing::info!(
            elapsed_ms = start.elapsed().as_millis(),
            changed = changes.len(),
            "diff complete"
        );
        Ok(changes)
    }
}

/// CI reports `0000…0` as `before` when a branch is created.
fn is_null_revision(rev: &str) -> bool {
    !rev.is_empty() && rev.bytes().all(|b| b == b'0')
}
