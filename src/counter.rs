//! Per-file hunk counts for the current worktree diff.
//!
//! This is the user's menu for numeric selection: `count-hunks` reports how
//! many hunks each changed file currently has, so a follow-up `stage` call
//! can address them by number.

use std::fmt;

use crate::error::Error;
use crate::git::GitOps;
use crate::models::ChangeKind;
use crate::patch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HunkCount {
    /// Binary files cannot be split; only a wildcard stages them.
    Binary,
    Hunks(usize),
}

impl fmt::Display for HunkCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HunkCount::Binary => f.write_str("*"),
            HunkCount::Hunks(n) => write!(f, "{n}"),
        }
    }
}

/// Count hunks per changed file, sorted by path.
///
/// Read-only: repeated invocations on an unchanged worktree produce
/// identical output. A clean worktree yields an empty list. Deletions report
/// 0; they are staged whole via a wildcard, not by number.
pub fn count_hunks<G: GitOps>(git: &G) -> Result<Vec<(String, HunkCount)>, Error> {
    let diff = git.worktree_diff()?;
    if diff.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }

    let parsed = patch::parse(&diff)?;
    let mut counts: Vec<(String, HunkCount)> = parsed
        .files
        .iter()
        .map(|file| {
            let count = if file.is_binary {
                HunkCount::Binary
            } else if file.kind == ChangeKind::Deleted {
                HunkCount::Hunks(0)
            } else {
                HunkCount::Hunks(file.hunks.len())
            };
            (file.display_path().to_string(), count)
        })
        .collect();

    counts.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(counts)
}
