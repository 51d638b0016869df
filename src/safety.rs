//! Index safety gate.
//!
//! The apply loop re-reads the worktree diff on every iteration, so content
//! already staged for an unrelated file would silently end up in whatever
//! commit follows. Staging therefore refuses to start unless the index is
//! clean, with one exemption: intent-to-add entries (`git add -N`), which
//! register a path without staging content and are exactly how new files are
//! made addressable for hunk-level staging.

use std::fmt;

use log::debug;

use crate::error::Error;
use crate::git::GitOps;
use crate::models::{IndexEntry, IndexEntryStatus};

/// Marker token opening every safety failure payload. Stable contract for
/// agent consumers.
pub const SAFETY_CHECK_MARKER: &str = "SAFETY_CHECK_FAILED";

/// Offending index entries, categorized, plus which requested paths are
/// themselves already staged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SafetyReport {
    pub new_files: Vec<String>,
    pub modified: Vec<String>,
    pub deleted: Vec<String>,
    pub renamed: Vec<String>,
    pub staged_targets: Vec<String>,
}

impl SafetyReport {
    pub fn is_empty(&self) -> bool {
        self.new_files.is_empty()
            && self.modified.is_empty()
            && self.deleted.is_empty()
            && self.renamed.is_empty()
    }

    fn all_paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self
            .new_files
            .iter()
            .chain(&self.modified)
            .chain(&self.deleted)
            .chain(&self.renamed)
            .map(String::as_str)
            .collect();
        paths.sort_unstable();
        paths
    }
}

impl fmt::Display for SafetyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut lines = vec![
            format!("{SAFETY_CHECK_MARKER}: the index already contains staged changes"),
            format!("STAGED_FILES: {}", self.all_paths().join(", ")),
        ];
        for (key, paths) in [
            ("NEW", &self.new_files),
            ("MODIFIED", &self.modified),
            ("DELETED", &self.deleted),
            ("RENAMED", &self.renamed),
        ] {
            if !paths.is_empty() {
                lines.push(format!("{key}: {}", paths.join(", ")));
            }
        }
        if !self.staged_targets.is_empty() {
            lines.push(format!(
                "REQUESTED_ALREADY_STAGED: {}",
                self.staged_targets.join(", ")
            ));
        }
        lines.push("ADVICE: commit the staged changes first: git commit".to_string());
        lines.push(
            "ADVICE: or unstage everything and keep the edits in the worktree: git reset HEAD"
                .to_string(),
        );
        f.write_str(&lines.join("\n"))
    }
}

/// Decide whether staging may proceed given the current index state.
///
/// `target_paths` only sharpen the message; the rule itself is about the
/// global index state.
pub fn check_index<G: GitOps>(git: &G, target_paths: &[String]) -> Result<(), Error> {
    let entries = git.index_status()?;
    evaluate(&entries, target_paths)
}

fn evaluate(entries: &[IndexEntry], target_paths: &[String]) -> Result<(), Error> {
    let mut report = SafetyReport::default();

    for entry in entries {
        match entry.status {
            IndexEntryStatus::Unmodified
            | IndexEntryStatus::IntentToAdd
            | IndexEntryStatus::Untracked => {}
            IndexEntryStatus::Added => report.new_files.push(entry.path.clone()),
            IndexEntryStatus::Modified | IndexEntryStatus::TypeChange => {
                report.modified.push(entry.path.clone())
            }
            IndexEntryStatus::Deleted => report.deleted.push(entry.path.clone()),
            IndexEntryStatus::Renamed => report.renamed.push(entry.path.clone()),
        }
    }

    if report.is_empty() {
        debug!("safety check passed: no staged content in the index");
        return Ok(());
    }

    report.staged_targets = target_paths
        .iter()
        .filter(|path| report.all_paths().contains(&path.as_str()))
        .cloned()
        .collect();

    Err(Error::SafetyCheckFailed(report))
}
