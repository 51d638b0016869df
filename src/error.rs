//! The crate-wide error taxonomy.
//!
//! One closed sum for every failure the tool can report. Callers that need to
//! dispatch programmatically match on [`Error::kind`]; no error is ever
//! identified by parsing its message.

use crate::models::Fingerprint;
use crate::safety::SafetyReport;

/// Field-free tags for [`Error`], for matching without string inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    DependencyMissing,
    InvalidArgument,
    FileNotFound,
    Parsing,
    HunkNotFound,
    FingerprintNotFound,
    SafetyCheckFailed,
    GitCommand,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("required tool not found: {tool}. Install it and make sure it is on PATH")]
    DependencyMissing { tool: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("failed to parse patch: {0}")]
    Parsing(String),

    /// A requested 1-based hunk number exceeds the file's hunk count.
    /// `requested` holds only the offending numbers.
    #[error("{}", hunk_not_found_message(.path, .requested, .actual))]
    HunkNotFound {
        path: String,
        requested: Vec<usize>,
        actual: usize,
    },

    /// A planned fingerprint vanished from the worktree diff mid-run.
    #[error("{}", fingerprint_not_found_message(.path, .fingerprint))]
    FingerprintNotFound {
        path: String,
        fingerprint: Fingerprint,
    },

    #[error("{0}")]
    SafetyCheckFailed(SafetyReport),

    #[error("{}", git_command_message(.operation, .status, .stderr))]
    GitCommand {
        operation: String,
        status: Option<i32>,
        stderr: String,
    },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::DependencyMissing { .. } => ErrorKind::DependencyMissing,
            Error::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Error::FileNotFound(_) => ErrorKind::FileNotFound,
            Error::Parsing(_) => ErrorKind::Parsing,
            Error::HunkNotFound { .. } => ErrorKind::HunkNotFound,
            Error::FingerprintNotFound { .. } => ErrorKind::FingerprintNotFound,
            Error::SafetyCheckFailed(_) => ErrorKind::SafetyCheckFailed,
            Error::GitCommand { .. } => ErrorKind::GitCommand,
        }
    }
}

/// Fixed remediation block printed after most errors.
pub const TROUBLESHOOTING: &str = "\
Troubleshooting:
  - check that the patch file exists and is readable
  - verify the hunks are not already staged: git diff --cached
  - regenerate the patch if the worktree changed: git diff HEAD > changes.patch
  - inspect the repository state: git status";

fn hunk_not_found_message(path: &str, requested: &[usize], actual: &usize) -> String {
    let list = requested
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    let requested_noun = if requested.len() == 1 { "hunk" } else { "hunks" };
    let actual_noun = if *actual == 1 { "hunk" } else { "hunks" };
    format!("{requested_noun} [{list}] requested, but {path} has {actual} {actual_noun}")
}

fn fingerprint_not_found_message(path: &str, fingerprint: &Fingerprint) -> String {
    format!(
        "hunk {} is no longer present in the diff for {}: it may already be staged, \
         or the worktree changed during the run",
        fingerprint.short(),
        path
    )
}

fn git_command_message(operation: &str, status: &Option<i32>, stderr: &str) -> String {
    match status {
        Some(code) => format!("git {operation} failed with exit status {code}: {stderr}"),
        None => format!("git {operation} failed: {stderr}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hunk_not_found_message_plural() {
        let err = Error::HunkNotFound {
            path: "main.go".to_string(),
            requested: vec![2, 3],
            actual: 1,
        };
        let message = err.to_string();
        assert!(message.contains("main.go"));
        assert!(message.contains("has 1 hunk"));
        assert!(message.contains("[2, 3]"));
        assert!(message.contains("requested"));
    }

    #[test]
    fn test_hunk_not_found_message_singular() {
        let err = Error::HunkNotFound {
            path: "file".to_string(),
            requested: vec![5],
            actual: 1,
        };
        let message = err.to_string();
        assert!(message.contains("hunk [5] requested"));
        assert!(message.contains("has 1 hunk"));
    }

    #[test]
    fn test_kind_matches_variant() {
        assert_eq!(
            Error::InvalidArgument("x".to_string()).kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            Error::GitCommand {
                operation: "diff".to_string(),
                status: Some(128),
                stderr: "boom".to_string(),
            }
            .kind(),
            ErrorKind::GitCommand
        );
    }

    #[test]
    fn test_git_command_message_with_and_without_status() {
        let with_status = Error::GitCommand {
            operation: "apply --cached".to_string(),
            status: Some(1),
            stderr: "patch does not apply".to_string(),
        };
        assert!(with_status.to_string().contains("exit status 1"));
        assert!(with_status.to_string().contains("patch does not apply"));

        let no_status = Error::GitCommand {
            operation: "diff".to_string(),
            status: None,
            stderr: "cancelled".to_string(),
        };
        assert!(no_status.to_string().contains("cancelled"));
    }

    #[test]
    fn test_fingerprint_not_found_uses_short_form() {
        let err = Error::FingerprintNotFound {
            path: "src/lib.rs".to_string(),
            fingerprint: Fingerprint::new("0123456789abcdef0123"),
        };
        let message = err.to_string();
        assert!(message.contains("01234567"));
        assert!(message.contains("src/lib.rs"));
    }
}
