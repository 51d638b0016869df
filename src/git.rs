//! The git driver: every interaction with the underlying `git` binary.

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

use log::debug;

use crate::cancel::CancelToken;
use crate::error::Error;
use crate::models::{Fingerprint, IndexEntry, IndexEntryStatus};
use crate::utils::unquote_git_path;

/// Capabilities the rest of the crate needs from git - allows mocking in tests
pub trait GitOps {
    /// Confirm the git binary is available at all.
    fn version_check(&self) -> Result<(), Error>;

    /// Content-derived fingerprint of a patch, via `git patch-id --stable`.
    fn fingerprint(&self, patch: &[u8]) -> Result<Fingerprint, Error>;

    /// Raw diff between HEAD and the working tree.
    fn worktree_diff(&self) -> Result<Vec<u8>, Error>;

    /// Apply a patch to the index only (`git apply --cached`).
    fn apply_cached(&self, patch: &[u8]) -> Result<(), Error>;

    /// Stage a whole path (`git add -- <path>`).
    fn add_path(&self, path: &str) -> Result<(), Error>;

    /// Per-path index state (`git status --porcelain`).
    fn index_status(&self) -> Result<Vec<IndexEntry>, Error>;
}

/// Real implementation of [`GitOps`] that spawns git child processes.
pub struct Git {
    /// Working directory for git commands; `None` means the process cwd.
    work_dir: Option<PathBuf>,
    cancel: CancelToken,
}

impl Git {
    pub fn new() -> Self {
        Self {
            work_dir: None,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_work_dir(work_dir: impl AsRef<Path>) -> Self {
        Self {
            work_dir: Some(work_dir.as_ref().to_path_buf()),
            cancel: CancelToken::new(),
        }
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run one git invocation, optionally feeding `stdin_data` to the child.
    ///
    /// stdout and stderr are drained on their own threads so a large diff
    /// cannot fill a pipe while the child is still running. The cancellation
    /// token is polled before the spawn and while waiting; a cancelled call
    /// kills the child and surfaces a `GitCommand` error with a `cancelled`
    /// marker.
    fn run_git(
        &self,
        operation: &str,
        args: &[&str],
        stdin_data: Option<&[u8]>,
    ) -> Result<Vec<u8>, Error> {
        if self.cancel.is_cancelled() {
            return Err(cancelled(operation));
        }
        debug!("git {}", args.join(" "));

        let mut cmd = Command::new("git");
        if let Some(ref dir) = self.work_dir {
            cmd.current_dir(dir);
        }
        cmd.args(args)
            .stdin(if stdin_data.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|err| {
            if err.kind() == io::ErrorKind::NotFound {
                Error::DependencyMissing {
                    tool: "git".to_string(),
                }
            } else {
                Error::GitCommand {
                    operation: operation.to_string(),
                    status: None,
                    stderr: err.to_string(),
                }
            }
        })?;

        let stdout_reader = spawn_reader(child.stdout.take());
        let stderr_reader = spawn_reader(child.stderr.take());

        if let Some(data) = stdin_data {
            if let Some(mut stdin) = child.stdin.take() {
                // a failed write means the child exited early; the exit
                // status below carries the real error
                let _ = stdin.write_all(data);
            }
        }

        let status = loop {
            if self.cancel.is_cancelled() {
                let _ = child.kill();
                let _ = child.wait();
                return Err(cancelled(operation));
            }
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => thread::sleep(Duration::from_millis(10)),
                Err(err) => {
                    return Err(Error::GitCommand {
                        operation: operation.to_string(),
                        status: None,
                        stderr: err.to_string(),
                    })
                }
            }
        };

        let stdout = stdout_reader.map(join_reader).unwrap_or_default();
        let stderr = stderr_reader.map(join_reader).unwrap_or_default();

        if !status.success() {
            return Err(Error::GitCommand {
                operation: operation.to_string(),
                status: status.code(),
                stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
            });
        }
        debug!("git {} produced {} bytes", operation, stdout.len());
        Ok(stdout)
    }
}

impl Default for Git {
    fn default() -> Self {
        Self::new()
    }
}

impl GitOps for Git {
    fn version_check(&self) -> Result<(), Error> {
        self.run_git("--version", &["--version"], None).map(|_| ())
    }

    fn fingerprint(&self, patch: &[u8]) -> Result<Fingerprint, Error> {
        let output = self.run_git("patch-id", &["patch-id", "--stable"], Some(patch))?;
        let text = String::from_utf8_lossy(&output);
        // output is "<patch-id> <commit-id>"; only the first token matters
        match text.split_whitespace().next() {
            Some(token) => Ok(Fingerprint::new(token)),
            None => Err(Error::GitCommand {
                operation: "patch-id".to_string(),
                status: Some(0),
                stderr: "patch-id produced no output for a non-empty patch".to_string(),
            }),
        }
    }

    fn worktree_diff(&self) -> Result<Vec<u8>, Error> {
        self.run_git("diff", &["diff", "HEAD", "--no-color"], None)
    }

    fn apply_cached(&self, patch: &[u8]) -> Result<(), Error> {
        self.run_git("apply --cached", &["apply", "--cached"], Some(patch))
            .map(|_| ())
    }

    fn add_path(&self, path: &str) -> Result<(), Error> {
        self.run_git("add", &["add", "--", path], None).map(|_| ())
    }

    fn index_status(&self) -> Result<Vec<IndexEntry>, Error> {
        let output = self.run_git("status", &["status", "--porcelain"], None)?;
        Ok(parse_porcelain(&output))
    }
}

fn cancelled(operation: &str) -> Error {
    Error::GitCommand {
        operation: operation.to_string(),
        status: None,
        stderr: "cancelled".to_string(),
    }
}

fn spawn_reader<R: Read + Send + 'static>(
    source: Option<R>,
) -> Option<thread::JoinHandle<Vec<u8>>> {
    source.map(|mut reader| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = reader.read_to_end(&mut buf);
            buf
        })
    })
}

fn join_reader(handle: thread::JoinHandle<Vec<u8>>) -> Vec<u8> {
    handle.join().unwrap_or_default()
}

/// Parse `git status --porcelain` v1 output.
///
/// Each line is `XY PATH` (or `XY OLD -> NEW` for renames). The index-side
/// column X drives the status, with one special case: intent-to-add entries
/// are reported as `" A"`.
fn parse_porcelain(output: &[u8]) -> Vec<IndexEntry> {
    let text = String::from_utf8_lossy(output);
    let mut entries = Vec::new();

    for line in text.lines() {
        let bytes = line.as_bytes();
        if bytes.len() < 4 {
            continue;
        }
        let x = bytes[0] as char;
        let y = bytes[1] as char;
        let rest = &line[3..];
        let path_field = match rest.split_once(" -> ") {
            Some((_, new_side)) => new_side,
            None => rest,
        };
        let path = unquote_git_path(path_field);

        let status = match (x, y) {
            ('?', '?') => IndexEntryStatus::Untracked,
            ('!', '!') => continue,
            (' ', 'A') => IndexEntryStatus::IntentToAdd,
            (' ', _) => IndexEntryStatus::Unmodified,
            ('M', _) => IndexEntryStatus::Modified,
            ('A', _) => IndexEntryStatus::Added,
            ('D', _) => IndexEntryStatus::Deleted,
            ('R', _) => IndexEntryStatus::Renamed,
            // a copy introduces a new path
            ('C', _) => IndexEntryStatus::Added,
            ('T', _) => IndexEntryStatus::TypeChange,
            // merge conflicts block staging like any staged change
            ('U', _) | (_, 'U') => IndexEntryStatus::Modified,
            _ => IndexEntryStatus::Modified,
        };

        entries.push(IndexEntry { path, status });
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_porcelain_basic_codes() {
        let output = b"\
M  staged.rs
 M worktree_only.rs
A  new.rs
D  gone.rs
?? untracked.rs
";
        let entries = parse_porcelain(output);
        assert_eq!(entries.len(), 5);
        assert_eq!(entries[0].status, IndexEntryStatus::Modified);
        assert_eq!(entries[0].path, "staged.rs");
        assert_eq!(entries[1].status, IndexEntryStatus::Unmodified);
        assert_eq!(entries[2].status, IndexEntryStatus::Added);
        assert_eq!(entries[3].status, IndexEntryStatus::Deleted);
        assert_eq!(entries[4].status, IndexEntryStatus::Untracked);
    }

    #[test]
    fn test_parse_porcelain_intent_to_add() {
        let entries = parse_porcelain(b" A main.go\n");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].status, IndexEntryStatus::IntentToAdd);
        assert_eq!(entries[0].path, "main.go");
    }

    #[test]
    fn test_parse_porcelain_rename_takes_new_path() {
        let entries = parse_porcelain(b"R  old.rs -> new.rs\n");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].status, IndexEntryStatus::Renamed);
        assert_eq!(entries[0].path, "new.rs");
    }

    #[test]
    fn test_parse_porcelain_quoted_path() {
        let entries = parse_porcelain(b"M  \"with space.rs\"\n");
        assert_eq!(entries[0].path, "with space.rs");
    }

    #[test]
    fn test_parse_porcelain_skips_ignored_and_short_lines() {
        let entries = parse_porcelain(b"!! build/\n\n");
        assert!(entries.is_empty());
    }

    #[test]
    fn test_cancelled_error_shape() {
        let err = cancelled("diff");
        match err {
            Error::GitCommand {
                operation,
                status,
                stderr,
            } => {
                assert_eq!(operation, "diff");
                assert_eq!(status, None);
                assert_eq!(stderr, "cancelled");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_pre_cancelled_token_short_circuits() {
        let token = CancelToken::new();
        token.cancel();
        let git = Git::new().with_cancel_token(token);
        let err = git.worktree_diff().unwrap_err();
        match err {
            Error::GitCommand { stderr, .. } => assert_eq!(stderr, "cancelled"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
