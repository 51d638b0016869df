//! Shared fixtures for unit tests.

use std::cell::RefCell;
use std::collections::VecDeque;

use crate::error::Error;
use crate::git::GitOps;
use crate::models::{Fingerprint, IndexEntry};

/// Scripted stand-in for the git driver.
///
/// `worktree_diff` drains the scripted diffs front-first (a blank diff once
/// they run out), applied patches and added paths are recorded, and
/// `fingerprint` hashes only the added/removed lines of the patch — the same
/// offset-stability `git patch-id` provides — so the stager's re-resolution
/// loop can be exercised without a repository.
#[derive(Default)]
pub struct StubGit {
    diffs: RefCell<VecDeque<Vec<u8>>>,
    applied: RefCell<Vec<Vec<u8>>>,
    added: RefCell<Vec<String>>,
    statuses: Vec<IndexEntry>,
    fingerprint_calls: RefCell<usize>,
    apply_error: Option<String>,
}

impl StubGit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_diffs(diffs: &[&str]) -> Self {
        Self {
            diffs: RefCell::new(diffs.iter().map(|d| d.as_bytes().to_vec()).collect()),
            ..Self::default()
        }
    }

    pub fn with_statuses(mut self, statuses: Vec<IndexEntry>) -> Self {
        self.statuses = statuses;
        self
    }

    /// Make every `apply_cached` call fail with the given stderr.
    pub fn failing_apply(mut self, stderr: &str) -> Self {
        self.apply_error = Some(stderr.to_string());
        self
    }

    pub fn applied_patches(&self) -> Vec<Vec<u8>> {
        self.applied.borrow().clone()
    }

    pub fn added_paths(&self) -> Vec<String> {
        self.added.borrow().clone()
    }

    pub fn fingerprint_calls(&self) -> usize {
        *self.fingerprint_calls.borrow()
    }
}

impl GitOps for StubGit {
    fn version_check(&self) -> Result<(), Error> {
        Ok(())
    }

    fn fingerprint(&self, patch: &[u8]) -> Result<Fingerprint, Error> {
        *self.fingerprint_calls.borrow_mut() += 1;
        Ok(content_fingerprint(patch))
    }

    fn worktree_diff(&self) -> Result<Vec<u8>, Error> {
        Ok(self.diffs.borrow_mut().pop_front().unwrap_or_default())
    }

    fn apply_cached(&self, patch: &[u8]) -> Result<(), Error> {
        if let Some(stderr) = &self.apply_error {
            return Err(Error::GitCommand {
                operation: "apply --cached".to_string(),
                status: Some(1),
                stderr: stderr.clone(),
            });
        }
        self.applied.borrow_mut().push(patch.to_vec());
        Ok(())
    }

    fn add_path(&self, path: &str) -> Result<(), Error> {
        self.added.borrow_mut().push(path.to_string());
        Ok(())
    }

    fn index_status(&self) -> Result<Vec<IndexEntry>, Error> {
        Ok(self.statuses.clone())
    }
}

/// FNV-1a over the `+`/`-` body lines of a patch, positions ignored.
pub fn content_fingerprint(patch: &[u8]) -> Fingerprint {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    let mut hash = OFFSET;
    for line in patch.split(|&b| b == b'\n') {
        let significant = match line.first() {
            Some(b'+') => !line.starts_with(b"+++"),
            Some(b'-') => !line.starts_with(b"---"),
            _ => false,
        };
        if significant {
            for &byte in line {
                hash ^= u64::from(byte);
                hash = hash.wrapping_mul(PRIME);
            }
            // line boundary
            hash ^= 0xff;
            hash = hash.wrapping_mul(PRIME);
        }
    }
    Fingerprint::new(format!("{hash:016x}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_fingerprint_ignores_offsets_and_context() {
        let at_top = b"--- a/f\n+++ b/f\n@@ -1,2 +1,3 @@\n ctx one\n+payload\n ctx two\n";
        let at_bottom = b"--- a/f\n+++ b/f\n@@ -90,2 +91,3 @@\n other ctx\n+payload\n more ctx\n";
        assert_eq!(content_fingerprint(at_top), content_fingerprint(at_bottom));
    }

    #[test]
    fn test_content_fingerprint_distinguishes_changes() {
        let one = b"@@ -1 +1,2 @@\n ctx\n+payload\n";
        let other = b"@@ -1 +1,2 @@\n ctx\n+different\n";
        assert_ne!(content_fingerprint(one), content_fingerprint(other));
    }

    #[test]
    fn test_stub_drains_diffs_then_goes_blank() {
        let git = StubGit::with_diffs(&["first", "second"]);
        assert_eq!(git.worktree_diff().unwrap(), b"first".to_vec());
        assert_eq!(git.worktree_diff().unwrap(), b"second".to_vec());
        assert!(git.worktree_diff().unwrap().is_empty());
    }
}
