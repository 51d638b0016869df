//! Sequential hunk application against the index.
//!
//! Numeric hunk selection is a plan-resolution convenience only: indices are
//! translated into content fingerprints exactly once, against the provided
//! patch, before anything is applied. The apply loop then works purely by
//! fingerprint, re-reading the worktree diff between applications — staging
//! a hunk shifts the offsets and renumbers the siblings of everything after
//! it, but its content identity stays put.

use log::{debug, info};

use crate::error::Error;
use crate::fingerprint::hunk_fingerprint;
use crate::git::GitOps;
use crate::hunk_spec::{FileRequest, HunkSelection};
use crate::models::Fingerprint;
use crate::patch::{self, Patch, PatchWriter};

/// Resolved work list: fingerprint multiset per file, plus whole-file paths.
///
/// Owns its fingerprints; nothing here borrows parse-owned storage.
#[derive(Debug, Clone, Default)]
pub struct Plan {
    pub targets: Vec<FileTargets>,
    pub wildcards: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct FileTargets {
    pub path: String,
    /// Remaining fingerprints. A multiset: two identical hunks in one file
    /// yield the same fingerprint twice, and both get staged.
    pub remaining: Vec<Fingerprint>,
}

impl Plan {
    /// True once every numeric target has been applied.
    pub fn is_settled(&self) -> bool {
        self.targets.iter().all(|t| t.remaining.is_empty())
    }

    pub fn remaining_total(&self) -> usize {
        self.targets.iter().map(|t| t.remaining.len()).sum()
    }

    fn first_remaining(&self) -> Option<(&str, &Fingerprint)> {
        self.targets
            .iter()
            .find(|t| !t.remaining.is_empty())
            .map(|t| (t.path.as_str(), &t.remaining[0]))
    }

    fn remove(&mut self, path: &str, fingerprint: &Fingerprint) {
        if let Some(target) = self.targets.iter_mut().find(|t| t.path == path) {
            if let Some(pos) = target.remaining.iter().position(|f| f == fingerprint) {
                target.remaining.remove(pos);
            }
        }
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageSummary {
    /// Hunks applied individually.
    pub applied: usize,
    /// Paths staged whole via wildcard.
    pub wildcarded: usize,
}

/// One hunk picked for application, with everything needed to stage it and
/// to annotate a failure.
struct NextApply {
    path: String,
    hunk_index: usize,
    fingerprint: Fingerprint,
    patch: Vec<u8>,
}

/// Drives plan resolution and the apply loop.
pub struct Stager<'a, G: GitOps> {
    git: &'a G,
}

impl<'a, G: GitOps> Stager<'a, G> {
    pub fn new(git: &'a G) -> Self {
        Self { git }
    }

    /// Translate 1-based hunk numbers into fingerprints against the provided
    /// patch. Nothing is applied yet.
    ///
    /// Fails with `FileNotFound` when a requested path has no section in the
    /// patch, `HunkNotFound` when a number exceeds the file's hunk count
    /// (binary and hunkless files count 0), and `Parsing` for a targeted
    /// hunk with no added or removed lines.
    pub fn resolve_plan(
        &self,
        patch: &Patch,
        requests: &[FileRequest],
    ) -> Result<Plan, Error> {
        let mut plan = Plan::default();

        for request in requests {
            let file = patch
                .file_for_path(&request.path)
                .ok_or_else(|| path_not_in_patch(&request.path))?;

            match &request.selection {
                HunkSelection::Wildcard => {
                    plan.wildcards.push(request.path.clone());
                }
                HunkSelection::Numbers(numbers) => {
                    let actual = file.hunks.len();
                    let offending: Vec<usize> =
                        numbers.iter().copied().filter(|&n| n > actual).collect();
                    if !offending.is_empty() {
                        return Err(Error::HunkNotFound {
                            path: request.path.clone(),
                            requested: offending,
                            actual,
                        });
                    }

                    let mut remaining = Vec::with_capacity(numbers.len());
                    for &number in numbers {
                        let hunk = &file.hunks[number - 1];
                        if !hunk.has_changes() {
                            return Err(Error::Parsing(format!(
                                "hunk {} in {} contains only context lines and cannot be staged",
                                number, request.path
                            )));
                        }
                        remaining.push(hunk_fingerprint(self.git, file, hunk)?);
                    }
                    plan.targets.push(FileTargets {
                        path: request.path.clone(),
                        remaining,
                    });
                }
            }
        }

        debug!(
            "plan resolved: {} fingerprints across {} files, {} wildcard paths",
            plan.remaining_total(),
            plan.targets.len(),
            plan.wildcards.len()
        );
        Ok(plan)
    }

    /// Apply every planned fingerprint, strictly one hunk per iteration, then
    /// stage the wildcard paths whole.
    ///
    /// Each iteration re-reads the worktree diff: the previous application
    /// has mutated the index, so offsets and sibling numbering are already
    /// stale, and only fingerprints are trusted. Hunks staged before a
    /// failure stay staged; the partial index is a legitimate checkpoint.
    pub fn run(&self, mut plan: Plan) -> Result<StageSummary, Error> {
        let mut summary = StageSummary::default();

        while !plan.is_settled() {
            let diff = self.git.worktree_diff()?;
            let current = if is_blank(&diff) {
                Patch::default()
            } else {
                patch::parse(&diff)?
            };

            let Some(next) = self.find_next(&current, &plan)? else {
                // settledness was checked above, so a remaining target exists
                let Some((path, fingerprint)) = plan.first_remaining() else {
                    break;
                };
                return Err(Error::FingerprintNotFound {
                    path: path.to_string(),
                    fingerprint: fingerprint.clone(),
                });
            };

            debug!(
                "applying {} hunk {} ({})",
                next.path,
                next.hunk_index,
                next.fingerprint.short()
            );
            self.git
                .apply_cached(&next.patch)
                .map_err(|err| annotate_apply_failure(err, &next))?;

            plan.remove(&next.path, &next.fingerprint);
            summary.applied += 1;
        }

        for path in &plan.wildcards {
            debug!("staging whole file {path}");
            self.git.add_path(path)?;
            summary.wildcarded += 1;
        }

        info!(
            "staged {} hunks and {} whole files",
            summary.applied, summary.wildcarded
        );
        Ok(summary)
    }

    /// Walk the planned files in the current diff, fingerprinting lazily,
    /// and return the first hunk matching any remaining target.
    fn find_next(&self, current: &Patch, plan: &Plan) -> Result<Option<NextApply>, Error> {
        for target in plan.targets.iter().filter(|t| !t.remaining.is_empty()) {
            let Some(file) = current.file_for_path(&target.path) else {
                continue;
            };
            for hunk in &file.hunks {
                let fingerprint = hunk_fingerprint(self.git, file, hunk)?;
                if target.remaining.contains(&fingerprint) {
                    return Ok(Some(NextApply {
                        path: target.path.clone(),
                        hunk_index: hunk.index,
                        fingerprint,
                        patch: PatchWriter::standalone(file, hunk),
                    }));
                }
            }
        }
        Ok(None)
    }
}

fn path_not_in_patch(path: &str) -> Error {
    Error::FileNotFound(format!(
        "{path}: not present in the patch. For a new file, register it first with \
         `git add -N {path}` (or `git add -N .` for all new files) and regenerate the patch"
    ))
}

/// Keep the error kind, fold the file/hunk/fingerprint context into the
/// operation field.
fn annotate_apply_failure(err: Error, next: &NextApply) -> Error {
    match err {
        Error::GitCommand {
            operation,
            status,
            stderr,
        } => Error::GitCommand {
            operation: format!(
                "{} [{} hunk {}, fingerprint {}]",
                operation,
                next.path,
                next.hunk_index,
                next.fingerprint.short()
            ),
            status,
            stderr,
        },
        other => other,
    }
}

fn is_blank(bytes: &[u8]) -> bool {
    bytes.iter().all(u8::is_ascii_whitespace)
}
