//! git-sequential-stage: stage chosen hunks from a patch into the git index,
//! without interactive prompts.
//!
//! Interactive partial staging (`git add -p`) cannot be driven by an
//! automated agent, and selecting hunks purely by number breaks as soon as
//! earlier hunks have been applied: offsets shift and sibling indices
//! renumber. This crate identifies every hunk by a content-derived
//! fingerprint (`git patch-id`) instead — numeric indices are a
//! plan-resolution convenience, resolved to fingerprints exactly once, and
//! the apply loop re-locates each hunk by content in the evolving diff.
//!
//! # Architecture
//!
//! - [`git::GitOps`] — the git capability surface (diff, apply, status),
//!   mockable in tests
//! - [`patch`] — byte-oriented unified diff parser and standalone-patch
//!   assembly
//! - [`fingerprint`] — content-derived hunk identity with per-parse caching
//! - [`safety`] — refuses to stage over an unclean index (intent-to-add
//!   entries exempt)
//! - [`hunk_spec`] — `PATH:SPEC` argument parsing
//! - [`stager`] — plan resolution and the sequential apply loop
//! - [`counter`] — per-file hunk counts for `count-hunks`
//! - [`error`] — the closed error taxonomy
//!
//! # Example
//!
//! ```ignore
//! use git_sequential_stage::git::Git;
//! use git_sequential_stage::hunk_spec::parse_requests;
//! use git_sequential_stage::stager::Stager;
//!
//! let git = Git::new();
//! let requests = parse_requests(&["src/server.py:1,3".to_string()])?;
//! let patch = git_sequential_stage::patch::parse(&patch_bytes)?;
//!
//! let stager = Stager::new(&git);
//! let plan = stager.resolve_plan(&patch, &requests)?;
//! stager.run(plan)?;
//! ```

pub mod app;
pub mod cancel;
pub mod cli;
pub mod counter;
pub mod error;
pub mod fingerprint;
pub mod git;
pub mod hunk_spec;
pub mod models;
pub mod patch;
pub mod safety;
pub mod stager;
pub mod utils;

#[cfg(test)]
pub mod test_utils;
