//! Content-derived hunk identity.
//!
//! A hunk is wrapped in a minimal standalone patch and handed to
//! `git patch-id`, which hashes the diff with line numbers ignored. The
//! resulting token therefore survives the offset shifts caused by staging
//! earlier hunks, which is what the whole apply loop leans on.

use crate::error::Error;
use crate::git::GitOps;
use crate::models::{FileChange, Fingerprint, Hunk};
use crate::patch::PatchWriter;

/// Fingerprint one hunk, caching the token on the hunk for the lifetime of
/// its parse. Fails with `GitCommand` if the driver call fails.
pub fn hunk_fingerprint<G: GitOps>(
    git: &G,
    file: &FileChange,
    hunk: &Hunk,
) -> Result<Fingerprint, Error> {
    if let Some(cached) = hunk.cached_fingerprint() {
        return Ok(cached.clone());
    }
    let patch = PatchWriter::standalone(file, hunk);
    let fingerprint = git.fingerprint(&patch)?;
    hunk.cache_fingerprint(fingerprint.clone());
    Ok(fingerprint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch;
    use crate::test_utils::StubGit;

    const DIFF: &str = "\
diff --git a/f b/f
--- a/f
+++ b/f
@@ -1,2 +1,3 @@
 context
+added line
 more context
@@ -10,2 +11,3 @@
 other context
+added line
 tail context
";

    #[test]
    fn test_fingerprint_is_cached_after_first_call() {
        let git = StubGit::new();
        let parsed = patch::parse(DIFF.as_bytes()).unwrap();
        let file = &parsed.files[0];

        assert!(file.hunks[0].cached_fingerprint().is_none());
        let first = hunk_fingerprint(&git, file, &file.hunks[0]).unwrap();
        assert_eq!(file.hunks[0].cached_fingerprint(), Some(&first));

        let second = hunk_fingerprint(&git, file, &file.hunks[0]).unwrap();
        assert_eq!(first, second);
        assert_eq!(git.fingerprint_calls(), 1);
    }

    #[test]
    fn test_identical_content_at_different_offsets_matches() {
        let git = StubGit::new();
        let parsed = patch::parse(DIFF.as_bytes()).unwrap();
        let file = &parsed.files[0];

        // both hunks add the same line but sit at different offsets with
        // different context; the stub hashes only added/removed lines
        let first = hunk_fingerprint(&git, file, &file.hunks[0]).unwrap();
        let second = hunk_fingerprint(&git, file, &file.hunks[1]).unwrap();
        assert_eq!(first, second);
    }
}
