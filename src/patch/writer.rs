//! Standalone single-hunk patch assembly.

use crate::models::{FileChange, Hunk};

/// Builds the synthetic one-hunk patches handed to `git apply --cached` and
/// `git patch-id`.
pub struct PatchWriter;

impl PatchWriter {
    /// File header, hunk header, hunk body — verbatim byte concatenation,
    /// nothing synthesized.
    #[must_use]
    pub fn standalone(file: &FileChange, hunk: &Hunk) -> Vec<u8> {
        let mut patch =
            Vec::with_capacity(file.header.len() + hunk.header.len() + hunk.body.len());
        patch.extend_from_slice(&file.header);
        patch.extend_from_slice(&hunk.header);
        patch.extend_from_slice(&hunk.body);
        patch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch;

    const DIFF: &str = "\
diff --git a/src/main.rs b/src/main.rs
index 1234567..abcdefg 100644
--- a/src/main.rs
+++ b/src/main.rs
@@ -1,3 +1,4 @@
 fn main() {
+    println!(\"one\");
     run();
 }
@@ -10,2 +11,3 @@
 fn helper() {
+    println!(\"two\");
 }
";

    #[test]
    fn test_standalone_is_pure_concatenation() {
        let parsed = patch::parse(DIFF.as_bytes()).unwrap();
        let file = &parsed.files[0];
        let standalone = PatchWriter::standalone(file, &file.hunks[0]);

        let expected = "\
diff --git a/src/main.rs b/src/main.rs
index 1234567..abcdefg 100644
--- a/src/main.rs
+++ b/src/main.rs
@@ -1,3 +1,4 @@
 fn main() {
+    println!(\"one\");
     run();
 }
";
        assert_eq!(standalone, expected.as_bytes());
    }

    #[test]
    fn test_standalone_excludes_sibling_hunks() {
        let parsed = patch::parse(DIFF.as_bytes()).unwrap();
        let file = &parsed.files[0];
        let standalone = PatchWriter::standalone(file, &file.hunks[1]);

        let text = String::from_utf8(standalone).unwrap();
        assert!(text.contains("@@ -10,2 +11,3 @@"));
        assert!(!text.contains("@@ -1,3 +1,4 @@"));
        assert!(!text.contains("println!(\"one\")"));
    }

    #[test]
    fn test_standalone_reparses_as_single_hunk_patch() {
        let parsed = patch::parse(DIFF.as_bytes()).unwrap();
        let file = &parsed.files[0];
        let standalone = PatchWriter::standalone(file, &file.hunks[1]);

        let reparsed = patch::parse(&standalone).unwrap();
        assert_eq!(reparsed.files.len(), 1);
        assert_eq!(reparsed.files[0].hunks.len(), 1);
        assert_eq!(reparsed.files[0].hunks[0].index, 1);
    }
}
