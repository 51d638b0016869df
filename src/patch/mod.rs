//! Unified diff patch parsing and standalone patch assembly.
//!
//! The parser is byte-oriented: diff bodies can carry arbitrary payloads
//! (including invalid UTF-8), so hunks are sliced out of the input as raw
//! byte ranges and only recognized path fields are decoded to strings.

mod parser;
mod writer;

pub use writer::PatchWriter;

use crate::error::Error;
use crate::models::FileChange;

/// A parsed unified diff: ordered file sections, each with ordered hunks.
#[derive(Debug, Clone, Default)]
pub struct Patch {
    pub files: Vec<FileChange>,
}

impl Patch {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Look up a file section by user-facing path.
    ///
    /// The addition side wins: when git reports a below-threshold rename as
    /// an independent deletion plus addition of the same path family, numeric
    /// hunk requests address the addition, and pure deletions stay reachable
    /// by their old path.
    pub fn file_for_path(&self, path: &str) -> Option<&FileChange> {
        self.files
            .iter()
            .find(|f| f.new_path.as_deref() == Some(path))
            .or_else(|| {
                self.files
                    .iter()
                    .find(|f| f.new_path.is_none() && f.old_path.as_deref() == Some(path))
            })
    }
}

/// Parse the full bytes of a unified diff.
///
/// Fails with [`Error::Parsing`] when the input is not a valid unified diff,
/// when a hunk's counted lines do not match its body, or when the input
/// contains no file sections at all.
pub fn parse(input: &[u8]) -> Result<Patch, Error> {
    parser::parse(input)
}
