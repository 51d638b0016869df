//! Byte-oriented unified diff parsing.
//!
//! Sections split at `diff --git`; hunk bodies are consumed count-driven
//! against the `@@` header, so a header/body mismatch is a parse error rather
//! than a silently mis-sliced hunk. Every hunk and file header keeps its
//! exact input bytes.

use crate::error::Error;
use crate::models::{ChangeKind, FileChange, Hunk};
use crate::patch::Patch;
use crate::utils::unquote_git_path;

pub(crate) fn parse(input: &[u8]) -> Result<Patch, Error> {
    let mut parser = PatchParser {
        input,
        spans: split_lines(input),
        cursor: 0,
    };

    let mut files = Vec::new();
    while parser.cursor < parser.spans.len() {
        let line = parser.line(parser.cursor);
        if is_blank(line) {
            parser.cursor += 1;
        } else if line.starts_with(b"diff --git ") {
            files.push(parser.parse_file_section()?);
        } else {
            return Err(Error::Parsing(format!(
                "unexpected content outside a file section: {}",
                String::from_utf8_lossy(line).trim_end()
            )));
        }
    }

    if files.is_empty() {
        return Err(Error::Parsing("patch contains no file sections".to_string()));
    }
    Ok(Patch { files })
}

struct PatchParser<'a> {
    input: &'a [u8],
    /// (start, end) byte ranges per line; end includes the trailing newline.
    spans: Vec<(usize, usize)>,
    cursor: usize,
}

impl<'a> PatchParser<'a> {
    /// Line content without its trailing newline.
    fn line(&self, i: usize) -> &'a [u8] {
        let (start, end) = self.spans[i];
        let mut slice = &self.input[start..end];
        if let Some((&b'\n', rest)) = slice.split_last() {
            slice = rest;
        }
        slice
    }

    fn parse_file_section(&mut self) -> Result<FileChange, Error> {
        let section_start = self.spans[self.cursor].0;
        let (mut old_path, mut new_path) = diff_git_paths(self.line(self.cursor));
        self.cursor += 1;

        let mut is_new = false;
        let mut is_deleted = false;
        let mut is_renamed = false;
        let mut is_copied = false;
        let mut has_mode_change = false;
        let mut is_binary = false;

        let header_end;
        loop {
            if self.cursor >= self.spans.len() {
                header_end = self.input.len();
                break;
            }
            let line = self.line(self.cursor);
            if line.starts_with(b"@@") || line.starts_with(b"diff --git ") || is_blank(line) {
                header_end = self.spans[self.cursor].0;
                break;
            }
            if line.starts_with(b"Binary files ") || line == b"GIT binary patch" {
                // No hunks follow; a literal binary payload runs to the next
                // section and stays inside this section's header bytes.
                is_binary = true;
                self.cursor += 1;
                while self.cursor < self.spans.len()
                    && !self.line(self.cursor).starts_with(b"diff --git ")
                {
                    self.cursor += 1;
                }
                header_end = if self.cursor < self.spans.len() {
                    self.spans[self.cursor].0
                } else {
                    self.input.len()
                };
                break;
            }

            if let Some(rest) = line.strip_prefix(b"rename from ") {
                is_renamed = true;
                old_path = Some(decode_path(rest));
            } else if let Some(rest) = line.strip_prefix(b"rename to ") {
                is_renamed = true;
                new_path = Some(decode_path(rest));
            } else if let Some(rest) = line.strip_prefix(b"copy from ") {
                is_copied = true;
                old_path = Some(decode_path(rest));
            } else if let Some(rest) = line.strip_prefix(b"copy to ") {
                is_copied = true;
                new_path = Some(decode_path(rest));
            } else if line.starts_with(b"old mode ") || line.starts_with(b"new mode ") {
                has_mode_change = true;
            } else if line.starts_with(b"new file") {
                is_new = true;
            } else if line.starts_with(b"deleted file") {
                is_deleted = true;
            } else if line.starts_with(b"similarity index")
                || line.starts_with(b"dissimilarity index")
                || line.starts_with(b"index ")
            {
                // informational only
            } else if let Some(rest) = line.strip_prefix(b"--- ") {
                old_path = marker_path(rest, "a/");
            } else if let Some(rest) = line.strip_prefix(b"+++ ") {
                new_path = marker_path(rest, "b/");
            } else {
                return Err(Error::Parsing(format!(
                    "unexpected line in file header: {}",
                    String::from_utf8_lossy(line).trim_end()
                )));
            }
            self.cursor += 1;
        }

        let mut hunks = Vec::new();
        while self.cursor < self.spans.len() {
            let line = self.line(self.cursor);
            if line.starts_with(b"@@") {
                if is_binary {
                    return Err(Error::Parsing(format!(
                        "hunk found in binary section for {}",
                        new_path.as_deref().or(old_path.as_deref()).unwrap_or("?")
                    )));
                }
                hunks.push(self.parse_hunk(hunks.len() + 1)?);
            } else if is_blank(line) {
                self.cursor += 1;
            } else if line.starts_with(b"diff --git ") {
                break;
            } else {
                return Err(Error::Parsing(format!(
                    "unexpected content after hunk: {}",
                    String::from_utf8_lossy(line).trim_end()
                )));
            }
        }

        if is_new {
            old_path = None;
        }
        if is_deleted {
            new_path = None;
        }

        let kind = if is_binary {
            ChangeKind::Binary
        } else if is_new {
            ChangeKind::Added
        } else if is_deleted {
            ChangeKind::Deleted
        } else if is_renamed {
            ChangeKind::Renamed
        } else if is_copied {
            ChangeKind::Copied
        } else if has_mode_change {
            ChangeKind::ModeChanged
        } else {
            ChangeKind::Modified
        };

        Ok(FileChange {
            old_path,
            new_path,
            kind,
            is_binary,
            header: self.input[section_start..header_end].to_vec(),
            hunks,
        })
    }

    fn parse_hunk(&mut self, index: usize) -> Result<Hunk, Error> {
        let (header_start, header_end) = self.spans[self.cursor];
        let header_line = self.line(self.cursor);
        let (old_start, old_count, new_start, new_count) = parse_hunk_header(header_line)?;
        self.cursor += 1;

        let body_start = if self.cursor < self.spans.len() {
            self.spans[self.cursor].0
        } else {
            self.input.len()
        };
        let mut body_end = body_start;
        let mut old_remaining = old_count;
        let mut new_remaining = new_count;
        let mut added = 0usize;
        let mut removed = 0usize;
        let mut consumed_any = false;

        while old_remaining > 0 || new_remaining > 0 {
            if self.cursor >= self.spans.len() {
                return Err(Error::Parsing(
                    "hunk truncated before its counted lines ended".to_string(),
                ));
            }
            let line = self.line(self.cursor);
            match line.first() {
                // an entirely empty line is an empty context line
                Some(b' ') | None => {
                    if old_remaining == 0 || new_remaining == 0 {
                        return Err(count_mismatch(line));
                    }
                    old_remaining -= 1;
                    new_remaining -= 1;
                }
                Some(b'+') => {
                    if new_remaining == 0 {
                        return Err(count_mismatch(line));
                    }
                    new_remaining -= 1;
                    added += 1;
                }
                Some(b'-') => {
                    if old_remaining == 0 {
                        return Err(count_mismatch(line));
                    }
                    old_remaining -= 1;
                    removed += 1;
                }
                Some(b'\\') => {
                    // "\ No newline at end of file" attaches to the previous
                    // line and counts on neither side
                    if !consumed_any {
                        return Err(count_mismatch(line));
                    }
                }
                Some(_) => return Err(count_mismatch(line)),
            }
            consumed_any = true;
            body_end = self.spans[self.cursor].1;
            self.cursor += 1;
        }

        // trailing no-newline marker for the last body line
        if self.cursor < self.spans.len() && self.line(self.cursor).first() == Some(&b'\\') {
            body_end = self.spans[self.cursor].1;
            self.cursor += 1;
        }

        Ok(Hunk::new(
            index,
            self.input[header_start..header_end].to_vec(),
            self.input[body_start..body_end].to_vec(),
            old_start,
            old_count,
            new_start,
            new_count,
            added,
            removed,
        ))
    }
}

fn count_mismatch(line: &[u8]) -> Error {
    Error::Parsing(format!(
        "hunk body does not match its header counts near: {}",
        String::from_utf8_lossy(line).trim_end()
    ))
}

fn is_blank(line: &[u8]) -> bool {
    line.iter().all(u8::is_ascii_whitespace)
}

fn split_lines(input: &[u8]) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = 0;
    for (i, &b) in input.iter().enumerate() {
        if b == b'\n' {
            spans.push((start, i + 1));
            start = i + 1;
        }
    }
    if start < input.len() {
        spans.push((start, input.len()));
    }
    spans
}

/// Parse a hunk header like `@@ -1,5 +1,7 @@` or `@@ -1 +1,2 @@ heading`.
/// A missing count denotes 1.
fn parse_hunk_header(line: &[u8]) -> Result<(u32, u32, u32, u32), Error> {
    let invalid = || {
        Error::Parsing(format!(
            "invalid hunk header: {}",
            String::from_utf8_lossy(line).trim_end()
        ))
    };

    let rest = line.strip_prefix(b"@@ -").ok_or_else(invalid)?;
    let (old_start, rest) = take_u32(rest).ok_or_else(invalid)?;
    let (old_count, rest) = take_optional_count(rest).ok_or_else(invalid)?;
    let rest = rest.strip_prefix(b" +").ok_or_else(invalid)?;
    let (new_start, rest) = take_u32(rest).ok_or_else(invalid)?;
    let (new_count, rest) = take_optional_count(rest).ok_or_else(invalid)?;
    if !rest.starts_with(b" @@") {
        return Err(invalid());
    }
    Ok((old_start, old_count, new_start, new_count))
}

fn take_u32(bytes: &[u8]) -> Option<(u32, &[u8])> {
    let digits = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    let mut value: u32 = 0;
    for &b in &bytes[..digits] {
        value = value.checked_mul(10)?.checked_add(u32::from(b - b'0'))?;
    }
    Some((value, &bytes[digits..]))
}

fn take_optional_count(bytes: &[u8]) -> Option<(u32, &[u8])> {
    match bytes.first() {
        Some(b',') => take_u32(&bytes[1..]),
        _ => Some((1, bytes)),
    }
}

/// Extract paths from a `diff --git a/X b/Y` line. Best effort: the
/// `---`/`+++` and `rename from`/`rename to` lines override these when
/// present.
fn diff_git_paths(line: &[u8]) -> (Option<String>, Option<String>) {
    let Some(rest) = line.strip_prefix(b"diff --git ") else {
        return (None, None);
    };
    let text = String::from_utf8_lossy(rest);
    let text = text.trim_end();

    if let Some(quoted) = text.strip_prefix('"') {
        let bytes = quoted.as_bytes();
        let mut end = None;
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'\\' => i += 2,
                b'"' => {
                    end = Some(i);
                    break;
                }
                _ => i += 1,
            }
        }
        let Some(end) = end else {
            return (None, None);
        };
        let a_raw = &text[..end + 2];
        let b_raw = text[end + 2..].trim_start();
        (
            strip_side(&unquote_git_path(a_raw), "a/"),
            strip_side(&unquote_git_path(b_raw), "b/"),
        )
    } else if let Some((a_part, b_part)) = text.split_once(" b/") {
        (strip_side(a_part, "a/"), Some(b_part.to_string()))
    } else {
        (None, None)
    }
}

fn strip_side(path: &str, prefix: &str) -> Option<String> {
    Some(path.strip_prefix(prefix).unwrap_or(path).to_string())
}

/// Path from a `---`/`+++` marker; `/dev/null` means no path on that side.
fn marker_path(rest: &[u8], prefix: &str) -> Option<String> {
    let text = String::from_utf8_lossy(rest);
    let text = text.trim_end();
    if text == "/dev/null" {
        return None;
    }
    let unquoted = unquote_git_path(text);
    Some(
        unquoted
            .strip_prefix(prefix)
            .unwrap_or(&unquoted)
            .to_string(),
    )
}

/// Path from a `rename from`/`rename to`/`copy from`/`copy to` line
/// (no `a/`/`b/` prefix on these).
fn decode_path(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    unquote_git_path(text.trim_end())
}
