//! Parsing of the repeatable `PATH:SPEC` hunk selection arguments.

use std::collections::BTreeSet;

use crate::error::Error;

/// Which hunks of one file the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HunkSelection {
    /// Stage the whole file.
    Wildcard,
    /// Stage specific 1-based hunk numbers, sorted and deduplicated.
    Numbers(Vec<usize>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRequest {
    pub path: String,
    pub selection: HunkSelection,
}

/// Parse `--hunk` arguments into normalized per-file requests.
///
/// Repeated numeric specs for the same path merge into one sorted set. A path
/// bound to both the wildcard and numeric form (or to two wildcards) is
/// rejected, as is a wildcard mixed with numbers inside a single spec.
pub fn parse_requests(specs: &[String]) -> Result<Vec<FileRequest>, Error> {
    let mut requests: Vec<FileRequest> = Vec::new();

    for raw in specs {
        let (path, spec) = raw.rsplit_once(':').ok_or_else(|| {
            Error::InvalidArgument(format!(
                "'{raw}': expected PATH:SPEC (e.g. src/main.rs:1,3 or src/main.rs:*)"
            ))
        })?;
        if path.is_empty() {
            return Err(Error::InvalidArgument(format!("'{raw}': empty path")));
        }
        if spec.is_empty() {
            return Err(Error::InvalidArgument(format!("'{raw}': empty hunk spec")));
        }

        let selection = parse_selection(raw, spec)?;
        match requests.iter_mut().find(|r| r.path == path) {
            None => requests.push(FileRequest {
                path: path.to_string(),
                selection,
            }),
            Some(existing) => merge(existing, selection)?,
        }
    }

    Ok(requests)
}

fn parse_selection(raw: &str, spec: &str) -> Result<HunkSelection, Error> {
    let parts: Vec<&str> = spec.split(',').map(str::trim).collect();

    if parts.iter().any(|p| *p == "*") {
        if parts.len() > 1 {
            return Err(Error::InvalidArgument(format!(
                "'{raw}': mixed wildcard and hunk numbers not allowed"
            )));
        }
        return Ok(HunkSelection::Wildcard);
    }

    let mut numbers = BTreeSet::new();
    for part in parts {
        let number: usize = part.parse().map_err(|_| {
            Error::InvalidArgument(format!(
                "'{raw}': hunk number '{part}' is not a positive integer"
            ))
        })?;
        if number == 0 {
            return Err(Error::InvalidArgument(format!(
                "'{raw}': hunk numbers are 1-based, got 0"
            )));
        }
        numbers.insert(number);
    }
    Ok(HunkSelection::Numbers(numbers.into_iter().collect()))
}

fn merge(existing: &mut FileRequest, incoming: HunkSelection) -> Result<(), Error> {
    match (&mut existing.selection, incoming) {
        (HunkSelection::Numbers(current), HunkSelection::Numbers(more)) => {
            let merged: BTreeSet<usize> =
                current.iter().copied().chain(more.into_iter()).collect();
            *current = merged.into_iter().collect();
            Ok(())
        }
        (HunkSelection::Wildcard, HunkSelection::Wildcard) => Err(Error::InvalidArgument(format!(
            "'{}': wildcard requested twice",
            existing.path
        ))),
        _ => Err(Error::InvalidArgument(format!(
            "'{}': conflicting requests, wildcard and hunk numbers",
            existing.path
        ))),
    }
}
