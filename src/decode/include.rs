//! File pattern resolution for `@include`.
//!
//! Only the final path component may carry `*` wildcards. Matching is done
//! against the entries of the containing directory; subdirectories are never
//! descended into.

use std::fs;
use std::path::{Path, PathBuf};

use smallvec::SmallVec;
use tracing::debug;

/// Returns true when `filename` matches `pattern`, where each `*` stands for
/// any run of characters, including none.
pub fn match_file(filename: &str, pattern: &str) -> bool {
    let parts: SmallVec<[&str; 4]> = pattern.split('*').collect();
    let (Some(first), Some(last)) = (parts.first(), parts.last()) else {
        return false;
    };
    if parts.len() == 1 {
        return filename == pattern;
    }
    if filename.len() < first.len() + last.len()
        || !filename.starts_with(first)
        || !filename.ends_with(last)
    {
        return false;
    }
    let mut rest = &filename[first.len()..filename.len() - last.len()];
    for part in &parts[1..parts.len() - 1] {
        if part.is_empty() {
            continue;
        }
        match rest.find(part) {
            Some(idx) => rest = &rest[idx + part.len()..],
            None => return false,
        }
    }
    true
}

/// Lists the regular files matching `pattern`, sorted by path.
///
/// An unreadable directory yields no matches.
pub fn list_matching(pattern: &Path) -> Vec<PathBuf> {
    let dir = match pattern.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let Some(name_pattern) = pattern.file_name().and_then(|name| name.to_str()) else {
        return Vec::new();
    };
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            debug!(dir = %dir.display(), error = %err, "cannot list include directory");
            return Vec::new();
        }
    };
    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .is_some_and(|name| match_file(name, name_pattern))
        })
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    files.sort();
    files
}

/// Resolves a relative `pattern` against `base_dir` and lists its matches.
pub(crate) fn resolve_pattern(pattern: &str, base_dir: Option<&Path>) -> Vec<PathBuf> {
    let pattern = Path::new(pattern);
    match base_dir {
        Some(base) if pattern.is_relative() => list_matching(&base.join(pattern)),
        _ => list_matching(pattern),
    }
}
