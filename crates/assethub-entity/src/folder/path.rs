//! Folder path normalization and slug generation.
//!
//! Paths are slash-separated with no leading or trailing slash. The root
//! folder is the empty string.

use assethub_core::{AppError, AppResult};
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Slug used when a label has no alphanumeric characters at all.
pub const SLUG_PLACEHOLDER: &str = "untitled";

/// Normalize a user-supplied folder path.
///
/// Every segment is trimmed, empty segments are dropped and the result is
/// NFC-normalized. Whitespace-only input yields the root path.
pub fn normalize_path(path: &str) -> AppResult<String> {
    if path.contains('\u{0000}') {
        return Err(AppError::validation("Path cannot contain NUL characters"));
    }
    let mut segments = Vec::new();
    for segment in path.split('/') {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        if segment == "." || segment == ".." {
            return Err(AppError::validation(format!(
                "Path segment '{segment}' is not allowed: '{path}'"
            )));
        }
        segments.push(segment.nfc().collect::<String>());
    }
    Ok(segments.join("/"))
}

/// Turn a human label into a URL-safe path segment.
///
/// Lower-cases, strips diacritics and collapses every run of other
/// characters into a single hyphen.
pub fn slugify(label: &str) -> String {
    let mut slug = String::with_capacity(label.len());
    let mut pending_hyphen = false;
    for c in label
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
    {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }
    if slug.is_empty() {
        SLUG_PLACEHOLDER.to_string()
    } else {
        slug
    }
}

/// Join a normalized parent path and a single segment.
pub fn join_path(parent: &str, segment: &str) -> String {
    if parent.is_empty() {
        segment.to_string()
    } else {
        format!("{parent}/{segment}")
    }
}

/// Parent of a normalized path (root for top-level paths and root itself).
pub fn parent_path(path: &str) -> &str {
    path.rsplit_once('/').map(|(parent, _)| parent).unwrap_or("")
}

/// Last segment of a normalized path.
pub fn last_segment(path: &str) -> &str {
    path.rsplit_once('/').map(|(_, last)| last).unwrap_or(path)
}

/// Number of segments in a normalized path.
pub fn path_depth(path: &str) -> i32 {
    if path.is_empty() {
        0
    } else {
        path.split('/').count() as i32
    }
}

/// Prefix that every strict descendant of `path` starts with.
pub fn descendant_prefix(path: &str) -> String {
    if path.is_empty() {
        String::new()
    } else {
        format!("{path}/")
    }
}

/// Whether `candidate` is `ancestor` itself or lies beneath it.
pub fn is_within(candidate: &str, ancestor: &str) -> bool {
    ancestor.is_empty() || candidate == ancestor || candidate.starts_with(&descendant_prefix(ancestor))
}

/// Rewrite `path` so that its `from` prefix becomes `to`.
///
/// `path` must satisfy [`is_within`] for `from`.
pub fn rebase_path(path: &str, from: &str, to: &str) -> String {
    if path == from {
        return to.to_string();
    }
    let rest = path.strip_prefix(&descendant_prefix(from)).unwrap_or(path);
    join_path(to, rest)
}

/// Validate an asset basename.
pub fn validate_basename(basename: &str) -> AppResult<String> {
    let trimmed = basename.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("Basename cannot be empty"));
    }
    if trimmed.contains('/') || trimmed.contains('\u{0000}') {
        return Err(AppError::validation(format!(
            "Basename '{trimmed}' contains forbidden characters"
        )));
    }
    Ok(trimmed.to_string())
}
