//! Traversal guard for manifest-sourced paths.
//!
//! Every path that comes out of a document (required files, entrypoints,
//! commands, package entries) goes through [`safe_relative`] or [`safe_child`]
//! before it touches the filesystem. Unsafe paths are rejected, never
//! sanitized.

use std::fmt;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsafeReason {
    Empty,
    Absolute,
    Traversal,
    /// The path resolves (through symlinks) outside its root.
    Escapes,
}

impl fmt::Display for UnsafeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("empty path"),
            Self::Absolute => f.write_str("absolute paths are not allowed"),
            Self::Traversal => f.write_str("path traversal (`..`) is not allowed"),
            Self::Escapes => f.write_str("resolves outside the root directory"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{prefix}unsafe path '{path}': {reason}", prefix = context_prefix(.context.as_deref()))]
pub struct UnsafePath {
    pub path: String,
    pub reason: UnsafeReason,
    pub context: Option<String>,
}

impl UnsafePath {
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

fn context_prefix(context: Option<&str>) -> String {
    context.map(|c| format!("{c}: ")).unwrap_or_default()
}

/// Normalize a relative path, rejecting absolute paths and `..` segments.
///
/// `.` and empty segments are dropped. A path that normalizes to nothing is
/// rejected as empty.
pub fn safe_relative(raw: &str) -> Result<PathBuf, UnsafePath> {
    let reject = |reason| UnsafePath {
        path: raw.to_owned(),
        reason,
        context: None,
    };

    if raw.trim().is_empty() {
        return Err(reject(UnsafeReason::Empty));
    }
    if raw.starts_with('/') || raw.starts_with('\\') || Path::new(raw).is_absolute() {
        return Err(reject(UnsafeReason::Absolute));
    }
    // `\` counts as a separator on every platform.
    if raw.split(['/', '\\']).any(|segment| segment == "..") {
        return Err(reject(UnsafeReason::Traversal));
    }

    let mut normalized = PathBuf::new();
    for component in Path::new(raw).components() {
        match component {
            Component::Normal(part) => normalized.push(part),
            Component::CurDir => {}
            Component::ParentDir => return Err(reject(UnsafeReason::Traversal)),
            Component::RootDir | Component::Prefix(_) => {
                return Err(reject(UnsafeReason::Absolute))
            }
        }
    }

    if normalized.as_os_str().is_empty() {
        return Err(reject(UnsafeReason::Empty));
    }
    Ok(normalized)
}

/// Resolve `relative` under `root` after passing it through [`safe_relative`].
pub fn safe_child(root: &Path, relative: &str, context: &str) -> Result<PathBuf, UnsafePath> {
    let rel = safe_relative(relative).map_err(|e| e.with_context(context))?;
    Ok(root.join(rel))
}

/// Check that `candidate` still lies under `root` once symlinks are resolved.
///
/// `root` must already be canonical. A candidate that cannot be resolved
/// passes, so callers report it as missing instead.
pub fn ensure_contained(root: &Path, candidate: &Path, raw: &str) -> Result<(), UnsafePath> {
    match candidate.canonicalize() {
        Ok(resolved) if !resolved.starts_with(root) => Err(UnsafePath {
            path: raw.to_owned(),
            reason: UnsafeReason::Escapes,
            context: None,
        }),
        _ => Ok(()),
    }
}

/// Render a relative path with `/` separators regardless of platform.
pub fn to_posix(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
