//! Deterministic file selection for migration packages.
//!
//! The selection is `(required ∪ optional-matches) − exclude-matches` over
//! normalized `/`-separated relative paths, returned sorted so the same tree
//! always yields the same package layout.

use crate::StoreError;
use globset::{GlobBuilder, GlobMatcher, GlobSet, GlobSetBuilder};
use statepack_schema::{ensure_contained, safe_child, safe_relative, to_posix};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

const GLOB_META: [char; 4] = ['*', '?', '[', '{'];

/// A file chosen for a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedFile {
    /// Repository-relative path with `/` separators.
    pub rel_path: String,
    pub abs_path: PathBuf,
}

/// Select files under `root`.
///
/// A required file or glob match that resolves outside `root` through a
/// symlink is never selected: required files fail with `UnsafePath`, glob
/// matches are skipped.
pub fn collect_files(
    root: &Path,
    required: &[String],
    optional_globs: &[String],
    exclude_globs: &[String],
) -> Result<Vec<CollectedFile>, StoreError> {
    let canonical_root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
    let mut selected: BTreeMap<String, PathBuf> = BTreeMap::new();

    for rel in required {
        let candidate = safe_child(root, rel, "required file")?;
        ensure_contained(&canonical_root, &candidate, rel)
            .map_err(|e| e.with_context("required file"))?;
        if !candidate.is_file() {
            return Err(StoreError::MissingRequiredFile(rel.clone()));
        }
        selected.insert(to_posix(&safe_relative(rel)?), candidate);
    }

    for pattern in optional_globs {
        let matched = expand_glob(root, &canonical_root, pattern)?;
        debug!("optional glob '{pattern}' matched {} file(s)", matched.len());
        selected.extend(matched);
    }

    let excludes = build_exclude_set(exclude_globs)?;
    let files: Vec<CollectedFile> = selected
        .into_iter()
        .filter(|(rel, _)| !excludes.is_match(rel))
        .map(|(rel_path, abs_path)| CollectedFile { rel_path, abs_path })
        .collect();

    debug!("collected {} file(s) under {}", files.len(), root.display());
    Ok(files)
}

/// Expand one root-anchored glob into `(relative path, absolute path)` pairs
/// for every regular file it matches.
///
/// `*`, `?` and classes stay within one path segment; `**` spans directories.
/// Unreadable directories are skipped.
fn expand_glob(
    root: &Path,
    canonical_root: &Path,
    pattern: &str,
) -> Result<Vec<(String, PathBuf)>, StoreError> {
    let matcher = build_matcher(pattern)?;
    let base = root.join(literal_base(pattern));
    if !base.is_dir() {
        return Ok(Vec::new());
    }

    let mut matched = Vec::new();
    for entry in WalkDir::new(&base).follow_links(false).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!("skipping unreadable entry while expanding '{pattern}': {e}");
                continue;
            }
        };
        if entry.file_type().is_dir() || !entry.path().is_file() {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(root) else {
            continue;
        };
        let rel = to_posix(rel);
        if !matcher.is_match(&rel) {
            continue;
        }
        if let Err(e) = ensure_contained(canonical_root, entry.path(), &rel) {
            warn!("optional glob '{pattern}': {e}");
            continue;
        }
        matched.push((rel, entry.into_path()));
    }
    Ok(matched)
}

fn build_matcher(pattern: &str) -> Result<GlobMatcher, StoreError> {
    Ok(GlobBuilder::new(pattern.trim_start_matches("./"))
        .literal_separator(true)
        .backslash_escape(true)
        .build()?
        .compile_matcher())
}

/// Exclusions use fnmatch semantics: `*` may cross `/`.
fn build_exclude_set(patterns: &[String]) -> Result<GlobSet, StoreError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(
            GlobBuilder::new(pattern.trim_start_matches("./"))
                .literal_separator(false)
                .build()?,
        );
    }
    Ok(builder.build()?)
}

/// Leading directory segments of `pattern` that contain no glob syntax.
fn literal_base(pattern: &str) -> PathBuf {
    let segments: Vec<&str> = pattern.trim_start_matches("./").split('/').collect();
    let mut base = PathBuf::new();
    for segment in &segments[..segments.len().saturating_sub(1)] {
        if segment.contains(GLOB_META) || *segment == ".." {
            break;
        }
        if !segment.is_empty() && *segment != "." {
            base.push(segment);
        }
    }
    base
}
