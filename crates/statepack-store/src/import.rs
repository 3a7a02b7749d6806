//! Two-phase package import: [`plan_import`] inspects, [`apply_import`] writes.
//!
//! Planning never touches the target tree. Applying either writes every
//! planned file or refuses with the complete list of blocking issues.

use crate::integrity::{check_payload_entry, load_package_manifest, IntegrityIssue, PayloadStatus};
use crate::layout::PackageLayout;
use crate::StoreError;
use serde::Serialize;
use statepack_schema::{safe_child, PackageManifest};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Serialize)]
pub struct PlannedWrite {
    pub path: String,
    pub source: PathBuf,
    pub destination: PathBuf,
    pub payload_present: bool,
    pub destination_exists: bool,
}

#[derive(Debug)]
pub struct ImportPlan {
    pub package_root: PathBuf,
    pub target_root: PathBuf,
    pub manifest: PackageManifest,
    pub writes: Vec<PlannedWrite>,
    pub missing_payload: Vec<String>,
    pub integrity_errors: Vec<IntegrityIssue>,
}

impl ImportPlan {
    /// Paths whose destination already exists, unless overwriting is allowed.
    pub fn conflicts(&self, allow_overwrite: bool) -> Vec<String> {
        if allow_overwrite {
            return Vec::new();
        }
        self.writes
            .iter()
            .filter(|w| w.destination_exists)
            .map(|w| w.path.clone())
            .collect()
    }

    fn issues(&self, allow_overwrite: bool) -> ImportIssues {
        ImportIssues {
            conflicts: self.conflicts(allow_overwrite),
            missing_payload: self.missing_payload.clone(),
            integrity_errors: self.integrity_errors.iter().map(ToString::to_string).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ImportOptions {
    pub dry_run: bool,
    pub allow_overwrite: bool,
}

/// Everything that stands between a plan and a real import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportIssues {
    pub conflicts: Vec<String>,
    pub missing_payload: Vec<String>,
    pub integrity_errors: Vec<String>,
}

impl ImportIssues {
    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty() && self.missing_payload.is_empty() && self.integrity_errors.is_empty()
    }
}

impl fmt::Display for ImportIssues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "import blocked: {} conflict(s), {} missing payload(s), {} integrity error(s)",
            self.conflicts.len(),
            self.missing_payload.len(),
            self.integrity_errors.len()
        )
    }
}

#[derive(Debug)]
pub struct ImportReport {
    pub dry_run: bool,
    pub planned: Vec<PlannedWrite>,
    pub written: usize,
    /// Issues seen during a dry run. Always empty after a real import.
    pub warnings: ImportIssues,
}

/// Inspect a package against a target tree without writing anything.
pub fn plan_import(package_root: &Path, target_root: &Path) -> Result<ImportPlan, StoreError> {
    let layout = PackageLayout::new(package_root);
    let manifest = load_package_manifest(&layout)?;
    let payload_dir = layout.payload_dir();

    let mut writes = Vec::with_capacity(manifest.entries.len());
    let mut missing_payload = Vec::new();
    let mut integrity_errors = Vec::new();

    for entry in &manifest.entries {
        let source = safe_child(&payload_dir, &entry.path, "migration payload entry")?;
        let destination = safe_child(target_root, &entry.path, "migration import target entry")?;
        let destination_exists = fs::symlink_metadata(&destination).is_ok();

        let payload_present = match check_payload_entry(&source, entry)? {
            PayloadStatus::Missing => {
                missing_payload.push(entry.path.clone());
                false
            }
            PayloadStatus::Present(issues) => {
                integrity_errors.extend(issues);
                true
            }
        };

        writes.push(PlannedWrite {
            path: entry.path.clone(),
            source,
            destination,
            payload_present,
            destination_exists,
        });
    }

    debug!(
        "planned {} write(s) from {} into {}",
        writes.len(),
        package_root.display(),
        target_root.display()
    );

    Ok(ImportPlan {
        package_root: package_root.to_path_buf(),
        target_root: target_root.to_path_buf(),
        manifest,
        writes,
        missing_payload,
        integrity_errors,
    })
}

/// Carry out a plan.
///
/// A dry run reports what would happen and never fails. A real run refuses
/// preview packages outright, then refuses if any conflict, missing payload
/// or integrity error exists, and only then writes.
pub fn apply_import(plan: &ImportPlan, options: ImportOptions) -> Result<ImportReport, StoreError> {
    let issues = plan.issues(options.allow_overwrite);

    if options.dry_run {
        if !issues.is_empty() {
            warn!("dry run: {issues}");
        }
        return Ok(ImportReport {
            dry_run: true,
            planned: plan.writes.clone(),
            written: 0,
            warnings: issues,
        });
    }

    if plan.manifest.dry_run_preview {
        return Err(StoreError::PreviewPackage(plan.package_root.clone()));
    }
    if !issues.is_empty() {
        return Err(StoreError::ImportBlocked(issues));
    }

    for write in &plan.writes {
        write_atomic(&write.source, &write.destination)?;
    }

    info!(
        "imported {} file(s) into {}",
        plan.writes.len(),
        plan.target_root.display()
    );

    Ok(ImportReport {
        dry_run: false,
        planned: plan.writes.clone(),
        written: plan.writes.len(),
        warnings: ImportIssues::default(),
    })
}

/// Copy `src` over `dst` through a temp file in `dst`'s directory.
fn write_atomic(src: &Path, dst: &Path) -> Result<(), StoreError> {
    let parent = dst.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;

    let mut input = fs::File::open(src)?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    io::copy(&mut input, tmp.as_file_mut())?;
    tmp.as_file().sync_all()?;
    fs::set_permissions(tmp.path(), input.metadata()?.permissions())?;
    tmp.persist(dst).map_err(|e| e.error)?;
    Ok(())
}
