use crate::collect::collect_files;
use crate::digest::digest_file;
use crate::layout::PackageLayout;
use crate::revision::RevisionSource;
use crate::StoreError;
use statepack_schema::{
    write_document, MigrationManifest, PackageEntry, PackageManifest, PACKAGE_VERSION,
};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default)]
pub struct ExportOptions {
    /// Write only the manifest, flagged as a preview.
    pub dry_run: bool,
    /// Replace a non-empty destination.
    pub force: bool,
}

#[derive(Debug)]
pub struct ExportReport {
    pub manifest: PackageManifest,
    pub package_root: PathBuf,
    /// Number of payload files written (zero for a preview).
    pub copied: usize,
}

impl ExportReport {
    /// Entry counts keyed by first path segment.
    pub fn summary_by_top_level(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for entry in &self.manifest.entries {
            let top = entry.path.split('/').next().unwrap_or_default();
            *counts.entry(top.to_owned()).or_insert(0) += 1;
        }
        counts
    }
}

/// Build a package at `destination` from the files `manifest` selects under
/// `repo_root`.
///
/// The package manifest is written before any payload file, so an interrupted
/// export still leaves a readable (if incomplete) package behind.
pub fn export_package(
    repo_root: &Path,
    manifest: &MigrationManifest,
    destination: &Path,
    options: ExportOptions,
    revision: &dyn RevisionSource,
) -> Result<ExportReport, StoreError> {
    let files = collect_files(
        repo_root,
        &manifest.required_files,
        &manifest.optional_globs,
        &manifest.exclude_globs,
    )?;

    let mut entries = Vec::with_capacity(files.len());
    for file in &files {
        let digest = digest_file(&file.abs_path)?;
        entries.push(PackageEntry {
            path: file.rel_path.clone(),
            sha256: digest.sha256,
            size_bytes: digest.size_bytes,
        });
    }

    let package = PackageManifest {
        package_version: PACKAGE_VERSION,
        manifest_version: manifest.version,
        package_name: manifest.package_name.clone(),
        created_at: chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        source_repo: repo_root.display().to_string(),
        source_commit: revision.current_revision(repo_root).unwrap_or_default(),
        dry_run_preview: options.dry_run,
        entry_count: entries.len(),
        entries,
    };

    let layout = PackageLayout::new(destination);
    layout.prepare(options.force)?;
    write_document(&layout.manifest_path(), &package)?;

    let mut copied = 0;
    if !options.dry_run {
        for file in &files {
            let dst = layout.payload_path(&file.rel_path)?;
            copy_preserving_mtime(&file.abs_path, &dst)?;
            copied += 1;
        }
    }

    info!(
        "exported {} entries to {} (preview: {})",
        package.entry_count,
        destination.display(),
        options.dry_run
    );

    Ok(ExportReport {
        manifest: package,
        package_root: destination.to_path_buf(),
        copied,
    })
}

/// Copy contents and carry the source mtime over when the platform allows it.
/// Source permissions are applied last.
fn copy_preserving_mtime(src: &Path, dst: &Path) -> Result<(), StoreError> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }
    let metadata = fs::metadata(src)?;
    let mut reader = File::open(src)?;
    let mut writer = File::create(dst)?;
    io::copy(&mut reader, &mut writer)?;

    if let Err(e) = metadata.modified().and_then(|mtime| writer.set_modified(mtime)) {
        debug!("could not preserve mtime for {}: {e}", dst.display());
    }
    drop(writer);
    fs::set_permissions(dst, metadata.permissions())?;
    Ok(())
}
