//! File collection, package export, import, and integrity verification for statepack.
//!
//! This crate provides the package layer: the deterministic `collect_files`
//! selector driven by a migration manifest, SHA-256 file digests, the on-disk
//! `PackageLayout`, `export_package` for writing packages, the two-phase
//! `plan_import`/`apply_import` gate for applying them onto a target tree, and
//! `verify_package` for checking a package against its own manifest.

pub mod collect;
pub mod digest;
pub mod export;
pub mod import;
pub mod integrity;
pub mod layout;
pub mod revision;

pub use collect::{collect_files, CollectedFile};
pub use digest::{digest_file, FileDigest};
pub use export::{export_package, ExportOptions, ExportReport};
pub use import::{
    apply_import, plan_import, ImportIssues, ImportOptions, ImportPlan, ImportReport, PlannedWrite,
};
pub use integrity::{verify_package, IntegrityIssue, PackageReport, PayloadStatus};
pub use layout::{PackageLayout, PACKAGE_MANIFEST_FILE, PAYLOAD_DIR};
pub use revision::{RevisionSource, StaticRevision};

use statepack_schema::{SchemaError, UnsafePath};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("package I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    UnsafePath(#[from] UnsafePath),
    #[error("invalid glob pattern: {0}")]
    InvalidGlob(#[from] globset::Error),
    #[error("required manifest file missing: {0}")]
    MissingRequiredFile(String),
    #[error("output directory already exists and is not empty: {}", .0.display())]
    DestinationNotEmpty(PathBuf),
    #[error(
        "cannot execute non-dry-run import from dry-run preview package {}; re-export without --dry-run to include payload files",
        .0.display()
    )]
    PreviewPackage(PathBuf),
    #[error("{0}")]
    ImportBlocked(ImportIssues),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_display_missing_required_file() {
        let e = StoreError::MissingRequiredFile("config/a.json".to_owned());
        assert_eq!(
            e.to_string(),
            "required manifest file missing: config/a.json"
        );
    }

    #[test]
    fn store_error_display_destination_not_empty() {
        let e = StoreError::DestinationNotEmpty(PathBuf::from("/tmp/out"));
        assert!(e.to_string().contains("/tmp/out"));
    }

    #[test]
    fn store_error_display_preview_package() {
        let e = StoreError::PreviewPackage(PathBuf::from("/tmp/pkg"));
        let msg = e.to_string();
        assert!(msg.contains("dry-run preview"));
        assert!(msg.contains("/tmp/pkg"));
    }

    #[test]
    fn store_error_display_schema_prefix() {
        let e = StoreError::Schema(SchemaError::NotAnObject(PathBuf::from("x.json")));
        assert!(e.to_string().starts_with("schema error:"));
    }

    #[test]
    fn store_error_unsafe_path_is_transparent() {
        let inner = statepack_schema::safe_relative("../x").unwrap_err();
        let e = StoreError::from(inner.clone());
        assert_eq!(e.to_string(), inner.to_string());
    }
}
