use crate::digest::digest_file;
use crate::layout::PackageLayout;
use crate::StoreError;
use statepack_schema::{load_document, parse_package_manifest, PackageEntry, PackageManifest};
use std::fmt;
use std::path::Path;

/// A payload file that disagrees with its manifest entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityIssue {
    SizeMismatch {
        path: String,
        expected: u64,
        actual: u64,
    },
    ChecksumMismatch {
        path: String,
        expected: String,
        actual: String,
    },
}

impl IntegrityIssue {
    pub fn path(&self) -> &str {
        match self {
            Self::SizeMismatch { path, .. } | Self::ChecksumMismatch { path, .. } => path,
        }
    }
}

impl fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SizeMismatch {
                path,
                expected,
                actual,
            } => write!(f, "{path}: size mismatch (expected {expected}, got {actual})"),
            Self::ChecksumMismatch { path, .. } => write!(f, "{path}: checksum mismatch"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadStatus {
    Missing,
    Present(Vec<IntegrityIssue>),
}

/// Compare one payload file against the size and digest its entry records.
pub fn check_payload_entry(source: &Path, entry: &PackageEntry) -> Result<PayloadStatus, StoreError> {
    if !source.is_file() {
        return Ok(PayloadStatus::Missing);
    }

    let actual = digest_file(source)?;
    let mut issues = Vec::new();
    if actual.size_bytes != entry.size_bytes {
        issues.push(IntegrityIssue::SizeMismatch {
            path: entry.path.clone(),
            expected: entry.size_bytes,
            actual: actual.size_bytes,
        });
    }
    if actual.sha256 != entry.sha256 {
        issues.push(IntegrityIssue::ChecksumMismatch {
            path: entry.path.clone(),
            expected: entry.sha256.to_string(),
            actual: actual.sha256.into_inner(),
        });
    }
    Ok(PayloadStatus::Present(issues))
}

/// Load and validate `package_manifest.json` from a package root.
pub fn load_package_manifest(layout: &PackageLayout) -> Result<PackageManifest, StoreError> {
    let path = layout.manifest_path();
    let document = load_document(&path)?;
    Ok(parse_package_manifest(
        &document,
        &path.display().to_string(),
    )?)
}

#[derive(Debug)]
pub struct PackageReport {
    pub manifest: PackageManifest,
    pub checked: usize,
    pub passed: usize,
    pub missing_payload: Vec<String>,
    pub integrity_errors: Vec<IntegrityIssue>,
}

impl PackageReport {
    /// No integrity errors, and payload is complete unless the package is a
    /// declared preview.
    pub fn is_clean(&self) -> bool {
        self.integrity_errors.is_empty()
            && (self.manifest.dry_run_preview || self.missing_payload.is_empty())
    }
}

/// Check every entry of a package against its payload.
pub fn verify_package(package_root: &Path) -> Result<PackageReport, StoreError> {
    let layout = PackageLayout::new(package_root);
    let manifest = load_package_manifest(&layout)?;

    let mut report = PackageReport {
        checked: manifest.entries.len(),
        passed: 0,
        missing_payload: Vec::new(),
        integrity_errors: Vec::new(),
        manifest,
    };

    for entry in &report.manifest.entries {
        let source = layout.payload_path(&entry.path)?;
        match check_payload_entry(&source, entry)? {
            PayloadStatus::Missing => report.missing_payload.push(entry.path.clone()),
            PayloadStatus::Present(issues) if issues.is_empty() => report.passed += 1,
            PayloadStatus::Present(issues) => report.integrity_errors.extend(issues),
        }
    }

    Ok(report)
}
