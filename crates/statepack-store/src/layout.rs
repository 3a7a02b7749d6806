use crate::StoreError;
use statepack_schema::safe_child;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const PACKAGE_MANIFEST_FILE: &str = "package_manifest.json";
pub const PAYLOAD_DIR: &str = "payload";

/// Directory layout of an exported package.
///
/// ```text
/// <root>/package_manifest.json
/// <root>/payload/<relative paths>
/// ```
#[derive(Debug, Clone)]
pub struct PackageLayout {
    root: PathBuf,
}

impl PackageLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[inline]
    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(PACKAGE_MANIFEST_FILE)
    }

    #[inline]
    pub fn payload_dir(&self) -> PathBuf {
        self.root.join(PAYLOAD_DIR)
    }

    /// Guarded location of a package entry inside `payload/`.
    pub fn payload_path(&self, rel: &str) -> Result<PathBuf, StoreError> {
        Ok(safe_child(&self.payload_dir(), rel, "package payload entry")?)
    }

    /// Whether the package root exists and has at least one entry.
    pub fn is_occupied(&self) -> Result<bool, StoreError> {
        if !self.root.exists() {
            return Ok(false);
        }
        Ok(fs::read_dir(&self.root)?.next().is_some())
    }

    /// Make the package root ready for a fresh export.
    ///
    /// An occupied root is an error unless `force` is set, in which case it is
    /// removed and recreated.
    pub fn prepare(&self, force: bool) -> Result<(), StoreError> {
        if self.is_occupied()? {
            if !force {
                return Err(StoreError::DestinationNotEmpty(self.root.clone()));
            }
            info!("removing existing package at {}", self.root.display());
            fs::remove_dir_all(&self.root)?;
        }
        fs::create_dir_all(&self.root)?;
        Ok(())
    }
}
