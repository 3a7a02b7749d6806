//! Document contracts, path safety, and slugging for statepack.
//!
//! This crate defines the schema layer: JSON document loading and atomic
//! writing (`load_document`, `write_document`), structural contract checks for
//! every document statepack reads (`validate`), typed views over validated
//! documents (`MigrationManifest`, `PackageManifest`, `ExtensionManifest`,
//! `ContractPolicy`), the traversal guard used before any manifest-sourced
//! filesystem access (`safe_relative`, `safe_child`), and namespace slugging.

pub mod document;
pub mod manifest;
pub mod paths;
pub mod slug;
pub mod types;
pub mod validate;

pub use document::{load_document, write_document};
pub use manifest::{
    parse_contract_policy, parse_extension_manifest, parse_migration_manifest,
    parse_package_manifest, CommandContract, CommandContractTarget, ContractPolicy,
    ContractTargets, ExtensionManifest, MigrationManifest, PackageEntry, PackageManifest,
    COMMAND_CONTRACT_VERSION, PACKAGE_VERSION,
};
pub use paths::{ensure_contained, safe_child, safe_relative, to_posix, UnsafePath, UnsafeReason};
pub use slug::normalize_slug;
pub use types::{Namespace, Sha256Digest};
pub use validate::{
    validate, validate_contract_policy, validate_extension_manifest, validate_migration_manifest,
    validate_package_manifest, validate_sync_policy, Schema,
};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to read document {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse document {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("expected JSON object in {0}")]
    NotAnObject(PathBuf),
    #[error("failed to write document {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{field} {expected}")]
    Violation { field: String, expected: String },
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SchemaError {
    pub(crate) fn violation(field: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::Violation {
            field: field.into(),
            expected: expected.into(),
        }
    }

    /// Field path of a contract violation, if this is one.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Violation { field, .. } => Some(field),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn violation_display_names_field_and_constraint() {
        let e = SchemaError::violation("policy.scorecard.weights.simplicity", "must be >= 0");
        assert_eq!(
            e.to_string(),
            "policy.scorecard.weights.simplicity must be >= 0"
        );
        assert_eq!(e.field(), Some("policy.scorecard.weights.simplicity"));
    }

    #[test]
    fn not_an_object_display() {
        let e = SchemaError::NotAnObject(PathBuf::from("/tmp/x.json"));
        assert!(e.to_string().contains("/tmp/x.json"));
        assert!(e.field().is_none());
    }
}
