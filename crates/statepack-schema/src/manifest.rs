use crate::types::{Namespace, Sha256Digest};
use crate::validate::{
    validate_contract_policy, validate_extension_manifest, validate_migration_manifest,
    validate_package_manifest,
};
use crate::SchemaError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Current package layout version written by the exporter.
pub const PACKAGE_VERSION: u32 = 1;
/// The only extension command contract version this tooling understands.
pub const COMMAND_CONTRACT_VERSION: u32 = 1;

/// Rules describing which repository files a package must contain.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct MigrationManifest {
    pub version: u32,
    pub package_name: String,
    pub required_files: Vec<String>,
    pub optional_globs: Vec<String>,
    pub exclude_globs: Vec<String>,
}

/// `package_manifest.json` at the root of an exported package.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct PackageManifest {
    pub package_version: u32,
    pub manifest_version: u32,
    pub package_name: String,
    pub created_at: String,
    pub source_repo: String,
    pub source_commit: String,
    pub dry_run_preview: bool,
    pub entry_count: usize,
    pub entries: Vec<PackageEntry>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct PackageEntry {
    pub path: String,
    pub sha256: Sha256Digest,
    pub size_bytes: u64,
}

/// Typed view of an extension `manifest.json`.
///
/// Mappings are sorted here; the contract migrator works on the raw document
/// when declaration order matters.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ExtensionManifest {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
    pub capabilities: Vec<String>,
    pub entrypoints: BTreeMap<String, String>,
    #[serde(default)]
    pub commands: BTreeMap<String, String>,
    #[serde(default)]
    pub command_contract: Option<CommandContract>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct CommandContract {
    pub version: u32,
    pub namespace: Namespace,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ContractPolicy {
    pub version: u32,
    pub targets: ContractTargets,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ContractTargets {
    #[serde(default)]
    pub extension_command_contract: Option<CommandContractTarget>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct CommandContractTarget {
    pub current_version: u32,
    #[serde(default)]
    pub migration_script: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ContractPolicy {
    /// Target version for extension command contracts, defaulting to 1.
    pub fn command_contract_version(&self) -> u32 {
        self.targets
            .extension_command_contract
            .as_ref()
            .map_or(COMMAND_CONTRACT_VERSION, |t| t.current_version)
    }
}

fn typed<T: DeserializeOwned>(document: &Value, context: &str) -> Result<T, SchemaError> {
    T::deserialize(document).map_err(|e| SchemaError::Violation {
        field: context.to_owned(),
        expected: format!("does not match its contract: {e}"),
    })
}

pub fn parse_migration_manifest(
    document: &Value,
    context: &str,
) -> Result<MigrationManifest, SchemaError> {
    validate_migration_manifest(document, context)?;
    let mut manifest: MigrationManifest = typed(document, context)?;
    manifest.package_name = manifest.package_name.trim().to_owned();
    for list in [
        &mut manifest.required_files,
        &mut manifest.optional_globs,
        &mut manifest.exclude_globs,
    ] {
        for item in list.iter_mut() {
            *item = item.trim().to_owned();
        }
    }
    Ok(manifest)
}

pub fn parse_package_manifest(
    document: &Value,
    context: &str,
) -> Result<PackageManifest, SchemaError> {
    validate_package_manifest(document, context)?;
    typed(document, context)
}

pub fn parse_extension_manifest(
    document: &Value,
    context: &str,
) -> Result<ExtensionManifest, SchemaError> {
    validate_extension_manifest(document, context)?;
    let mut manifest: ExtensionManifest = typed(document, context)?;
    manifest.name = manifest.name.trim().to_owned();
    Ok(manifest)
}

pub fn parse_contract_policy(
    document: &Value,
    context: &str,
) -> Result<ContractPolicy, SchemaError> {
    validate_contract_policy(document, context)?;
    typed(document, context)
}
