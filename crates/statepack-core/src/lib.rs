//! Repository-level orchestration for statepack.
//!
//! This crate ties the schema and store layers to a concrete repository: it
//! resolves the repository root and current revision through git, loads the
//! optional `statepack.toml` path configuration, migrates extension manifests
//! to the namespaced command contract, inspects installed extensions, and runs
//! the combined contract check. [`Workspace`] is the entry point the CLI uses.

pub mod check;
pub mod config;
pub mod contracts;
pub mod extensions;
pub mod revision;
pub mod workspace;

pub use check::{check_contracts, ContractCheckReport};
pub use config::{load_config, parse_config_str, PathsSection, ResolvedPaths, StatepackConfig};
pub use contracts::{
    ensure_supported_target, migrate_extension_manifest, migrate_extensions, stable_command_key,
    MigrationFailure, MigrationReport,
};
pub use extensions::{inspect_extensions, CommandRegistration, ExtensionReport};
pub use revision::{resolve_repo_root, GitRevision};
pub use workspace::{PathOverrides, Workspace};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("schema error: {0}")]
    Schema(#[from] statepack_schema::SchemaError),
    #[error("package error: {0}")]
    Store(#[from] statepack_store::StoreError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config {}: {source}", path.display())]
    Config {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("cannot derive command namespace from extension name '{0}'")]
    NamespaceDerivation(String),
    #[error("unsupported target version {0} for extension command contract migration")]
    UnsupportedContractVersion(u32),
    #[error("extensions directory missing: {}", .0.display())]
    ExtensionsDirMissing(PathBuf),
}
