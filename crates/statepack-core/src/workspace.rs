use crate::check::{check_contracts, ContractCheckReport};
use crate::config::{load_config, resolve_against, ResolvedPaths};
use crate::contracts::{ensure_supported_target, migrate_extensions, MigrationReport};
use crate::extensions::{inspect_extensions, ExtensionReport};
use crate::revision::{resolve_repo_root, GitRevision};
use crate::CoreError;
use statepack_schema::{load_document, parse_contract_policy, parse_migration_manifest, MigrationManifest};
use statepack_store::{export_package, ExportOptions, ExportReport};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Command-line replacements for configured paths. Relative paths resolve
/// against the repository root.
#[derive(Debug, Clone, Default)]
pub struct PathOverrides {
    pub manifest: Option<PathBuf>,
    pub policy: Option<PathBuf>,
    pub contract_policy: Option<PathBuf>,
    pub extensions_dir: Option<PathBuf>,
}

/// A repository root together with its resolved statepack paths.
pub struct Workspace {
    root: PathBuf,
    paths: ResolvedPaths,
}

impl Workspace {
    /// Locate the repository containing `path` and load its configuration.
    pub fn open(path: &Path) -> Result<Self, CoreError> {
        let root = resolve_repo_root(path);
        let paths = load_config(&root)?.resolve(&root);
        debug!("workspace root: {}", root.display());
        Ok(Self { root, paths })
    }

    #[must_use]
    pub fn with_overrides(mut self, overrides: PathOverrides) -> Self {
        let root = self.root.clone();
        let apply = |slot: &mut PathBuf, value: Option<PathBuf>| {
            if let Some(value) = value {
                *slot = resolve_against(&root, &value);
            }
        };
        apply(&mut self.paths.manifest, overrides.manifest);
        apply(&mut self.paths.policy, overrides.policy);
        apply(&mut self.paths.contract_policy, overrides.contract_policy);
        apply(&mut self.paths.extensions_dir, overrides.extensions_dir);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn paths(&self) -> &ResolvedPaths {
        &self.paths
    }

    pub fn load_migration_manifest(&self) -> Result<MigrationManifest, CoreError> {
        let path = &self.paths.manifest;
        let document = load_document(path)?;
        Ok(parse_migration_manifest(&document, &path.display().to_string())?)
    }

    /// Export the configured migration manifest's selection to `destination`.
    pub fn export(
        &self,
        destination: &Path,
        options: ExportOptions,
    ) -> Result<ExportReport, CoreError> {
        let manifest = self.load_migration_manifest()?;
        Ok(export_package(
            &self.root,
            &manifest,
            destination,
            options,
            &GitRevision,
        )?)
    }

    /// Check the contract policy target, then migrate every extension.
    pub fn migrate(&self, write: bool) -> Result<MigrationReport, CoreError> {
        let path = &self.paths.contract_policy;
        let policy = parse_contract_policy(&load_document(path)?, &path.display().to_string())?;
        ensure_supported_target(&policy)?;
        migrate_extensions(&self.paths.extensions_dir, write)
    }

    pub fn inspect_extensions(&self) -> Result<ExtensionReport, CoreError> {
        inspect_extensions(&self.root, &self.paths.extensions_dir)
    }

    pub fn check_contracts(&self) -> Result<ContractCheckReport, CoreError> {
        check_contracts(&self.root, &self.paths)
    }
}
