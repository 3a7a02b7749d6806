use crate::config::ResolvedPaths;
use crate::extensions::inspect_extensions;
use crate::CoreError;
use serde::Serialize;
use statepack_schema::{load_document, validate, Schema};
use std::path::Path;

#[derive(Debug, Default, Serialize)]
pub struct ContractCheckReport {
    pub extensions: Vec<String>,
    pub commands: usize,
    pub issues: Vec<String>,
}

impl ContractCheckReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Validate the sync policy (strictly), the migration manifest and the
/// contract policy, then inspect extensions. Every issue is collected.
pub fn check_contracts(
    repo_root: &Path,
    paths: &ResolvedPaths,
) -> Result<ContractCheckReport, CoreError> {
    let mut report = ContractCheckReport::default();

    for (path, schema, strict) in [
        (&paths.policy, Schema::SyncPolicy, true),
        (&paths.manifest, Schema::MigrationManifest, false),
        (&paths.contract_policy, Schema::ContractPolicy, false),
    ] {
        let checked = load_document(path).and_then(|doc| {
            validate(&doc, schema, &path.display().to_string(), strict).map(|_| ())
        });
        if let Err(e) = checked {
            report.issues.push(e.to_string());
        }
    }

    let extensions = inspect_extensions(repo_root, &paths.extensions_dir)?;
    report.issues.extend(extensions.issues);
    report.commands = extensions.command_registry.len();
    report.extensions = extensions.names;
    Ok(report)
}
