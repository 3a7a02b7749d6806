//! Migration of extension manifests to the namespaced command contract.
//!
//! Command keys become `<namespace>/<slug>`, where the namespace is the slug
//! of the extension name. [`migrate_extension_manifest`] is a pure transform;
//! [`migrate_extensions`] applies it across an extensions directory and only
//! writes when asked to.

use crate::CoreError;
use serde_json::{json, Map, Value};
use statepack_schema::{
    load_document, normalize_slug, validate_extension_manifest, write_document, ContractPolicy,
    Namespace, SchemaError, COMMAND_CONTRACT_VERSION,
};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const FALLBACK_COMMAND: &str = "command";

/// Reserve a unique `<namespace>/<slug>` key for `raw`.
///
/// An empty slug becomes `command`; a key already in `seen` gets `-2`, `-3`,
/// and so on appended until it is free.
pub fn stable_command_key(
    namespace: &Namespace,
    raw: &str,
    seen: &mut HashSet<String>,
) -> String {
    let mut suffix = normalize_slug(raw);
    if suffix.is_empty() {
        suffix = FALLBACK_COMMAND.to_owned();
    }

    let prefix = namespace.key_prefix();
    let mut counter = 1u32;
    loop {
        let key = if counter == 1 {
            format!("{prefix}{suffix}")
        } else {
            format!("{prefix}{suffix}-{counter}")
        };
        if seen.insert(key.clone()) {
            return key;
        }
        counter += 1;
    }
}

/// Bring one extension manifest onto the current command contract.
///
/// Returns the (possibly rewritten) document and whether anything changed.
/// Manifests without commands pass through untouched.
pub fn migrate_extension_manifest(mut document: Value) -> Result<(Value, bool), CoreError> {
    let Some(manifest) = document.as_object_mut() else {
        return Err(SchemaError::Violation {
            field: "extension manifest".to_owned(),
            expected: "must be an object".to_owned(),
        }
        .into());
    };

    let commands = match manifest.get("commands") {
        Some(Value::Object(commands)) if !commands.is_empty() => commands.clone(),
        _ => return Ok((document, false)),
    };

    let name = manifest
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim()
        .to_owned();
    let Some(namespace) = Namespace::derive(&name) else {
        return Err(CoreError::NamespaceDerivation(name));
    };

    let contract_valid = manifest
        .get("command_contract")
        .and_then(Value::as_object)
        .is_some_and(|contract| {
            contract.get("version").and_then(Value::as_u64)
                == Some(u64::from(COMMAND_CONTRACT_VERSION))
                && contract
                    .get("namespace")
                    .and_then(Value::as_str)
                    .is_some_and(|ns| ns.trim() == namespace.as_str())
        });

    let prefix = namespace.key_prefix();
    let mut seen = HashSet::new();
    let mut migrated = Map::with_capacity(commands.len());
    let mut changed = false;

    for (key, rel_path) in commands {
        if !rel_path.is_string() {
            return Err(SchemaError::Violation {
                field: format!("commands.{key}"),
                expected: "must map to a string path".to_owned(),
            }
            .into());
        }

        let trimmed = key.trim();
        let new_key = match trimmed.strip_prefix(&prefix) {
            Some(suffix) => stable_command_key(&namespace, suffix, &mut seen),
            None => stable_command_key(&namespace, trimmed, &mut seen),
        };
        if new_key != key {
            debug!("command '{key}' -> '{new_key}'");
            changed = true;
        }
        migrated.insert(new_key, rel_path);
    }

    if changed || !contract_valid {
        manifest.insert("commands".to_owned(), Value::Object(migrated));
        manifest.insert(
            "command_contract".to_owned(),
            json!({
                "version": COMMAND_CONTRACT_VERSION,
                "namespace": namespace,
            }),
        );
        changed = true;
    }

    validate_extension_manifest(&document, "migrated extension manifest")?;
    Ok((document, changed))
}

/// Refuse to migrate toward any command contract version other than 1.
pub fn ensure_supported_target(policy: &ContractPolicy) -> Result<(), CoreError> {
    match policy.command_contract_version() {
        COMMAND_CONTRACT_VERSION => Ok(()),
        other => Err(CoreError::UnsupportedContractVersion(other)),
    }
}

#[derive(Debug)]
pub struct MigrationFailure {
    pub manifest: PathBuf,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct MigrationReport {
    /// Manifests that were loaded and run through the migrator.
    pub inspected: usize,
    pub changed: Vec<PathBuf>,
    pub failures: Vec<MigrationFailure>,
    pub written: bool,
}

/// Migrate every `<extensions_dir>/<name>/manifest.json`, in directory-name
/// order. Per-manifest failures are collected rather than aborting the batch.
pub fn migrate_extensions(extensions_dir: &Path, write: bool) -> Result<MigrationReport, CoreError> {
    if !extensions_dir.is_dir() {
        return Err(CoreError::ExtensionsDirMissing(extensions_dir.to_path_buf()));
    }

    let mut report = MigrationReport {
        written: write,
        ..MigrationReport::default()
    };

    for dir in sorted_subdirs(extensions_dir)? {
        let manifest_path = dir.join("manifest.json");
        if !manifest_path.is_file() {
            continue;
        }
        report.inspected += 1;

        match migrate_one(&manifest_path, write) {
            Ok(true) => report.changed.push(manifest_path),
            Ok(false) => {}
            Err(e) => {
                warn!("{}: {e}", manifest_path.display());
                report.failures.push(MigrationFailure {
                    manifest: manifest_path,
                    message: e.to_string(),
                });
            }
        }
    }

    info!(
        "inspected {} extension manifest(s), {} need migration",
        report.inspected,
        report.changed.len()
    );
    Ok(report)
}

fn migrate_one(manifest_path: &Path, write: bool) -> Result<bool, CoreError> {
    let document = load_document(manifest_path)?;
    let (migrated, changed) = migrate_extension_manifest(document)?;
    if changed && write {
        write_document(manifest_path, &migrated)?;
    }
    Ok(changed)
}

pub(crate) fn sorted_subdirs(dir: &Path) -> Result<Vec<PathBuf>, CoreError> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}
