use crate::contracts::sorted_subdirs;
use crate::CoreError;
use serde::Serialize;
use statepack_schema::{load_document, parse_extension_manifest, safe_child};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// Where a namespaced command key points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandRegistration {
    pub extension: String,
    pub path: String,
}

#[derive(Debug, Default, Serialize)]
pub struct ExtensionReport {
    /// Extension names in directory order.
    pub names: Vec<String>,
    pub command_registry: BTreeMap<String, CommandRegistration>,
    pub issues: Vec<String>,
}

impl ExtensionReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Inspect every extension under `extensions_dir`.
///
/// Entrypoint and command paths are relative to `repo_root`. Problems are
/// accumulated as issues; only an unreadable directory is an error.
pub fn inspect_extensions(
    repo_root: &Path,
    extensions_dir: &Path,
) -> Result<ExtensionReport, CoreError> {
    let mut report = ExtensionReport::default();
    if !extensions_dir.is_dir() {
        report.issues.push(format!(
            "extensions directory missing: {}",
            extensions_dir.display()
        ));
        return Ok(report);
    }

    let mut seen_names = HashSet::new();
    for dir in sorted_subdirs(extensions_dir)? {
        let dir_name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let manifest_path = dir.join("manifest.json");
        if !manifest_path.exists() {
            report.issues.push(format!("{dir_name}: missing manifest.json"));
            continue;
        }

        let manifest = match load_document(&manifest_path).and_then(|doc| {
            parse_extension_manifest(&doc, &manifest_path.display().to_string())
        }) {
            Ok(manifest) => manifest,
            Err(e) => {
                report.issues.push(e.to_string());
                continue;
            }
        };

        let name = manifest.name.clone();
        if !seen_names.insert(name.clone()) {
            report
                .issues
                .push(format!("{dir_name}: duplicate extension name `{name}`"));
        }

        for (key, rel) in &manifest.entrypoints {
            check_file(
                repo_root,
                rel,
                &format!("extension `{name}` entrypoint `{key}`"),
                &format!("{name}: entrypoint path missing `{rel}`"),
                &mut report.issues,
            );
        }

        for (key, rel) in &manifest.commands {
            check_file(
                repo_root,
                rel,
                &format!("extension `{name}` command `{key}`"),
                &format!("{name}: command path missing `{rel}`"),
                &mut report.issues,
            );
            let key = key.trim().to_owned();
            if let Some(existing) = report.command_registry.get(&key) {
                report.issues.push(format!(
                    "{name}: command `{key}` already registered by `{}`",
                    existing.extension
                ));
                continue;
            }
            report.command_registry.insert(
                key,
                CommandRegistration {
                    extension: name.clone(),
                    path: rel.clone(),
                },
            );
        }

        report.names.push(name);
    }

    Ok(report)
}

fn check_file(root: &Path, rel: &str, context: &str, missing: &str, issues: &mut Vec<String>) {
    match safe_child(root, rel, context) {
        Ok(candidate) if candidate.is_file() => {}
        Ok(_) => issues.push(missing.to_owned()),
        Err(e) => issues.push(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::fs;

    fn write_extension(repo: &Path, dir: &str, manifest: &Value) {
        let path = repo.join("extensions").join(dir).join("manifest.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, serde_json::to_string_pretty(manifest).unwrap()).unwrap();
    }

    fn touch(repo: &Path, rel: &str) {
        let path = repo.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"#!/bin/sh\n").unwrap();
    }

    fn extension(name: &str, slug: &str) -> Value {
        json!({
            "name": name,
            "version": "1.0.0",
            "capabilities": ["cli"],
            "entrypoints": {"main": format!("extensions/{slug}/main.sh")},
            "commands": {format!("{slug}/run"): format!("extensions/{slug}/run.sh")},
            "command_contract": {"version": 1, "namespace": slug},
        })
    }

    #[test]
    fn clean_extensions_register_commands() {
        let dir = tempfile::tempdir().unwrap();
        let repo = dir.path();
        for (name, slug) in [("Alpha Tools", "alpha-tools"), ("Beta", "beta")] {
            write_extension(repo, slug, &extension(name, slug));
            touch(repo, &format!("extensions/{slug}/main.sh"));
            touch(repo, &format!("extensions/{slug}/run.sh"));
        }

        let report = inspect_extensions(repo, &repo.join("extensions")).unwrap();
        assert!(report.is_clean(), "{:?}", report.issues);
        assert_eq!(report.names, vec!["Alpha Tools", "Beta"]);
        assert_eq!(report.command_registry.len(), 2);
        assert_eq!(report.command_registry["beta/run"].extension, "Beta");
    }

    #[test]
    fn missing_directory_is_single_issue() {
        let dir = tempfile::tempdir().unwrap();
        let report = inspect_extensions(dir.path(), &dir.path().join("extensions")).unwrap();
        assert_eq!(report.issues.len(), 1);
        assert!(report.issues[0].starts_with("extensions directory missing"));
    }

    #[test]
    fn issues_are_accumulated() {
        let dir = tempfile::tempdir().unwrap();
        let repo = dir.path();
        fs::create_dir_all(repo.join("extensions/empty")).unwrap();
        write_extension(repo, "first", &extension("Beta", "beta"));
        write_extension(repo, "second", &extension("Beta", "beta"));
        write_extension(repo, "third", &json!({"name": "Broken"}));

        let report = inspect_extensions(repo, &repo.join("extensions")).unwrap();
        let issues = report.issues.join("\n");
        assert!(issues.contains("empty: missing manifest.json"));
        assert!(issues.contains("second: duplicate extension name `Beta`"));
        assert!(issues.contains("Beta: entrypoint path missing `extensions/beta/main.sh`"));
        assert!(issues.contains("Beta: command path missing `extensions/beta/run.sh`"));
        assert!(issues.contains("command `beta/run` already registered by `Beta`"));
        assert!(issues.contains("third"), "{issues}");
        assert_eq!(report.names, vec!["Beta", "Beta"]);
    }
}
