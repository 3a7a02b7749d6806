use super::{json_pretty, open_workspace, print_issues, EXIT_MANIFEST_ERROR, EXIT_SUCCESS};
use statepack_core::PathOverrides;
use std::path::Path;

pub fn run(repo: &Path, overrides: PathOverrides, write: bool, json: bool) -> Result<u8, String> {
    let ws = open_workspace(repo, overrides)?;
    let report = ws.migrate(write).map_err(|e| e.to_string())?;

    let failures: Vec<String> = report
        .failures
        .iter()
        .map(|f| format!("{}: {}", f.manifest.display(), f.message))
        .collect();

    if json {
        let mode = if write { "write" } else { "dry_run" };
        let payload = serde_json::json!({
            "mode": mode,
            "extensions_dir": ws.paths().extensions_dir,
            "inspected": report.inspected,
            "changed": report.changed,
            "failures": failures,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        let mode = if write { "WRITE" } else { "DRY RUN" };
        println!("extension contract migrate ({mode})");
        println!("policy: {}", ws.paths().contract_policy.display());
        println!("extensions inspected: {}", report.inspected);
        println!(
            "extension manifests needing migration: {}",
            report.changed.len()
        );
        for path in &report.changed {
            println!("- {}", path.display());
        }
        if !write {
            println!("no files were modified; re-run with --write to apply migrations");
        }
        if !failures.is_empty() {
            print_issues("extension manifests that could not be migrated:", &failures);
        }
    }

    if failures.is_empty() {
        Ok(EXIT_SUCCESS)
    } else {
        Ok(EXIT_MANIFEST_ERROR)
    }
}
