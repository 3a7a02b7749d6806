use super::{issues_exit, json_pretty, open_workspace, print_issues, EXIT_SUCCESS};
use statepack_core::PathOverrides;
use std::path::Path;

fn file_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

pub fn run(repo: &Path, overrides: PathOverrides, strict: bool, json: bool) -> Result<u8, String> {
    let ws = open_workspace(repo, overrides)?;
    let report = ws.check_contracts().map_err(|e| e.to_string())?;
    let paths = ws.paths();

    if json {
        let payload = serde_json::json!({
            "policy": paths.policy,
            "manifest": paths.manifest,
            "contract_policy": paths.contract_policy,
            "extensions": report.extensions,
            "extension_commands": report.commands,
            "issues": report.issues,
        });
        println!("{}", json_pretty(&payload)?);
    } else if report.is_clean() {
        println!(
            "contract check OK (policy={}, manifest={}, contract_policy={}, extensions={}, extension_commands={})",
            file_name(&paths.policy),
            file_name(&paths.manifest),
            file_name(&paths.contract_policy),
            report.extensions.len(),
            report.commands
        );
    } else {
        print_issues("contract check: issues found", &report.issues);
    }

    if report.is_clean() {
        Ok(EXIT_SUCCESS)
    } else {
        Ok(issues_exit(strict))
    }
}
