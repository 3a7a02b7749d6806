use super::{issues_exit, json_pretty, open_workspace, print_issues, EXIT_SUCCESS};
use statepack_core::PathOverrides;
use std::path::Path;

pub fn run(repo: &Path, overrides: PathOverrides, strict: bool, json: bool) -> Result<u8, String> {
    let ws = open_workspace(repo, overrides)?;
    let report = ws.inspect_extensions().map_err(|e| e.to_string())?;

    if json {
        let payload = serde_json::json!({
            "extensions": report.names,
            "commands": report.command_registry,
            "issues": report.issues,
        });
        println!("{}", json_pretty(&payload)?);
    } else if report.is_clean() {
        println!(
            "extension contract check OK ({} extension(s)): {}",
            report.names.len(),
            report.names.join(", ")
        );
    } else {
        print_issues("extension contract issues found:", &report.issues);
    }

    if report.is_clean() {
        Ok(EXIT_SUCCESS)
    } else {
        Ok(issues_exit(strict))
    }
}
