pub mod check;
pub mod completions;
pub mod contracts_check;
pub mod export;
pub mod extension_check;
pub mod import;
pub mod man_pages;
pub mod migrate;

use indicatif::{ProgressBar, ProgressStyle};
use statepack_core::{PathOverrides, Workspace};
use statepack_store::StoreError;
use std::path::Path;
use std::time::Duration;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_MANIFEST_ERROR: u8 = 2;
pub const EXIT_PACKAGE_ERROR: u8 = 3;

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .expect("valid template")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(msg.to_owned());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

pub fn spin_ok(pb: &ProgressBar, msg: &str) {
    pb.set_style(ProgressStyle::with_template("{msg}").expect("valid template"));
    pb.finish_with_message(format!("✓ {msg}"));
}

pub fn spin_fail(pb: &ProgressBar, msg: &str) {
    pb.set_style(ProgressStyle::with_template("{msg}").expect("valid template"));
    pb.finish_with_message(format!("✗ {msg}"));
}

/// Print a header and one `- ` bullet per issue to stderr.
pub fn print_issues(header: &str, issues: &[String]) {
    use console::Style;
    eprintln!("{}", Style::new().for_stderr().yellow().bold().apply_to(header));
    for issue in issues {
        eprintln!("- {issue}");
    }
}

pub fn open_workspace(repo: &Path, overrides: PathOverrides) -> Result<Workspace, String> {
    Workspace::open(repo)
        .map(|ws| ws.with_overrides(overrides))
        .map_err(|e| e.to_string())
}

#[allow(clippy::needless_pass_by_value)]
pub fn store_error(e: StoreError) -> String {
    format!("package error: {e}")
}

/// Exit status for a check that found issues.
pub fn issues_exit(strict: bool) -> u8 {
    if strict {
        EXIT_FAILURE
    } else {
        EXIT_SUCCESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_pretty_serializes_string() {
        let val = serde_json::json!({"key": "value"});
        let result = json_pretty(&val).unwrap();
        assert!(result.contains("\"key\""));
        assert!(result.contains("\"value\""));
    }

    #[test]
    fn exit_codes_are_distinct() {
        assert_ne!(EXIT_SUCCESS, EXIT_FAILURE);
        assert_ne!(EXIT_FAILURE, EXIT_MANIFEST_ERROR);
        assert_ne!(EXIT_MANIFEST_ERROR, EXIT_PACKAGE_ERROR);
    }

    #[test]
    fn store_errors_are_prefixed() {
        let msg = store_error(StoreError::MissingRequiredFile("a.txt".to_owned()));
        assert!(msg.starts_with("package error:"));
    }

    #[test]
    fn issues_exit_depends_on_strict() {
        assert_eq!(issues_exit(true), EXIT_FAILURE);
        assert_eq!(issues_exit(false), EXIT_SUCCESS);
    }

    #[test]
    fn spinner_creates_progress_bar() {
        let pb = spinner("testing...");
        spin_ok(&pb, "done");
    }

    #[test]
    fn spinner_fail_creates_progress_bar() {
        let pb = spinner("testing...");
        spin_fail(&pb, "failed");
    }
}
