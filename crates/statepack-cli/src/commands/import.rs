use super::{
    json_pretty, print_issues, store_error, EXIT_FAILURE, EXIT_PACKAGE_ERROR, EXIT_SUCCESS,
};
use statepack_store::{apply_import, plan_import, ImportIssues, ImportOptions, StoreError};
use std::path::Path;

pub fn run(
    package: &Path,
    target: &Path,
    dry_run: bool,
    allow_overwrite: bool,
    json: bool,
) -> Result<u8, String> {
    let plan = plan_import(package, target).map_err(store_error)?;
    let options = ImportOptions {
        dry_run,
        allow_overwrite,
    };

    let report = match apply_import(&plan, options) {
        Ok(report) => report,
        Err(StoreError::ImportBlocked(issues)) => return report_blocked(&issues, json),
        Err(e) => return Err(store_error(e)),
    };

    if json {
        let payload = serde_json::json!({
            "dry_run": report.dry_run,
            "target": plan.target_root,
            "planned": report.planned,
            "written": report.written,
            "warnings": report.warnings,
        });
        println!("{}", json_pretty(&payload)?);
        return Ok(EXIT_SUCCESS);
    }

    if report.dry_run {
        println!("DRY RUN import plan ({} files):", report.planned.len());
        for write in &report.planned {
            let note = if write.payload_present {
                ""
            } else {
                " (payload missing)"
            };
            println!(
                "- {} -> {}{note}",
                write.source.display(),
                write.destination.display()
            );
        }
        let warnings = &report.warnings;
        if !warnings.is_empty() {
            print_issues("dry-run warnings:", &flatten(warnings));
        }
    } else {
        println!(
            "imported {} files into {}",
            report.written,
            plan.target_root.display()
        );
    }
    Ok(EXIT_SUCCESS)
}

fn report_blocked(issues: &ImportIssues, json: bool) -> Result<u8, String> {
    if json {
        let payload = serde_json::json!({ "blocked": issues });
        println!("{}", json_pretty(&payload)?);
    } else {
        if !issues.conflicts.is_empty() {
            print_issues(
                "import blocked: existing files would be overwritten (use --allow-overwrite)",
                &issues.conflicts,
            );
        }
        if !issues.missing_payload.is_empty() {
            print_issues(
                "import blocked: package payload is incomplete",
                &issues.missing_payload,
            );
        }
        if !issues.integrity_errors.is_empty() {
            print_issues(
                "import blocked: payload integrity check failed",
                &issues.integrity_errors,
            );
        }
    }

    if issues.missing_payload.is_empty() && issues.integrity_errors.is_empty() {
        Ok(EXIT_FAILURE)
    } else {
        Ok(EXIT_PACKAGE_ERROR)
    }
}

fn flatten(issues: &ImportIssues) -> Vec<String> {
    let mut lines: Vec<String> = issues
        .conflicts
        .iter()
        .map(|p| format!("{p}: already exists in target"))
        .collect();
    lines.extend(
        issues
            .missing_payload
            .iter()
            .map(|p| format!("{p}: payload missing")),
    );
    lines.extend(issues.integrity_errors.iter().cloned());
    lines
}
