use super::{json_pretty, print_issues, store_error, EXIT_PACKAGE_ERROR, EXIT_SUCCESS};
use statepack_store::verify_package;
use std::path::Path;

pub fn run(package: &Path, dry_run: bool, json: bool) -> Result<u8, String> {
    let report = verify_package(package).map_err(store_error)?;

    let mut issues: Vec<String> = report.integrity_errors.iter().map(ToString::to_string).collect();
    if !report.manifest.dry_run_preview {
        issues.extend(
            report
                .missing_payload
                .iter()
                .map(|p| format!("{p}: payload missing")),
        );
    }

    if json {
        let payload = serde_json::json!({
            "package_name": report.manifest.package_name,
            "dry_run_preview": report.manifest.dry_run_preview,
            "checked": report.checked,
            "passed": report.passed,
            "missing_payload": report.missing_payload,
            "issues": issues,
            "clean": report.is_clean(),
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!(
            "package '{}': {}/{} entries passed",
            report.manifest.package_name, report.passed, report.checked
        );
        if report.manifest.dry_run_preview {
            println!("dry-run preview package: payload is not included");
        }
    }

    if report.is_clean() {
        return Ok(EXIT_SUCCESS);
    }
    if dry_run {
        if !json {
            print_issues("package check warnings:", &issues);
        }
        return Ok(EXIT_SUCCESS);
    }
    if !json {
        print_issues("package check failed:", &issues);
    }
    Ok(EXIT_PACKAGE_ERROR)
}
