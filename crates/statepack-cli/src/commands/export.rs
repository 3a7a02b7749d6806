use super::{json_pretty, open_workspace, spin_fail, spin_ok, spinner, EXIT_SUCCESS};
use statepack_core::PathOverrides;
use statepack_store::ExportOptions;
use std::path::Path;

pub fn run(
    repo: &Path,
    out: &Path,
    overrides: PathOverrides,
    dry_run: bool,
    force: bool,
    json: bool,
) -> Result<u8, String> {
    let ws = open_workspace(repo, overrides)?;

    let pb = if json {
        None
    } else {
        Some(spinner("exporting package..."))
    };
    let report = match ws.export(out, ExportOptions { dry_run, force }) {
        Ok(r) => {
            if let Some(ref pb) = pb {
                spin_ok(pb, "package exported");
            }
            r
        }
        Err(e) => {
            if let Some(ref pb) = pb {
                spin_fail(pb, "export failed");
            }
            return Err(e.to_string());
        }
    };

    let summary = report.summary_by_top_level();
    if json {
        let payload = serde_json::json!({
            "package_root": report.package_root,
            "package_name": report.manifest.package_name,
            "source_commit": report.manifest.source_commit,
            "dry_run_preview": report.manifest.dry_run_preview,
            "entry_count": report.manifest.entry_count,
            "copied": report.copied,
            "by_top_level": summary,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!(
            "package manifest written: {}",
            report.package_root.join("package_manifest.json").display()
        );
        if dry_run {
            println!("dry-run preview: payload files were not copied");
        } else {
            println!("payload files copied: {}", report.copied);
        }
        let counts: Vec<String> = summary.iter().map(|(k, v)| format!("{k}={v}")).collect();
        println!(
            "included files ({}): {}",
            report.manifest.entry_count,
            counts.join(", ")
        );
        println!("repo root: {}", ws.root().display());
        println!("manifest: {}", ws.paths().manifest.display());
    }
    Ok(EXIT_SUCCESS)
}
