//! Structural contract checks for statepack documents.
//!
//! Each validator walks the declared fields of one document kind and fails on
//! the first violation with the dotted field path and the expected constraint,
//! e.g. `policy.scorecard.weights.simplicity must be >= 0`. Validators are
//! pure: on success the input is returned untouched.

use crate::paths::safe_relative;
use crate::types::{Namespace, Sha256Digest};
use crate::SchemaError;
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashSet};
use std::fmt;

type Object = Map<String, Value>;

/// Scorecard metrics shared by the sync policy weights and history metrics.
pub const METRIC_KEYS: [&str; 4] = [
    "privacy_risk",
    "simplicity",
    "merge_conflict_risk",
    "auditability",
];

const FILTERED_HISTORY_FIELDS: [(&str, &[&str]); 4] = [
    ("privacy_risk", &["base", "block_penalty", "ambiguous_penalty"]),
    (
        "simplicity",
        &["base", "commit_divisor", "commit_cap", "ambiguous_penalty"],
    ),
    (
        "merge_conflict_risk",
        &["base", "commit_divisor", "commit_cap", "ambiguous_penalty"],
    ),
    ("auditability", &["base", "block_penalty", "ambiguous_penalty"]),
];

const CLEAN_FOUNDATION_FIELDS: [(&str, &[&str]); 4] = [
    ("privacy_risk", &["base"]),
    (
        "simplicity",
        &["base", "commit_bonus_divisor", "commit_bonus_cap"],
    ),
    ("merge_conflict_risk", &["base"]),
    ("auditability", &["base"]),
];

const PACKAGE_REQUIRED_KEYS: [&str; 9] = [
    "package_version",
    "manifest_version",
    "package_name",
    "created_at",
    "source_repo",
    "source_commit",
    "dry_run_preview",
    "entry_count",
    "entries",
];

/// Named document contracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schema {
    SyncPolicy,
    MigrationManifest,
    PackageManifest,
    ExtensionManifest,
    ContractPolicy,
}

impl Schema {
    /// Context used when the caller has nothing more specific.
    pub fn default_context(self) -> &'static str {
        match self {
            Self::SyncPolicy => "migration_sync_policy",
            Self::MigrationManifest => "state_migration_manifest",
            Self::PackageManifest => "state_package_manifest",
            Self::ExtensionManifest => "extension_manifest",
            Self::ContractPolicy => "delta_contract_policy",
        }
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.default_context())
    }
}

/// Validate `document` against `schema`.
///
/// `strict` only affects [`Schema::SyncPolicy`], where it makes every
/// first-class section mandatory.
pub fn validate<'a>(
    document: &'a Value,
    schema: Schema,
    context: &str,
    strict: bool,
) -> Result<&'a Value, SchemaError> {
    match schema {
        Schema::SyncPolicy => validate_sync_policy(document, context, strict),
        Schema::MigrationManifest => validate_migration_manifest(document, context),
        Schema::PackageManifest => validate_package_manifest(document, context),
        Schema::ExtensionManifest => validate_extension_manifest(document, context),
        Schema::ContractPolicy => validate_contract_policy(document, context),
    }
}

pub fn validate_sync_policy<'a>(
    document: &'a Value,
    context: &str,
    strict: bool,
) -> Result<&'a Value, SchemaError> {
    let policy = expect_object(Some(document), context)?;

    expect_int(policy.get("version"), &format!("{context}.version"), Some(1))?;

    for block_name in ["origin", "upstream"] {
        let field = format!("{context}.{block_name}");
        let Some(block) = policy.get(block_name) else {
            if strict {
                return Err(SchemaError::violation(field, "is required in strict mode"));
            }
            continue;
        };
        let block = expect_object(Some(block), &field)?;
        expect_non_empty_str(block.get("remote"), &format!("{field}.remote"))?;
        expect_non_empty_str(block.get("branch"), &format!("{field}.branch"))?;
        if block_name == "upstream" {
            match block.get("url") {
                Some(url) => {
                    expect_str(Some(url), &format!("{field}.url"))?;
                }
                None if strict => {
                    return Err(SchemaError::violation(
                        format!("{field}.url"),
                        "is required in strict mode",
                    ));
                }
                None => {}
            }
        }
    }

    if let Some(section) = section(policy, context, "sync_button_policy", strict)? {
        let field = format!("{context}.sync_button_policy");
        expect_bool(
            section.get("require_clean_worktree"),
            &format!("{field}.require_clean_worktree"),
        )?;
        expect_int(
            section.get("max_origin_only_commits"),
            &format!("{field}.max_origin_only_commits"),
            Some(0),
        )?;
        expect_bool(
            section.get("require_upstream_only_commits"),
            &format!("{field}.require_upstream_only_commits"),
        )?;
    }

    if let Some(section) = section(policy, context, "scorecard", strict)? {
        let field = format!("{context}.scorecard");
        expect_number(
            section.get("clean_foundation_threshold"),
            &format!("{field}.clean_foundation_threshold"),
            Some(0.0),
        )?;
        let weights_field = format!("{field}.weights");
        let weights = expect_object(section.get("weights"), &weights_field)?;
        let mut total = 0.0;
        for metric in METRIC_KEYS {
            total += expect_number(
                weights.get(metric),
                &format!("{weights_field}.{metric}"),
                Some(0.0),
            )?;
        }
        if total <= 0.0 {
            return Err(SchemaError::violation(weights_field, "must sum to > 0"));
        }
    }

    if let Some(section) = section(policy, context, "schedule", strict)? {
        let field = format!("{context}.schedule");
        for key in ["timezone", "weekly_day", "cron_utc"] {
            expect_non_empty_str(section.get(key), &format!("{field}.{key}"))?;
        }
    }

    if let Some(history) = policy.get("history_metrics") {
        let field = format!("{context}.history_metrics");
        let history = expect_object(Some(history), &field)?;
        for (candidate, allowed) in [
            ("filtered_history", &FILTERED_HISTORY_FIELDS),
            ("clean_foundation", &CLEAN_FOUNDATION_FIELDS),
        ] {
            let Some(metrics) = history.get(candidate) else {
                continue;
            };
            validate_history_candidate(metrics, &format!("{field}.{candidate}"), allowed)?;
        }
    }

    Ok(document)
}

fn section<'a>(
    policy: &'a Object,
    context: &str,
    name: &str,
    strict: bool,
) -> Result<Option<&'a Object>, SchemaError> {
    match policy.get(name) {
        Some(value) => expect_object(Some(value), &format!("{context}.{name}")).map(Some),
        None if strict => Err(SchemaError::violation(
            format!("{context}.{name}"),
            "is required in strict mode",
        )),
        None => Ok(None),
    }
}

fn validate_history_candidate(
    metrics: &Value,
    field: &str,
    allowed: &[(&str, &[&str]); 4],
) -> Result<(), SchemaError> {
    let metrics = expect_object(Some(metrics), field)?;

    let extra: BTreeSet<&str> = metrics
        .keys()
        .map(String::as_str)
        .filter(|k| !allowed.iter().any(|(name, _)| name == k))
        .collect();
    if !extra.is_empty() {
        return Err(SchemaError::violation(
            field,
            format!("has unsupported metrics: {}", join(&extra)),
        ));
    }

    for (metric, cfg) in metrics {
        let metric_field = format!("{field}.{metric}");
        let cfg = expect_object(Some(cfg), &metric_field)?;
        let fields = allowed
            .iter()
            .find(|(name, _)| name == metric)
            .map_or(&[][..], |(_, fields)| *fields);
        let extra: BTreeSet<&str> = cfg
            .keys()
            .map(String::as_str)
            .filter(|k| !fields.contains(k))
            .collect();
        if !extra.is_empty() {
            return Err(SchemaError::violation(
                metric_field,
                format!("has unsupported fields: {}", join(&extra)),
            ));
        }
        for (key, value) in cfg {
            expect_number(Some(value), &format!("{metric_field}.{key}"), Some(0.0))?;
        }
    }
    Ok(())
}

pub fn validate_migration_manifest<'a>(
    document: &'a Value,
    context: &str,
) -> Result<&'a Value, SchemaError> {
    let manifest = expect_object(Some(document), context)?;
    expect_int(manifest.get("version"), &format!("{context}.version"), Some(1))?;
    expect_non_empty_str(
        manifest.get("package_name"),
        &format!("{context}.package_name"),
    )?;

    let field = format!("{context}.required_files");
    let required = expect_string_list(manifest.get("required_files"), &field, false, true)?;
    for (index, rel) in required.iter().enumerate() {
        if let Err(e) = safe_relative(rel) {
            return Err(SchemaError::violation(
                format!("{field}[{index}]"),
                format!("invalid: {e}"),
            ));
        }
    }

    for key in ["optional_globs", "exclude_globs"] {
        let field = format!("{context}.{key}");
        let patterns = expect_string_list(manifest.get(key), &field, true, true)?;
        validate_glob_patterns(&patterns, &field)?;
    }

    Ok(document)
}

fn validate_glob_patterns(patterns: &[&str], field: &str) -> Result<(), SchemaError> {
    for (index, pattern) in patterns.iter().enumerate() {
        if pattern.starts_with('/') {
            return Err(SchemaError::violation(
                format!("{field}[{index}]"),
                "must be relative (no absolute paths)",
            ));
        }
        if pattern.split('/').any(|segment| segment == "..") {
            return Err(SchemaError::violation(
                format!("{field}[{index}]"),
                "must not contain path traversal (`..`)",
            ));
        }
    }
    Ok(())
}

pub fn validate_package_manifest<'a>(
    document: &'a Value,
    context: &str,
) -> Result<&'a Value, SchemaError> {
    let manifest = expect_object(Some(document), context)?;

    let missing: Vec<&str> = PACKAGE_REQUIRED_KEYS
        .iter()
        .copied()
        .filter(|k| !manifest.contains_key(*k))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    if !missing.is_empty() {
        return Err(SchemaError::violation(
            context,
            format!("missing required keys: {}", missing.join(", ")),
        ));
    }

    expect_int(
        manifest.get("package_version"),
        &format!("{context}.package_version"),
        Some(1),
    )?;
    expect_int(
        manifest.get("manifest_version"),
        &format!("{context}.manifest_version"),
        Some(1),
    )?;
    for key in ["package_name", "created_at", "source_repo"] {
        expect_non_empty_str(manifest.get(key), &format!("{context}.{key}"))?;
    }
    expect_str(
        manifest.get("source_commit"),
        &format!("{context}.source_commit"),
    )?;
    expect_bool(
        manifest.get("dry_run_preview"),
        &format!("{context}.dry_run_preview"),
    )?;

    let Some(Value::Array(entries)) = manifest.get("entries") else {
        return Err(SchemaError::violation(
            format!("{context}.entries"),
            "must be a list",
        ));
    };
    let expected = expect_int(
        manifest.get("entry_count"),
        &format!("{context}.entry_count"),
        Some(0),
    )?;
    if usize::try_from(expected).ok() != Some(entries.len()) {
        return Err(SchemaError::violation(
            format!("{context}.entry_count"),
            format!("mismatch: expected {expected}, found {}", entries.len()),
        ));
    }

    let mut seen_paths = HashSet::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let entry_field = format!("{context}.entries[{index}]");
        let entry = expect_object(Some(entry), &entry_field)?;

        let rel = expect_non_empty_str(entry.get("path"), &format!("{entry_field}.path"))?;
        let normalized = safe_relative(rel).map_err(|e| {
            SchemaError::violation(format!("{entry_field}.path"), format!("invalid: {e}"))
        })?;
        if !seen_paths.insert(normalized) {
            return Err(SchemaError::violation(
                format!("{entry_field}.path"),
                format!("duplicate entry path `{rel}`"),
            ));
        }

        let digest = expect_non_empty_str(entry.get("sha256"), &format!("{entry_field}.sha256"))?;
        if !Sha256Digest::new(digest).is_well_formed() {
            return Err(SchemaError::violation(
                format!("{entry_field}.sha256"),
                "must be a 64-char lowercase hex string",
            ));
        }

        expect_int(
            entry.get("size_bytes"),
            &format!("{entry_field}.size_bytes"),
            Some(0),
        )?;
    }

    Ok(document)
}

pub fn validate_extension_manifest<'a>(
    document: &'a Value,
    context: &str,
) -> Result<&'a Value, SchemaError> {
    let manifest = expect_object(Some(document), context)?;

    let name = expect_non_empty_str(manifest.get("name"), &format!("{context}.name"))?;
    expect_non_empty_str(manifest.get("version"), &format!("{context}.version"))?;

    match manifest.get("description") {
        None | Some(Value::Null) => {}
        Some(description) => {
            expect_non_empty_str(Some(description), &format!("{context}.description"))?;
        }
    }

    expect_string_list(
        manifest.get("capabilities"),
        &format!("{context}.capabilities"),
        false,
        true,
    )?;

    let field = format!("{context}.entrypoints");
    let entrypoints = expect_object(manifest.get("entrypoints"), &field)?;
    if entrypoints.is_empty() {
        return Err(SchemaError::violation(field, "must not be empty"));
    }
    expect_path_mapping(entrypoints, &field)?;

    let commands = match manifest.get("commands") {
        None => None,
        Some(value) => {
            let field = format!("{context}.commands");
            let commands = expect_object(Some(value), &field)?;
            expect_path_mapping(commands, &field)?;
            Some(commands)
        }
    };

    if let Some(contract) = manifest.get("command_contract") {
        let field = format!("{context}.command_contract");
        let contract = expect_object(Some(contract), &field)?;
        let version = expect_int(contract.get("version"), &format!("{field}.version"), Some(1))?;
        if version != 1 {
            return Err(SchemaError::violation(
                format!("{field}.version"),
                "must be 1",
            ));
        }
        let namespace =
            expect_non_empty_str(contract.get("namespace"), &format!("{field}.namespace"))?;
        let derived = Namespace::derive(name);
        if derived.as_deref() != Some(namespace) {
            return Err(SchemaError::violation(
                format!("{field}.namespace"),
                format!(
                    "must match the namespace derived from name (`{}`)",
                    derived.as_deref().unwrap_or_default()
                ),
            ));
        }
        if let Some(commands) = commands {
            let prefix = Namespace::new(namespace).key_prefix();
            for key in commands.keys() {
                let suffix = key.trim().strip_prefix(&prefix).unwrap_or_default();
                if suffix.is_empty() {
                    return Err(SchemaError::violation(
                        format!("{context}.commands.{key}"),
                        format!("must be namespaced as `{prefix}<command>`"),
                    ));
                }
            }
        }
    }

    Ok(document)
}

fn expect_path_mapping(mapping: &Object, field: &str) -> Result<(), SchemaError> {
    for (key, value) in mapping {
        if key.trim().is_empty() {
            return Err(SchemaError::violation(
                format!("{field} key"),
                "must be a non-empty string",
            ));
        }
        let entry_field = format!("{field}.{key}");
        let rel = expect_non_empty_str(Some(value), &entry_field)?;
        if let Err(e) = safe_relative(rel) {
            return Err(SchemaError::violation(entry_field, format!("invalid: {e}")));
        }
    }
    Ok(())
}

pub fn validate_contract_policy<'a>(
    document: &'a Value,
    context: &str,
) -> Result<&'a Value, SchemaError> {
    let policy = expect_object(Some(document), context)?;
    expect_int(policy.get("version"), &format!("{context}.version"), Some(1))?;

    let field = format!("{context}.targets");
    let targets = expect_object(policy.get("targets"), &field)?;
    if let Some(target) = targets.get("extension_command_contract") {
        let field = format!("{field}.extension_command_contract");
        let target = expect_object(Some(target), &field)?;
        expect_int(
            target.get("current_version"),
            &format!("{field}.current_version"),
            Some(1),
        )?;
        for key in ["migration_script", "notes"] {
            if let Some(value) = target.get(key) {
                expect_str(Some(value), &format!("{field}.{key}"))?;
            }
        }
    }

    Ok(document)
}

fn join(items: &BTreeSet<&str>) -> String {
    items.iter().copied().collect::<Vec<_>>().join(", ")
}

fn expect_object<'a>(value: Option<&'a Value>, field: &str) -> Result<&'a Object, SchemaError> {
    value
        .and_then(Value::as_object)
        .ok_or_else(|| SchemaError::violation(field, "must be an object"))
}

fn expect_str<'a>(value: Option<&'a Value>, field: &str) -> Result<&'a str, SchemaError> {
    value
        .and_then(Value::as_str)
        .ok_or_else(|| SchemaError::violation(field, "must be a string"))
}

fn expect_non_empty_str<'a>(value: Option<&'a Value>, field: &str) -> Result<&'a str, SchemaError> {
    let text = expect_str(value, field)?.trim();
    if text.is_empty() {
        return Err(SchemaError::violation(field, "must be a non-empty string"));
    }
    Ok(text)
}

fn expect_bool(value: Option<&Value>, field: &str) -> Result<bool, SchemaError> {
    value
        .and_then(Value::as_bool)
        .ok_or_else(|| SchemaError::violation(field, "must be a boolean"))
}

fn expect_number(value: Option<&Value>, field: &str, min: Option<f64>) -> Result<f64, SchemaError> {
    let number = value
        .and_then(Value::as_f64)
        .ok_or_else(|| SchemaError::violation(field, "must be a number"))?;
    if let Some(min) = min {
        if number < min {
            return Err(SchemaError::violation(field, format!("must be >= {min}")));
        }
    }
    Ok(number)
}

fn expect_int(value: Option<&Value>, field: &str, min: Option<i64>) -> Result<i64, SchemaError> {
    let Some(Value::Number(number)) = value else {
        return Err(SchemaError::violation(field, "must be an integer"));
    };
    let int = if let Some(int) = number.as_i64() {
        int
    } else if number.is_u64() {
        return Err(SchemaError::violation(field, "is out of range"));
    } else {
        return Err(SchemaError::violation(field, "must be an integer"));
    };
    if let Some(min) = min {
        if int < min {
            return Err(SchemaError::violation(field, format!("must be >= {min}")));
        }
    }
    Ok(int)
}

fn expect_string_list<'a>(
    value: Option<&'a Value>,
    field: &str,
    allow_empty: bool,
    unique: bool,
) -> Result<Vec<&'a str>, SchemaError> {
    let Some(Value::Array(items)) = value else {
        return Err(SchemaError::violation(field, "must be a list of strings"));
    };

    let mut parsed = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        parsed.push(expect_non_empty_str(Some(item), &format!("{field}[{index}]"))?);
    }

    if !allow_empty && parsed.is_empty() {
        return Err(SchemaError::violation(field, "must not be empty"));
    }
    if unique {
        let mut seen = HashSet::with_capacity(parsed.len());
        if !parsed.iter().all(|item| seen.insert(*item)) {
            return Err(SchemaError::violation(field, "must not contain duplicates"));
        }
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_policy() -> Value {
        json!({
            "version": 1,
            "origin": {"remote": "origin", "branch": "main"},
            "upstream": {"remote": "upstream", "url": "https://example.com/upstream.git", "branch": "main"},
            "sync_button_policy": {
                "require_clean_worktree": true,
                "max_origin_only_commits": 0,
                "require_upstream_only_commits": true
            },
            "scorecard": {
                "clean_foundation_threshold": 80,
                "weights": {
                    "privacy_risk": 0.35,
                    "simplicity": 0.35,
                    "merge_conflict_risk": 0.2,
                    "auditability": 0.1
                }
            },
            "schedule": {
                "timezone": "America/New_York",
                "weekly_day": "monday",
                "cron_utc": "0 14 * * 1"
            }
        })
    }

    fn valid_package() -> Value {
        json!({
            "package_version": 1,
            "manifest_version": 1,
            "package_name": "delta-state",
            "created_at": "2026-01-01T00:00:00Z",
            "source_repo": "/repo",
            "source_commit": "",
            "dry_run_preview": false,
            "entry_count": 1,
            "entries": [
                {"path": "a.txt", "sha256": "a".repeat(64), "size_bytes": 3}
            ]
        })
    }

    fn valid_extension() -> Value {
        json!({
            "name": "sample-extension",
            "version": "0.1.0",
            "capabilities": ["sync"],
            "entrypoints": {"doctor": "scripts/tool.py"}
        })
    }

    fn violation_of(result: Result<&Value, SchemaError>) -> (String, String) {
        match result {
            Err(SchemaError::Violation { field, expected }) => (field, expected),
            other => panic!("expected violation, got {other:?}"),
        }
    }

    #[test]
    fn strict_policy_accepts_full_document() {
        let doc = valid_policy();
        assert!(validate(&doc, Schema::SyncPolicy, "policy", true).is_ok());
    }

    #[test]
    fn lenient_policy_needs_only_version() {
        let doc = json!({"version": 1});
        assert!(validate_sync_policy(&doc, "policy", false).is_ok());
        let (field, expected) = violation_of(validate_sync_policy(&doc, "policy", true));
        assert_eq!(field, "policy.origin");
        assert_eq!(expected, "is required in strict mode");
    }

    #[test]
    fn strict_policy_requires_upstream_url() {
        let mut doc = valid_policy();
        doc["upstream"].as_object_mut().unwrap().remove("url");
        let (field, _) = violation_of(validate_sync_policy(&doc, "policy", true));
        assert_eq!(field, "policy.upstream.url");
        assert!(validate_sync_policy(&doc, "policy", false).is_ok());
    }

    #[test]
    fn negative_weight_names_the_metric() {
        let mut doc = valid_policy();
        doc["scorecard"]["weights"]["simplicity"] = json!(-1);
        let err = validate_sync_policy(&doc, "policy", true).unwrap_err();
        assert_eq!(err.to_string(), "policy.scorecard.weights.simplicity must be >= 0");
    }

    #[test]
    fn zero_weights_rejected() {
        let mut doc = valid_policy();
        for metric in METRIC_KEYS {
            doc["scorecard"]["weights"][metric] = json!(0);
        }
        let (field, expected) = violation_of(validate_sync_policy(&doc, "policy", true));
        assert_eq!(field, "policy.scorecard.weights");
        assert_eq!(expected, "must sum to > 0");
    }

    #[test]
    fn history_metrics_reject_unknown_fields() {
        let mut doc = valid_policy();
        doc["history_metrics"] = json!({
            "filtered_history": {"privacy_risk": {"base": 100, "bonus": 3}}
        });
        let (field, expected) = violation_of(validate_sync_policy(&doc, "policy", true));
        assert_eq!(field, "policy.history_metrics.filtered_history.privacy_risk");
        assert_eq!(expected, "has unsupported fields: bonus");
    }

    #[test]
    fn history_metrics_reject_unknown_metrics() {
        let mut doc = valid_policy();
        doc["history_metrics"] = json!({"clean_foundation": {"speed": {"base": 1}}});
        let (_, expected) = violation_of(validate_sync_policy(&doc, "policy", false));
        assert_eq!(expected, "has unsupported metrics: speed");
    }

    #[test]
    fn history_metrics_accept_declared_fields() {
        let mut doc = valid_policy();
        doc["history_metrics"] = json!({
            "filtered_history": {"simplicity": {"base": 100, "commit_divisor": 15, "commit_cap": 35, "ambiguous_penalty": 0.3}},
            "clean_foundation": {"simplicity": {"base": 90, "commit_bonus_divisor": 10, "commit_bonus_cap": 5}}
        });
        assert!(validate_sync_policy(&doc, "policy", true).is_ok());
    }

    #[test]
    fn unknown_top_level_policy_keys_tolerated() {
        let mut doc = valid_policy();
        doc["extra"] = json!({"anything": true});
        assert!(validate_sync_policy(&doc, "policy", true).is_ok());
    }

    #[test]
    fn migration_manifest_accepts_valid_document() {
        let doc = json!({
            "version": 1,
            "package_name": "delta-state",
            "required_files": ["config/migration_sync_policy.json"],
            "optional_globs": ["scripts/*.py"],
            "exclude_globs": ["**/__pycache__/**"]
        });
        assert!(validate(&doc, Schema::MigrationManifest, "manifest", false).is_ok());
    }

    #[test]
    fn migration_manifest_rejects_traversal_in_required_files() {
        let doc = json!({
            "version": 1,
            "package_name": "x",
            "required_files": ["ok.txt", "../secret"],
            "optional_globs": [],
            "exclude_globs": []
        });
        let (field, expected) = violation_of(validate_migration_manifest(&doc, "manifest"));
        assert_eq!(field, "manifest.required_files[1]");
        assert!(expected.starts_with("invalid: unsafe path"), "{expected}");
    }

    #[test]
    fn migration_manifest_rejects_empty_and_duplicate_required() {
        let mut doc = json!({
            "version": 1,
            "package_name": "x",
            "required_files": [],
            "optional_globs": [],
            "exclude_globs": []
        });
        let (_, expected) = violation_of(validate_migration_manifest(&doc, "m"));
        assert_eq!(expected, "must not be empty");

        doc["required_files"] = json!(["a", "a"]);
        let (_, expected) = violation_of(validate_migration_manifest(&doc, "m"));
        assert_eq!(expected, "must not contain duplicates");
    }

    #[test]
    fn migration_manifest_rejects_absolute_glob() {
        let doc = json!({
            "version": 1,
            "package_name": "x",
            "required_files": ["a"],
            "optional_globs": ["/etc/*"],
            "exclude_globs": []
        });
        let (field, _) = violation_of(validate_migration_manifest(&doc, "m"));
        assert_eq!(field, "m.optional_globs[0]");
    }

    #[test]
    fn migration_manifest_rejects_zero_version() {
        let doc = json!({
            "version": 0,
            "package_name": "x",
            "required_files": ["a"],
            "optional_globs": [],
            "exclude_globs": []
        });
        let err = validate_migration_manifest(&doc, "m").unwrap_err();
        assert_eq!(err.to_string(), "m.version must be >= 1");
    }

    #[test]
    fn package_manifest_accepts_valid_document() {
        let doc = valid_package();
        assert!(validate(&doc, Schema::PackageManifest, "pkg", false).is_ok());
    }

    #[test]
    fn package_manifest_entry_count_mismatch() {
        let mut doc = valid_package();
        doc["entry_count"] = json!(2);
        let (field, expected) = violation_of(validate_package_manifest(&doc, "pkg"));
        assert_eq!(field, "pkg.entry_count");
        assert_eq!(expected, "mismatch: expected 2, found 1");
    }

    #[test]
    fn package_manifest_lists_all_missing_keys() {
        let doc = json!({"package_version": 1, "entries": []});
        let (_, expected) = violation_of(validate_package_manifest(&doc, "pkg"));
        assert_eq!(
            expected,
            "missing required keys: created_at, dry_run_preview, entry_count, manifest_version, package_name, source_commit, source_repo"
        );
    }

    #[test]
    fn package_manifest_rejects_bad_digest() {
        let mut doc = valid_package();
        doc["entries"][0]["sha256"] = json!("abc");
        let (field, _) = violation_of(validate_package_manifest(&doc, "pkg"));
        assert_eq!(field, "pkg.entries[0].sha256");

        doc["entries"][0]["sha256"] = json!("A".repeat(64));
        assert!(validate_package_manifest(&doc, "pkg").is_err());
    }

    #[test]
    fn package_manifest_rejects_unsafe_entry_path() {
        let mut doc = valid_package();
        doc["entries"][0]["path"] = json!("/etc/passwd");
        let (field, _) = violation_of(validate_package_manifest(&doc, "pkg"));
        assert_eq!(field, "pkg.entries[0].path");
    }

    #[test]
    fn package_manifest_rejects_duplicate_normalized_paths() {
        let mut doc = valid_package();
        doc["entry_count"] = json!(2);
        doc["entries"] = json!([
            {"path": "a.txt", "sha256": "a".repeat(64), "size_bytes": 3},
            {"path": "./a.txt", "sha256": "b".repeat(64), "size_bytes": 3}
        ]);
        let (field, expected) = violation_of(validate_package_manifest(&doc, "pkg"));
        assert_eq!(field, "pkg.entries[1].path");
        assert!(expected.contains("duplicate"), "{expected}");
    }

    #[test]
    fn package_manifest_source_commit_may_be_empty_but_must_be_string() {
        let mut doc = valid_package();
        assert!(validate_package_manifest(&doc, "pkg").is_ok());
        doc["source_commit"] = json!(null);
        let (field, _) = violation_of(validate_package_manifest(&doc, "pkg"));
        assert_eq!(field, "pkg.source_commit");
    }

    #[test]
    fn package_manifest_rejects_negative_size() {
        let mut doc = valid_package();
        doc["entries"][0]["size_bytes"] = json!(-1);
        let (field, _) = violation_of(validate_package_manifest(&doc, "pkg"));
        assert_eq!(field, "pkg.entries[0].size_bytes");
    }

    #[test]
    fn extension_manifest_accepts_minimal_document() {
        let doc = valid_extension();
        assert!(validate(&doc, Schema::ExtensionManifest, "ext", false).is_ok());
    }

    #[test]
    fn extension_manifest_requires_entrypoints() {
        let mut doc = valid_extension();
        doc["entrypoints"] = json!({});
        let (field, expected) = violation_of(validate_extension_manifest(&doc, "ext"));
        assert_eq!(field, "ext.entrypoints");
        assert_eq!(expected, "must not be empty");
    }

    #[test]
    fn extension_manifest_rejects_duplicate_capabilities() {
        let mut doc = valid_extension();
        doc["capabilities"] = json!(["sync", "sync"]);
        let (field, _) = violation_of(validate_extension_manifest(&doc, "ext"));
        assert_eq!(field, "ext.capabilities");
    }

    #[test]
    fn extension_manifest_null_description_allowed() {
        let mut doc = valid_extension();
        doc["description"] = json!(null);
        assert!(validate_extension_manifest(&doc, "ext").is_ok());
        doc["description"] = json!("  ");
        assert!(validate_extension_manifest(&doc, "ext").is_err());
    }

    #[test]
    fn extension_manifest_legacy_commands_without_contract_are_valid() {
        let mut doc = valid_extension();
        doc["commands"] = json!({"doctor-run": "scripts/tool.py"});
        assert!(validate_extension_manifest(&doc, "ext").is_ok());
    }

    #[test]
    fn extension_manifest_contract_requires_namespaced_keys() {
        let mut doc = valid_extension();
        doc["commands"] = json!({"doctor-run": "scripts/tool.py"});
        doc["command_contract"] = json!({"version": 1, "namespace": "sample-extension"});
        let (field, _) = violation_of(validate_extension_manifest(&doc, "ext"));
        assert_eq!(field, "ext.commands.doctor-run");

        doc["commands"] = json!({"sample-extension/doctor-run": "scripts/tool.py"});
        assert!(validate_extension_manifest(&doc, "ext").is_ok());
    }

    #[test]
    fn extension_manifest_contract_namespace_must_match_name() {
        let mut doc = valid_extension();
        doc["command_contract"] = json!({"version": 1, "namespace": "other"});
        let (field, expected) = violation_of(validate_extension_manifest(&doc, "ext"));
        assert_eq!(field, "ext.command_contract.namespace");
        assert!(expected.contains("`sample-extension`"), "{expected}");

        doc["name"] = json!("***");
        let (_, expected) = violation_of(validate_extension_manifest(&doc, "ext"));
        assert!(expected.ends_with("(``)"), "{expected}");
    }

    #[test]
    fn extension_manifest_rejects_unsafe_command_path() {
        let mut doc = valid_extension();
        doc["commands"] = json!({"run": "../outside.sh"});
        let (field, _) = violation_of(validate_extension_manifest(&doc, "ext"));
        assert_eq!(field, "ext.commands.run");
    }

    #[test]
    fn contract_policy_validation() {
        let doc = json!({
            "version": 1,
            "targets": {
                "extension_command_contract": {
                    "current_version": 1,
                    "migration_script": "scripts/delta_contract_migrate.py",
                    "notes": "Commands must use <namespace>/<command>."
                }
            }
        });
        assert!(validate(&doc, Schema::ContractPolicy, "contract", false).is_ok());

        let bad = json!({"version": 1, "targets": {"extension_command_contract": {"current_version": 0}}});
        let (field, _) = violation_of(validate_contract_policy(&bad, "contract"));
        assert_eq!(
            field,
            "contract.targets.extension_command_contract.current_version"
        );
    }

    #[test]
    fn non_object_document_rejected() {
        let doc = json!([1, 2, 3]);
        let (field, expected) = violation_of(validate(&doc, Schema::PackageManifest, "pkg", false));
        assert_eq!(field, "pkg");
        assert_eq!(expected, "must be an object");
    }

    #[test]
    fn float_is_not_an_integer() {
        let doc = json!({"version": 1.5});
        let (_, expected) = violation_of(validate_sync_policy(&doc, "p", false));
        assert_eq!(expected, "must be an integer");
    }
}
