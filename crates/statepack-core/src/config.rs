//! Optional `statepack.toml` at the repository root.
//!
//! ```toml
//! [paths]
//! manifest = "config/state_migration_manifest.json"
//! policy = "config/migration_sync_policy.json"
//! contract_policy = "config/delta_contract_policy.json"
//! extensions_dir = "extensions"
//! ```

use crate::CoreError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const CONFIG_FILE: &str = "statepack.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct StatepackConfig {
    #[serde(default)]
    pub paths: PathsSection,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PathsSection {
    #[serde(default = "default_manifest")]
    pub manifest: PathBuf,
    #[serde(default = "default_policy")]
    pub policy: PathBuf,
    #[serde(default = "default_contract_policy")]
    pub contract_policy: PathBuf,
    #[serde(default = "default_extensions_dir")]
    pub extensions_dir: PathBuf,
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            manifest: default_manifest(),
            policy: default_policy(),
            contract_policy: default_contract_policy(),
            extensions_dir: default_extensions_dir(),
        }
    }
}

fn default_manifest() -> PathBuf {
    PathBuf::from("config/state_migration_manifest.json")
}

fn default_policy() -> PathBuf {
    PathBuf::from("config/migration_sync_policy.json")
}

fn default_contract_policy() -> PathBuf {
    PathBuf::from("config/delta_contract_policy.json")
}

fn default_extensions_dir() -> PathBuf {
    PathBuf::from("extensions")
}

/// Configured paths made absolute against a repository root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub manifest: PathBuf,
    pub policy: PathBuf,
    pub contract_policy: PathBuf,
    pub extensions_dir: PathBuf,
}

impl StatepackConfig {
    pub fn resolve(&self, repo_root: &Path) -> ResolvedPaths {
        ResolvedPaths {
            manifest: resolve_against(repo_root, &self.paths.manifest),
            policy: resolve_against(repo_root, &self.paths.policy),
            contract_policy: resolve_against(repo_root, &self.paths.contract_policy),
            extensions_dir: resolve_against(repo_root, &self.paths.extensions_dir),
        }
    }
}

/// `path` unchanged when absolute, otherwise joined onto `root`.
pub fn resolve_against(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

pub fn parse_config_str(input: &str) -> Result<StatepackConfig, toml::de::Error> {
    toml::from_str(input)
}

/// Load `statepack.toml` from `repo_root`, or the defaults when there is none.
pub fn load_config(repo_root: &Path) -> Result<StatepackConfig, CoreError> {
    let path = repo_root.join(CONFIG_FILE);
    if !path.is_file() {
        debug!("no {CONFIG_FILE} in {}, using defaults", repo_root.display());
        return Ok(StatepackConfig::default());
    }
    let content = fs::read_to_string(&path)?;
    parse_config_str(&content).map_err(|source| CoreError::Config { path, source })
}
