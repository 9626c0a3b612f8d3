//! The flat settings record shared with the extension surfaces.
//!
//! Stored as TOML under `~/.leetsync`, keyed exactly as the wire protocol
//! keys them so the options page round-trips the record without renaming.
//! The store is read-entire / write-entire with no partial updates; callers
//! load once per operation rather than caching.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::SyncError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncSettings {
    /// Credential for the contents API. Required non-empty for any write.
    pub github_token: String,
    pub github_owner: String,
    pub github_repo: String,
    pub github_branch: String,
    /// Stored and surfaced, but no scheduler consumes it.
    pub auto_sync: bool,
    pub file_structure: FileStructure,
    pub file_naming: FileNaming,
}

impl Default for SyncSettings {
    fn default() -> Self {
        SyncSettings {
            github_token: String::new(),
            github_owner: String::new(),
            github_repo: String::new(),
            github_branch: "main".to_string(),
            auto_sync: false,
            file_structure: FileStructure::ByDifficulty,
            file_naming: FileNaming::ProblemName,
        }
    }
}

/// Directory layout for synced solutions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum FileStructure {
    #[default]
    ByDifficulty,
    ByLanguage,
    Flat,
}

/// File-stem policy for synced solutions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum FileNaming {
    #[default]
    ProblemName,
    IdAndName,
}

pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".leetsync")
}

pub fn settings_path() -> PathBuf {
    data_dir().join("settings.toml")
}

/// Bulk load. A missing file yields the defaults; a malformed file is a
/// config error rather than a silent reset.
pub fn load_from(path: &Path) -> Result<SyncSettings, SyncError> {
    if !path.exists() {
        return Ok(SyncSettings::default());
    }
    let content = fs::read_to_string(path)?;
    toml::from_str(&content).map_err(|e| SyncError::Config(format!("Invalid settings: {}", e)))
}

/// Bulk save. Last writer wins.
pub fn save_to(path: &Path, settings: &SyncSettings) -> Result<(), SyncError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = toml::to_string(settings)
        .map_err(|e| SyncError::Config(format!("Failed to serialize settings: {}", e)))?;
    fs::write(path, content)?;
    Ok(())
}

/// Bulk clear.
pub fn clear_at(path: &Path) -> Result<(), SyncError> {
    if path.exists() {
        fs::remove_file(path)?;
    }
    Ok(())
}

/// First-install hook: seed the defaults unless settings already exist.
/// Returns whether anything was written.
pub fn seed_defaults(path: &Path) -> Result<bool, SyncError> {
    if path.exists() {
        return Ok(false);
    }
    save_to(path, &SyncSettings::default())?;
    Ok(true)
}
