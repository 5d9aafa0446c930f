use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::schema::error::ConfigError;

// =============================================================================
// Remote endpoints
// =============================================================================

/// GitHub API base for the schema repository
pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com/repos/crackingshells/Hatch-Schemas";

/// Base URL of release assets for the schema repository
pub const DEFAULT_RELEASES_BASE_URL: &str =
    "https://github.com/crackingshells/Hatch-Schemas/releases/download";

// =============================================================================
// Time-related constants
// =============================================================================

/// Timeout for discovery and other metadata requests in seconds
pub const METADATA_TIMEOUT_SECS: u64 = 10;

/// Timeout for schema and archive downloads in seconds
pub const DOWNLOAD_TIMEOUT_SECS: u64 = 30;

/// Name of the cache record file inside the cache directory
pub const CACHE_INFO_FILE: &str = "schema_info.json";

/// How the latest schema versions are discovered
#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum DiscoveryKind {
    /// List releases and pick the first tag per schema type
    #[default]
    Releases,
    /// Read a single `latest.json` manifest document
    Manifest,
}

/// How a stale schema is retrieved
#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum FetchMode {
    /// Download the schema JSON file itself
    #[default]
    Direct,
    /// Download a zip archive and unpack it into the type directory
    Archive,
}

/// What the cache record claims after a pass in which some fetches failed
#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum CommitPolicy {
    /// Write the whole discovery snapshot, including types whose fetch failed
    #[default]
    Snapshot,
    /// Keep the previous entry for every type whose fetch failed
    PerType,
}

/// Top-level configuration for the schema cache
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct SchemaConfig {
    pub cache_dir: PathBuf,
    pub api_base_url: String,
    pub releases_base_url: String,
    pub manifest_url: Option<String>,
    pub discovery: DiscoveryKind,
    pub fetch_mode: FetchMode,
    pub metadata_timeout_secs: u64,
    pub download_timeout_secs: u64,
    pub commit_policy: CommitPolicy,
    pub log: LogConfig,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            cache_dir: cache_dir(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            releases_base_url: DEFAULT_RELEASES_BASE_URL.to_string(),
            manifest_url: None,
            discovery: DiscoveryKind::default(),
            fetch_mode: FetchMode::default(),
            metadata_timeout_secs: METADATA_TIMEOUT_SECS,
            download_timeout_secs: DOWNLOAD_TIMEOUT_SECS,
            commit_policy: CommitPolicy::default(),
            log: LogConfig::default(),
        }
    }
}

impl SchemaConfig {
    /// Reads a JSON config file; fields that are absent keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn metadata_timeout(&self) -> Duration {
        Duration::from_secs(self.metadata_timeout_secs)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    pub level: String,
    /// Optional log file written in addition to stderr
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// Returns the base directory for product data (`~/.crackingshells`),
/// or `./.crackingshells` if no home directory is available.
pub fn base_dir() -> PathBuf {
    base_dir_with_home(dirs::home_dir())
}

/// Returns the default schema cache directory.
pub fn cache_dir() -> PathBuf {
    base_dir().join("schemas")
}

/// Returns the default path of the log file.
pub fn log_path() -> PathBuf {
    base_dir().join("logs").join("schema_updates.log")
}

fn base_dir_with_home(home_dir: Option<PathBuf>) -> PathBuf {
    home_dir
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".crackingshells")
}
