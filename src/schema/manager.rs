//! Reconcile-and-fetch pass and schema loading

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::config::{CommitPolicy, DiscoveryKind, FetchMode, SchemaConfig};
use crate::schema::cache::SchemaCache;
use crate::schema::discoveries::releases::schema_file_url;
use crate::schema::discoveries::{ManifestDiscovery, ReleasesDiscovery};
use crate::schema::discovery::Discovery;
use crate::schema::error::{ConfigError, SchemaError};
use crate::schema::fetcher::SchemaFetcher;
use crate::schema::fetchers::direct::download_schema;
use crate::schema::fetchers::{ArchiveFetcher, DirectFileFetcher};
use crate::schema::http;
use crate::schema::reconcile::reconcile;
use crate::schema::types::{
    CacheRecord, SchemaInfo, SchemaType, SchemaVersion, normalize_version,
};

/// Keeps the local schema cache in sync with the remote releases
pub struct SchemaCacheManager {
    cache: SchemaCache,
    discovery: Arc<dyn Discovery>,
    fetcher: Arc<dyn SchemaFetcher>,
    /// Client for exact-version loads, which bypass the cache
    client: reqwest::Client,
    releases_base_url: String,
    commit_policy: CommitPolicy,
}

impl SchemaCacheManager {
    /// Creates a manager with the discovery and fetcher selected by `config`
    pub fn new(config: &SchemaConfig) -> Result<Self, ConfigError> {
        let discovery: Arc<dyn Discovery> = match config.discovery {
            DiscoveryKind::Releases => Arc::new(ReleasesDiscovery::new(
                &config.api_base_url,
                &config.releases_base_url,
                config.metadata_timeout(),
            )?),
            DiscoveryKind::Manifest => {
                let manifest_url = config
                    .manifest_url
                    .as_deref()
                    .ok_or(ConfigError::MissingManifestUrl)?;
                Arc::new(ManifestDiscovery::new(
                    manifest_url,
                    config.metadata_timeout(),
                )?)
            }
        };

        let fetcher: Arc<dyn SchemaFetcher> = match config.fetch_mode {
            FetchMode::Direct => Arc::new(DirectFileFetcher::new(config.download_timeout())?),
            FetchMode::Archive => Arc::new(ArchiveFetcher::new(config.download_timeout())?),
        };

        Self::build(config, discovery, fetcher)
    }

    /// Build a manager with custom discovery and fetcher
    pub fn build(
        config: &SchemaConfig,
        discovery: Arc<dyn Discovery>,
        fetcher: Arc<dyn SchemaFetcher>,
    ) -> Result<Self, ConfigError> {
        debug!(
            "Schema cache at {:?} (discovery: {}, fetch mode: {:?})",
            config.cache_dir,
            discovery.source(),
            fetcher.mode()
        );

        Ok(Self {
            cache: SchemaCache::new(&config.cache_dir),
            discovery,
            fetcher,
            client: http::build_client(config.download_timeout())?,
            releases_base_url: config.releases_base_url.clone(),
            commit_policy: config.commit_policy,
        })
    }

    pub fn cache(&self) -> &SchemaCache {
        &self.cache
    }

    /// The current cache record, if one exists and parses
    pub fn cached_info(&self) -> Option<CacheRecord> {
        self.cache.read_record()
    }

    /// Where the latest cached schema of `schema_type` lives
    pub fn schema_path(&self, schema_type: SchemaType) -> PathBuf {
        self.cache.schema_path(schema_type)
    }

    /// Checks for new schema versions and downloads the stale ones.
    ///
    /// Returns true if at least one schema was updated. Remote failures are
    /// logged and leave the cache untouched.
    pub async fn check_and_update(&self) -> bool {
        let latest = match self.discovery.fetch_latest_info().await {
            Ok(latest) => latest,
            Err(e) => {
                warn!(
                    "Could not retrieve latest schema information from {}: {}. Using cached version if available.",
                    self.discovery.source(),
                    e
                );
                return false;
            }
        };

        let cached = self.cache.read_record();

        let mut updated = Vec::new();

        // Sequential on purpose: one type at a time
        for (schema_type, descriptor) in reconcile(&latest, cached.as_ref()) {
            let type_dir = self.cache.type_dir(schema_type);
            match self
                .fetcher
                .fetch_and_store(schema_type, &descriptor, &type_dir)
                .await
            {
                Ok(()) => {
                    info!(
                        "{} schema updated successfully to {}.",
                        schema_type, descriptor.version
                    );
                    updated.push(schema_type);
                }
                Err(e) => {
                    error!("{} schema update failed: {}", schema_type, e);
                }
            }
        }

        if updated.is_empty() {
            return false;
        }

        let record = commit_record(self.commit_policy, latest, cached.as_ref(), &updated);
        if let Err(e) = self.cache.write_record(&record) {
            error!("Error writing cache info: {}", e);
        }

        true
    }

    /// Loads a schema.
    ///
    /// `Latest` runs [`check_and_update`](Self::check_and_update) first and then
    /// reads the cached file; `Exact` downloads that release directly without
    /// touching the cache.
    pub async fn load_schema(&self, schema_type: SchemaType, version: SchemaVersion) -> Option<Value> {
        match version {
            SchemaVersion::Exact(version) => self.fetch_version(schema_type, &version).await,
            SchemaVersion::Latest => {
                self.check_and_update().await;
                self.cache.read_schema(schema_type)
            }
        }
    }

    /// Like [`load_schema`](Self::load_schema), with the type given by name.
    ///
    /// # Errors
    /// Returns [`SchemaError::UnknownSchemaType`] if `schema_type` is neither
    /// `package` nor `registry`.
    pub async fn load_schema_by_name(
        &self,
        schema_type: &str,
        version: Option<&str>,
    ) -> Result<Option<Value>, SchemaError> {
        let schema_type = schema_type.parse::<SchemaType>()?;
        Ok(self
            .load_schema(schema_type, SchemaVersion::from_option(version))
            .await)
    }

    async fn fetch_version(&self, schema_type: SchemaType, version: &str) -> Option<Value> {
        let version = normalize_version(version);
        let url = schema_file_url(&self.releases_base_url, schema_type, &version);

        debug!(
            "Loading {} schema version {} from {}",
            schema_type, version, url
        );
        download_schema(&self.client, &url)
            .await
            .inspect_err(|e| {
                error!(
                    "Error loading {} schema version {}: {}",
                    schema_type, version, e
                )
            })
            .ok()
    }
}

/// Builds the record to persist after a pass.
///
/// With [`CommitPolicy::Snapshot`] the discovery snapshot is written as is.
/// With [`CommitPolicy::PerType`] every type missing from `updated` keeps its
/// previous entry (or none). That covers failed downloads as well as stale
/// types skipped for lack of a URL, so the record never names a version that
/// is not on disk.
pub fn commit_record(
    policy: CommitPolicy,
    latest: SchemaInfo,
    cached: Option<&CacheRecord>,
    updated: &[SchemaType],
) -> CacheRecord {
    match policy {
        CommitPolicy::Snapshot => latest,
        CommitPolicy::PerType => {
            let mut record = latest;
            for schema_type in SchemaType::ALL {
                if !updated.contains(&schema_type) {
                    record.copy_entry_from(schema_type, cached);
                }
            }
            record
        }
    }
}
