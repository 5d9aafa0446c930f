//! `latest.json` manifest discovery implementation

use std::time::Duration;

use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::schema::discovery::Discovery;
use crate::schema::error::RemoteError;
use crate::schema::http;
use crate::schema::types::{SchemaInfo, VersionDescriptor};

/// Manifest document published next to the releases.
///
/// Its own `updated_at` is ignored; snapshots are stamped locally.
#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default)]
    latest_package_version: Option<String>,
    #[serde(default)]
    latest_registry_version: Option<String>,
    #[serde(default)]
    package: Option<VersionDescriptor>,
    #[serde(default)]
    registry: Option<VersionDescriptor>,
}

impl Manifest {
    fn into_info(self) -> SchemaInfo {
        let mut info = SchemaInfo::new(Utc::now());
        // A version without descriptor is kept; reconciliation logs and skips it
        info.latest_package_version = self
            .latest_package_version
            .or_else(|| self.package.as_ref().map(|d| d.version.clone()));
        info.latest_registry_version = self
            .latest_registry_version
            .or_else(|| self.registry.as_ref().map(|d| d.version.clone()));
        info.package = self.package;
        info.registry = self.registry;
        info
    }
}

/// Discovery that reads a single manifest document
pub struct ManifestDiscovery {
    client: reqwest::Client,
    manifest_url: String,
}

impl ManifestDiscovery {
    pub fn new(manifest_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: http::build_client(timeout)?,
            manifest_url: manifest_url.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl Discovery for ManifestDiscovery {
    fn source(&self) -> String {
        self.manifest_url.clone()
    }

    async fn fetch_latest_info(&self) -> Result<SchemaInfo, RemoteError> {
        debug!("Requesting manifest from {}", self.manifest_url);

        let manifest: Manifest = http::get(&self.client, &self.manifest_url)
            .await?
            .json()
            .await
            .map_err(|e| {
                warn!("Failed to parse schema manifest: {}", e);
                RemoteError::InvalidResponse(e.to_string())
            })?;

        Ok(manifest.into_info())
    }
}
