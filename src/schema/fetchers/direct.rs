//! Direct schema file download

use std::path::Path;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info};

use crate::config::FetchMode;
use crate::schema::cache::write_atomic;
use crate::schema::error::FetchError;
use crate::schema::fetcher::SchemaFetcher;
use crate::schema::http;
use crate::schema::types::{SchemaType, VersionDescriptor};

/// Fetcher that downloads the schema JSON file itself
pub struct DirectFileFetcher {
    client: reqwest::Client,
}

impl DirectFileFetcher {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: http::build_client(timeout)?,
        })
    }
}

/// Downloads `url` and parses the body as JSON
pub async fn download_schema(client: &reqwest::Client, url: &str) -> Result<Value, FetchError> {
    let body = http::get_bytes(client, url).await?;
    serde_json::from_slice(&body).map_err(FetchError::InvalidSchema)
}

#[async_trait::async_trait]
impl SchemaFetcher for DirectFileFetcher {
    fn mode(&self) -> FetchMode {
        FetchMode::Direct
    }

    async fn fetch_and_store(
        &self,
        schema_type: SchemaType,
        descriptor: &VersionDescriptor,
        type_dir: &Path,
    ) -> Result<(), FetchError> {
        let url = descriptor
            .download_url()
            .ok_or_else(|| FetchError::MissingUrl(schema_type.to_string()))?;

        info!("Downloading {} schema from {}", schema_type, url);
        let schema = download_schema(&self.client, url).await?;

        let path = type_dir.join(schema_type.filename());
        let content = serde_json::to_vec_pretty(&schema).map_err(FetchError::InvalidSchema)?;
        write_atomic(&path, &content)
            .map_err(|e| FetchError::io("Failed to write schema file", &path, e))?;

        debug!("{} schema saved to {:?}", schema_type, path);
        Ok(())
    }
}
