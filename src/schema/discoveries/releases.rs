//! GitHub Releases API discovery implementation

use std::time::Duration;

use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::schema::discovery::Discovery;
use crate::schema::error::RemoteError;
use crate::schema::http;
use crate::schema::types::{SchemaInfo, SchemaType, VersionDescriptor};

/// Response item from GitHub Releases API
#[derive(Debug, Deserialize)]
struct Release {
    tag_name: String,
    #[serde(default)]
    html_url: Option<String>,
}

/// Discovery that lists repository releases and matches their tags
pub struct ReleasesDiscovery {
    client: reqwest::Client,
    api_base_url: String,
    releases_base_url: String,
}

impl ReleasesDiscovery {
    /// Creates a discovery for the repository at `api_base_url`
    /// (e.g. `https://api.github.com/repos/<owner>/<repo>`).
    pub fn new(
        api_base_url: &str,
        releases_base_url: &str,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: http::build_client(timeout)?,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            releases_base_url: releases_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn descriptor(&self, schema_type: SchemaType, version: &str, release: &Release) -> VersionDescriptor {
        VersionDescriptor {
            version: version.to_string(),
            url: Some(schema_file_url(&self.releases_base_url, schema_type, version)),
            release_url: release.html_url.clone(),
        }
    }
}

/// Direct download URL of a schema file published in a release
pub fn schema_file_url(releases_base_url: &str, schema_type: SchemaType, version: &str) -> String {
    format!(
        "{}/{}/{}",
        releases_base_url.trim_end_matches('/'),
        schema_type.release_tag(version),
        schema_type.filename()
    )
}

#[async_trait::async_trait]
impl Discovery for ReleasesDiscovery {
    fn source(&self) -> String {
        format!("{}/releases", self.api_base_url)
    }

    async fn fetch_latest_info(&self) -> Result<SchemaInfo, RemoteError> {
        let url = self.source();
        debug!("Requesting releases from {}", url);

        let releases: Vec<Release> = http::get(&self.client, &url)
            .await?
            .json()
            .await
            .map_err(|e| {
                warn!("Failed to parse GitHub releases response: {}", e);
                RemoteError::InvalidResponse(e.to_string())
            })?;

        let mut info = SchemaInfo::new(Utc::now());

        // Releases are trusted to come newest first; the first tag per type wins
        for release in &releases {
            for schema_type in SchemaType::ALL {
                let Some(version) = release.tag_name.strip_prefix(schema_type.tag_prefix()) else {
                    continue;
                };
                if info.latest_version(schema_type).is_none() {
                    info.set_entry(schema_type, self.descriptor(schema_type, version, release));
                }
            }
        }

        debug!(
            "Discovered package={:?} registry={:?} from {} releases",
            info.latest_version(SchemaType::Package),
            info.latest_version(SchemaType::Registry),
            releases.len()
        );
        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    fn discovery(server: &Server) -> ReleasesDiscovery {
        ReleasesDiscovery::new(
            &format!("{}/repos/owner/schemas", server.url()),
            "https://example.com/download",
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn fetch_latest_info_takes_first_matching_tag_per_type() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/repos/owner/schemas/releases")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[
                    {"tag_name": "schemas-registry-v3.0.0", "html_url": "https://example.com/r3"},
                    {"tag_name": "schemas-package-v1.2.0", "html_url": "https://example.com/p12"},
                    {"tag_name": "schemas-package-v1.3.0", "html_url": "https://example.com/p13"},
                    {"tag_name": "unrelated-v9.9.9", "html_url": "https://example.com/u"},
                    {"tag_name": "schemas-registry-v2.9.0", "html_url": "https://example.com/r29"}
                ]"#,
            )
            .create_async()
            .await;

        let before = Utc::now();
        let info = discovery(&server).fetch_latest_info().await.unwrap();
        let after = Utc::now();

        mock.assert_async().await;
        assert_eq!(info.latest_version(SchemaType::Package), Some("v1.2.0"));
        assert_eq!(info.latest_version(SchemaType::Registry), Some("v3.0.0"));
        assert_eq!(
            info.descriptor(SchemaType::Package),
            Some(&VersionDescriptor {
                version: "v1.2.0".to_string(),
                url: Some(
                    "https://example.com/download/schemas-package-v1.2.0/hatch_pkg_metadata_schema.json"
                        .to_string()
                ),
                release_url: Some("https://example.com/p12".to_string()),
            })
        );
        assert_eq!(
            info.descriptor(SchemaType::Registry)
                .and_then(|d| d.download_url()),
            Some(
                "https://example.com/download/schemas-registry-v3.0.0/hatch_all_pkg_metadata_schema.json"
            )
        );
        assert!(info.updated_at >= before && info.updated_at <= after);
    }

    #[tokio::test]
    async fn fetch_latest_info_returns_empty_snapshot_without_schema_releases() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/repos/owner/schemas/releases")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"tag_name": "v1.0.0", "html_url": "https://example.com"}]"#)
            .create_async()
            .await;

        let info = discovery(&server).fetch_latest_info().await.unwrap();

        mock.assert_async().await;
        assert!(info.is_empty());
    }

    #[tokio::test]
    async fn fetch_latest_info_rejects_malformed_response() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/repos/owner/schemas/releases")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message": "not a list"}"#)
            .create_async()
            .await;

        let result = discovery(&server).fetch_latest_info().await;

        mock.assert_async().await;
        assert!(matches!(result, Err(RemoteError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn fetch_latest_info_returns_rate_limited_for_429() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/repos/owner/schemas/releases")
            .with_status(429)
            .with_header("retry-after", "30")
            .with_body(r#"{"message": "API rate limit exceeded"}"#)
            .create_async()
            .await;

        let result = discovery(&server).fetch_latest_info().await;

        mock.assert_async().await;
        assert!(matches!(
            result,
            Err(RemoteError::RateLimited {
                retry_after_secs: Some(30)
            })
        ));
    }

    #[test]
    fn schema_file_url_ignores_trailing_slash() {
        assert_eq!(
            schema_file_url("https://example.com/download/", SchemaType::Registry, "v1"),
            "https://example.com/download/schemas-registry-v1/hatch_all_pkg_metadata_schema.json"
        );
    }
}
