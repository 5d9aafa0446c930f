//! Discovery trait for finding the newest published schema versions

#[cfg(test)]
use mockall::automock;

use crate::schema::error::RemoteError;
use crate::schema::types::SchemaInfo;

/// Trait for discovering the latest schema version of every schema type
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait Discovery: Send + Sync {
    /// Human-readable name of the remote source, used in logs
    fn source(&self) -> String;

    /// Fetches a snapshot of the latest version per schema type
    ///
    /// # Returns
    /// * `Ok(SchemaInfo)` - Snapshot stamped with the local time of the call
    /// * `Err(RemoteError)` - If the source is unreachable or its response is malformed
    async fn fetch_latest_info(&self) -> Result<SchemaInfo, RemoteError>;
}
