//! Fetcher trait for retrieving and materializing schema files

use std::path::Path;

use crate::config::FetchMode;
use crate::schema::error::FetchError;
use crate::schema::types::{SchemaType, VersionDescriptor};

/// Trait for downloading one schema version into its cache directory
#[async_trait::async_trait]
pub trait SchemaFetcher: Send + Sync {
    /// Retrieval mode this implementation handles
    fn mode(&self) -> FetchMode;

    /// Downloads `descriptor` and stores it under `type_dir`, replacing what was there
    ///
    /// # Arguments
    /// * `schema_type` - Type being fetched; decides the expected file name
    /// * `descriptor` - Version to fetch; its URL must be present
    /// * `type_dir` - Cache directory of this schema type (e.g. `<cache>/package`)
    async fn fetch_and_store(
        &self,
        schema_type: SchemaType,
        descriptor: &VersionDescriptor,
        type_dir: &Path,
    ) -> Result<(), FetchError>;
}
