use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, error, warn};

use crate::config::CACHE_INFO_FILE;
use crate::schema::error::CacheError;
use crate::schema::types::{CacheRecord, SchemaInfo, SchemaType};

/// On-disk schema cache.
///
/// Layout:
/// ```text
/// <root>/schema_info.json
/// <root>/package/hatch_pkg_metadata_schema.json
/// <root>/registry/hatch_all_pkg_metadata_schema.json
/// ```
#[derive(Debug, Clone)]
pub struct SchemaCache {
    root: PathBuf,
}

impl SchemaCache {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn info_path(&self) -> PathBuf {
        self.root.join(CACHE_INFO_FILE)
    }

    /// Directory holding the materialized files of one schema type
    pub fn type_dir(&self, schema_type: SchemaType) -> PathBuf {
        self.root.join(schema_type.as_str())
    }

    pub fn schema_path(&self, schema_type: SchemaType) -> PathBuf {
        self.type_dir(schema_type).join(schema_type.filename())
    }

    /// Reads the cache record. Missing and unreadable records both yield `None`.
    pub fn read_record(&self) -> Option<CacheRecord> {
        let path = self.info_path();
        if !path.exists() {
            debug!("No cached schema info found");
            return None;
        }

        debug!("Reading cached schema info from {:?}", path);
        let content = std::fs::read_to_string(&path)
            .inspect_err(|e| error!("Error reading cached schema info {:?}: {}", path, e))
            .ok()?;

        serde_json::from_str(&content)
            .inspect_err(|e| error!("Error parsing cached schema info {:?}: {}", path, e))
            .ok()
    }

    /// Overwrites the cache record with `info`
    pub fn write_record(&self, info: &SchemaInfo) -> Result<(), CacheError> {
        let path = self.info_path();
        debug!("Writing updated schema info to {:?}", path);

        let content = serde_json::to_vec_pretty(info)?;
        write_atomic(&path, &content).map_err(|source| CacheError::Io { path, source })
    }

    /// Reads and parses a materialized schema, if present
    pub fn read_schema(&self, schema_type: SchemaType) -> Option<Value> {
        let path = self.schema_path(schema_type);
        if !path.exists() {
            warn!("{} schema file not found: {:?}", schema_type, path);
            return None;
        }

        debug!("Loading {} schema from {:?}", schema_type, path);
        let content = std::fs::read(&path)
            .inspect_err(|e| error!("Error reading {} schema: {}", schema_type, e))
            .ok()?;

        serde_json::from_slice(&content)
            .inspect_err(|e| error!("Error parsing {} schema: {}", schema_type, e))
            .ok()
    }
}

/// Replaces `path` with `content` through a temp file in the same directory,
/// so readers never observe a half-written file.
pub(crate) fn write_atomic(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;

    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    file.write_all(content)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}
