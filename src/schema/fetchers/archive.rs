//! Zip archive download and extraction

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::FetchMode;
use crate::schema::error::FetchError;
use crate::schema::fetcher::SchemaFetcher;
use crate::schema::http;
use crate::schema::types::{SchemaType, VersionDescriptor};

/// Fetcher that downloads a zip archive and unpacks it into the type directory.
///
/// The archive must contain exactly one top-level directory holding the
/// schema file; its contents become the new type directory.
pub struct ArchiveFetcher {
    client: reqwest::Client,
}

impl ArchiveFetcher {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: http::build_client(timeout)?,
        })
    }
}

#[async_trait::async_trait]
impl SchemaFetcher for ArchiveFetcher {
    fn mode(&self) -> FetchMode {
        FetchMode::Archive
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

        info!("Downloading {} schema archive from {}", schema_type, url);
        let archive = http::get_bytes(&self.client, url).await?;

        install_archive(&archive, schema_type, type_dir)
    }
}

/// Extracts `archive` next to `type_dir`, validates its layout, then swaps
/// the extracted directory in place of `type_dir`.
pub fn install_archive(
    archive: &[u8],
    schema_type: SchemaType,
    type_dir: &Path,
) -> Result<(), FetchError> {
    let parent = type_dir.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)
        .map_err(|e| FetchError::io("Failed to create cache directory", parent, e))?;

    // Staging lives in the cache root so the final rename stays on one filesystem
    let staging = tempfile::Builder::new()
        .prefix(".staging-")
        .tempdir_in(parent)
        .map_err(|e| FetchError::io("Failed to create staging directory", parent, e))?;

    extract_zip(archive, staging.path())?;
    let root = single_top_level_dir(staging.path())?;

    let schema_file = root.join(schema_type.filename());
    if !schema_file.is_file() {
        return Err(FetchError::MissingSchemaFile(
            type_dir.join(schema_type.filename()),
        ));
    }

    if type_dir.exists() {
        std::fs::remove_dir_all(type_dir)
            .map_err(|e| FetchError::io("Failed to clear schema directory", type_dir, e))?;
    }
    std::fs::rename(&root, type_dir)
        .map_err(|e| FetchError::io("Failed to move extracted schemas", type_dir, e))?;

    debug!("{} schema archive installed to {:?}", schema_type, type_dir);
    Ok(())
}

/// Extracts every entry with a safe relative path into `dest`
pub fn extract_zip(archive: &[u8], dest: &Path) -> Result<(), FetchError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(archive))?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let Some(name) = entry.enclosed_name() else {
            warn!("Skipping zip entry with unsafe path: {}", entry.name());
            continue;
        };
        let out_path = dest.join(name);

        if entry.is_dir() {
            std::fs::create_dir_all(&out_path).map_err(|e| {
                FetchError::io("Failed to create extraction directory", &out_path, e)
            })?;
        } else {
            if let Some(parent) = out_path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    FetchError::io("Failed to create extraction parent directory", parent, e)
                })?;
            }
            let mut outfile = std::fs::File::create(&out_path)
                .map_err(|e| FetchError::io("Failed to create extracted file", &out_path, e))?;
            std::io::copy(&mut entry, &mut outfile)
                .map_err(|e| FetchError::io("Failed to extract archive entry", &out_path, e))?;
        }
    }

    debug!("Extraction complete to {:?}", dest);
    Ok(())
}

/// Returns the only entry of `dir`, which must be a directory
pub fn single_top_level_dir(dir: &Path) -> Result<PathBuf, FetchError> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| FetchError::io("Failed to read extracted archive", dir, e))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| FetchError::io("Failed to read extracted archive", dir, e))?;

    match entries.as_slice() {
        [single] if single.is_dir() => Ok(single.clone()),
        [single] => Err(FetchError::ArchiveLayout(format!(
            "top-level entry {:?} is not a directory",
            single.file_name().unwrap_or_default()
        ))),
        entries => Err(FetchError::ArchiveLayout(format!(
            "expected exactly one top-level directory, found {} entries",
            entries.len()
        ))),
    }
}
