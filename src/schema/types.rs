//! Common types for schema discovery and caching

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::schema::error::SchemaError;

/// Kind of schema managed by the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaType {
    /// Metadata schema of a single package (hatch_pkg_metadata_schema.json)
    Package,
    /// Schema of the whole package registry (hatch_all_pkg_metadata_schema.json)
    Registry,
}

impl SchemaType {
    /// All schema types, in the order they are reconciled
    pub const ALL: [SchemaType; 2] = [SchemaType::Package, SchemaType::Registry];

    /// Returns the string representation of the schema type
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaType::Package => "package",
            SchemaType::Registry => "registry",
        }
    }

    /// Fixed file name of the schema inside its cache directory and release
    pub fn filename(&self) -> &'static str {
        match self {
            SchemaType::Package => "hatch_pkg_metadata_schema.json",
            SchemaType::Registry => "hatch_all_pkg_metadata_schema.json",
        }
    }

    /// Prefix of release tags publishing this schema type
    pub fn tag_prefix(&self) -> &'static str {
        match self {
            SchemaType::Package => "schemas-package-",
            SchemaType::Registry => "schemas-registry-",
        }
    }

    /// Release tag for a given version (e.g. `schemas-package-v1.2.0`)
    pub fn release_tag(&self, version: &str) -> String {
        format!("{}{}", self.tag_prefix(), version)
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SchemaType {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "package" => Ok(SchemaType::Package),
            "registry" => Ok(SchemaType::Registry),
            _ => Err(SchemaError::UnknownSchemaType(s.to_string())),
        }
    }
}

/// Where a specific schema version can be retrieved from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionDescriptor {
    pub version: String,
    /// Direct file URL, or archive URL (`download_url` in manifests)
    #[serde(default, alias = "download_url", skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_url: Option<String>,
}

impl VersionDescriptor {
    /// The retrieval URL, if one is present and non-empty
    pub fn download_url(&self) -> Option<&str> {
        self.url.as_deref().filter(|url| !url.is_empty())
    }
}

/// Snapshot of the newest known version per schema type.
///
/// Produced by discovery and persisted unchanged as the cache record
/// (`schema_info.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SchemaInfo {
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_package_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_registry_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<VersionDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry: Option<VersionDescriptor>,
}

/// The persisted form of [`SchemaInfo`]
pub type CacheRecord = SchemaInfo;

impl SchemaInfo {
    /// Creates an empty snapshot taken at `updated_at`
    pub fn new(updated_at: DateTime<Utc>) -> Self {
        Self {
            updated_at,
            ..Self::default()
        }
    }

    pub fn latest_version(&self, schema_type: SchemaType) -> Option<&str> {
        match schema_type {
            SchemaType::Package => self.latest_package_version.as_deref(),
            SchemaType::Registry => self.latest_registry_version.as_deref(),
        }
    }

    pub fn descriptor(&self, schema_type: SchemaType) -> Option<&VersionDescriptor> {
        match schema_type {
            SchemaType::Package => self.package.as_ref(),
            SchemaType::Registry => self.registry.as_ref(),
        }
    }

    /// Returns true if the snapshot has no entry for any schema type
    pub fn is_empty(&self) -> bool {
        SchemaType::ALL
            .iter()
            .all(|t| self.latest_version(*t).is_none() && self.descriptor(*t).is_none())
    }

    /// Records `descriptor` as the latest version of `schema_type`
    pub fn set_entry(&mut self, schema_type: SchemaType, descriptor: VersionDescriptor) {
        let version = Some(descriptor.version.clone());
        match schema_type {
            SchemaType::Package => {
                self.latest_package_version = version;
                self.package = Some(descriptor);
            }
            SchemaType::Registry => {
                self.latest_registry_version = version;
                self.registry = Some(descriptor);
            }
        }
    }

    /// Replaces the entry of `schema_type` with the one found in `other` (or none)
    pub fn copy_entry_from(&mut self, schema_type: SchemaType, other: Option<&SchemaInfo>) {
        let version = other.and_then(|o| o.latest_version(schema_type).map(str::to_string));
        let descriptor = other.and_then(|o| o.descriptor(schema_type).cloned());
        match schema_type {
            SchemaType::Package => {
                self.latest_package_version = version;
                self.package = descriptor;
            }
            SchemaType::Registry => {
                self.latest_registry_version = version;
                self.registry = descriptor;
            }
        }
    }
}

/// Which version of a schema a caller wants
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SchemaVersion {
    /// Whatever the reconciled cache holds
    #[default]
    Latest,
    /// An exact release, fetched directly and never cached
    Exact(String),
}

impl SchemaVersion {
    pub fn from_option(version: Option<&str>) -> Self {
        match version {
            Some(v) => SchemaVersion::Exact(v.to_string()),
            None => SchemaVersion::Latest,
        }
    }
}

/// Adds the `v` prefix used by release tags when it is missing
pub fn normalize_version(version: &str) -> String {
    if version.starts_with('v') {
        version.to_string()
    } else {
        format!("v{version}")
    }
}
