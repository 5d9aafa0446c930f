//! Staleness decisions between a discovery snapshot and the cache record

use tracing::{debug, info, warn};

use crate::schema::types::{CacheRecord, SchemaInfo, SchemaType, VersionDescriptor};

/// Returns true if the cached copy of `schema_type` must be refreshed.
///
/// Versions are compared as opaque strings. Equal versions are still stale
/// when the record is older than the snapshot.
pub fn is_stale(schema_type: SchemaType, latest: &SchemaInfo, cached: Option<&CacheRecord>) -> bool {
    let Some(latest_version) = latest.latest_version(schema_type) else {
        return false;
    };

    let Some(cached) = cached else {
        return true;
    };

    if cached.descriptor(schema_type).is_none() {
        return true;
    }

    match cached.latest_version(schema_type) {
        Some(cached_version) if cached_version == latest_version => {
            cached.updated_at < latest.updated_at
        }
        _ => true,
    }
}

/// Lists the schema types to fetch, with the descriptor to fetch them from.
///
/// Stale types without a usable download URL are logged and left out.
pub fn reconcile(
    latest: &SchemaInfo,
    cached: Option<&CacheRecord>,
) -> Vec<(SchemaType, VersionDescriptor)> {
    let mut to_fetch = Vec::new();

    for schema_type in SchemaType::ALL {
        let Some(latest_version) = latest.latest_version(schema_type) else {
            debug!("No latest version for {} schema", schema_type);
            continue;
        };

        if !is_stale(schema_type, latest, cached) {
            info!(
                "{} schema is up to date (version {}).",
                schema_type, latest_version
            );
            continue;
        }

        match latest.descriptor(schema_type) {
            Some(descriptor) if descriptor.download_url().is_some() => {
                info!(
                    "New {} schema version available: {}",
                    schema_type, latest_version
                );
                to_fetch.push((schema_type, descriptor.clone()));
            }
            _ => warn!("No download URL found for {} schema", schema_type),
        }
    }

    to_fetch
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use rstest::rstest;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, hour, 0, 0).unwrap()
    }

    fn descriptor(version: &str) -> VersionDescriptor {
        VersionDescriptor {
            version: version.to_string(),
            url: Some(format!("https://example.com/{version}.json")),
            release_url: None,
        }
    }

    fn info(updated_at: DateTime<Utc>, package: Option<&str>, registry: Option<&str>) -> SchemaInfo {
        let mut info = SchemaInfo::new(updated_at);
        if let Some(v) = package {
            info.set_entry(SchemaType::Package, descriptor(v));
        }
        if let Some(v) = registry {
            info.set_entry(SchemaType::Registry, descriptor(v));
        }
        info
    }

    fn types(result: &[(SchemaType, VersionDescriptor)]) -> Vec<SchemaType> {
        result.iter().map(|(t, _)| *t).collect()
    }

    #[rstest]
    // Cached equals latest, same timestamp
    #[case(Some("v1.0.0"), 10, "v1.0.0", 10, false)]
    // Cached written after latest snapshot
    #[case(Some("v1.0.0"), 11, "v1.0.0", 10, false)]
    // Same version but older record is conservatively stale
    #[case(Some("v1.0.0"), 9, "v1.0.0", 10, true)]
    // Different version, newer record
    #[case(Some("v0.9.0"), 11, "v1.0.0", 10, true)]
    // No semantic comparison: a "downgrade" is still a change
    #[case(Some("v2.0.0"), 10, "v1.0.0", 10, true)]
    // Missing cached entry
    #[case(None, 10, "v1.0.0", 10, true)]
    fn is_stale_returns_expected(
        #[case] cached_version: Option<&str>,
        #[case] cached_hour: u32,
        #[case] latest_version: &str,
        #[case] latest_hour: u32,
        #[case] expected: bool,
    ) {
        let cached = info(at(cached_hour), cached_version, None);
        let latest = info(at(latest_hour), Some(latest_version), None);

        assert_eq!(is_stale(SchemaType::Package, &latest, Some(&cached)), expected);
    }

    #[test]
    fn is_stale_without_cache_record() {
        let latest = info(at(10), Some("v1.0.0"), None);

        assert!(is_stale(SchemaType::Package, &latest, None));
    }

    #[test]
    fn is_stale_is_false_without_latest_version() {
        let latest = info(at(10), None, None);

        assert!(!is_stale(SchemaType::Package, &latest, None));
    }

    #[test]
    fn reconcile_cold_start_fetches_every_type() {
        let latest = info(at(10), Some("v1.2.0"), Some("v3.0.0"));

        let result = reconcile(&latest, None);

        assert_eq!(types(&result), vec![SchemaType::Package, SchemaType::Registry]);
        assert_eq!(result[0].1, descriptor("v1.2.0"));
        assert_eq!(result[1].1, descriptor("v3.0.0"));
    }

    #[test]
    fn reconcile_only_fetches_changed_type() {
        let latest = info(at(10), Some("v1.2.0"), Some("v3.0.0"));
        let cached = info(at(10), Some("v1.2.0"), Some("v2.9.0"));

        let result = reconcile(&latest, Some(&cached));

        assert_eq!(types(&result), vec![SchemaType::Registry]);
    }

    #[test]
    fn reconcile_same_snapshot_fetches_nothing() {
        let latest = info(at(10), Some("v1.2.0"), Some("v3.0.0"));

        assert!(reconcile(&latest, Some(&latest.clone())).is_empty());
    }

    #[test]
    fn reconcile_refetches_when_record_is_older() {
        let cached = info(at(10), Some("v1.2.0"), Some("v3.0.0"));
        let latest = info(at(10) + Duration::seconds(1), Some("v1.2.0"), Some("v3.0.0"));

        let result = reconcile(&latest, Some(&cached));

        assert_eq!(types(&result), vec![SchemaType::Package, SchemaType::Registry]);
    }

    #[test]
    fn reconcile_skips_type_missing_from_latest() {
        let latest = info(at(10), None, Some("v3.0.0"));

        let result = reconcile(&latest, None);

        assert_eq!(types(&result), vec![SchemaType::Registry]);
    }

    #[test]
    fn reconcile_skips_stale_type_without_download_url() {
        let mut latest = info(at(10), None, Some("v3.0.0"));
        latest.latest_package_version = Some("v1.2.0".to_string());
        latest.package = Some(VersionDescriptor {
            version: "v1.2.0".to_string(),
            url: None,
            release_url: None,
        });

        let result = reconcile(&latest, None);

        assert_eq!(types(&result), vec![SchemaType::Registry]);
    }

    #[test]
    fn reconcile_skips_stale_type_without_descriptor() {
        let mut latest = info(at(10), None, None);
        latest.latest_registry_version = Some("v3.0.0".to_string());

        assert!(reconcile(&latest, None).is_empty());
    }
}
