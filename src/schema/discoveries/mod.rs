//! Discovery implementations for finding the latest schema versions

pub mod manifest;
pub mod releases;

pub use manifest::ManifestDiscovery;
pub use releases::ReleasesDiscovery;
