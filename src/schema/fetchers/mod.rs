//! Fetcher implementations for materializing schemas

pub mod archive;
pub mod direct;

pub use archive::ArchiveFetcher;
pub use direct::DirectFileFetcher;
