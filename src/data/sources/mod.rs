//! Clients for the two upstream data sources

pub mod nflverse;
pub mod pfr;

use std::path::{Path, PathBuf};

/// Derive a flat cache file name from a URL
pub(crate) fn cache_file_name(cache_dir: &Path, url: &str, extension: &str) -> PathBuf {
    let filename = url
        .replace("https://", "")
        .replace("http://", "")
        .replace('/', "_")
        .replace('?', "_")
        + extension;
    cache_dir.join(filename)
}
