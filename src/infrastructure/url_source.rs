//! Newline-delimited URL list

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
#[error("Failed to read URL list {path:?}: {source}")]
pub struct UrlListError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// One URL per non-empty line; surrounding whitespace (including `\r`) is
/// stripped.
#[must_use]
pub fn parse_url_list(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

pub async fn read_url_list(path: impl AsRef<Path>) -> Result<Vec<String>, UrlListError> {
    let path = path.as_ref();
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| UrlListError {
            path: path.to_path_buf(),
            source,
        })?;

    let urls = parse_url_list(&contents);
    info!("📄 Loaded {} URLs from {:?}", urls.len(), path);
    Ok(urls)
}
