//! Download orchestration: fetch a manifest's archive to a local temp path.

use crate::http::HttpClient;
use crate::runtime::Runtime;
use anyhow::{Context, Result};
use log::info;
use std::path::Path;

/// Downloads an archive from a resolved manifest URL to a temporary path,
/// with retry support.
#[tracing::instrument(skip(runtime, temp_path, http_client))]
pub async fn download_archive<R: Runtime>(
    runtime: &R,
    url: &str,
    temp_path: &Path,
    http_client: &HttpClient,
) -> Result<u64> {
    info!("Downloading {}...", url);

    let temp_path = temp_path.to_path_buf();
    let bytes = http_client
        .download_file(url, || {
            runtime
                .create_file(&temp_path)
                .with_context(|| format!("Failed to create temporary file at {:?}", temp_path))
        })
        .await?;

    info!("Download complete ({} bytes).", bytes);
    Ok(bytes)
}
