use std::path::Path;

use futures_util::StreamExt;
use log::{info, warn};
use reqwest::{Client, StatusCode};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::api::models::ReleaseMetadata;
use crate::platform;

/// Downloads release files sequentially, skipping artifacts that are
/// already complete on disk.
pub struct Downloader {
    client: Client,
}

/// One failed file from a best-effort download pass.
#[derive(Debug)]
pub struct DownloadFailure {
    pub path: String,
    pub error: String,
}

impl Downloader {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Download every file in the release manifest, in manifest order.
    /// Per-file failures are collected and returned; they never abort the
    /// pass, so the caller gets a best-effort tree plus the failure set.
    pub async fn download_release(&self, release: &ReleaseMetadata) -> Vec<DownloadFailure> {
        let mut failures = Vec::new();
        for file in &release.files {
            let Some(local_path) = file.local_path() else {
                warn!("download: skipping file without path or id: {}", file.url);
                continue;
            };
            if let Err(error) = self
                .download_file(Path::new(&local_path), &file.url, file.expected_size())
                .await
            {
                warn!("download: failed to download a file: {error}");
                failures.push(DownloadFailure {
                    path: local_path,
                    error,
                });
            }
        }
        failures
    }

    /// Fetch `url` to `dest`, streaming the body to disk.
    ///
    /// When `expected_size` is positive and `dest` already holds exactly
    /// that many bytes the download is skipped without touching the
    /// network; there is no checksum, so a corrupted same-size file passes.
    ///
    /// # Errors
    /// Returns an error on a non-success response or any I/O failure for
    /// this file; callers treat that as recoverable.
    pub async fn download_file(
        &self,
        dest: &Path,
        url: &str,
        expected_size: i64,
    ) -> Result<(), String> {
        if expected_size > 0
            && let Ok(meta) = fs::metadata(dest).await
            && meta.is_file()
            && meta.len() as i64 == expected_size
        {
            info!(
                "download: skipping, file exists: {}, size matches: {expected_size}",
                dest.display()
            );
            return Ok(());
        }

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| format!("failed to send a HTTP GET request: {e}"))?;

        // Strictly 200: a 204 or 206 body would land on disk as a silently
        // truncated file.
        if resp.status() != StatusCode::OK {
            return Err(format!(
                "failed to download {url} to {}: bad status: {}",
                dest.display(),
                resp.status()
            ));
        }

        if let Some(parent) = dest.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| format!("failed to create a directory {}: {e}", parent.display()))?;
        }

        let mut out = fs::File::create(dest)
            .await
            .map_err(|e| format!("failed to create {}: {e}", dest.display()))?;
        let mut stream = resp.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| format!("download read error for {url}: {e}"))?;
            out.write_all(&chunk)
                .await
                .map_err(|e| format!("failed to write {}: {e}", dest.display()))?;
        }
        out.flush()
            .await
            .map_err(|e| format!("failed to flush {}: {e}", dest.display()))?;
        drop(out);

        mark_executable_if_binary(dest).await;
        Ok(())
    }
}

/// Give recognized server binaries an executable mode. Chmod failures are
/// logged and ignored; on non-unix targets this is a no-op.
pub(crate) async fn mark_executable_if_binary(path: &Path) {
    if !platform::is_server_binary(&path.to_string_lossy()) {
        return;
    }
    #[cfg(unix)]
    {
        use std::fs::Permissions;
        use std::os::unix::fs::PermissionsExt;

        if let Err(err) = fs::set_permissions(path, Permissions::from_mode(0o755)).await {
            warn!(
                "download: failed to change file mode for {}: {err}",
                path.display()
            );
        }
    }
}
