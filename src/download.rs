//! Artifact download
//!
//! The installer talks to a [`ToolDownloader`] trait object so tests can
//! substitute a double (and assert a cache hit performs zero downloads).
//! The production implementation streams over HTTPS via `ureq` into a
//! uniquely named file under the runner temp directory.

use crate::error::{LeinupError, LeinupResult};
use async_trait::async_trait;
use indicatif::ProgressBar;
use sha2::{Digest, Sha256};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};
use ureq::Agent;

/// Fetches a single file by URL into a local path
#[async_trait]
pub trait ToolDownloader: Send + Sync {
    /// Download `url` into a fresh file under `dest_dir`
    ///
    /// Fails with [`LeinupError::Download`] on any non-2xx response or
    /// transport failure. An unresolvable version is only ever detected
    /// here, as a failed fetch.
    async fn download_tool(&self, url: &str, dest_dir: &Path) -> LeinupResult<PathBuf>;
}

/// HTTP downloader backed by `ureq` with rustls
pub struct HttpDownloader {
    timeout: Duration,
}

impl HttpDownloader {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for HttpDownloader {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}

#[async_trait]
impl ToolDownloader for HttpDownloader {
    async fn download_tool(&self, url: &str, dest_dir: &Path) -> LeinupResult<PathBuf> {
        tokio::fs::create_dir_all(dest_dir)
            .await
            .map_err(|e| LeinupError::io(format!("creating {}", dest_dir.display()), e))?;

        info!(url, "downloading artifact");

        let url_owned = url.to_string();
        let dest = dest_dir.to_path_buf();
        let timeout = self.timeout;

        // ureq is blocking; keep it off the async runtime
        let path = tokio::task::spawn_blocking(move || fetch_to_file(&url_owned, &dest, timeout))
            .await
            .map_err(|e| LeinupError::download(url, format!("download task failed: {e}")))??;

        Ok(path)
    }
}

fn fetch_to_file(url: &str, dest_dir: &Path, timeout: Duration) -> LeinupResult<PathBuf> {
    let config = Agent::config_builder()
        .timeout_global(Some(timeout))
        .build();
    let agent: Agent = config.into();

    let response = agent
        .get(url)
        .call()
        .map_err(|e| LeinupError::download(url, describe(e)))?;

    let total = response.body().content_length();
    let reader = response.into_body().into_reader();

    let progress = if console::Term::stderr().is_term() {
        match total {
            Some(len) => ProgressBar::new(len),
            None => ProgressBar::new_spinner(),
        }
    } else {
        ProgressBar::hidden()
    };

    let mut reader = progress.wrap_read(reader);

    let tmp = tempfile::Builder::new()
        .prefix("lein-download-")
        .tempfile_in(dest_dir)
        .map_err(|e| LeinupError::io(format!("creating temp file in {}", dest_dir.display()), e))?;
    let mut file = tmp.as_file();

    let mut hasher = Sha256::new();
    let mut total_bytes: u64 = 0;
    let mut buf = [0u8; 8192];
    loop {
        let n = reader
            .read(&mut buf)
            .map_err(|e| LeinupError::download(url, format!("read failed: {e}")))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        file.write_all(&buf[..n])
            .map_err(|e| LeinupError::io("writing downloaded artifact", e))?;
        total_bytes += n as u64;
    }
    file.flush()
        .map_err(|e| LeinupError::io("flushing downloaded artifact", e))?;
    progress.finish_and_clear();

    let (_, path) = tmp
        .keep()
        .map_err(|e| LeinupError::io("persisting downloaded artifact", e.error))?;

    debug!(
        url,
        bytes = total_bytes,
        sha256 = %hex::encode(hasher.finalize()),
        path = %path.display(),
        "download complete"
    );

    Ok(path)
}

fn describe(err: ureq::Error) -> String {
    match err {
        ureq::Error::StatusCode(code) => format!("HTTP status {code}"),
        other => other.to_string(),
    }
}
