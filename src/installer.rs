//! Leiningen installer
//!
//! `setup(version)` guarantees that on success a working `lein` for that
//! version sits in the tool cache and the returned [`EnvironmentPatch`]
//! exposes it (`LEIN_HOME` plus a PATH prepend of its `bin` directory).
//! A valid cached entry short-circuits the download entirely.

use crate::cache::ToolCache;
use crate::config::Config;
use crate::download::{HttpDownloader, ToolDownloader};
use crate::env::EnvironmentPatch;
use crate::error::{LeinupError, LeinupResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::fs;
use tokio::process::Command;
use tracing::{debug, info};

/// Cache key component for Leiningen installations
pub const TOOL_NAME: &str = "leiningen";

/// Canonical executable name inside `bin/`
pub const EXECUTABLE: &str = "lein";

/// Home directory variable exported on success
pub const HOME_VAR: &str = "LEIN_HOME";

/// Normalize a requested version into a stable cache key
///
/// Pads to `major.minor.patch`, joining any extra dot segments into the
/// patch with `-`. The rule only has to be stable; the version itself is
/// validated by nothing but the download.
pub fn cache_version_key(version: &str) -> String {
    let mut parts = version.split('.');
    let major = parts.next().unwrap_or("0");
    let minor = parts.next().unwrap_or("0");
    let rest: Vec<&str> = parts.collect();
    let patch = if rest.is_empty() {
        "0".to_string()
    } else {
        rest.join("-")
    };
    format!("{major}.{minor}.{patch}")
}

/// Smoke-tests a freshly staged executable
#[async_trait]
pub trait BinaryProbe: Send + Sync {
    /// Invoke `binary` once against the staging install rooted at `home`
    async fn probe(&self, binary: &Path, home: &Path) -> LeinupResult<()>;
}

/// Probe that runs `lein -h`
///
/// The staging `LEIN_HOME` and PATH are supplied to the subprocess only;
/// the process environment never sees the staging paths.
pub struct HelpProbe;

#[async_trait]
impl BinaryProbe for HelpProbe {
    async fn probe(&self, binary: &Path, home: &Path) -> LeinupResult<()> {
        let command = format!("{} -h", binary.display());
        debug!(%command, "smoke-testing staged install");

        let path = crate::env::prepend_path(&home.join("bin"))?;
        let output = Command::new(binary)
            .arg("-h")
            .env(HOME_VAR, home)
            .env("PATH", path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| LeinupError::smoke_test(&command, e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(LeinupError::smoke_test(
                &command,
                format!("{}: {}", output.status, stderr.trim()),
            ));
        }
        Ok(())
    }
}

/// Result of a successful [`Installer::setup`]
#[derive(Debug)]
pub struct SetupOutcome {
    /// Final (cached) installation root
    pub tool_home: PathBuf,
    /// Cache key the entry was stored under
    pub version_key: String,
    /// Whether the version was already cached
    pub cache_hit: bool,
    /// Environment changes to export for later job steps
    pub patch: EnvironmentPatch,
}

/// Resolves a version string to a cached, ready-to-run installation
pub struct Installer {
    cache: ToolCache,
    downloader: Box<dyn ToolDownloader>,
    probe: Box<dyn BinaryProbe>,
    base_url: String,
    temp_root: PathBuf,
    smoke_test: bool,
}

impl Installer {
    /// Build an installer from resolved configuration
    pub fn new(config: &Config) -> Self {
        Self {
            cache: ToolCache::new(config.cache_dir()),
            downloader: Box::new(HttpDownloader::new(Duration::from_secs(
                config.download.timeout_secs,
            ))),
            probe: Box::new(HelpProbe),
            base_url: config.download.base_url.clone(),
            temp_root: config.temp_dir(),
            smoke_test: config.install.smoke_test,
        }
    }

    /// Replace the downloader (test seam)
    pub fn with_downloader(mut self, downloader: Box<dyn ToolDownloader>) -> Self {
        self.downloader = downloader;
        self
    }

    /// Replace the smoke-test probe (test seam)
    pub fn with_probe(mut self, probe: Box<dyn BinaryProbe>) -> Self {
        self.probe = probe;
        self
    }

    /// Override the cache root
    pub fn with_cache_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.cache = ToolCache::new(root);
        self
    }

    /// Override the staging/temp root
    pub fn with_temp_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.temp_root = root.into();
        self
    }

    /// The cache this installer reads and writes
    pub fn cache(&self) -> &ToolCache {
        &self.cache
    }

    /// Ensure `version` is installed and describe how to expose it
    pub async fn setup(&self, version: &str) -> LeinupResult<SetupOutcome> {
        let key = cache_version_key(version);
        if semver::Version::parse(version).is_err() {
            debug!(version, "version is not semver-shaped; the download will decide");
        }
        let arch = std::env::consts::ARCH;

        let (tool_home, cache_hit) = match self.cache.find(TOOL_NAME, &key, arch).await {
            Some(path) => {
                debug!(path = %path.display(), "leiningen found in cache");
                (path, true)
            }
            None => (self.install(version, &key, arch).await?, false),
        };

        let mut patch = EnvironmentPatch::new();
        patch.export_var(HOME_VAR, tool_home.to_string_lossy());
        patch.add_path(tool_home.join("bin"));

        Ok(SetupOutcome {
            tool_home,
            version_key: key,
            cache_hit,
            patch,
        })
    }

    /// Download, stage and cache one version
    async fn install(&self, version: &str, key: &str, arch: &str) -> LeinupResult<PathBuf> {
        let url = format!(
            "{}/{}/bin/{}",
            self.base_url.trim_end_matches('/'),
            version,
            EXECUTABLE
        );
        let artifact = self.downloader.download_tool(&url, &self.temp_root).await?;

        let staging = tempfile::Builder::new()
            .prefix("leinup-")
            .tempdir_in(&self.temp_root)
            .map_err(|e| {
                LeinupError::io(format!("creating staging dir in {}", self.temp_root.display()), e)
            })?
            .keep();

        // On failure the staging directory is left behind; cleanup is
        // best effort and happens only after a successful store
        let staged_home = self.install_into_staging(&artifact, &staging).await?;
        info!(path = %staged_home.display(), "leiningen staged");

        let final_path = self.cache.store(&staged_home, TOOL_NAME, key, arch).await?;
        let _ = fs::remove_dir_all(&staging).await;
        Ok(final_path)
    }

    /// Turn one downloaded file into a directory the cache can adopt
    async fn install_into_staging(
        &self,
        artifact: &Path,
        dest_root: &Path,
    ) -> LeinupResult<PathBuf> {
        fs::create_dir_all(dest_root)
            .await
            .map_err(|e| LeinupError::io(format!("creating {}", dest_root.display()), e))?;

        let meta = fs::metadata(artifact)
            .await
            .map_err(|_| LeinupError::PathNotFound(artifact.to_path_buf()))?;
        if !meta.is_file() {
            return Err(LeinupError::NotAFile(artifact.to_path_buf()));
        }

        let home = dest_root.join(TOOL_NAME);
        let bin_dir = home.join("bin");
        let libexec_dir = home.join("libexec");
        fs::create_dir_all(&bin_dir)
            .await
            .map_err(|e| LeinupError::io(format!("creating {}", bin_dir.display()), e))?;
        fs::create_dir_all(&libexec_dir)
            .await
            .map_err(|e| LeinupError::io(format!("creating {}", libexec_dir.display()), e))?;

        let bin_path = bin_dir.join(EXECUTABLE);
        move_file(artifact, &bin_path).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&bin_path, std::fs::Permissions::from_mode(0o755))
                .await
                .map_err(|e| LeinupError::io(format!("chmod {}", bin_path.display()), e))?;
        }

        if self.smoke_test {
            self.probe.probe(&bin_path, &home).await?;
        }

        Ok(home)
    }
}

/// Move a file, falling back to copy-and-delete across filesystems
async fn move_file(src: &Path, dest: &Path) -> LeinupResult<()> {
    match fs::rename(src, dest).await {
        Ok(()) => Ok(()),
        Err(_) => {
            fs::copy(src, dest)
                .await
                .map_err(|e| LeinupError::io(format!("copying {}", src.display()), e))?;
            fs::remove_file(src)
                .await
                .map_err(|e| LeinupError::io(format!("removing {}", src.display()), e))?;
            Ok(())
        }
    }
}
