//! Tool cache store
//!
//! Adopts staged installation directories and looks up completed ones.
//! The completion marker is written only after the directory move has
//! finished, so a crash mid-store leaves a partial entry that lookups
//! ignore and the next store deletes and redoes.

use crate::cache::entry::{CacheEntry, CacheState};
use crate::error::{LeinupError, LeinupResult};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// Filesystem-backed cache of tool installations
#[derive(Debug, Clone)]
pub struct ToolCache {
    root: PathBuf,
}

impl ToolCache {
    /// Create a cache rooted at `root` (created lazily on first store)
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Cache root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_dir(&self, tool: &str, version: &str, arch: &str) -> PathBuf {
        self.root.join(tool).join(version).join(arch)
    }

    fn marker_path(&self, tool: &str, version: &str, arch: &str) -> PathBuf {
        self.root
            .join(tool)
            .join(version)
            .join(format!("{arch}.complete"))
    }

    /// Look up a completed entry
    ///
    /// Returns the installation directory only when both the directory
    /// and its completion marker exist.
    pub async fn find(&self, tool: &str, version: &str, arch: &str) -> Option<PathBuf> {
        let dir = self.entry_dir(tool, version, arch);
        let marker = self.marker_path(tool, version, arch);

        let dir_ok = fs::metadata(&dir)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        if !dir_ok {
            return None;
        }
        let marker_ok = fs::try_exists(&marker).await.unwrap_or(false);
        if !marker_ok {
            debug!(path = %dir.display(), "cache entry has no completion marker, ignoring");
            return None;
        }
        Some(dir)
    }

    /// Adopt a staged directory as the entry for `(tool, version, arch)`
    ///
    /// Ownership of `staged` transfers to the cache; the contents end up
    /// at the returned stable path. A pre-existing (necessarily partial)
    /// entry is deleted first.
    pub async fn store(
        &self,
        staged: &Path,
        tool: &str,
        version: &str,
        arch: &str,
    ) -> LeinupResult<PathBuf> {
        let meta = fs::metadata(staged)
            .await
            .map_err(|_| LeinupError::PathNotFound(staged.to_path_buf()))?;
        if !meta.is_dir() {
            return Err(LeinupError::CacheEntryInvalid(staged.to_path_buf()));
        }

        let dest = self.entry_dir(tool, version, arch);
        let marker = self.marker_path(tool, version, arch);

        // Delete-and-redo for any leftover from an interrupted store
        if fs::try_exists(&dest).await.unwrap_or(false) {
            warn!(path = %dest.display(), "replacing partial cache entry");
            fs::remove_dir_all(&dest)
                .await
                .map_err(|e| LeinupError::io(format!("removing {}", dest.display()), e))?;
        }
        if fs::try_exists(&marker).await.unwrap_or(false) {
            fs::remove_file(&marker)
                .await
                .map_err(|e| LeinupError::io(format!("removing {}", marker.display()), e))?;
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| LeinupError::io(format!("creating {}", parent.display()), e))?;
        }

        move_dir(staged, &dest).await?;

        // Marker last: its presence asserts the move above finished
        fs::write(&marker, b"")
            .await
            .map_err(|e| LeinupError::io(format!("writing {}", marker.display()), e))?;

        debug!(path = %dest.display(), "cache entry stored");
        Ok(dest)
    }

    /// Enumerate every entry for `tool`, partial ones included
    pub async fn entries(&self, tool: &str) -> LeinupResult<Vec<CacheEntry>> {
        let tool_dir = self.root.join(tool);
        let mut out = Vec::new();

        let mut versions = match fs::read_dir(&tool_dir).await {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(out),
            Err(e) => return Err(LeinupError::io(format!("reading {}", tool_dir.display()), e)),
        };

        while let Some(version_entry) = versions
            .next_entry()
            .await
            .map_err(|e| LeinupError::io(format!("reading {}", tool_dir.display()), e))?
        {
            let version_path = version_entry.path();
            if !version_path.is_dir() {
                continue;
            }
            let version = version_entry.file_name().to_string_lossy().into_owned();

            let mut arches = fs::read_dir(&version_path)
                .await
                .map_err(|e| LeinupError::io(format!("reading {}", version_path.display()), e))?;
            while let Some(arch_entry) = arches
                .next_entry()
                .await
                .map_err(|e| LeinupError::io(format!("reading {}", version_path.display()), e))?
            {
                let path = arch_entry.path();
                if !path.is_dir() {
                    // Completion markers are the only files at this level
                    continue;
                }
                let arch = arch_entry.file_name().to_string_lossy().into_owned();
                let marker = version_path.join(format!("{arch}.complete"));
                let state = if fs::try_exists(&marker).await.unwrap_or(false) {
                    CacheState::Complete
                } else {
                    CacheState::Partial
                };
                let created_at = entry_timestamp(&path).await;
                out.push(CacheEntry {
                    tool: tool.to_string(),
                    version: version.clone(),
                    arch,
                    state,
                    path,
                    created_at,
                });
            }
        }

        out.sort_by(|a, b| a.version.cmp(&b.version).then(a.arch.cmp(&b.arch)));
        Ok(out)
    }

    /// Remove one entry; returns whether anything was deleted
    pub async fn remove(&self, tool: &str, version: &str, arch: &str) -> LeinupResult<bool> {
        let dir = self.entry_dir(tool, version, arch);
        let marker = self.marker_path(tool, version, arch);
        let mut removed = false;

        if fs::try_exists(&marker).await.unwrap_or(false) {
            fs::remove_file(&marker)
                .await
                .map_err(|e| LeinupError::io(format!("removing {}", marker.display()), e))?;
            removed = true;
        }
        if fs::try_exists(&dir).await.unwrap_or(false) {
            fs::remove_dir_all(&dir)
                .await
                .map_err(|e| LeinupError::io(format!("removing {}", dir.display()), e))?;
            removed = true;
        }
        Ok(removed)
    }

    /// Remove every entry for `tool`; returns how many were deleted
    pub async fn clear(&self, tool: &str) -> LeinupResult<usize> {
        let entries = self.entries(tool).await?;
        let count = entries.len();
        if count > 0 {
            let tool_dir = self.root.join(tool);
            fs::remove_dir_all(&tool_dir)
                .await
                .map_err(|e| LeinupError::io(format!("removing {}", tool_dir.display()), e))?;
        }
        Ok(count)
    }
}

async fn entry_timestamp(path: &Path) -> DateTime<Utc> {
    match fs::metadata(path).await.and_then(|m| m.modified()) {
        Ok(t) => DateTime::<Utc>::from(t),
        Err(_) => Utc::now(),
    }
}

/// Move a directory, falling back to copy-and-delete when rename fails
/// (staging usually lives on a different filesystem than the cache)
async fn move_dir(src: &Path, dest: &Path) -> LeinupResult<()> {
    match fs::rename(src, dest).await {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            debug!(
                error = %rename_err,
                "rename failed, copying staged directory instead"
            );
            copy_tree(src, dest).await?;
            fs::remove_dir_all(src)
                .await
                .map_err(|e| LeinupError::io(format!("removing {}", src.display()), e))?;
            Ok(())
        }
    }
}

async fn copy_tree(src: &Path, dest: &Path) -> LeinupResult<()> {
    let mut stack = vec![(src.to_path_buf(), dest.to_path_buf())];
    while let Some((s, d)) = stack.pop() {
        fs::create_dir_all(&d)
            .await
            .map_err(|e| LeinupError::io(format!("creating {}", d.display()), e))?;
        let mut rd = fs::read_dir(&s)
            .await
            .map_err(|e| LeinupError::io(format!("reading {}", s.display()), e))?;
        while let Some(entry) = rd
            .next_entry()
            .await
            .map_err(|e| LeinupError::io(format!("reading {}", s.display()), e))?
        {
            let from = entry.path();
            let to = d.join(entry.file_name());
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| LeinupError::io(format!("inspecting {}", from.display()), e))?;
            if file_type.is_dir() {
                stack.push((from, to));
            } else {
                // fs::copy preserves permission bits, which matters for bin/lein
                fs::copy(&from, &to)
                    .await
                    .map_err(|e| LeinupError::io(format!("copying {}", from.display()), e))?;
            }
        }
    }
    Ok(())
}
