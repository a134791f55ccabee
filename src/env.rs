//! Environment export for CI job steps
//!
//! The installer never mutates the process environment directly. It
//! returns an [`EnvironmentPatch`] describing the variable assignments
//! and PATH prepends a successful install requires, and an
//! [`EnvironmentExporter`] applies the patch at the boundary. On GitHub
//! runners the export is persisted through the `GITHUB_ENV` /
//! `GITHUB_PATH` files so it survives into subsequent job steps.

use crate::error::{LeinupError, LeinupResult};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment changes produced by a successful setup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentPatch {
    /// Variable assignments, in application order
    pub vars: Vec<(String, String)>,
    /// Directories to prepend to PATH, in application order
    pub path_prepends: Vec<PathBuf>,
}

impl EnvironmentPatch {
    /// Create an empty patch
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a variable assignment
    pub fn export_var(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.push((name.into(), value.into()));
    }

    /// Record a PATH prepend
    pub fn add_path(&mut self, dir: impl Into<PathBuf>) {
        self.path_prepends.push(dir.into());
    }

    /// Whether the patch contains no changes
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty() && self.path_prepends.is_empty()
    }

    /// Look up the last assignment for a variable
    pub fn var(&self, name: &str) -> Option<&str> {
        self.vars
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Applies an [`EnvironmentPatch`] to some persistence mechanism
pub trait EnvironmentExporter {
    /// Persist a single variable assignment
    fn export_variable(&self, name: &str, value: &str) -> LeinupResult<()>;

    /// Persist a PATH prepend
    fn add_path(&self, dir: &Path) -> LeinupResult<()>;

    /// Apply a whole patch, variables first, then PATH prepends
    fn apply(&self, patch: &EnvironmentPatch) -> LeinupResult<()> {
        for (name, value) in &patch.vars {
            self.export_variable(name, value)?;
        }
        for dir in &patch.path_prepends {
            self.add_path(dir)?;
        }
        Ok(())
    }
}

/// Exporter that persists through GitHub runner command files
///
/// Appends `NAME=value` lines to the file named by `GITHUB_ENV` and bare
/// directory lines to the file named by `GITHUB_PATH`. Later job steps
/// see the result; the current process environment is untouched.
pub struct RunnerFileExporter {
    env_file: PathBuf,
    path_file: PathBuf,
}

impl RunnerFileExporter {
    pub fn new(env_file: PathBuf, path_file: PathBuf) -> Self {
        Self {
            env_file,
            path_file,
        }
    }

    /// Build from `GITHUB_ENV` / `GITHUB_PATH` if both are set
    pub fn from_env() -> Option<Self> {
        let env_file = std::env::var_os("GITHUB_ENV")?;
        let path_file = std::env::var_os("GITHUB_PATH")?;
        Some(Self::new(PathBuf::from(env_file), PathBuf::from(path_file)))
    }

    fn append_line(file: &Path, line: &str) -> LeinupResult<()> {
        use std::io::Write;

        let mut f = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(file)
            .map_err(|e| LeinupError::io(format!("opening {}", file.display()), e))?;
        writeln!(f, "{}", line)
            .map_err(|e| LeinupError::io(format!("writing {}", file.display()), e))
    }
}

impl EnvironmentExporter for RunnerFileExporter {
    fn export_variable(&self, name: &str, value: &str) -> LeinupResult<()> {
        // The simple NAME=value form cannot carry newlines
        if value.contains('\n') || name.contains('\n') || name.contains('=') {
            return Err(LeinupError::EnvExport {
                name: name.to_string(),
                reason: "value or name contains characters the env file cannot hold".to_string(),
            });
        }
        debug!(name, value, "exporting variable via runner env file");
        Self::append_line(&self.env_file, &format!("{}={}", name, value))
    }

    fn add_path(&self, dir: &Path) -> LeinupResult<()> {
        let dir_str = dir.to_string_lossy();
        if dir_str.contains('\n') {
            return Err(LeinupError::EnvExport {
                name: "PATH".to_string(),
                reason: "directory contains a newline".to_string(),
            });
        }
        debug!(dir = %dir.display(), "prepending PATH via runner path file");
        Self::append_line(&self.path_file, &dir_str)
    }
}

/// Exporter that mutates the current process environment
///
/// Used outside GitHub runners, where there is no exported-state file
/// and only the current process (and its children) can benefit.
pub struct ProcessExporter;

impl EnvironmentExporter for ProcessExporter {
    fn export_variable(&self, name: &str, value: &str) -> LeinupResult<()> {
        debug!(name, value, "exporting variable in process environment");
        std::env::set_var(name, value);
        Ok(())
    }

    fn add_path(&self, dir: &Path) -> LeinupResult<()> {
        debug!(dir = %dir.display(), "prepending PATH in process environment");
        std::env::set_var("PATH", prepend_path(dir)?);
        Ok(())
    }
}

/// Compute a new PATH value with `dir` prepended to the current one
pub fn prepend_path(dir: &Path) -> LeinupResult<std::ffi::OsString> {
    let current = std::env::var_os("PATH").unwrap_or_default();
    let mut parts = vec![dir.to_path_buf()];
    parts.extend(std::env::split_paths(&current));
    std::env::join_paths(parts).map_err(|e| LeinupError::EnvExport {
        name: "PATH".to_string(),
        reason: e.to_string(),
    })
}

/// Pick the exporter appropriate for the current environment
pub fn detect_exporter() -> Box<dyn EnvironmentExporter> {
    match RunnerFileExporter::from_env() {
        Some(exporter) => Box::new(exporter),
        None => Box::new(ProcessExporter),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn patch_records_in_order() {
        let mut patch = EnvironmentPatch::new();
        assert!(patch.is_empty());

        patch.export_var("LEIN_HOME", "/tools/leiningen/2.9.1/x86_64");
        patch.add_path("/tools/leiningen/2.9.1/x86_64/bin");

        assert!(!patch.is_empty());
        assert_eq!(patch.var("LEIN_HOME"), Some("/tools/leiningen/2.9.1/x86_64"));
        assert_eq!(patch.path_prepends.len(), 1);
    }

    #[test]
    fn patch_last_assignment_wins() {
        let mut patch = EnvironmentPatch::new();
        patch.export_var("LEIN_HOME", "/staging");
        patch.export_var("LEIN_HOME", "/final");
        assert_eq!(patch.var("LEIN_HOME"), Some("/final"));
    }

    #[test]
    fn runner_file_exporter_appends() {
        let dir = tempfile::tempdir().unwrap();
        let env_file = dir.path().join("env");
        let path_file = dir.path().join("path");
        let exporter = RunnerFileExporter::new(env_file.clone(), path_file.clone());

        let mut patch = EnvironmentPatch::new();
        patch.export_var("LEIN_HOME", "/tools/lein");
        patch.add_path("/tools/lein/bin");
        exporter.apply(&patch).unwrap();

        let env_contents = std::fs::read_to_string(&env_file).unwrap();
        assert_eq!(env_contents, "LEIN_HOME=/tools/lein\n");
        let path_contents = std::fs::read_to_string(&path_file).unwrap();
        assert_eq!(path_contents, "/tools/lein/bin\n");
    }

    #[test]
    fn runner_file_exporter_rejects_newlines() {
        let dir = tempfile::tempdir().unwrap();
        let exporter =
            RunnerFileExporter::new(dir.path().join("env"), dir.path().join("path"));
        let result = exporter.export_variable("LEIN_HOME", "bad\nvalue");
        assert!(matches!(result, Err(LeinupError::EnvExport { .. })));
    }

    #[test]
    fn runner_file_exporter_rejects_equals_in_name() {
        let dir = tempfile::tempdir().unwrap();
        let exporter =
            RunnerFileExporter::new(dir.path().join("env"), dir.path().join("path"));
        assert!(exporter.export_variable("A=B", "v").is_err());
    }

    #[test]
    #[serial]
    fn process_exporter_sets_var_and_path() {
        let exporter = ProcessExporter;
        exporter.export_variable("LEINUP_TEST_HOME", "/tools/lein").unwrap();
        assert_eq!(
            std::env::var("LEINUP_TEST_HOME").unwrap(),
            "/tools/lein"
        );
        std::env::remove_var("LEINUP_TEST_HOME");

        let original = std::env::var_os("PATH");
        exporter.add_path(Path::new("/tools/lein/bin")).unwrap();
        let updated = std::env::var_os("PATH").unwrap();
        let first = std::env::split_paths(&updated).next().unwrap();
        assert_eq!(first, PathBuf::from("/tools/lein/bin"));
        if let Some(orig) = original {
            std::env::set_var("PATH", orig);
        }
    }

    #[test]
    #[serial]
    fn detect_exporter_prefers_runner_files() {
        let dir = tempfile::tempdir().unwrap();
        std::env::set_var("GITHUB_ENV", dir.path().join("env"));
        std::env::set_var("GITHUB_PATH", dir.path().join("path"));
        assert!(RunnerFileExporter::from_env().is_some());
        std::env::remove_var("GITHUB_ENV");
        std::env::remove_var("GITHUB_PATH");
        assert!(RunnerFileExporter::from_env().is_none());
    }
}
