//! Integration tests for leinup

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;

    fn leinup() -> Command {
        cargo_bin_cmd!("leinup")
    }

    fn seed_cache_entry(root: &std::path::Path, version: &str, arch: &str) {
        let dir = root.join("leiningen").join(version).join(arch);
        std::fs::create_dir_all(dir.join("bin")).unwrap();
        std::fs::write(dir.join("bin").join("lein"), "#!/bin/sh\nexit 0\n").unwrap();
        std::fs::write(
            root.join("leiningen")
                .join(version)
                .join(format!("{arch}.complete")),
            "",
        )
        .unwrap();
    }

    #[test]
    fn help_displays() {
        leinup()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Leiningen installer"));
    }

    #[test]
    fn version_displays() {
        leinup()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("leinup"));
    }

    #[test]
    fn config_path() {
        leinup()
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        leinup()
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[download]"));
    }

    #[test]
    fn config_init_writes_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        leinup()
            .args(["--config", path.to_str().unwrap(), "config", "init"])
            .assert()
            .success();
        assert!(path.is_file());

        // Second init without --force refuses
        leinup()
            .args(["--config", path.to_str().unwrap(), "config", "init"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("already exists"));
    }

    #[test]
    fn cache_list_empty() {
        let tmp = tempfile::tempdir().unwrap();
        leinup()
            .env("RUNNER_TOOL_CACHE", tmp.path())
            .args(["cache", "list"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No cached installations"));
    }

    #[test]
    fn cache_list_shows_seeded_entry() {
        let tmp = tempfile::tempdir().unwrap();
        seed_cache_entry(tmp.path(), "2.9.1", std::env::consts::ARCH);

        leinup()
            .env("RUNNER_TOOL_CACHE", tmp.path())
            .args(["cache", "list"])
            .assert()
            .success()
            .stdout(predicate::str::contains("2.9.1").and(predicate::str::contains("complete")));
    }

    #[test]
    fn cache_clean_removes_entry() {
        let tmp = tempfile::tempdir().unwrap();
        seed_cache_entry(tmp.path(), "2.9.1", std::env::consts::ARCH);

        leinup()
            .env("RUNNER_TOOL_CACHE", tmp.path())
            .args(["cache", "clean", "2.9.1", "--yes"])
            .assert()
            .success()
            .stdout(predicate::str::contains("removed 1"));

        leinup()
            .env("RUNNER_TOOL_CACHE", tmp.path())
            .args(["cache", "list"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No cached installations"));
    }

    #[test]
    fn install_requires_version() {
        leinup().arg("install").assert().failure();
    }

    #[test]
    fn install_unreachable_mirror_fails_with_download_error() {
        let tmp = tempfile::tempdir().unwrap();
        let config = tmp.path().join("config.toml");
        // Port 9 (discard) refuses connections; the version can only
        // fail at download time
        std::fs::write(
            &config,
            "[download]\nbase_url = \"http://127.0.0.1:9\"\ntimeout_secs = 2\n",
        )
        .unwrap();

        leinup()
            .env("RUNNER_TOOL_CACHE", tmp.path().join("cache"))
            .env("RUNNER_TEMP", tmp.path().join("temp"))
            .args(["--config", config.to_str().unwrap(), "install", "1000"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Download failed"));
    }

    #[test]
    fn install_cache_hit_succeeds_offline() {
        let tmp = tempfile::tempdir().unwrap();
        let cache_root = tmp.path().join("cache");
        seed_cache_entry(&cache_root, "2.9.1", std::env::consts::ARCH);

        let config = tmp.path().join("config.toml");
        // Unreachable mirror proves the cache hit never downloads
        std::fs::write(
            &config,
            "[download]\nbase_url = \"http://127.0.0.1:9\"\ntimeout_secs = 2\n",
        )
        .unwrap();

        let env_file = tmp.path().join("github_env");
        let path_file = tmp.path().join("github_path");

        leinup()
            .env("RUNNER_TOOL_CACHE", &cache_root)
            .env("RUNNER_TEMP", tmp.path().join("temp"))
            .env("GITHUB_ENV", &env_file)
            .env("GITHUB_PATH", &path_file)
            .args(["--config", config.to_str().unwrap(), "install", "2.9.1"])
            .assert()
            .success()
            .stdout(predicate::str::contains("cache hit"));

        let exported = std::fs::read_to_string(&env_file).unwrap();
        assert!(exported.starts_with("LEIN_HOME="));
        assert!(exported.contains("2.9.1"));
        let path_line = std::fs::read_to_string(&path_file).unwrap();
        assert!(path_line.trim_end().ends_with("bin"));
    }
}
