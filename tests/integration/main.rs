//! Integration tests for webpx

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use tempfile::TempDir;

    fn webpx() -> Command {
        cargo_bin_cmd!("webpx")
    }

    /// Write a config pointing every path at a private temp dir
    fn hermetic_config(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("config.toml");
        let content = format!(
            "[paths]\ndocument_root = {root:?}\ncache_dir = {cache:?}\nbin_dir = {bin:?}\n",
            root = dir.path().join("www"),
            cache = dir.path().join("cache"),
            bin = dir.path().join("bin"),
        );
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn help_displays() {
        webpx()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Transparent WebP transcoding proxy"));
    }

    #[test]
    fn version_displays() {
        webpx()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("webpx"));
    }

    #[test]
    fn status_reports_missing_tools() {
        let dir = TempDir::new().unwrap();
        let config = hermetic_config(&dir);

        webpx()
            .args(["status", "--config"])
            .arg(&config)
            .assert()
            .success()
            .stdout(
                predicate::str::contains("webpx System Status")
                    .and(predicate::str::contains("cwebp"))
                    .and(predicate::str::contains("missing")),
            );
    }

    #[test]
    fn cache_stats_on_empty_cache() {
        let dir = TempDir::new().unwrap();
        let config = hermetic_config(&dir);

        webpx()
            .args(["cache", "stats", "--config"])
            .arg(&config)
            .assert()
            .success()
            .stdout(
                predicate::str::contains("Cache directory:")
                    .and(predicate::str::contains("Entries:"))
                    .and(predicate::str::contains("converted:")),
            );
    }

    #[test]
    fn cache_clear_on_empty_cache() {
        let dir = TempDir::new().unwrap();
        let config = hermetic_config(&dir);

        webpx()
            .args(["cache", "clear", "--yes", "--config"])
            .arg(&config)
            .assert()
            .success()
            .stdout(predicate::str::contains("already empty"));
    }

    #[test]
    fn cache_clear_removes_entries() {
        let dir = TempDir::new().unwrap();
        let config = hermetic_config(&dir);
        let cache = dir.path().join("cache");
        std::fs::create_dir_all(&cache).unwrap();
        std::fs::write(cache.join("aaaa"), b"artifact").unwrap();
        std::fs::write(cache.join("bbbb"), b"").unwrap();

        webpx()
            .args(["cache", "clear", "--yes", "--config"])
            .arg(&config)
            .assert()
            .success()
            .stdout(predicate::str::contains("2 entries removed"));

        assert_eq!(std::fs::read_dir(&cache).unwrap().count(), 0);
    }

    #[test]
    fn serve_rejects_invalid_listen_address() {
        let dir = TempDir::new().unwrap();
        let config = hermetic_config(&dir);

        webpx()
            .args(["serve", "--listen", "not-an-addr", "--config"])
            .arg(&config)
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid listen address"));
    }

    #[test]
    fn invalid_config_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[paths\nbroken").unwrap();

        webpx()
            .args(["status", "--config"])
            .arg(&path)
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"));
    }
}
