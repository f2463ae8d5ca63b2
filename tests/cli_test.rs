//! CLI surface smoke tests. Nothing here touches the network.

use assert_cmd::Command;
use predicates::prelude::*;

fn write_config(dir: &tempfile::TempDir) -> std::path::PathBuf {
    let cache_path = dir.path().join("asin-cache.json");
    let config_path = dir.path().join("bookhound.toml");
    std::fs::write(
        &config_path,
        format!("[cache]\npath = \"{}\"\n", cache_path.display()),
    )
    .unwrap();
    config_path
}

#[test]
fn help_lists_subcommands() {
    Command::cargo_bin("bookhound")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("lookup"))
        .stdout(predicate::str::contains("batch"))
        .stdout(predicate::str::contains("cache"));
}

#[test]
fn lookup_without_title_or_isbn_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir);

    Command::cargo_bin("bookhound")
        .unwrap()
        .args(["--config", config.to_str().unwrap(), "lookup"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid query"));
}

#[test]
fn lookup_with_unknown_source_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir);

    Command::cargo_bin("bookhound")
        .unwrap()
        .args([
            "--config",
            config.to_str().unwrap(),
            "lookup",
            "--title",
            "Mistborn",
            "--source",
            "ebay",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown source"));
}

#[test]
fn cache_stats_on_fresh_cache() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir);

    Command::cargo_bin("bookhound")
        .unwrap()
        .args(["--config", config.to_str().unwrap(), "cache", "stats"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 entries"));
}

#[test]
fn batch_with_missing_library_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir);

    Command::cargo_bin("bookhound")
        .unwrap()
        .args([
            "--config",
            config.to_str().unwrap(),
            "batch",
            "--library",
            "/definitely/not/a/real/library/path",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn invalid_config_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("bookhound.toml");
    std::fs::write(&config_path, "[fuzzy]\nthreshold = 3.0\n").unwrap();

    Command::cargo_bin("bookhound")
        .unwrap()
        .args(["--config", config_path.to_str().unwrap(), "cache", "stats"])
        .assert()
        .failure();
}
