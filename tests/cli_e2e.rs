//! End-to-end CLI tests for the harvester binary.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Command isolated from the user's config and working directory.
fn harvester(temp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("harvester").unwrap();
    cmd.current_dir(temp.path())
        .env("XDG_CONFIG_HOME", temp.path().join("config"))
        .env("HOME", temp.path())
        .env_remove("RUST_LOG");
    cmd
}

fn write_corpus(dir: &Path, body: &str) -> std::path::PathBuf {
    let path = dir.join("datasets.json");
    std::fs::write(&path, body).unwrap();
    path
}

/// Test that --help displays usage information and exits with code 0.
#[test]
fn test_binary_help_displays_usage() {
    let temp = TempDir::new().unwrap();
    harvester(&temp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--mode"))
        .stdout(predicate::str::contains("--signature"));
}

/// Test that --version displays version and exits with code 0.
#[test]
fn test_binary_version_displays_version() {
    let temp = TempDir::new().unwrap();
    harvester(&temp)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("harvester"));
}

/// Test that invalid flags cause non-zero exit.
#[test]
fn test_binary_invalid_flag_returns_error() {
    let temp = TempDir::new().unwrap();
    harvester(&temp)
        .arg("--invalid-flag")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_binary_unknown_mode_returns_error() {
    let temp = TempDir::new().unwrap();
    harvester(&temp)
        .args(["--mode", "crawl"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("crawl"));
}

#[test]
fn test_binary_parse_mode_requires_signature() {
    let temp = TempDir::new().unwrap();
    harvester(&temp)
        .args(["--mode", "parse"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("signature"));
}

#[test]
fn test_binary_reversed_range_returns_error() {
    let temp = TempDir::new().unwrap();
    harvester(&temp)
        .args(["--start-id", "10", "--end-id", "2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--start-id"));
}

#[test]
fn test_binary_unknown_config_key_returns_error() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("bad.toml");
    std::fs::write(&config, "concurrency = 4\n").unwrap();

    harvester(&temp)
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown configuration key"));
}

#[test]
fn test_binary_missing_corpus_returns_error() {
    let temp = TempDir::new().unwrap();
    harvester(&temp)
        .args(["--mode", "index", "--corpus", "absent.json", "-q"])
        .assert()
        .failure();
}

// ==================== Mode Tests ====================

#[test]
fn test_binary_index_mode_writes_reports() {
    let temp = TempDir::new().unwrap();
    let corpus = write_corpus(
        temp.path(),
        r#"{"datasets": [{"dataset_id": 1, "download": []}, {"dataset_id": "2"}]}"#,
    );
    let content_dir = temp.path().join("out/content");
    std::fs::create_dir_all(&content_dir).unwrap();
    std::fs::write(
        content_dir.join("dataset_1.json"),
        r#"{"classes":[],"properties":[],"entities":[],"literals":[]}"#,
    )
    .unwrap();

    harvester(&temp)
        .args(["--mode", "index", "--start-id", "1", "--end-id", "2", "-q"])
        .arg("--corpus")
        .arg(&corpus)
        .args(["-o", "out"])
        .assert()
        .success();

    let report = std::fs::read_to_string(temp.path().join("out/results/empty_datasets.json")).unwrap();
    assert!(report.contains("\"1\""));
}

#[test]
fn test_binary_download_mode_discards_ineligible_links() {
    let temp = TempDir::new().unwrap();
    let corpus = write_corpus(
        temp.path(),
        r#"{"datasets": [{"dataset_id": 3, "download": ["http://ex.org/index.html", "http://ex.org/logo.png"]}]}"#,
    );

    harvester(&temp)
        .args(["--mode", "download", "--start-id", "3", "--end-id", "3", "-q"])
        .args(["--download-program", "definitely-not-a-downloader"])
        .arg("--corpus")
        .arg(&corpus)
        .args(["-o", "out"])
        .assert()
        .success();

    let results = std::fs::read_dir(temp.path().join("out/results/download"))
        .unwrap()
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .find(|path| {
            path.file_name()
                .is_some_and(|name| name.to_string_lossy().starts_with("download_infos_3_3_"))
        })
        .expect("download results table");
    let table = std::fs::read_to_string(results).unwrap();
    assert_eq!(table.matches(";format;").count(), 2);
}

#[test]
fn test_binary_missing_download_program_returns_error() {
    let temp = TempDir::new().unwrap();
    let corpus = write_corpus(
        temp.path(),
        r#"{"datasets": [{"dataset_id": 4, "download": ["http://ex.org/data.ttl"]}]}"#,
    );

    harvester(&temp)
        .args(["--mode", "download", "--start-id", "4", "--end-id", "4", "-q"])
        .args(["--download-program", "definitely-not-a-downloader"])
        .arg("--corpus")
        .arg(&corpus)
        .args(["-o", "out"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("definitely-not-a-downloader"));
}
