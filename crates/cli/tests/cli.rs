//! Command-line behaviour against throwaway config directories.

use assert_cmd::Command;

const SOURCE: &str = r#"
[scraper]
schedule_enabled = false

[[scraper.sources]]
name = "Sample Publisher"
url = "https://example.com/new-jewish-books"

[scraper.sources.locators]
entry = ".book-entry"
title = ".title"
author = ".author"
blurb = ".description"
cover = "img"
date = ".date"
"#;

fn config_dir(base: &str) -> tempfile::TempDir {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(dir.path().join("base.toml"), base).unwrap();
    dir
}

fn catalog(dir: &tempfile::TempDir) -> Command {
    let mut cmd = Command::cargo_bin("catalog").unwrap();
    cmd.env_remove("RUST_LOG")
        .env_remove("CATALOG_ENV")
        .arg("--config-dir")
        .arg(dir.path());
    cmd
}

#[test]
fn sources_lists_configured_sites() {
    let dir = config_dir(SOURCE);
    let output = catalog(&dir).arg("sources").output().unwrap();
    assert!(output.status.success());

    let listed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(listed[0]["name"], "Sample Publisher");
    assert_eq!(listed[0]["url"], "https://example.com/new-jewish-books");
    assert_eq!(listed[0]["locators"]["blurb"], ".description");
}

#[test]
fn invalid_selector_is_rejected() {
    let dir = config_dir(&SOURCE.replace(r#"title = ".title""#, r#"title = "[[broken""#));
    let output = catalog(&dir).arg("sources").output().unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Sample Publisher"), "{stderr}");
}

#[test]
fn crawl_without_sources_reports_nothing() {
    let dir = config_dir("[scraper]\nschedule_enabled = false\n");
    let output = catalog(&dir).arg("crawl").output().unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["sources"], serde_json::json!([]));
}

#[test]
fn unknown_environment_fails() {
    let dir = config_dir(SOURCE);
    catalog(&dir)
        .args(["--env", "moon", "sources"])
        .assert()
        .failure();
}
