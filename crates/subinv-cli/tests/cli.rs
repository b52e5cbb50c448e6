use assert_cmd::Command;
use predicates::prelude::*;

fn subinv() -> Command {
    Command::cargo_bin("subinv").unwrap()
}

#[test]
fn test_help_lists_commands() {
    subinv()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run").and(predicate::str::contains("config")));
}

#[test]
fn test_run_without_pdfs_fails() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("notes.txt"), "not an invoice").unwrap();
    let pattern = dir.path().join("*").display().to_string();

    subinv()
        .args(["run", &pattern])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No PDF files found"));
}

#[test]
fn test_config_init_and_get() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    let path_str = path.display().to_string();

    subinv()
        .args(["config", "init", "--output", &path_str])
        .assert()
        .success();
    assert!(path.exists());

    subinv()
        .args(["config", "init", "--output", &path_str])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    subinv()
        .args(["-c", &path_str, "config", "get", "extraction.line_item_columns"])
        .assert()
        .success()
        .stdout(predicate::str::contains("9"));
}

#[test]
fn test_config_set_zone_rules() {
    let dir = tempfile::tempdir().unwrap();
    let path_str = dir.path().join("config.json").display().to_string();

    subinv()
        .args([
            "-c",
            &path_str,
            "config",
            "set",
            "extraction.zone_rules",
            r#"[{"token": "CSBP", "zone": "A"}]"#,
        ])
        .assert()
        .success();

    subinv()
        .args(["-c", &path_str, "config", "get", "extraction.zone_rules"])
        .assert()
        .success()
        .stdout(predicate::str::contains("CSBP"));

    subinv()
        .args(["-c", &path_str, "config", "set", "extraction.no_such_key", "1"])
        .assert()
        .failure();
}

#[test]
fn test_missing_explicit_config_fails() {
    subinv()
        .args(["-c", "/nonexistent/subinv.json", "config", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read config file"));
}
