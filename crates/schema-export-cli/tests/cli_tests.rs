//! CLI integration tests for schema-export.
//!
//! These tests verify command-line argument parsing, help output,
//! exit codes, and complete runs against snapshot sources.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use std::path::Path;

/// Get a command for the schema-export binary.
fn cmd() -> Command {
    Command::cargo_bin("schema-export").unwrap()
}

const SNAPSHOT: &str = r#"{
    "source": "shop.mdb",
    "collections": [
        {
            "name": "Tables",
            "columns": ["TABLE_NAME", "TABLE_TYPE"],
            "rows": [
                [{"text": "Customers"}, {"text": "TABLE"}],
                [{"text": "Big Spenders"}, {"text": "VIEW"}]
            ]
        },
        {
            "name": "Columns",
            "columns": ["TABLE_NAME", "COLUMN_NAME", "ORDINAL_POSITION", "DATA_TYPE", "IS_NULLABLE"],
            "rows": [
                [{"text": "Customers"}, {"text": "id"}, {"int": 1}, {"int": 3}, {"bool": false}],
                [{"text": "Customers"}, {"text": "name"}, {"int": 2}, {"int": 202}, {"bool": true}],
                [{"text": "Customers"}, {"text": "joined"}, {"int": 3}, {"int": 7}, {"bool": true}]
            ]
        },
        {
            "name": "Indexes",
            "columns": ["TABLE_NAME", "INDEX_NAME", "COLUMN_NAME", "PRIMARY_KEY"],
            "rows": [[{"text": "Customers"}, {"text": "PrimaryKey"}, {"text": "id"}, {"bool": true}]]
        }
    ],
    "data": [
        {
            "table": "Customers",
            "columns": ["id", "name", "joined"],
            "rows": [
                [{"int": 1}, {"text": "Ada"}, {"text": "2020-05-17 08:30:00"}],
                [{"int": 2}, "null", {"text": "not a date"}]
            ]
        }
    ]
}"#;

/// Write a snapshot and a config pointing at it; returns the config path.
fn write_project(dir: &Path, extra: &str) -> std::path::PathBuf {
    let snapshot = dir.join("shop.json");
    std::fs::write(&snapshot, SNAPSHOT).unwrap();

    let config = dir.join("config.yaml");
    let yaml = format!(
        "source:\n  type: snapshot\n  path: {}\noutput:\n  script_file: {}\n{}",
        snapshot.display(),
        dir.join("shop.sql").display(),
        extra
    );
    std::fs::write(&config, yaml).unwrap();
    config
}

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_shows_all_commands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("log"))
        .stdout(predicate::str::contains("snapshot"))
        .stdout(predicate::str::contains("health-check"));
}

#[test]
fn test_run_subcommand_help() {
    cmd()
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--include-data"))
        .stdout(predicate::str::contains("--no-data"))
        .stdout(predicate::str::contains("--script"))
        .stdout(predicate::str::contains("--force"));
}

#[test]
fn test_snapshot_requires_output() {
    cmd()
        .args(["snapshot"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--output"));
}

#[test]
fn test_version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("schema-export"));
}

// =============================================================================
// Global Flags Tests
// =============================================================================

#[test]
fn test_output_json_flag_exists() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--output-json"));
}

#[test]
fn test_log_format_flag_exists() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--log-format"))
        .stdout(predicate::str::contains("[default: text]"));
}

#[test]
fn test_verbosity_flag_exists() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--verbosity"))
        .stdout(predicate::str::contains("[default: info]"));
}

#[test]
fn test_config_default_path() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("[default: config.yaml]"));
}

#[test]
fn test_no_subcommand_shows_help() {
    cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage:"));
}

// =============================================================================
// Exit Code Tests
// =============================================================================

#[test]
fn test_missing_config_exits_with_code_7() {
    // Missing file is an IO error (code 7), not config error (code 1)
    cmd()
        .args(["--config", "nonexistent_config_file.yaml", "health-check"])
        .assert()
        .code(7);
}

#[test]
fn test_invalid_yaml_exits_with_code_1() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "invalid: yaml: content: [").unwrap();

    cmd()
        .args(["--config", file.path().to_str().unwrap(), "health-check"])
        .assert()
        .code(1);
}

#[test]
fn test_empty_config_exits_with_code_1() {
    let file = tempfile::NamedTempFile::new().unwrap();

    cmd()
        .args(["--config", file.path().to_str().unwrap(), "health-check"])
        .assert()
        .code(1);
}

#[test]
fn test_snapshot_source_without_path_exits_with_code_1() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "source:").unwrap();
    writeln!(file, "  type: snapshot").unwrap();

    cmd()
        .args(["--config", file.path().to_str().unwrap(), "health-check"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("source.path"));
}

#[test]
fn test_unhealthy_source_exits_with_code_2() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = dir.path().join("empty.json");
    std::fs::write(&snapshot, "{}").unwrap();
    let config = dir.path().join("config.yaml");
    std::fs::write(
        &config,
        format!("source:\n  type: snapshot\n  path: {}\n", snapshot.display()),
    )
    .unwrap();

    cmd()
        .args(["--config", config.to_str().unwrap(), "health-check"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("UNHEALTHY"));
}

// =============================================================================
// End-to-end Runs
// =============================================================================

#[test]
fn test_health_check_passes() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_project(dir.path(), "");

    cmd()
        .args(["--config", config.to_str().unwrap(), "health-check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("HEALTHY"))
        .stdout(predicate::str::contains("snapshot of shop.mdb"));
}

#[test]
fn test_run_writes_schema_script() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_project(dir.path(), "");

    cmd()
        .args(["--config", config.to_str().unwrap(), "run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Export completed!"));

    let script = std::fs::read_to_string(dir.path().join("shop.sql")).unwrap();
    assert!(script.starts_with("-- Generated by schema-export"));
    assert!(script.contains("DROP TABLE IF EXISTS \"Customers\";"));
    assert!(script.contains(
        "CREATE TABLE \"Customers\" (\n\t\"id\" INTEGER PRIMARY KEY AUTOINCREMENT, \n\t\"name\" STRING NULL, \n\t\"joined\" DATETIME NULL\n);"
    ));
    assert!(!script.contains("Big Spenders"));
    assert!(!script.contains("INSERT INTO"));
}

#[test]
fn test_run_with_data_and_json_output() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_project(dir.path(), "");

    cmd()
        .args(["--config", config.to_str().unwrap(), "--output-json", "run", "--include-data"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"rows_written\": 2"))
        .stdout(predicate::str::contains("\"null_substitutions\": 1"));

    let script = std::fs::read_to_string(dir.path().join("shop.sql")).unwrap();
    assert!(script.contains("-- Data for table \"Customers\""));
    assert!(script.contains(
        "INSERT INTO \"Customers\" (\"id\", \"name\", \"joined\") \n\tVALUES (1, \"Ada\", '2020-05-17');"
    ));
    assert!(script.contains("VALUES (2, NULL, NULL);"));
}

#[test]
fn test_run_refuses_to_overwrite_without_force() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_project(dir.path(), "");
    std::fs::write(dir.path().join("shop.sql"), "existing").unwrap();

    cmd()
        .args(["--config", config.to_str().unwrap(), "run"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--force"));
    assert_eq!(
        std::fs::read_to_string(dir.path().join("shop.sql")).unwrap(),
        "existing"
    );

    cmd()
        .args(["--config", config.to_str().unwrap(), "run", "--force"])
        .assert()
        .success();
    assert!(std::fs::read_to_string(dir.path().join("shop.sql"))
        .unwrap()
        .contains("CREATE TABLE"));
}

#[test]
fn test_log_command_writes_metadata_log() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_project(dir.path(), "");
    let log = dir.path().join("meta.log");

    cmd()
        .args(["--config", config.to_str().unwrap(), "log", "--output", log.to_str().unwrap()])
        .assert()
        .success();

    let text = std::fs::read_to_string(&log).unwrap();
    assert!(text.contains("All Metadata Collections\n(unavailable)"));
    assert!(text.contains("Tables (2 rows)"));
    assert!(text.contains(&"=".repeat(80)));
}

#[test]
fn test_snapshot_then_run_from_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_project(dir.path(), "export:\n  include_data: true\n");
    let copy = dir.path().join("copy.json");

    cmd()
        .args([
            "--config",
            config.to_str().unwrap(),
            "snapshot",
            "--output",
            copy.to_str().unwrap(),
            "--include-data",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 collections"));

    let copy_config = dir.path().join("copy.yaml");
    std::fs::write(
        &copy_config,
        format!(
            "source:\n  type: snapshot\n  path: {}\noutput:\n  script_file: {}\nexport:\n  include_data: true\n",
            copy.display(),
            dir.path().join("copy.sql").display()
        ),
    )
    .unwrap();

    cmd()
        .args(["--config", copy_config.to_str().unwrap(), "run"])
        .assert()
        .success();
    cmd()
        .args(["--config", config.to_str().unwrap(), "run"])
        .assert()
        .success();

    let original = std::fs::read_to_string(dir.path().join("shop.sql")).unwrap();
    let replayed = std::fs::read_to_string(dir.path().join("copy.sql")).unwrap();
    assert_eq!(original, replayed);
}
