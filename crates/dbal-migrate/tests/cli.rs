//! Command-line behavior that does not need a running database.

use std::io::Write;
use std::process::{Command, Output};

fn dbal_migrate(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_dbal-migrate"))
        .args(args)
        .env_remove("DATABASE_URL")
        .env_remove("DBAL_CONFIG")
        .output()
        .expect("failed to run dbal-migrate")
}

#[test]
fn test_help_lists_commands() {
    let output = dbal_migrate(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("inspect"));
    assert!(stdout.contains("diff"));
    assert!(stdout.contains("migrate"));
}

#[test]
fn test_requires_a_connection() {
    let output = dbal_migrate(&["inspect"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(stderr.contains("either --config or --database"));
}

#[test]
fn test_unreadable_config() {
    let output = dbal_migrate(&["--config", "/nonexistent/dbal.json", "inspect"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(stderr.contains("loading configuration"));
}

#[test]
fn test_config_without_connection_name() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{"connections": [{{"driver": "mysql", "url": "mysql://localhost/app"}}]}}"#)
        .unwrap();

    let path = file.path().to_str().unwrap();
    let output = dbal_migrate(&["--config", path, "inspect"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(stderr.contains("Missing name for connection."));
}

#[test]
fn test_unknown_connection_name() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"connections": [{{"name": "main", "driver": "mysql", "url": "mysql://localhost/app"}}]}}"#
    )
    .unwrap();

    let path = file.path().to_str().unwrap();
    let output = dbal_migrate(&["--config", path, "--connection", "replica", "inspect"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(stderr.contains("Found no database connection with name \"replica\"."));
}
