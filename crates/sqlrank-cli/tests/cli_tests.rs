//! Integration tests for the sqlrank binary.

use rusqlite::Connection;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Create a temp dir holding a users database and a config for it.
fn create_test_env(driver: &str) -> (TempDir, PathBuf, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db = temp_dir.path().join("users.db");
    let config = temp_dir.path().join("users.json");

    let conn = Connection::open(&db).unwrap();
    conn.execute_batch(
        "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT, email TEXT);
         INSERT INTO users VALUES
             (1, 'Bob Smith', 'bob@example.com'),
             (2, 'Bobby Tables', 'tables@example.com'),
             (3, 'Carol', 'carol@example.com');",
    )
    .unwrap();

    std::fs::write(
        &config,
        format!(
            r#"{{
                "table": "users",
                "driver": "{}",
                "columns": [
                    {{"column": "users.name", "weight": 10}},
                    {{"column": "users.email", "weight": 5}}
                ],
                "conditions": {{"users.name": "[a-zA-Z]{{3,}}"}}
            }}"#,
            driver
        ),
    )
    .unwrap();

    (temp_dir, db, config)
}

fn sqlrank(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sqlrank"))
        .args(args)
        .output()
        .expect("Failed to run sqlrank")
}

fn stdout_json(output: &Output) -> Value {
    assert!(
        output.status.success(),
        "sqlrank failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
}

fn path(p: &Path) -> &str {
    p.to_str().unwrap()
}

#[test]
fn test_compile_prints_sql_and_bindings() {
    let (_dir, _db, config) = create_test_env("pgsql");
    let output = sqlrank(&["compile", "--config", path(&config), "--query", "Al Bob"]);
    let json = stdout_json(&output);

    let sql = json["sql"].as_str().unwrap();
    assert!(sql.contains("LOWER(users.name) ILIKE ?"));
    assert!(sql.contains("> 3.75"));
    // name admits "bob" only; pgsql binds the sequence twice
    assert_eq!(json["bindings"].as_array().unwrap().len(), 2 * (4 + 8));
}

#[test]
fn test_compile_numbered_placeholders() {
    let (_dir, _db, config) = create_test_env("pgsql");
    let output = sqlrank(&[
        "compile",
        "--config",
        path(&config),
        "--query",
        "bob",
        "--numbered",
    ]);
    let json = stdout_json(&output);
    let sql = json["sql"].as_str().unwrap();
    assert!(sql.contains("$1"));
    assert!(sql.contains("$16"));
    assert!(!sql.contains('?'));
}

#[test]
fn test_search_returns_ranked_rows() {
    let (_dir, db, config) = create_test_env("sqlite");
    let output = sqlrank(&[
        "search",
        "--config",
        path(&config),
        "--db",
        path(&db),
        "--query",
        "bob",
    ]);
    let rows = stdout_json(&output);
    let rows = rows.as_array().unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["fields"]["id"], 1);
    assert_eq!(rows[0]["relevance"], 75.0);
    assert_eq!(rows[1]["fields"]["name"], "Bobby Tables");
}

#[test]
fn test_search_with_limit() {
    let (_dir, db, config) = create_test_env("sqlite");
    let output = sqlrank(&[
        "search",
        "--config",
        path(&config),
        "--db",
        path(&db),
        "--query",
        "bob",
        "--limit",
        "1",
        "--offset",
        "1",
    ]);
    let rows = stdout_json(&output);
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["fields"]["id"], 2);
}

#[test]
fn test_search_missing_database_fails() {
    let (dir, _db, config) = create_test_env("sqlite");
    let missing = dir.path().join("missing.db");
    let output = sqlrank(&[
        "search",
        "--config",
        path(&config),
        "--db",
        path(&missing),
        "--query",
        "bob",
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Database not found"));
}

#[test]
fn test_invalid_config_fails() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("bad.json");
    std::fs::write(
        &config,
        r#"{"table": "users", "columns": [{"column": "users.name", "weight": -1}]}"#,
    )
    .unwrap();
    let output = sqlrank(&["compile", "--config", path(&config), "--query", "bob"]);
    assert!(!output.status.success());
}

#[test]
fn test_non_finite_threshold_fails() {
    let (_dir, _db, config) = create_test_env("mysql");
    let output = sqlrank(&[
        "compile",
        "--config",
        path(&config),
        "--query",
        "bob",
        "--threshold",
        "nan",
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("threshold"));
}
