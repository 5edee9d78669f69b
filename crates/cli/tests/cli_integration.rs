//! CLI integration tests.
//!
//! Uses `assert_cmd` to spawn the `adef` binary against section trees and
//! catalogs written into a temporary directory.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn adef() -> Command {
    cargo_bin_cmd!("adef")
}

fn loc(line: u32) -> Value {
    json!({ "file": "hello.adef", "line": line, "column": 1 })
}

fn tok(kind: &str, text: &str, line: u32) -> Value {
    json!({ "kind": kind, "text": text, "loc": loc(line) })
}

fn section(name: &str, line: u32, body: Value) -> Value {
    json!({ "name": name, "loc": loc(line), "body": body })
}

/// Section tree for `hello.adef` in `dir`, plus any extra sections.
fn write_tree(dir: &Path, extra: Vec<Value>) -> PathBuf {
    let mut sections = vec![
        section(
            "executables",
            1,
            json!({ "item_list": [{
                "loc": loc(2),
                "name": tok("name", "greeter", 2),
                "tokens": [tok("file_path", "greetComp", 2)]
            }]}),
        ),
        section(
            "bundles",
            4,
            json!({ "complex": [section("file", 5, json!({ "item_list": [{
                "loc": loc(6),
                "tokens": [tok("file_path", "motd.txt", 6), tok("file_path", "/etc/", 6)]
            }]}))]}),
        ),
        section(
            "processes",
            8,
            json!({ "complex": [
                section("run", 9, json!({ "item_list": [{
                    "loc": loc(10),
                    "tokens": [tok("file_path", "greeter", 10)]
                }]})),
                section("envVars", 11, json!({ "item_list": [{
                    "loc": loc(12),
                    "name": tok("name", "GREETING", 12),
                    "tokens": [tok("string", "\"$GREETING\"", 12)]
                }]})),
            ]}),
        ),
    ];
    sections.extend(extra);

    let tree = json!({
        "path": dir.join("hello.adef"),
        "sections": sections,
    });
    let path = dir.join("hello.json");
    fs::write(&path, serde_json::to_string_pretty(&tree).unwrap()).unwrap();
    fs::write(dir.join("motd.txt"), "hi\n").unwrap();
    path
}

fn write_catalog(dir: &Path) -> PathBuf {
    let catalog = json!({
        "components": [{
            "name": "greetComp",
            "dir": dir.join("greetComp"),
            "has_native_code": true,
            "client_apis": [{ "internal_name": "log", "api_file": "/api/log.api" }],
            "server_apis": [{ "internal_name": "greet", "api_file": "/api/greet.api" }]
        }]
    });
    let path = dir.join("catalog.json");
    fs::write(&path, serde_json::to_string_pretty(&catalog).unwrap()).unwrap();
    path
}

fn fixture(extra: Vec<Value>) -> (TempDir, PathBuf, PathBuf) {
    let dir = TempDir::new().unwrap();
    let tree = write_tree(dir.path(), extra);
    let catalog = write_catalog(dir.path());
    (dir, tree, catalog)
}

// ──────────────────────────────────────────────
// 1. Help and version
// ──────────────────────────────────────────────

#[test]
fn help_exits_0_with_description() {
    adef()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Application definition modeller"));
}

#[test]
fn model_requires_components_flag() {
    adef()
        .args(["model", "tree.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--components"));
}

// ──────────────────────────────────────────────
// 2. Text summary
// ──────────────────────────────────────────────

#[test]
fn text_summary_lists_app_contents() {
    let (_dir, tree, catalog) = fixture(Vec::new());
    adef()
        .arg("model")
        .arg(&tree)
        .arg("--components")
        .arg(&catalog)
        .args(["--var", "GREETING=hello"])
        .assert()
        .success()
        .stdout(predicate::str::contains("== 'hello' application summary =="))
        .stdout(predicate::str::contains("  Builds executables:"))
        .stdout(predicate::str::contains("        'greetComp'"))
        .stdout(predicate::str::contains("      appearing inside app as: '/etc/motd.txt'"))
        .stdout(predicate::str::contains("  When started, will run process: 'greeter'"))
        .stdout(predicate::str::contains("      GREETING=hello"))
        .stdout(predicate::str::contains("      'log' -> UNBOUND."));
}

#[test]
fn summary_shows_bindings() {
    let (_dir, tree, catalog) = fixture(vec![section(
        "bindings",
        20,
        json!({ "item_list": [{
            "loc": loc(21),
            "tokens": [
                tok("name", "greeter", 21),
                tok("name", "greetComp", 21),
                tok("name", "log", 21),
                tok("ipc_agent", "<root>", 21),
                tok("name", "logSvc", 21)
            ]
        }]}),
    )]);
    adef()
        .arg("model")
        .arg(&tree)
        .arg("--components")
        .arg(&catalog)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "      'log' -> user 'root' interface 'logSvc'",
        ));
}

// ──────────────────────────────────────────────
// 3. JSON output
// ──────────────────────────────────────────────

#[test]
fn json_output_is_app_and_warnings() {
    let (_dir, tree, catalog) = fixture(vec![section(
        "maxFileSystemBytes",
        30,
        json!({ "simple": tok("integer", "64K", 30) }),
    )]);
    let output = adef()
        .args(["--output", "json", "model"])
        .arg(&tree)
        .arg("--components")
        .arg(&catalog)
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["app"]["name"], "hello");
    assert!(value["app"]["executables"]["greeter"].is_object());
    assert_eq!(
        value["app"]["process_envs"][0]["env_vars"]["PATH"],
        "/usr/local/bin:/usr/bin:/bin"
    );

    // Default maxFileBytes (90K) exceeds the 64K file system limit.
    let warnings = value["warnings"].as_array().unwrap();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0]["conflict"], "file_size_exceeds_file_system");
}

// ──────────────────────────────────────────────
// 4. Errors
// ──────────────────────────────────────────────

#[test]
fn model_error_goes_to_stderr_with_location() {
    let (_dir, tree, catalog) = fixture(vec![section(
        "maxThreads",
        40,
        json!({ "simple": tok("integer", "0", 40) }),
    )]);
    adef()
        .arg("model")
        .arg(&tree)
        .arg("--components")
        .arg(&catalog)
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("hello.adef:40:1: error:"));
}

#[test]
fn model_error_as_json() {
    let (_dir, tree, catalog) = fixture(vec![section(
        "colour",
        50,
        json!({ "simple": tok("name", "blue", 50) }),
    )]);
    let output = adef()
        .args(["--output", "json", "model"])
        .arg(&tree)
        .arg("--components")
        .arg(&catalog)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));

    let err: Value = serde_json::from_slice(&output.stderr).unwrap();
    assert_eq!(err["kind"], "internal");
    assert_eq!(err["line"], 50);
    assert_eq!(err["message"], "Internal error: Unrecognized section 'colour'.");
}

#[test]
fn missing_tree_file_fails() {
    let dir = TempDir::new().unwrap();
    let catalog = write_catalog(dir.path());
    adef()
        .arg("model")
        .arg(dir.path().join("absent.json"))
        .arg("--components")
        .arg(&catalog)
        .assert()
        .failure()
        .stderr(predicate::str::contains("error reading file"));
}

#[test]
fn malformed_catalog_fails() {
    let (dir, tree, _catalog) = fixture(Vec::new());
    let bad = dir.path().join("bad.json");
    fs::write(&bad, "{ not json").unwrap();
    adef()
        .arg("model")
        .arg(&tree)
        .arg("--components")
        .arg(&bad)
        .assert()
        .failure()
        .stderr(predicate::str::contains("error parsing JSON"));
}

#[test]
fn bad_var_argument_is_rejected() {
    let (_dir, tree, catalog) = fixture(Vec::new());
    adef()
        .arg("model")
        .arg(&tree)
        .arg("--components")
        .arg(&catalog)
        .args(["--var", "NOEQUALS"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected NAME=VALUE"));
}
