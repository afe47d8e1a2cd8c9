//! Integration tests for `extcopy copy --json` output.
//!
//! These tests verify:
//! - JSON output is always valid JSON with `ok` and `schema_version`
//! - External modules and their dependencies land in `<outdir>/node_modules`
//! - Ineligible builds copy nothing
//! - Failed dependencies are reported but do not fail the command

use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

fn cargo_bin() -> Command {
    let mut cmd = Command::new(env!("CARGO"));
    cmd.args(["run", "-p", "extcopy-cli", "--bin", "extcopy", "--"]);
    cmd
}

fn package(root: &Path, name: &str, deps: &[&str]) {
    let dir = root.join("node_modules").join(name);
    fs::create_dir_all(&dir).unwrap();
    let deps: Vec<String> = deps.iter().map(|d| format!(r#""{d}":"*""#)).collect();
    fs::write(
        dir.join("package.json"),
        format!(
            r#"{{"name":"{name}","main":"index.js","dependencies":{{{}}}}}"#,
            deps.join(",")
        ),
    )
    .unwrap();
    fs::write(dir.join("index.js"), format!("module.exports = '{name}';")).unwrap();
}

fn project(entry_source: &str) -> tempfile::TempDir {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("src")).unwrap();
    fs::write(dir.path().join("src/server.js"), entry_source).unwrap();
    dir
}

fn run_copy(dir: &Path, extra: &[&str]) -> (std::process::Output, serde_json::Value) {
    let output = cargo_bin()
        .args(["copy", "src/server.js", "--json", "--cwd"])
        .arg(dir)
        .args(extra)
        .output()
        .expect("Failed to run copy command");

    let stdout = String::from_utf8_lossy(&output.stdout);
    let json: serde_json::Value =
        serde_json::from_str(&stdout).expect("Output should be valid JSON");
    (output, json)
}

fn copied_names(json: &serde_json::Value) -> Vec<String> {
    let mut names: Vec<String> = json["copied"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap().to_string())
        .collect();
    names.sort();
    names
}

#[test]
fn test_copy_json_copies_external_and_dependencies() {
    let dir = project(
        r#"
const sharp = require("sharp");
import { helper } from "./helper";
import _ from "lodash";
"#,
    );
    package(dir.path(), "sharp", &["color", "detect-libc"]);
    package(dir.path(), "color", &["detect-libc"]);
    package(dir.path(), "detect-libc", &[]);
    package(dir.path(), "lodash", &[]);

    let (output, json) = run_copy(dir.path(), &["--external", "sharp", "--outdir", "dist"]);

    assert!(output.status.success());
    assert_eq!(json["ok"], true);
    assert_eq!(json["schema_version"], 1);
    assert_eq!(json["enabled"], true);
    assert_eq!(json["externals"].as_array().unwrap().len(), 1);
    assert_eq!(json["externals"][0]["specifier"], "sharp");
    assert_eq!(json["externals"][0]["line"], 2);
    assert_eq!(copied_names(&json), vec!["color", "detect-libc", "sharp"]);

    let node_modules = dir.path().join("dist/node_modules");
    assert!(node_modules.join("sharp/index.js").is_file());
    assert!(node_modules.join("color/package.json").is_file());
    assert!(node_modules.join("detect-libc/index.js").is_file());
    assert!(!node_modules.join("lodash").exists());
}

#[test]
fn test_copy_json_browser_platform_disabled() {
    let dir = project(r#"const sharp = require("sharp");"#);
    package(dir.path(), "sharp", &[]);

    let (output, json) = run_copy(
        dir.path(),
        &["--external", "sharp", "--outdir", "dist", "--platform", "browser"],
    );

    assert!(output.status.success());
    assert_eq!(json["ok"], true);
    assert_eq!(json["enabled"], false);
    assert!(json["externals"].as_array().unwrap().is_empty());
    assert!(json["copied"].as_array().unwrap().is_empty());
    assert!(!dir.path().join("dist").exists());
}

#[test]
fn test_copy_json_missing_dependency_reported() {
    let dir = project(r#"import pg from "pg";"#);
    package(dir.path(), "pg", &["pg-native-missing"]);

    let (output, json) = run_copy(dir.path(), &["--external", "pg", "--outfile", "build/server.js"]);

    assert!(output.status.success(), "failures are reported, not fatal");
    assert_eq!(json["ok"], false);
    assert_eq!(json["externals"][0]["specifier"], "pg");
    assert_eq!(copied_names(&json), vec!["pg"]);
    assert!(dir.path().join("build/node_modules/pg/package.json").is_file());

    let errors = json["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["module"], "pg-native-missing");

    let code = errors[0]["code"].as_str().unwrap();
    assert!(
        code.chars().all(|c| c.is_ascii_uppercase() || c == '_'),
        "error code should be SCREAMING_SNAKE_CASE: {code}"
    );
}

#[test]
fn test_copy_json_dry_run_writes_nothing() {
    let dir = project(r#"require("sharp");"#);
    package(dir.path(), "sharp", &[]);

    let (output, json) = run_copy(
        dir.path(),
        &["--external", "sharp", "--outdir", "dist", "--dry-run"],
    );

    assert!(output.status.success());
    assert_eq!(json["dry_run"], true);
    assert_eq!(copied_names(&json), vec!["sharp"]);
    assert!(!dir.path().join("dist").exists());
}

#[test]
fn test_copy_json_missing_entry_is_fatal() {
    let dir = tempdir().unwrap();

    let (output, json) = run_copy(dir.path(), &["--external", "sharp", "--outdir", "dist"]);

    assert!(!output.status.success());
    assert_eq!(json["ok"], false);
    assert_eq!(json["error"]["code"], "ENTRY_READ_FAILED");
}
