//! E2E tests for `pharos compile`, `inspect` and `verify`.
//!
//! Each test runs the `pharos` binary as a subprocess in an isolated temp
//! directory with its own user config directory.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

const BOOK: &str = "# Book\n\n## Chapter 1\n\nHello world\n";

// ---------------------------------------------------------------------------
// Test Harness
// ---------------------------------------------------------------------------

/// Build a Command targeting the pharos binary, rooted in `dir`.
fn pharos_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("pharos"));
    cmd.current_dir(dir);
    cmd.env("XDG_CONFIG_HOME", dir.join("xdg"));
    cmd.env("HOME", dir);
    cmd.env_remove("FORMAT");
    // Suppress tracing output that goes to stderr
    cmd.env("PHAROS_LOG", "error");
    cmd
}

fn write(dir: &Path, name: &str, contents: &str) {
    std::fs::write(dir.join(name), contents).expect("write fixture");
}

fn compile_json(dir: &Path, file: &str) -> Vec<Value> {
    let output = pharos_cmd(dir)
        .args(["compile", file, "--issuer", "pk-test", "--json"])
        .output()
        .expect("compile should not crash");
    assert!(
        output.status.success(),
        "compile failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let json: Value =
        serde_json::from_slice(&output.stdout).expect("compile --json should produce valid JSON");
    json.as_array().expect("compile output should be an array").clone()
}

fn d_tag(record: &Value) -> Option<&str> {
    record["tags"]
        .as_array()?
        .iter()
        .find(|tag| tag[0] == "d")
        .and_then(|tag| tag[1].as_str())
}

// ---------------------------------------------------------------------------
// compile
// ---------------------------------------------------------------------------

#[test]
fn compile_book_emits_three_records_children_first() {
    let dir = TempDir::new().expect("tempdir");
    write(dir.path(), "book.md", BOOK);

    let records = compile_json(dir.path(), "book.md");
    assert_eq!(records.len(), 3);

    let ids: Vec<Option<&str>> = records.iter().map(d_tag).collect();
    assert_eq!(
        ids,
        vec![Some("book_paragraph_0"), Some("chapter-1"), Some("book")]
    );
    assert_eq!(records[0]["kind"], 30041);
    assert_eq!(records[0]["content"], "Hello world");
    assert_eq!(records[1]["kind"], 30040);
    assert_eq!(records[2]["pubkey"], "pk-test");

    let chapter_refs: Vec<&Value> = records[1]["tags"]
        .as_array()
        .expect("tags")
        .iter()
        .filter(|tag| tag[0] == "e")
        .collect();
    assert_eq!(chapter_refs.len(), 1);
    assert_eq!(chapter_refs[0][1], records[0]["id"]);
}

#[test]
fn compile_without_issuer_fails_with_hint() {
    let dir = TempDir::new().expect("tempdir");
    write(dir.path(), "book.md", BOOK);

    pharos_cmd(dir.path())
        .args(["compile", "book.md"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--issuer"));
}

#[test]
fn compile_uses_issuer_from_user_config() {
    let dir = TempDir::new().expect("tempdir");
    write(dir.path(), "book.md", BOOK);
    let config_dir = dir.path().join("xdg/pharos");
    std::fs::create_dir_all(&config_dir).expect("mkdir");
    std::fs::write(config_dir.join("config.toml"), "issuer = \"from-config\"\n").expect("write");

    let output = pharos_cmd(dir.path())
        .args(["compile", "book.md", "--json"])
        .output()
        .expect("compile should not crash");
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(json[0]["pubkey"], "from-config");
}

#[test]
fn compile_text_mode_prints_one_row_per_record() {
    let dir = TempDir::new().expect("tempdir");
    write(dir.path(), "book.md", BOOK);

    pharos_cmd(dir.path())
        .env("FORMAT", "text")
        .args(["compile", "book.md", "--issuer", "pk"])
        .assert()
        .success()
        .stdout(predicate::str::contains("30041\tbook_paragraph_0"))
        .stdout(predicate::str::contains("30040\tbook\t"));
}

#[test]
fn missing_file_reports_error() {
    let dir = TempDir::new().expect("tempdir");
    pharos_cmd(dir.path())
        .args(["compile", "nope.md", "--issuer", "pk"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read"))
        .stderr(predicate::str::contains("E5001"));
}

#[test]
fn verify_missing_batch_reports_read_code() {
    let dir = TempDir::new().expect("tempdir");
    pharos_cmd(dir.path())
        .args(["verify", "absent.json", "--json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E5001"));
}

#[test]
fn project_config_depth_ceiling_applies() {
    let dir = TempDir::new().expect("tempdir");
    write(dir.path(), "deep.md", "# Deep\n\n## A\n\n### B\n\ntext\n");
    std::fs::create_dir_all(dir.path().join(".pharos")).expect("mkdir");
    write(dir.path(), ".pharos/config.toml", "[compiler]\ndepth_ceiling = 1\n");

    let records = compile_json(dir.path(), "deep.md");
    let ids: Vec<Option<&str>> = records.iter().map(d_tag).collect();
    assert_eq!(ids, vec![Some("a"), Some("deep")]);
}

#[test]
fn broken_project_config_reports_code() {
    let dir = TempDir::new().expect("tempdir");
    write(dir.path(), "book.md", BOOK);
    std::fs::create_dir_all(dir.path().join(".pharos")).expect("mkdir");
    write(dir.path(), ".pharos/config.toml", "[compiler\n");

    pharos_cmd(dir.path())
        .args(["compile", "book.md", "--issuer", "pk"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E1002"));
}

// ---------------------------------------------------------------------------
// compile --out + verify
// ---------------------------------------------------------------------------

#[test]
fn saved_batch_verifies() {
    let dir = TempDir::new().expect("tempdir");
    write(
        dir.path(),
        "notes.md",
        "---\nauthors: [Ada]\n---\n\n# Notes\n\nSee [[Other Page]]\n\n## Part\n\n- a\n- b\n",
    );

    pharos_cmd(dir.path())
        .args(["compile", "notes.md", "--issuer", "pk", "--out", "batch.json", "--json"])
        .assert()
        .success();

    let output = pharos_cmd(dir.path())
        .args(["verify", "batch.json", "--json"])
        .output()
        .expect("verify should not crash");
    assert!(
        output.status.success(),
        "verify failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let json: Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(json["ok"], true);
    assert_eq!(json["records"], 4);
    assert_eq!(json["valid_indices"], 2);
}

#[test]
fn tampered_batch_fails_verification() {
    let dir = TempDir::new().expect("tempdir");
    write(dir.path(), "book.md", BOOK);
    let mut records = compile_json(dir.path(), "book.md");
    records[0]["content"] = Value::String("tampered".into());
    std::fs::write(
        dir.path().join("batch.json"),
        serde_json::to_string(&records).expect("serialize"),
    )
    .expect("write");

    pharos_cmd(dir.path())
        .args(["verify", "batch.json", "--json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E4001"));
}

#[test]
fn reordered_batch_fails_verification() {
    let dir = TempDir::new().expect("tempdir");
    write(dir.path(), "book.md", BOOK);
    let mut records = compile_json(dir.path(), "book.md");
    records.reverse();
    std::fs::write(
        dir.path().join("batch.json"),
        serde_json::to_string(&records).expect("serialize"),
    )
    .expect("write");

    pharos_cmd(dir.path())
        .args(["verify", "batch.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E4002"));
}

// ---------------------------------------------------------------------------
// inspect / completions
// ---------------------------------------------------------------------------

#[test]
fn inspect_shows_tree_without_issuer() {
    let dir = TempDir::new().expect("tempdir");
    write(dir.path(), "book.md", BOOK);

    let output = pharos_cmd(dir.path())
        .args(["inspect", "book.md", "--json"])
        .output()
        .expect("inspect should not crash");
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(json["root"], "book");
    assert_eq!(json["nodes"][1]["id"], "chapter-1");
    assert_eq!(json["nodes"][2]["kind"], "zettel");
    assert_eq!(json["nodes"][2]["depth"], 2);
}

#[test]
fn completions_generate_for_bash() {
    let dir = TempDir::new().expect("tempdir");
    pharos_cmd(dir.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pharos"));
}
