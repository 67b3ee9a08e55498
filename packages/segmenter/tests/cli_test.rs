//! Tests for the command-line interface.
//!
//! Each test runs the real binary against files in a temporary directory.

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn cli() -> Command {
    Command::new(env!("CARGO_BIN_EXE_biblio-segmenter"))
}

fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

const POEMS: &str = "\"Cementerio\"\nLine one\nLine two\n\n\"Olvido\"\nuna sombra\nde agua\n";

#[test]
fn test_help() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("segment"))
        .stdout(predicate::str::contains("author"))
        .stdout(predicate::str::contains("profiles"));
}

#[test]
fn test_profiles_lists_builtins() {
    cli()
        .arg("profiles")
        .assert()
        .success()
        .stdout(predicate::str::contains("prose"))
        .stdout(predicate::str::contains("book"))
        .stdout(predicate::str::contains("verse"));
}

#[test]
fn test_segment_text_file_as_verse() {
    let dir = TempDir::new().unwrap();
    let input = write_file(&dir, "poemas.txt", POEMS);

    let output = cli()
        .arg("segment")
        .arg(&input)
        .args(["--profile", "verse"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Poems: 2"))
        .get_output()
        .stdout
        .clone();

    let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
    let segments = value.as_array().unwrap();
    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0]["type"], "poem");
    assert_eq!(segments[0]["title"], "Cementerio");
    assert_eq!(segments[0]["verse_count"], 2);
}

#[test]
fn test_segment_json_blocks_to_ndjson_file() {
    let dir = TempDir::new().unwrap();
    let input = write_file(
        &dir,
        "libro.json",
        r###"[
            {"text": "# Title", "order": 0},
            {"text": "Body paragraph one.", "order": 1},
            {"text": "Body paragraph two.", "order": 2},
            {"text": "## Sub", "order": 3},
            {"text": "Body three.", "order": 4},
            {"text": "Body four.", "order": 5}
        ]"###,
    );
    let out = dir.path().join("segments.ndjson");

    cli()
        .arg("segment")
        .arg(&input)
        .args(["--profile", "book", "--format", "ndjson", "--output"])
        .arg(&out)
        .assert()
        .success()
        .stderr(predicate::str::contains("Saved to:"));

    let written = fs::read_to_string(&out).unwrap();
    let lines: Vec<serde_json::Value> = written
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["type"], "section");
    assert_eq!(lines[1]["title"], "Sub");
    assert_eq!(lines[1]["parent_order"], 0);
}

#[test]
fn test_segment_with_config_file() {
    let dir = TempDir::new().unwrap();
    let input = write_file(&dir, "poemas.txt", POEMS);
    let config = write_file(&dir, "config.yaml", "profile: verse\nauthor_detection:\n  enabled: false\n");

    cli()
        .arg("segment")
        .arg(&input)
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"type\": \"poem\""))
        .stdout(predicate::str::contains("detected_author").not());
}

#[test]
fn test_author_from_title() {
    let dir = TempDir::new().unwrap();
    let input = write_file(&dir, "poemas.txt", POEMS);

    cli()
        .arg("author")
        .arg(&input)
        .args(["--profile", "verse", "--title", "Dario Ruben_Antologia"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Rubén Darío"))
        .stdout(predicate::str::contains("0.85"));
}

#[test]
fn test_author_from_filename() {
    let dir = TempDir::new().unwrap();
    let input = write_file(&dir, "antologia_pablo-neruda.txt", POEMS);

    cli()
        .arg("author")
        .arg(&input)
        .args(["--profile", "verse"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Pablo Neruda"));
}

#[test]
fn test_author_not_found() {
    let dir = TempDir::new().unwrap();
    let input = write_file(&dir, "notas.txt", "una nota sin firma.\notra nota.\n");

    cli()
        .arg("author")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("No author detected"));
}

#[test]
fn test_missing_input_fails() {
    cli()
        .args(["segment", "/nonexistent/libro.json"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_unknown_profile_fails() {
    let dir = TempDir::new().unwrap();
    let input = write_file(&dir, "a.txt", "texto\n");

    cli()
        .arg("segment")
        .arg(&input)
        .args(["--profile", "drama"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown profile"));
}

#[test]
fn test_invalid_block_json_fails() {
    let dir = TempDir::new().unwrap();
    let input = write_file(&dir, "roto.json", "{\"text\": 1}");

    cli()
        .arg("segment")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("JSON error"));
}
