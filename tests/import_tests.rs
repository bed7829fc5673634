//! File-based tests for the batch importer.

use abc_import::import::{collect_abc_files, import_files};
use abc_import::ImportConfig;
use pretty_assertions::assert_eq;
use serde_json::Value;
use std::fs;

const TUNEBOOK: &str = "%abc-2.1
X:1
T:The Butterfly
R:slip jig
M:9/8
L:1/8
K:Em
|:B2 E G2 E F3|B2 E G2 E FED|
X:2
T:Broken One
K:G
GAB [Bd
X:3
T:Tiny
K:C
C
";

#[test]
fn test_import_directory() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let nested = input.path().join("jigs");
    fs::create_dir_all(&nested).unwrap();
    fs::write(nested.join("Slip Jigs.abc"), TUNEBOOK).unwrap();
    fs::write(input.path().join("notes.txt"), "not a tune").unwrap();

    let files = collect_abc_files(input.path());
    assert_eq!(files.len(), 1);

    let summary = import_files(&files, output.path(), &ImportConfig::default()).unwrap();
    assert_eq!(summary.total, 3);
    assert_eq!(summary.converted, 1);

    let json = fs::read_to_string(output.path().join("abc-slip-jigs.json")).unwrap();
    let song: Value = serde_json::from_str(&json).unwrap();

    assert_eq!(song["id"], "abc-slip-jigs");
    assert_eq!(song["type"], "song");
    assert_eq!(song["source"], "thesession");
    assert_eq!(song["metadata"]["title"], "The Butterfly");
    assert_eq!(song["metadata"]["genre"], "slip jig");
    assert_eq!(song["settings"]["timeSignature"], serde_json::json!([9, 8]));
    assert_eq!(song["settings"]["keySignature"], "Em");
    assert_eq!(song["scoring"]["starThresholds"], serde_json::json!([70, 85, 95]));

    let melody = song["sections"][0]["layers"]["melody"].as_array().unwrap();
    assert_eq!(melody.len(), 12);
    // F# from the E minor signature
    assert_eq!(melody[4]["note"], 66);

    assert!(!output.path().join("abc-slip-jigs-2.json").exists());
    assert!(!output.path().join("abc-slip-jigs-3.json").exists());
}

#[test]
fn test_unreadable_file_counts_as_failure() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("good.abc");
    fs::write(&good, "X:1\nT:Good\nL:1/4\nK:C\nCDEF|").unwrap();
    let missing = dir.path().join("missing.abc");

    let summary = import_files(&[good, missing], &dir.path().join("out"), &ImportConfig::default())
        .unwrap();
    assert_eq!(summary.converted, 1);
    assert_eq!(summary.total, 2);
}

#[test]
fn test_untitled_tune_with_composer() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Carolan_Tunes.abc");
    fs::write(&path, "X:1\nC:Turlough O'Carolan\nM:3/4\nL:1/4\nK:G major\nGAB|c2d|\n").unwrap();

    let out = dir.path().join("out");
    let summary = import_files(&[path], &out, &ImportConfig::default()).unwrap();
    assert_eq!(summary.converted, 1);

    let song: Value =
        serde_json::from_str(&fs::read_to_string(out.join("abc-carolan-tunes.json")).unwrap())
            .unwrap();
    assert_eq!(song["metadata"]["title"], "Carolan Tunes");
    assert_eq!(song["metadata"]["artist"], "Turlough O'Carolan");
    assert_eq!(song["settings"]["keySignature"], "G major");
}

#[test]
fn test_config_file_changes_output() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("import.yaml");
    fs::write(&config_path, "min-notes: 1\nsource: archive\n").unwrap();
    let config = ImportConfig::load(&config_path).unwrap();

    let tune_path = dir.path().join("tiny.abc");
    fs::write(&tune_path, "X:1\nT:Tiny\nK:C\nC\n").unwrap();

    let out = dir.path().join("out");
    let summary = import_files(&[tune_path], &out, &config).unwrap();
    assert_eq!(summary.converted, 1);

    let song: Value =
        serde_json::from_str(&fs::read_to_string(out.join("abc-tiny.json")).unwrap()).unwrap();
    assert_eq!(song["source"], "archive");
    assert_eq!(song["metadata"]["genre"], "folk");
    assert_eq!(song["metadata"]["durationSeconds"], 10);
}
