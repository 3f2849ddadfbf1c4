//! End-to-end tests of the barcode-seqkit binary on small FASTQ inputs.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

fn write_fastq(path: &Path, records: &[(&str, &str)]) {
    let mut text = String::new();
    for (name, sequence) in records {
        text.push_str(&format!(
            "@{name}\n{sequence}\n+\n{}\n",
            "I".repeat(sequence.len())
        ));
    }
    std::fs::write(path, text).expect("Failed to write FASTQ fixture");
}

fn read_names(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .expect("Failed to read output")
        .lines()
        .filter_map(|l| l.strip_prefix('@'))
        .map(str::to_string)
        .collect()
}

fn cmd() -> Command {
    Command::cargo_bin("barcode-seqkit").expect("Binary should be built")
}

fn three_read_fixture(dir: &Path) -> std::path::PathBuf {
    let input = dir.join("reads.fastq");
    write_fastq(
        &input,
        &[("r1", "ACGTAAAA"), ("r2", "AAAATTTT"), ("r3", "GGGGCCCC")],
    );
    input
}

#[test]
fn test_extract_located_barcodes() {
    let dir = tempfile::tempdir().unwrap();
    let input = three_read_fixture(dir.path());
    let out = dir.path().join("out");

    cmd()
        .arg("extract")
        .arg(&input)
        .args(["--barcode5", "ACGT", "--barcode3", "TTTT"])
        .args(["--output-prefix", "sample"])
        .arg("--output-dir")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Barcode extraction: 3 reads"))
        .stdout(predicate::str::contains("barcode5_orientFR"));

    assert_eq!(
        read_names(&out.join("sample_barcode5_orientFR.fastq")),
        vec!["r1"]
    );
    assert_eq!(
        read_names(&out.join("sample_barcode3_orientFR.fastq")),
        vec!["r2"]
    );
    assert_eq!(read_names(&out.join("sample_noBarcode.fastq")), vec!["r3"]);

    let tsv = std::fs::read_to_string(out.join("sample_extraction_stats.tsv")).unwrap();
    assert!(tsv.starts_with("Metric\tValue\nTotalReads\t3\nTotalBarcodeMatches\t2\n"));
    assert!(tsv.contains("MatchRate\t0.6667\n"));
}

#[test]
fn test_extract_json_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = three_read_fixture(dir.path());

    let output = cmd()
        .args(["--format", "json", "extract"])
        .arg(&input)
        .args(["-b", "ACGT", "--stats-only"])
        .arg("-o")
        .arg(dir.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["total_reads"], 3);
    assert_eq!(value["total_barcode_matches"], 1);
    assert_eq!(value["no_barcode_count"], 2);
    assert_eq!(value["matches_by_category"]["barcode_orientFR"], 1);
    assert!(!dir.path().join("barcode_extraction_barcode_orientFR.fastq").exists());
    assert!(dir
        .path()
        .join("barcode_extraction_extraction_stats.json")
        .exists());
}

#[test]
fn test_extract_without_unmatched_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = three_read_fixture(dir.path());

    cmd()
        .arg("extract")
        .arg(&input)
        .args(["-b", "ACGT", "--no-unmatched", "-p", "run"])
        .arg("-o")
        .arg(dir.path())
        .assert()
        .success();

    assert!(dir.path().join("run_barcode_orientFR.fastq").exists());
    assert!(dir.path().join("run_barcode_orientRC.fastq").exists());
    assert!(!dir.path().join("run_noBarcode.fastq").exists());
}

#[test]
fn test_extract_with_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = three_read_fixture(dir.path());
    let config = dir.path().join("config.json");
    std::fs::write(
        &config,
        r#"{"barcodes": [{"sequence": "ACGAAAAA", "name": "fuzzy"}], "max_mismatches": 1}"#,
    )
    .unwrap();

    cmd()
        .args(["--format", "tsv", "extract"])
        .arg(&input)
        .arg("--config")
        .arg(&config)
        .arg("--stats-only")
        .arg("-o")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("fuzzy\t1"));
}

#[test]
fn test_extract_paired_directory() {
    let dir = tempfile::tempdir().unwrap();
    let reads = dir.path().join("reads");
    std::fs::create_dir(&reads).unwrap();
    write_fastq(&reads.join("s_R1.fastq"), &[("p1/1", "ACGTAAAA")]);
    write_fastq(&reads.join("s_R2.fastq"), &[("p1/2", "CCCCCCCC")]);
    let out = dir.path().join("out");

    cmd()
        .arg("extract")
        .arg(&reads)
        .args(["-b", "ACGT", "-p", "pair"])
        .arg("-o")
        .arg(&out)
        .assert()
        .success();

    assert_eq!(
        read_names(&out.join("pair_barcode_orientFR_R1.fastq")),
        vec!["p1/1"]
    );
    assert_eq!(
        read_names(&out.join("pair_barcode_orientFR_R2.fastq")),
        vec!["p1/2"]
    );
}

#[test]
fn test_extract_rejects_bad_inputs() {
    let dir = tempfile::tempdir().unwrap();
    let input = three_read_fixture(dir.path());

    // No barcodes
    cmd()
        .arg("extract")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("No barcodes configured"));

    // Invalid barcode base
    cmd()
        .arg("extract")
        .arg(&input)
        .args(["-b", "ACGU"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid barcode sequence"));

    // Prefix escaping the output directory
    cmd()
        .arg("extract")
        .arg(&input)
        .args(["-b", "ACGT", "-p", "../escape"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid output prefix"));

    // Unsupported input format
    let text = dir.path().join("reads.txt");
    std::fs::write(&text, "not reads").unwrap();
    cmd()
        .arg("extract")
        .arg(&text)
        .args(["-b", "ACGT"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported input format"));

    // Missing input
    cmd()
        .arg("extract")
        .arg(dir.path().join("missing.fastq"))
        .args(["-b", "ACGT"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input not found"));
}

#[test]
fn test_scan_reports_first_and_best() {
    cmd()
        .args(["scan", "AAAACCGCNNTCTCAGAG"])
        .args(["-b", "AAAACCCC", "-b", "TCTCAGAG", "-m", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Category: barcode_orientFR"))
        .stdout(predicate::str::contains("Decided by: AAAACCCC (FR) at position 0"))
        .stdout(predicate::str::contains(
            "Fewest edits: TCTCAGAG (FR) at position 10",
        ));
}

#[test]
fn test_scan_json() {
    let output = cmd()
        .args(["--format", "json", "scan", "TTACGTCCGTTT"])
        .args(["--barcode5", "ACGTACGT", "-m", "1"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["category"], "barcode_orientFR");
    assert_eq!(value["first_match"]["position"], 2);
    assert_eq!(value["first_match"]["matched"], "ACGTCCGT");
    assert_eq!(value["first_match"]["hamming"], 1);
    assert_eq!(value["matches"].as_array().unwrap().len(), 2);
}

#[test]
fn test_help() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("extract"))
        .stdout(predicate::str::contains("scan"));
}
