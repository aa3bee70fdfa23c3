use assert_cmd::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

/// `tissue-hier` command running in an isolated temp directory.
fn hier_cmd(work_dir: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("tissue-hier");
    cmd.current_dir(work_dir.path());
    cmd.env("NO_COLOR", "1");
    cmd.env_remove("RUST_LOG");
    cmd
}

fn square(x: f64, y: f64, size: f64) -> String {
    format!(
        "POLYGON(({x} {y}, {x1} {y}, {x1} {y1}, {x} {y1}, {x} {y}))",
        x1 = x + size,
        y1 = y + size
    )
}

fn annotation(id: &str, label: &str, wkt: String) -> serde_json::Value {
    serde_json::json!({"id": id, "kind": "annotation", "classification": label, "wkt": wkt})
}

fn detection(id: &str, wkt: String) -> serde_json::Value {
    serde_json::json!({"id": id, "kind": "detection", "wkt": wkt})
}

/// Follicle / PALS / vessel section with three detections, plus one region
/// of each remaining structural label so the presets validate.
fn section() -> Vec<serde_json::Value> {
    vec![
        annotation("F1", "Follicle", square(0.0, 0.0, 10.0)),
        annotation("P1", "PALS", square(20.0, 0.0, 10.0)),
        annotation("V1", "SmallVessel", square(2.0, 2.0, 2.0)),
        annotation("R1", "RedPulp", square(100.0, 0.0, 10.0)),
        annotation("T1", "Trabeculae", square(120.0, 0.0, 10.0)),
        annotation("L1", "LargeVessel", square(140.0, 0.0, 10.0)),
        detection("D1", square(4.5, 4.5, 1.0)),
        detection("D2", square(24.5, 4.5, 1.0)),
        detection("D3", square(2.5, 2.5, 1.0)),
        detection("OUT", square(500.0, 500.0, 1.0)),
    ]
}

fn write_json(dir: &TempDir, name: &str, records: &[serde_json::Value]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, serde_json::to_string(records).unwrap()).unwrap();
    path
}

// ============================================================================
// Basic flags
// ============================================================================

#[test]
fn version_flag() {
    cargo_bin_cmd!("tissue-hier")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("tissue-hier"));
}

#[test]
fn help_flag() {
    cargo_bin_cmd!("tissue-hier")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("assign"))
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("presets"));
}

#[test]
fn verbose_quiet_conflict() {
    cargo_bin_cmd!("tissue-hier")
        .args(["--verbose", "--quiet", "presets"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

// ============================================================================
// presets
// ============================================================================

#[test]
fn presets_prints_both() {
    let tmp = TempDir::new().unwrap();
    hier_cmd(&tmp)
        .arg("presets")
        .assert()
        .success()
        .stdout(predicate::str::contains("# preset: annotations-only"))
        .stdout(predicate::str::contains("# preset: annotations-detections"))
        .stdout(predicate::str::contains("mode = \"two-tier\""))
        .stdout(predicate::str::contains("lowest_priority_label = \"SmallVessel\""));
}

#[test]
fn unknown_preset_is_usage_error() {
    let tmp = TempDir::new().unwrap();
    hier_cmd(&tmp)
        .args(["presets", "liver"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown preset 'liver'"));
}

// ============================================================================
// assign
// ============================================================================

#[test]
fn assign_prints_table_summary() {
    let tmp = TempDir::new().unwrap();
    let input = write_json(&tmp, "objects.json", &section());

    hier_cmd(&tmp)
        .args(["assign", input.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("three-tier"))
        .stdout(predicate::str::contains("assigned"))
        .stdout(predicate::str::contains("structural"))
        .stdout(predicate::str::contains("Follicle"));
}

#[test]
fn assign_json_summary() {
    let tmp = TempDir::new().unwrap();
    let input = write_json(&tmp, "objects.json", &section());

    let out = hier_cmd(&tmp)
        .args(["assign", input.to_str().unwrap(), "--format", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let report: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(report["summary"]["parents"], 6);
    assert_eq!(report["summary"]["children"], 4);
    assert_eq!(report["summary"]["assigned"], 3);
    assert_eq!(report["summary"]["unassigned"], 1);
    assert_eq!(report["summary"]["per_tier"]["structural"]["assigned"], 3);
    assert_eq!(report["summary"]["per_tier"]["lowest"]["assigned"], 0);
}

#[test]
fn assign_writes_relation() {
    let tmp = TempDir::new().unwrap();
    let input = write_json(&tmp, "objects.json", &section());
    let output = tmp.path().join("relation.json");

    hier_cmd(&tmp)
        .args([
            "assign",
            input.to_str().unwrap(),
            "--output",
            output.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("Wrote 3 assignments"));

    let doc: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(doc["relation"]["assignments"]["D1"], "F1");
    assert_eq!(doc["relation"]["assignments"]["D2"], "P1");
    assert_eq!(doc["relation"]["assignments"]["D3"], "F1");
    assert_eq!(doc["relation"]["children"]["F1"], serde_json::json!(["D1", "D3"]));
    assert_eq!(doc["unassigned"], serde_json::json!(["OUT"]));
}

#[test]
fn assign_output_is_deterministic() {
    let tmp = TempDir::new().unwrap();
    let input = write_json(&tmp, "objects.json", &section());
    let a = tmp.path().join("a.json");
    let b = tmp.path().join("b.json");

    for out in [&a, &b] {
        hier_cmd(&tmp)
            .args([
                "-q",
                "assign",
                input.to_str().unwrap(),
                "-o",
                out.to_str().unwrap(),
            ])
            .assert()
            .success();
    }

    assert_eq!(std::fs::read(&a).unwrap(), std::fs::read(&b).unwrap());
}

#[test]
fn assign_reads_ndjson_from_stdin() {
    let tmp = TempDir::new().unwrap();
    let ndjson: String = section()
        .iter()
        .map(|r| format!("{r}\n"))
        .collect();

    hier_cmd(&tmp)
        .args(["assign", "-", "--format", "json"])
        .write_stdin(ndjson)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"assigned\": 3"));
}

#[test]
fn two_tier_mode_override() {
    let tmp = TempDir::new().unwrap();
    let input = write_json(&tmp, "objects.json", &section());
    let output = tmp.path().join("relation.json");

    hier_cmd(&tmp)
        .args([
            "assign",
            input.to_str().unwrap(),
            "--mode",
            "two-tier",
            "-o",
            output.to_str().unwrap(),
        ])
        .assert()
        .success();

    let doc: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(doc["summary"]["mode"], "two-tier");
    assert_eq!(doc["relation"]["assignments"]["V1"], "F1");
}

#[test]
fn missing_label_fails_unless_allowed() {
    let tmp = TempDir::new().unwrap();
    let records = vec![
        annotation("F1", "Follicle", square(0.0, 0.0, 10.0)),
        detection("D1", square(4.5, 4.5, 1.0)),
    ];
    let input = write_json(&tmp, "objects.json", &records);

    hier_cmd(&tmp)
        .args(["assign", input.to_str().unwrap()])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("absent from data"));

    hier_cmd(&tmp)
        .args(["assign", input.to_str().unwrap(), "--allow-missing-labels"])
        .assert()
        .success();
}

#[test]
fn config_file_defines_labels() {
    let tmp = TempDir::new().unwrap();
    let records = vec![
        annotation("C1", "Cortex", square(0.0, 0.0, 10.0)),
        annotation("G1", "Glomerulus", square(1.0, 1.0, 5.0)),
        detection("D1", square(2.5, 2.5, 1.0)),
    ];
    let input = write_json(&tmp, "kidney.json", &records);
    let config = tmp.path().join("kidney.toml");
    std::fs::write(
        &config,
        "mode = \"three-tier\"\nstructural_labels = [\"Cortex\"]\nlowest_priority_label = \"Glomerulus\"\n",
    )
    .unwrap();
    let output = tmp.path().join("relation.json");

    hier_cmd(&tmp)
        .args([
            "assign",
            input.to_str().unwrap(),
            "--config",
            config.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
        ])
        .assert()
        .success();

    let doc: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(doc["relation"]["assignments"]["D1"], "C1");
}

#[test]
fn config_and_preset_conflict() {
    let tmp = TempDir::new().unwrap();
    hier_cmd(&tmp)
        .args([
            "assign",
            "objects.json",
            "--config",
            "a.toml",
            "--preset",
            "annotations-only",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn missing_input_file() {
    let tmp = TempDir::new().unwrap();
    hier_cmd(&tmp)
        .args(["assign", "nope.json"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed to read"));
}

// ============================================================================
// validate
// ============================================================================

#[test]
fn validate_reports_roles_and_skipped() {
    let tmp = TempDir::new().unwrap();
    let mut records = section();
    records.push(detection("BROKEN", "POLYGON((0 0, 1 1".to_string()));
    let input = write_json(&tmp, "objects.json", &records);

    hier_cmd(&tmp)
        .args(["validate", input.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("parents (structural)"))
        .stdout(predicate::str::contains("parents (lowest)"))
        .stdout(predicate::str::contains("BROKEN"))
        .stdout(predicate::str::contains("ok:"));
}
