//! Command-line tests
//!
//! Drive the binary against a small synthetic panel: two 275-residue
//! references that share the class I start motif and nothing else.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;

const MOTIF: &str = "GSHSMRYF";

/// Deterministic residue filler without histidines
fn pseudo_sequence(seed: u64, len: usize) -> String {
    const RESIDUES: &[u8] = b"ACDEFGIKLMNPQRSTVWY";
    let mut state = seed;
    (0..len)
        .map(|_| {
            state = state
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            RESIDUES[((state >> 33) % RESIDUES.len() as u64) as usize] as char
        })
        .collect()
}

fn reference(seed: u64) -> String {
    format!("{MOTIF}{}", pseudo_sequence(seed, 267))
}

struct Fixture {
    dir: tempfile::TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let panel = serde_json::json!({
            "class_i": {
                "HLA-B*27:05": reference(1),
                "HLA-A*02:01": reference(2),
            }
        });
        std::fs::write(dir.path().join("panel.json"), panel.to_string()).unwrap();
        std::fs::write(dir.path().join("motifs.json"), format!(r#"["{MOTIF}"]"#)).unwrap();

        let chains = [
            ("1hhk_A", format!("{}HHHHHH", reference(2))),
            ("1hhk_B", "LLFGYPVYV".to_string()),
            ("1hhk_D", format!("{}HHHHHH", reference(2))),
            ("2bnr_A", reference(1)),
            ("3abc_A", format!("{MOTIF}{}", "W".repeat(250))),
            ("4xyz_A", pseudo_sequence(11, 250)),
        ];
        let table: String = chains
            .iter()
            .map(|(id, seq)| format!("{id}\t{}\t{seq}\n", &id[..4]))
            .collect();
        std::fs::write(dir.path().join("chains.tsv"), format!("structure_id\tpdb_code\tsequence\n{table}"))
            .unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("pdb-curator").unwrap();
        cmd.current_dir(self.dir.path());
        cmd
    }

    fn panel_args(&self) -> Vec<String> {
        vec![
            "--panel".to_string(),
            self.path("panel.json").display().to_string(),
            "--motifs".to_string(),
            self.path("motifs.json").display().to_string(),
        ]
    }
}

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).unwrap()
}

fn read(path: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn test_help_lists_commands() {
    Command::cargo_bin("pdb-curator")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("scan"))
        .stdout(predicate::str::contains("classify"))
        .stdout(predicate::str::contains("partition"))
        .stdout(predicate::str::contains("step"));
}

#[test]
fn test_classify_exact_match() {
    let f = Fixture::new();
    let output = f
        .cmd()
        .args(["--format", "json", "classify"])
        .arg(format!("{}HHHHHH", reference(2)))
        .args(f.panel_args())
        .output()
        .unwrap();
    assert!(output.status.success());

    let json = stdout_json(&output);
    assert_eq!(json["tier"], "exact");
    assert_eq!(json["matched_to"], "hla_a_02_01");
    assert_eq!(json["construct_type"], "cytoplasmic");
    assert!(json["structural"].is_null());
}

#[test]
fn test_classify_text_output() {
    let f = Fixture::new();
    f.cmd()
        .arg("classify")
        .arg(reference(1))
        .args(["--structure-id", "2bnr_A"])
        .args(f.panel_args())
        .assert()
        .success()
        .stdout(predicate::str::contains("2bnr_A: EXACT"))
        .stdout(predicate::str::contains("HLA-B*27:05"));
}

#[test]
fn test_classify_without_motif_is_excluded() {
    let f = Fixture::new();
    f.cmd()
        .arg("classify")
        .arg(pseudo_sequence(11, 250))
        .args(f.panel_args())
        .assert()
        .success()
        .stdout(predicate::str::contains("excluded"));
}

#[test]
fn test_classify_requires_panel() {
    let f = Fixture::new();
    f.cmd()
        .args(["classify", MOTIF])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--panel is required"));
}

#[test]
fn test_classify_rejects_bad_sequence() {
    let f = Fixture::new();
    f.cmd()
        .args(["classify", "GSHS-12"])
        .args(f.panel_args())
        .assert()
        .failure()
        .stderr(predicate::str::contains("unexpected residue codes"));
}

#[test]
fn test_invalid_config_rejected() {
    let f = Fixture::new();
    std::fs::write(f.path("config.json"), r#"{"thresholds": {"good": 1.5}}"#).unwrap();
    f.cmd()
        .args(["--config", "config.json", "partition"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration"));
}

#[test]
fn test_scan_partition_and_core_records() {
    let f = Fixture::new();

    let output = f
        .cmd()
        .args(["--format", "json", "scan", "--candidates", "chains.tsv"])
        .args(f.panel_args())
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let report = stdout_json(&output);
    assert_eq!(report["tiers"]["exact"], 2);
    assert_eq!(report["tiers"]["poor"], 1);
    assert_eq!(report["duplicate"], 1);
    assert_eq!(report["excluded"], 1);
    assert_eq!(report["issues"], 1);

    let scan_dir = f.path("output/scan/class_i");
    assert_eq!(read(&scan_dir.join("exact.json")).as_array().unwrap().len(), 2);
    assert!(scan_dir.join("summary.json").is_file());
    assert!(!scan_dir.join("checkpoint").exists());

    let output = f
        .cmd()
        .args(["--format", "json", "partition"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let partition = stdout_json(&output);
    assert_eq!(partition["summary"]["new_work"], 2);
    assert_eq!(partition["summary"]["ignore_matches"], 1);
    assert_eq!(read(&f.path("overrides/scan/new_work.json")).as_array().unwrap().len(), 2);

    f.cmd()
        .args(["step", "core-records"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Successful: 2"));
    let core = read(&f.path("output/structures/core/1hhk.json"));
    assert_eq!(core["pdb_code"], "1hhk");

    f.cmd()
        .args(["step", "alike-chains", "--candidates", "chains.tsv"])
        .assert()
        .success();
    let alike = read(&f.path("output/structures/alike_chains/1hhk.json"));
    assert_eq!(alike["chains"]["A"], serde_json::json!(["A", "D"]));
    assert_eq!(alike["total_chain_counts"], 3);

    // Settled structures are skipped on the next sweep
    let output = f
        .cmd()
        .args(["--format", "json", "scan", "--candidates", "chains.tsv"])
        .args(f.panel_args())
        .output()
        .unwrap();
    let report = stdout_json(&output);
    assert_eq!(report["known"], 4);
    assert_eq!(report["tiers"]["exact"], 0);
}

#[test]
fn test_step_help_lists_metadata_steps() {
    Command::cargo_bin("pdb-curator")
        .unwrap()
        .args(["step", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("experimental"))
        .stdout(predicate::str::contains("publication"))
        .stdout(predicate::str::contains("--literature-url"));
}

#[test]
fn test_step_requires_candidates_for_alike_chains() {
    let f = Fixture::new();
    f.cmd()
        .args(["step", "alike-chains"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--candidates is required"));
}
