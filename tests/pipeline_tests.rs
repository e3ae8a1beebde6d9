//! End-to-end library tests: scan, partition, then curation steps.

use std::collections::BTreeMap;

use pdb_curator::catalog::lists::ScanLists;
use pdb_curator::catalog::panel::{ReferenceEntry, ReferencePanel};
use pdb_curator::matching::{AlignError, StructuralAligner};
use pdb_curator::pipeline::provider::{MetadataProvider, ProviderError};
use pdb_curator::pipeline::runlog::{RunId, RunLog};
use pdb_curator::pipeline::steps::{
    chronology, core_records, experimental, partition, title, StepContext,
};
use pdb_curator::pipeline::{ExecutorOptions, Facet, FacetStore};
use pdb_curator::scan::{
    CandidateOutcome, CheckpointStore, EveryN, ScanController, ScanFilter, ScanOptions, ScanPhase,
};
use pdb_curator::{Candidate, SequenceClassifier, Tier};
use serde_json::{json, Value};

const MOTIF: &str = "GSHSMRYF";

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

fn panel() -> ReferencePanel {
    ReferencePanel::new(
        "class_i",
        vec![
            ReferenceEntry::new("HLA-B*27:05", reference(1)),
            ReferenceEntry::new("HLA-A*02:01", reference(2)),
        ],
        vec![MOTIF.to_string()],
    )
    .unwrap()
}

/// Every structure covers most of the alignment region
struct WellAligned;

impl StructuralAligner for WellAligned {
    fn align(&self, _candidate: &Candidate) -> Result<f64, AlignError> {
        Ok(0.9)
    }
}

struct Summaries(BTreeMap<String, Value>);

impl MetadataProvider for Summaries {
    fn fetch_summary(&self, pdb_code: &str) -> Result<Value, ProviderError> {
        self.0
            .get(pdb_code)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(pdb_code.to_string()))
    }

    fn fetch_experiment(&self, pdb_code: &str) -> Result<Value, ProviderError> {
        let summary = self.fetch_summary(pdb_code)?;
        Ok(json!({
            "experimental_method": summary["experimental_method"],
            "resolution_high": summary["resolution"],
            "spacegroup": summary["spacegroup"],
            "cell": summary["cell"],
        }))
    }

    fn fetch_publications(&self, pdb_code: &str) -> Result<Value, ProviderError> {
        Err(ProviderError::NotFound(pdb_code.to_string()))
    }
}

fn candidates() -> Vec<Candidate> {
    vec![
        Candidate::from_structure_id("1hhk_A", reference(2)),
        Candidate::from_structure_id("2bnr_A", reference(1)),
        Candidate::from_structure_id("3abc_A", format!("{MOTIF}{}", "W".repeat(250))),
        Candidate::from_structure_id("4xyz_A", pseudo_sequence(11, 250)),
    ]
}

#[test]
fn test_interrupted_scan_resumes() {
    let dir = tempfile::tempdir().unwrap();
    let panel = panel();
    let aligner = WellAligned;
    let classifier = SequenceClassifier::new(&panel, &aligner);
    let scan_dir = dir.path().join("scan");

    {
        let mut controller = ScanController::new(
            &classifier,
            CheckpointStore::new(&scan_dir),
            ScanFilter::default(),
            ScanOptions::default(),
        )
        .with_trigger(EveryN::new(1));
        controller.start().unwrap();
        for candidate in &candidates()[..2] {
            controller.process(candidate).unwrap();
        }
        assert_eq!(controller.checkpoints_written(), 2);
        // Dropped without finishing
    }

    let mut controller = ScanController::new(
        &classifier,
        CheckpointStore::new(&scan_dir),
        ScanFilter::default(),
        ScanOptions::default(),
    );
    assert_eq!(controller.start().unwrap(), ScanPhase::Running { resumed: true });
    let outcomes: Vec<_> = candidates()
        .iter()
        .map(|c| controller.process(c).unwrap())
        .collect();
    assert_eq!(outcomes[0], CandidateOutcome::Resumed);
    assert_eq!(outcomes[1], CandidateOutcome::Resumed);
    assert_eq!(outcomes[2], CandidateOutcome::Classified(Tier::Possible));
    assert_eq!(outcomes[3], CandidateOutcome::Excluded);

    let report = controller.finish().unwrap();
    assert_eq!(report.resumed, 2);
    assert_eq!(report.tiers[&Tier::Exact], 2);
    assert_eq!(report.tiers[&Tier::Possible], 1);
    assert!(report.unmatched_labels.is_empty());
}

#[test]
fn test_scan_to_facets() {
    let dir = tempfile::tempdir().unwrap();
    let overrides_root = dir.path().join("overrides");
    let scan_dir = dir.path().join("output/scan/class_i");
    let run_log = RunLog::new(dir.path().join("logs"), RunId::from("e2e"));

    let panel = panel();
    let aligner = WellAligned;
    let classifier = SequenceClassifier::new(&panel, &aligner);
    let (report, _) = ScanController::new(
        &classifier,
        CheckpointStore::new(&scan_dir),
        ScanFilter::from_lists(&ScanLists::load(&overrides_root).unwrap()),
        ScanOptions::default(),
    )
    .run(candidates())
    .unwrap();
    assert_eq!(report.accepted(), 2);

    let record = partition::run(&scan_dir, &overrides_root, &run_log).unwrap();
    assert_eq!(record.summary.new_work, 2);
    assert_eq!(record.summary.left_for_review, 1);

    let ctx = StepContext {
        store: FacetStore::new(dir.path().join("output")),
        overrides_root: overrides_root.clone(),
        run_log: run_log.clone(),
        options: ExecutorOptions::default(),
        family: "class_i".to_string(),
    };

    let core = core_records::run(&ctx).unwrap();
    assert_eq!(core.summary.successful, 2);

    let mut summaries = BTreeMap::new();
    summaries.insert(
        "1hhk".to_string(),
        json!({
            "title": "THE ANTIGENIC IDENTITY OF PEPTIDE-MHC COMPLEXES",
            "deposition_date": "19950911",
            "release_date": "19960308",
            "revision_date": "20111116",
            "experimental_method": "X-ray diffraction",
            "resolution": 2.1,
            "spacegroup": "P 21 21 21",
            "cell": {"a": 58.9, "b": 79.5, "c": 113.3}
        }),
    );
    let provider = Summaries(summaries);

    let titles = title::run(&ctx, &provider).unwrap();
    assert_eq!(titles.successful, vec!["1hhk"]);
    assert_eq!(titles.errors[0].entity_id, "2bnr");
    assert_eq!(titles.errors[0].errors, vec!["unable_to_fetch_title_data"]);

    let mut action = chronology::ChronologyAction::new(&provider);
    let dates = chronology::run(&ctx, &mut action).unwrap();
    assert_eq!(dates.summary.successful, 1);
    assert_eq!(dates.errors[0].errors, vec!["unable_to_fetch_chronology_data"]);

    let doc = ctx
        .store
        .read(&Facet::structure("chronology"), "1hhk")
        .unwrap()
        .unwrap();
    assert_eq!(doc["release_date"], "1996-03-08");

    let methods = experimental::run(&ctx, &provider).unwrap();
    assert_eq!(methods.successful, vec!["1hhk"]);
    assert_eq!(methods.errors[0].errors, vec!["unable_to_fetch_experimental_data"]);
    let doc = ctx
        .store
        .read(&Facet::structure("experimental"), "1hhk")
        .unwrap()
        .unwrap();
    assert_eq!(doc["experimental_method"], "x_ray_diffraction");
    assert_eq!(doc["resolution"], 2.1);

    // Every step left a run log
    for step in ["partition", "core_records", "title", "chronology", "experimental"] {
        assert!(run_log.path(step).is_file(), "missing run log for {step}");
    }
}
