//! Classify command - run the classification cascade on one sequence.
//!
//! Useful for checking why a chain landed in a tier without rerunning a scan.

use std::path::PathBuf;

use clap::Args;
use serde_json::json;

use crate::cli::{load_config, load_panel, print_json, OutputFormat, PanelArgs};
use crate::core::candidate::Candidate;
use crate::matching::{AlignmentRecordStore, Classification, SequenceClassifier};
use crate::utils::validation::normalize_sequence;

#[derive(Args)]
pub struct ClassifyArgs {
    /// One-letter residue sequence
    #[arg(required = true)]
    pub sequence: String,

    /// Chain identifier (`pdb_chain`); the pdb code selects the alignment record
    #[arg(long, default_value = "query_A")]
    pub structure_id: String,

    #[command(flatten)]
    pub panel: PanelArgs,

    /// Directory of per-structure alignment records
    #[arg(long)]
    pub alignments: Option<PathBuf>,
}

/// Execute the classify subcommand
///
/// # Errors
///
/// Returns an error if the sequence is invalid or the panel cannot be loaded.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(
    args: ClassifyArgs,
    format: OutputFormat,
    verbose: bool,
    config_path: Option<&std::path::Path>,
) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;
    args.panel.apply(&mut config);
    if let Some(alignments) = &args.alignments {
        config.paths.alignments.clone_from(alignments);
    }
    config.validate()?;

    let sequence = normalize_sequence(&args.sequence)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| anyhow::anyhow!("Sequence contains unexpected residue codes"))?;
    let candidate = Candidate::from_structure_id(&args.structure_id, sequence);

    let panel = load_panel(&config)?;
    let aligner = AlignmentRecordStore::new(&config.paths.alignments, &config.alignment);
    let classifier = SequenceClassifier::with_config(&panel, &aligner, config.classifier_config());
    let classification = classifier.classify(&candidate);

    match format {
        OutputFormat::Text => print_text(&candidate, classification.as_ref(), verbose),
        OutputFormat::Json => {
            let output = classification.as_ref().map_or_else(
                || json!({ "structure_id": candidate.structure_id, "excluded": true }),
                |c| {
                    json!({
                        "structure_id": candidate.structure_id,
                        "excluded": false,
                        "tier": c.tier,
                        "score": c.score,
                        "label": c.label,
                        "matched_to": c.matched_to,
                        "motif": c.motif,
                        "construct_type": c.normalized.construct,
                        "leader": c.normalized.leader,
                        "compared_length": c.normalized.sequence.len(),
                        "structural": c.structural.as_ref().map(|s| json!({
                            "ratio": s.ratio,
                            "issue": s.issue.as_ref().map(|issue| issue.code()),
                        })),
                    })
                },
            );
            print_json(&output)?;
        }
    }
    Ok(())
}

fn print_text(candidate: &Candidate, classification: Option<&Classification>, verbose: bool) {
    let Some(c) = classification else {
        println!(
            "{}: excluded (no start motif near the N-terminus)",
            candidate.structure_id
        );
        return;
    };

    println!("{}: {}", candidate.structure_id, c.tier.as_str().to_uppercase());
    println!("   Score: {:.4}", c.score);
    println!("   Best match: {}", c.label.as_deref().unwrap_or("-"));
    println!("   Construct: {}", c.normalized.construct);
    if let Some(structural) = &c.structural {
        println!("   Alignment coverage: {:.1}%", structural.ratio * 100.0);
        if let Some(issue) = &structural.issue {
            println!("   Alignment issue: {issue}");
        }
    }
    if verbose {
        println!("   Motif: {}", c.motif);
        println!("   Compared length: {}", c.normalized.sequence.len());
        println!("   Compared sequence: {}", c.normalized.sequence);
    }
}
