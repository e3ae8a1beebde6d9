use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use crate::catalog::lists::ScanLists;
use crate::cli::{load_config, load_panel, print_json, OutputFormat, PanelArgs};
use crate::config::PipelineConfig;
use crate::matching::{AlignmentRecordStore, SequenceClassifier};
use crate::parsing;
use crate::scan::{CheckpointStore, EveryN, ScanController, ScanFilter, ScanOptions, ScanReport};

#[derive(Args)]
pub struct ScanArgs {
    /// Candidate chains: PDB seqres FASTA (optionally gzipped) or a TSV chain table
    #[arg(long, required = true)]
    pub candidates: PathBuf,

    #[command(flatten)]
    pub panel: PanelArgs,

    /// Output root; scan results go under `{output}/scan/{family}`
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Overrides root holding the scan lists
    #[arg(long)]
    pub overrides: Option<PathBuf>,

    /// Directory of per-structure alignment records
    #[arg(long)]
    pub alignments: Option<PathBuf>,

    /// Discard any checkpoint and rescan structures settled by earlier runs
    #[arg(long)]
    pub force: bool,

    /// Candidates between checkpoints (0 disables checkpointing)
    #[arg(long)]
    pub checkpoint_interval: Option<usize>,

    /// Exclusive lower bound on chain length
    #[arg(long)]
    pub min_length: Option<usize>,

    /// Exclusive upper bound on chain length
    #[arg(long)]
    pub max_length: Option<usize>,
}

impl ScanArgs {
    fn apply(&self, config: &mut PipelineConfig) {
        self.panel.apply(config);
        if let Some(output) = &self.output {
            config.paths.output.clone_from(output);
        }
        if let Some(overrides) = &self.overrides {
            config.paths.overrides.clone_from(overrides);
        }
        if let Some(alignments) = &self.alignments {
            config.paths.alignments.clone_from(alignments);
        }
        if let Some(interval) = self.checkpoint_interval {
            config.scan.checkpoint_interval = interval;
        }
        if let Some(min_length) = self.min_length {
            config.scan.min_length = min_length;
        }
        if let Some(max_length) = self.max_length {
            config.scan.max_length = max_length;
        }
    }
}

/// Execute the scan subcommand
///
/// # Errors
///
/// Returns an error if the configuration, panel or candidate source cannot
/// be loaded, or the scan output cannot be written.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(
    args: ScanArgs,
    format: OutputFormat,
    verbose: bool,
    config_path: Option<&std::path::Path>,
) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;
    args.apply(&mut config);
    config.validate()?;

    let panel = load_panel(&config)?;
    if verbose {
        eprintln!(
            "Loaded {} references and {} start motifs for '{}'",
            panel.len(),
            panel.start_motifs().len(),
            panel.family()
        );
    }

    let candidates = parsing::parse_candidates(&args.candidates, &config.candidate_query())
        .with_context(|| format!("Failed to read candidates from {}", args.candidates.display()))?;
    if verbose {
        eprintln!("Read {} candidate chains", candidates.len());
    }

    let lists = ScanLists::load(&config.paths.overrides)?;
    let aligner = AlignmentRecordStore::new(&config.paths.alignments, &config.alignment);
    let classifier = SequenceClassifier::with_config(&panel, &aligner, config.classifier_config());
    let store = CheckpointStore::new(config.scan_dir());
    let controller = ScanController::new(
        &classifier,
        store,
        ScanFilter::from_lists(&lists),
        ScanOptions { force: args.force },
    )
    .with_trigger(EveryN::new(config.scan.checkpoint_interval));

    let (report, _) = controller.run(candidates)?;

    match format {
        OutputFormat::Text => print_text_report(&report, &config),
        OutputFormat::Json => print_json(&report)?,
    }
    Ok(())
}

fn print_text_report(report: &ScanReport, config: &PipelineConfig) {
    println!("Scan complete for '{}'", report.family);
    println!("   Candidates: {}", report.candidates);
    for (tier, count) in &report.tiers {
        println!("   {tier:>10}: {count}");
    }
    println!(
        "   Skipped: {} excluded, {} ignored, {} known, {} duplicate",
        report.excluded, report.ignored, report.known, report.duplicate
    );
    if report.resumed > 0 {
        println!("   Resumed past {} candidates", report.resumed);
    }
    if report.issues > 0 {
        println!("   Structural issues: {}", report.issues);
    }
    if report.leader_strip_failures > 0 {
        println!("   Leader strip failures: {}", report.leader_strip_failures);
    }
    if !report.unmatched_labels.is_empty() {
        println!(
            "\n   References never matched ({}): {}",
            report.unmatched_labels.len(),
            report.unmatched_labels.join(", ")
        );
    }
    println!("\nResults written to {}", config.scan_dir().display());
}
