use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use crate::cli::{load_config, print_json, OutputFormat};
use crate::core::candidate::CandidateQuery;
use crate::parsing;
use crate::pipeline::executor::{ExecutorOptions, RunRecord};
use crate::pipeline::facet::FacetStore;
use crate::pipeline::provider::{PdbeProvider, EUROPE_PMC_SEARCH_URL, PDBE_ENTRY_URL};
use crate::pipeline::runlog::{RunId, RunLog};
use crate::pipeline::steps::{
    alike_chains, chronology, core_records, experimental, publication, title, StepContext,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum StepName {
    /// Empty structure record skeleton
    CoreRecords,
    /// Group chains of each structure by sequence similarity
    AlikeChains,
    /// Structure title from the PDBe summary
    Title,
    /// Deposition, release and revision dates (always recomputed)
    Chronology,
    /// Experimental method, resolution and unit cell
    Experimental,
    /// Primary citation as BibJSON
    Publication,
}

#[derive(Args)]
pub struct StepArgs {
    /// Step to run
    #[arg(value_enum)]
    pub step: StepName,

    /// Recompute facets that already exist
    #[arg(long)]
    pub force: bool,

    /// Process at most this many structures
    #[arg(long)]
    pub limit: Option<usize>,

    /// Output root for facets
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Overrides root holding the scan lists and per-step corrections
    #[arg(long)]
    pub overrides: Option<PathBuf>,

    /// Directory for run logs
    #[arg(long)]
    pub logs: Option<PathBuf>,

    /// Candidate chains used by alike-chains (every chain of each structure)
    #[arg(long)]
    pub candidates: Option<PathBuf>,

    /// Base URL of the PDBe entry API
    #[arg(long, default_value = PDBE_ENTRY_URL)]
    pub api_url: String,

    /// Literature search URL used by publication
    #[arg(long, default_value = EUROPE_PMC_SEARCH_URL)]
    pub literature_url: String,
}

/// Execute the step subcommand
///
/// # Errors
///
/// Returns an error if the configuration or scan lists cannot be read, or
/// the run log cannot be written. Per-structure failures are reported in the
/// run log, not as errors.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(
    args: StepArgs,
    format: OutputFormat,
    verbose: bool,
    config_path: Option<&std::path::Path>,
) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(output) = &args.output {
        config.paths.output.clone_from(output);
    }
    if let Some(overrides) = &args.overrides {
        config.paths.overrides.clone_from(overrides);
    }
    if let Some(logs) = &args.logs {
        config.paths.logs.clone_from(logs);
    }
    config.validate()?;

    let ctx = StepContext {
        store: FacetStore::new(&config.paths.output),
        overrides_root: config.paths.overrides.clone(),
        run_log: RunLog::new(&config.paths.logs, RunId::now()),
        options: ExecutorOptions {
            force: args.force,
            limit: args.limit,
        },
        family: config.scan.family.clone(),
    };

    let record = match args.step {
        StepName::CoreRecords => core_records::run(&ctx)?,
        StepName::AlikeChains => {
            let path = args
                .candidates
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("--candidates is required for alike-chains"))?;
            let candidates = parsing::parse_candidates(path, &CandidateQuery::unbounded())
                .with_context(|| format!("Failed to read candidates from {}", path.display()))?;
            let index = alike_chains::ChainIndex::from_candidates(&candidates);
            if verbose {
                eprintln!("Indexed chains for {} structures", index.len());
            }
            alike_chains::run(&ctx, &index)?
        }
        StepName::Title => {
            let provider = PdbeProvider::with_base_url(&args.api_url)?;
            title::run(&ctx, &provider)?
        }
        StepName::Chronology => {
            let provider = PdbeProvider::with_base_url(&args.api_url)?;
            let mut action = chronology::ChronologyAction::new(&provider);
            chronology::run(&ctx, &mut action)?
        }
        StepName::Experimental => {
            let provider = PdbeProvider::with_base_url(&args.api_url)?;
            experimental::run(&ctx, &provider)?
        }
        StepName::Publication => {
            let provider = PdbeProvider::with_base_url(&args.api_url)?
                .with_literature_url(&args.literature_url);
            publication::run(&ctx, &provider)?
        }
    };

    match format {
        OutputFormat::Text => print_text(&record, verbose),
        OutputFormat::Json => print_json(&record)?,
    }
    Ok(())
}

fn print_text(record: &RunRecord, verbose: bool) {
    println!("Step '{}' ({})", record.step, record.facet);
    println!("   Successful: {}", record.summary.successful);
    println!("   Unchanged: {}", record.summary.unchanged);
    println!("   Errors: {}", record.summary.errors);
    if record.summary.applied_overrides > 0 {
        println!("   Overrides applied: {}", record.summary.applied_overrides);
    }
    if let Some(stale) = record.extra.get("needs_updating").and_then(|v| v.as_array()) {
        if !stale.is_empty() {
            println!("   Requeued after revision: {}", stale.len());
        }
    }
    if verbose {
        for failure in &record.errors {
            println!(
                "      {}: {} ({})",
                failure.entity_id,
                failure.errors.join(", "),
                failure.message
            );
        }
    }
}
