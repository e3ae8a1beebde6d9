//! Command-line interface for pdb-curator.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **scan**: Sweep a candidate set and sort every chain into a tier
//! - **classify**: Classify a single sequence and explain the decision
//! - **partition**: Route the final tier files into the scan lists
//! - **step**: Run a per-structure curation step over `new_work`
//!
//! ## Usage
//!
//! ```text
//! # Full sweep over the PDB seqres dump
//! pdb-curator scan --candidates pdb_seqres.txt.gz --panel panel.json --motifs motifs.json
//!
//! # Check one sequence
//! pdb-curator classify GSHSMRYFFTSVSRPGRGEPRFIAVGYVDDTQFVRF... --panel panel.json --motifs motifs.json
//!
//! # Route results, then build facets for new structures
//! pdb-curator partition
//! pdb-curator step core-records
//! pdb-curator step title --limit 100
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::catalog::panel::ReferencePanel;
use crate::config::PipelineConfig;

pub mod classify;
pub mod partition;
pub mod scan;
pub mod step;

#[derive(Parser)]
#[command(name = "pdb-curator")]
#[command(version)]
#[command(about = "Classify PDB chains against a reference panel and curate per-structure facets")]
#[command(
    long_about = "pdb-curator finds the chains in the PDB that belong to a molecule family.\n\nEach chain is compared against a panel of labelled reference sequences and sorted into a confidence tier:\n- exact, excellent and good matches become new work for the curation steps\n- poor matches are remembered and skipped by later scans\n- possible matches are left for a curator to review"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// JSON configuration file; flags override its values
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sweep a candidate set and sort every chain into a tier
    Scan(scan::ScanArgs),

    /// Classify a single sequence
    Classify(classify::ClassifyArgs),

    /// Route final tier files into known, ignore and new-work lists
    Partition(partition::PartitionArgs),

    /// Run a curation step over the structures in new_work
    Step(step::StepArgs),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Reference panel selection shared by `scan` and `classify`
#[derive(clap::Args, Debug, Clone, Default)]
pub struct PanelArgs {
    /// Reference panel JSON, keyed by molecule family
    #[arg(long)]
    pub panel: Option<PathBuf>,

    /// Start motif list JSON
    #[arg(long)]
    pub motifs: Option<PathBuf>,

    /// Molecule family to classify against
    #[arg(long)]
    pub family: Option<String>,
}

impl PanelArgs {
    /// Fold these flags into the configuration
    pub fn apply(&self, config: &mut PipelineConfig) {
        if let Some(panel) = &self.panel {
            config.paths.panel = Some(panel.clone());
        }
        if let Some(motifs) = &self.motifs {
            config.paths.motifs = Some(motifs.clone());
        }
        if let Some(family) = &self.family {
            config.scan.family.clone_from(family);
        }
    }
}

/// Load the configuration file, or the defaults when none was given
///
/// # Errors
///
/// Returns an error if the file cannot be read or holds invalid values.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<PipelineConfig> {
    PipelineConfig::load_or_default(path).with_context(|| match path {
        Some(path) => format!("Failed to load configuration from {}", path.display()),
        None => "Invalid default configuration".to_string(),
    })
}

/// Load the panel named by the configuration
///
/// # Errors
///
/// Returns an error if the panel or motif path is unset, or the files are
/// missing or malformed.
pub fn load_panel(config: &PipelineConfig) -> anyhow::Result<ReferencePanel> {
    let panel = config
        .paths
        .panel
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("--panel is required (or set paths.panel in the config)"))?;
    let motifs = config
        .paths
        .motifs
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("--motifs is required (or set paths.motifs in the config)"))?;
    ReferencePanel::load(panel, motifs, &config.scan.family)
        .with_context(|| format!("Failed to load reference panel from {}", panel.display()))
}

/// Print a value as pretty JSON on stdout
///
/// # Errors
///
/// Returns an error if the value cannot be serialized.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
