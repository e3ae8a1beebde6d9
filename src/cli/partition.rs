use std::path::PathBuf;

use clap::Args;

use crate::cli::{load_config, print_json, OutputFormat};
use crate::pipeline::runlog::{RunId, RunLog};
use crate::pipeline::steps::partition;

#[derive(Args)]
pub struct PartitionArgs {
    /// Molecule family whose scan output is partitioned
    #[arg(long)]
    pub family: Option<String>,

    /// Output root holding `scan/{family}`
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Overrides root holding the scan lists
    #[arg(long)]
    pub overrides: Option<PathBuf>,

    /// Directory for run logs
    #[arg(long)]
    pub logs: Option<PathBuf>,
}

/// Execute the partition subcommand
///
/// # Errors
///
/// Returns an error if the tier files or scan lists cannot be read or written.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(
    args: PartitionArgs,
    format: OutputFormat,
    verbose: bool,
    config_path: Option<&std::path::Path>,
) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(family) = &args.family {
        config.scan.family.clone_from(family);
    }
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

    let run_log = RunLog::new(&config.paths.logs, RunId::now());
    let record = partition::run(&config.scan_dir(), &config.paths.overrides, &run_log)?;

    match format {
        OutputFormat::Text => {
            println!("Partitioned '{}'", config.scan.family);
            println!("   New work: {}", record.summary.new_work);
            println!("   Added to known matches: {}", record.summary.known_matches);
            println!("   Added to ignore matches: {}", record.summary.ignore_matches);
            println!("   Left for review: {}", record.summary.left_for_review);
            if verbose {
                for result in &record.left_for_review {
                    println!(
                        "      {} ({:.3})",
                        result.structure_id.as_deref().unwrap_or(&result.pdb_code),
                        result.score
                    );
                }
            }
        }
        OutputFormat::Json => print_json(&record)?,
    }
    Ok(())
}
