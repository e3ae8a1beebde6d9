use clap::Parser;
use tracing_subscriber::EnvFilter;

use pdb_curator::cli;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    // Initialize logging based on verbosity flag
    let filter = if cli.verbose {
        EnvFilter::new("pdb_curator=debug,info")
    } else {
        EnvFilter::new("pdb_curator=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let config = cli.config.as_deref();
    match cli.command {
        cli::Commands::Scan(args) => {
            cli::scan::run(args, cli.format, cli.verbose, config)?;
        }
        cli::Commands::Classify(args) => {
            cli::classify::run(args, cli.format, cli.verbose, config)?;
        }
        cli::Commands::Partition(args) => {
            cli::partition::run(args, cli.format, cli.verbose, config)?;
        }
        cli::Commands::Step(args) => {
            cli::step::run(args, cli.format, cli.verbose, config)?;
        }
    }

    Ok(())
}
