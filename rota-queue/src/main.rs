//! rota-queue - Inspect and reset the persisted rotation state

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use librotacast::catalog::Catalog;
use librotacast::exclusions::ExclusionSet;
use librotacast::rotation::RotationQueue;
use librotacast::{Config, Result, RotacastError};

#[derive(Parser, Debug)]
#[command(name = "rota-queue")]
#[command(version)]
#[command(about = "Inspect and reset the persisted rotation state")]
#[command(long_about = "\
rota-queue - Inspect and reset the persisted rotation state

DESCRIPTION:
    Read-only views of the current cycle (status, show) plus a reset command
    that clears the persisted order so the next run regenerates a fresh
    permutation of the eligible items.

USAGE:
    rota-queue status
    rota-queue show
    rota-queue reset --yes

EXIT CODES:
    0 - Success
    1 - Error (config, catalog, exclusions, or queue state unreadable)
    3 - Refused (reset without --yes)
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the configuration file
    #[arg(short, long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Summarize the current cycle: pending count, next up, eligible total
    Status,
    /// Print the full pending order, one item per line
    Show,
    /// Clear the persisted order; the next run regenerates a fresh cycle
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };

    let catalog = Catalog::load(&config.catalog.path)?;
    let exclusions = match &config.queue.exclusions {
        Some(path) => ExclusionSet::load(path)?,
        None => ExclusionSet::default(),
    };
    let queue = RotationQueue::open(config.queue.path.clone());

    match cli.command {
        Commands::Status => status(&catalog, &exclusions, &queue),
        Commands::Show => show(&catalog, &exclusions, &queue),
        Commands::Reset { yes } => reset(&queue, yes),
    }
}

fn status(catalog: &Catalog, exclusions: &ExclusionSet, queue: &RotationQueue) -> Result<()> {
    let pending = queue.pending(catalog.len(), exclusions)?;
    let eligible = (0..catalog.len()).filter(|i| !exclusions.contains(*i)).count();

    println!("catalog:  {} item(s), {} excluded", catalog.len(), exclusions.len());
    println!("eligible: {}", eligible);

    match pending.first() {
        Some(next) => {
            println!("pending:  {} of {}", pending.len(), eligible);
            match catalog.get(*next) {
                Some(item) => println!("next up:  {} ({})", next, item.caption()),
                None => println!("next up:  {}", next),
            }
        }
        None => {
            println!("pending:  0 (next run regenerates a fresh cycle)");
        }
    }

    Ok(())
}

fn show(catalog: &Catalog, exclusions: &ExclusionSet, queue: &RotationQueue) -> Result<()> {
    let pending = queue.pending(catalog.len(), exclusions)?;

    for index in pending {
        match catalog.get(index) {
            Some(item) => println!("{}\t{}", index, item.caption()),
            None => println!("{}", index),
        }
    }

    Ok(())
}

fn reset(queue: &RotationQueue, yes: bool) -> Result<()> {
    if !yes {
        return Err(RotacastError::InvalidInput(
            "reset discards the current cycle; pass --yes to confirm".to_string(),
        ));
    }

    queue.commit(&[])?;
    println!("rotation state cleared; next run regenerates a fresh cycle");
    Ok(())
}
