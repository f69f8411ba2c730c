use clap::{Parser, Subcommand};
use std::path::PathBuf;
use spelunker::experiment::{replay_traces, TraceFile};
use spelunker::ExperimentConfig;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// RON configuration file (defaults to ./spelunker.ron if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Score recorded episodes as one generation
    Replay {
        /// Trace file (RON)
        trace: PathBuf,

        /// Override the population snapshot directory
        #[arg(long)]
        snapshot_dir: Option<PathBuf>,
    },
    /// Print the effective configuration
    ShowConfig,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();
    let mut config = ExperimentConfig::load(args.config.as_deref())?;

    match args.command {
        Command::Replay {
            trace,
            snapshot_dir,
        } => {
            if let Some(dir) = snapshot_dir {
                config.experiment.snapshot_dir = dir;
            }

            log::info!("Loading trace {:?}", trace);
            let trace = TraceFile::load(&trace)?;
            let outcome = replay_traces(&config, &trace)?;

            for report in &outcome.reports {
                println!(
                    "generation {} candidate {}: {:?} fitness {:.4} (distance {:.3}, exploration {:.3}, states {})",
                    report.generation,
                    report.candidate,
                    report.summary.status,
                    report.fitness(),
                    report.breakdown.normalized_distance,
                    report.breakdown.exploration,
                    report.summary.states_visited,
                );
            }
            for stats in &outcome.history {
                println!(
                    "generation {}: best {:.4}, mean {:.4}, {}/{} winners",
                    stats.generation,
                    stats.highest_fitness,
                    stats.mean_fitness,
                    stats.winners,
                    stats.evaluated,
                );
            }
        }
        Command::ShowConfig => {
            println!("{}", config.to_ron()?);
        }
    }

    Ok(())
}
