//! # `oai-harvest`
//!
//! Resumable OAI-PMH `ListRecords` harvesting into flat page files.
//!
//! ```bash
//! # Harvest astro-ph in arXivRaw format into ./arXiv_oai/reclist{session}_{page}
//! oai-harvest harvest
//!
//! # Only records newer than the most recent session
//! oai-harvest harvest --incremental
//!
//! # Pick a set and format first
//! oai-harvest sets
//! oai-harvest formats --identifier oai:arXiv.org:0704.0001
//! ```

mod commands;
mod settings;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use engine_logging::LogDestination;
use log::LevelFilter;

use crate::settings::HarvestOverrides;

#[derive(Parser)]
#[command(name = "oai-harvest", version, about = "Resumable OAI-PMH harvester")]
struct Cli {
    /// RON file with harvest settings; flags override its values.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Also write the log to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// More log output (-v debug, -vv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a harvest session until the list completes or stalls.
    Harvest {
        /// Continue from the last session, or from session N.
        #[arg(long, value_name = "N", num_args = 0..=1)]
        incremental: Option<Option<u32>>,

        #[command(flatten)]
        overrides: HarvestOverrides,
    },

    /// List the record sets of the repository.
    Sets {
        #[arg(long)]
        base_url: Option<String>,
    },

    /// List the metadata formats of the repository or of one item.
    Formats {
        #[arg(long)]
        identifier: Option<String>,

        #[arg(long)]
        base_url: Option<String>,
    },

    /// Show the most recent session in the page store.
    LastSession {
        /// Directory plus filename prefix of the page files.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Delete every page file of a session.
    Clear {
        session: u32,

        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn log_level(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let destination = match cli.log_file {
        Some(path) => LogDestination::Both(path),
        None => LogDestination::Terminal,
    };
    engine_logging::initialize(destination, log_level(cli.verbose));

    let config = settings::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Harvest {
            incremental,
            overrides,
        } => commands::harvest(overrides.apply(config)?, incremental).await,
        Commands::Sets { base_url } => {
            let overrides = HarvestOverrides {
                base_url,
                ..HarvestOverrides::default()
            };
            commands::sets(&overrides.apply(config)?).await
        }
        Commands::Formats {
            identifier,
            base_url,
        } => {
            let overrides = HarvestOverrides {
                base_url,
                ..HarvestOverrides::default()
            };
            commands::formats(&overrides.apply(config)?, identifier.as_deref()).await
        }
        Commands::LastSession { out } => {
            let overrides = HarvestOverrides {
                out,
                ..HarvestOverrides::default()
            };
            commands::last_session(&overrides.apply(config)?)
        }
        Commands::Clear { session, out } => {
            let overrides = HarvestOverrides {
                out,
                ..HarvestOverrides::default()
            };
            commands::clear(&overrides.apply(config)?, session)
        }
    }
}
