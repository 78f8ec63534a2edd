mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use szokincs::trainer::TrainerStore;

#[derive(Parser)]
#[command(name = "szokincs-cli", about = "Vocabulary trainer CLI", version)]
struct Cli {
    /// Data directory (default: platform-local app data)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import a semicolon-separated word list (prompt;answer per line)
    Import {
        /// Path to the word list
        file: PathBuf,
    },

    /// Practice words in a typed-answer drill
    Drill {
        /// Number of cards in the sitting
        #[arg(long, default_value_t = 20)]
        length: usize,
        /// Restrict to hard words
        #[arg(long)]
        hard: bool,
        /// Restrict to words due today
        #[arg(long)]
        due: bool,
    },

    /// Show the progress dashboard
    Stats,

    /// List the most-missed words
    Mistakes {
        /// Maximum entries to show
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Reset all review progress
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => TrainerStore::default_data_dir()?,
    };
    let store = TrainerStore::open(data_dir)?;

    match cli.command {
        Command::Import { file } => commands::words::run_import(&store, &file).await,
        Command::Drill { length, hard, due } => {
            commands::drill::run(&store, length, hard, due).await
        }
        Command::Stats => commands::stats::run(&store).await,
        Command::Mistakes { limit } => commands::words::run_mistakes(&store, limit).await,
        Command::Reset { yes } => commands::words::run_reset(&store, yes).await,
    }
}
