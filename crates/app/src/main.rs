//! `quiz`: terminal driver for the adaptive true/false quiz.

use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "quiz", version, about = "Adaptive true/false quiz")]
struct Cli {
    /// Question bank JSON file (used when no cached bank exists)
    #[arg(long, global = true)]
    bank: Option<PathBuf>,

    /// SQLite database holding progress and the cached bank
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// JSON settings file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Seed for reproducible question order
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show progress per area
    Summary,

    /// List areas in the bank
    Areas,

    /// Answer questions interactively
    Play {
        /// Areas to draw from (comma-separated, default: all)
        #[arg(long, value_delimiter = ',')]
        areas: Vec<String>,

        /// Bias toward previously missed questions (min 1.1)
        #[arg(long)]
        boost: Option<f64>,

        /// Number of questions
        #[arg(long, default_value = "10")]
        count: usize,

        /// Extra questions to mix into this session
        #[arg(long)]
        extra: Option<PathBuf>,
    },

    /// Clear all recorded progress
    Reset,

    /// Drop the cached bank so the next run reads --bank again
    ClearCache,

    /// Report how many questions of a file are new for this learner
    Add {
        /// Question JSON file
        #[arg(long)]
        file: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new("warn,quiz=info,services=info")
                }),
        )
        .with_ansi(io::stderr().is_terminal())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let ctx = commands::Context {
        bank: cli.bank,
        db: cli.db,
        config: cli.config,
        seed: cli.seed,
    };

    let result = match cli.command {
        Commands::Summary => commands::summary(&ctx),
        Commands::Areas => commands::areas(&ctx),
        Commands::Play {
            areas,
            boost,
            count,
            extra,
        } => {
            let stdin = io::stdin();
            commands::play(
                &ctx,
                &commands::PlayOptions {
                    areas,
                    boost,
                    count,
                    extra,
                },
                &mut stdin.lock(),
                &mut io::stdout(),
            )
        }
        Commands::Reset => commands::reset(&ctx),
        Commands::ClearCache => commands::clear_cache(&ctx),
        Commands::Add { file } => commands::add(&ctx, &file),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
