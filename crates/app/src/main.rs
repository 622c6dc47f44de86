//! Command-line front end for the vocabulary trainer.

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use services::{Clock, TrainingConfig, TrainingServices};
use storage::repository::Storage;
use vocab_core::mastery::MasteryThresholds;

mod commands;
mod db;

#[derive(Parser)]
#[command(name = "vocab")]
#[command(version)]
#[command(about = "Spaced-repetition vocabulary trainer")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// SQLite database URL or file path
    #[arg(
        long,
        env = "VOCAB_DB_URL",
        default_value = "sqlite://vocab.sqlite3",
        global = true
    )]
    db: String,

    /// Fixed seed for item selection
    #[arg(long, global = true)]
    shuffle_seed: Option<u64>,

    #[command(subcommand)]
    command: commands::Command,
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let db_url = db::normalize_sqlite_url(&cli.db);
    // Open + migrate at startup; services stay storage-agnostic.
    db::prepare_sqlite_file(&db_url)?;
    let storage = Storage::sqlite(&db_url).await?;

    let services = TrainingServices::with_thresholds(
        &storage,
        Clock::system(),
        TrainingConfig::from_env(),
        MasteryThresholds::default(),
        cli.shuffle_seed,
    );
    commands::handle_command(&services, cli.command).await
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli).await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
