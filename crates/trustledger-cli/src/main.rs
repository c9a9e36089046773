//! trustledger CLI - run ledger scripts and inspect notification journals.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod errors;
mod output;
mod script;

use commands::{audit, list, run, verify};
use errors::CliError;

#[derive(Parser)]
#[command(name = "trustledger")]
#[command(about = "Purchase-gated review ledger: run scripts, list, verify and audit journals")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply a JSON script of ledger operations and journal the notifications
    Run {
        /// Path to the script file
        script: String,
        /// Journal to write notifications to
        #[arg(long)]
        journal: String,
        /// Ledger configuration file (overrides the script's own config)
        #[arg(long)]
        config: Option<String>,
        /// fsync the journal after every record
        #[arg(long)]
        sync: bool,
        /// Discard records already in the journal instead of refusing it
        #[arg(long)]
        truncate: bool,
        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },
    /// List notification records in a journal
    List {
        /// Path to journal file
        journal: String,
        /// Output as JSON lines
        #[arg(long)]
        json: bool,
        /// Only show records of this kind (e.g. review_posted)
        #[arg(long)]
        kind: Option<String>,
        /// Stop after N matching records
        #[arg(long)]
        max_events: Option<u64>,
    },
    /// Recompute and check every record's event id
    Verify {
        /// Path to journal file
        journal: String,
        /// Exit with an error if any record fails
        #[arg(long)]
        strict: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Replay a journal and check every derived score
    Audit {
        /// Path to journal file
        journal: String,
        /// Output the report as JSON
        #[arg(long)]
        json: bool,
        /// Exit with an error if any violation is found
        #[arg(long)]
        strict: bool,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("TRUSTLEDGER_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("trustledger=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result: Result<(), CliError> = match cli.command {
        Commands::Run {
            script,
            journal,
            config,
            sync,
            truncate,
            json,
        } => run::run(script, journal, config, sync, truncate, json),
        Commands::List {
            journal,
            json,
            kind,
            max_events,
        } => list::run(journal, json, kind, max_events),
        Commands::Verify {
            journal,
            strict,
            json,
        } => verify::run(journal, strict, json),
        Commands::Audit {
            journal,
            json,
            strict,
        } => audit::run(journal, json, strict),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
