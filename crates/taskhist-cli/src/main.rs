//! taskhist CLI: replays task mutation scripts against an in-memory store
//! with a bounded undo/redo history.
//!
//! Usage:
//!   taskhist replay <script.json> [--max-history N] [--quiet]
//!
//! Each step prints one JSON line to stdout; the final tasks and history
//! entries follow as a pretty-printed JSON document. Logs go to stderr and
//! are filtered with `RUST_LOG`.

mod error;
mod script;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use taskhist_history::HistoryConfig;

use crate::error::CliError;
use crate::script::{Script, Session};

#[derive(Parser)]
#[command(name = "taskhist", about = "Task history replay tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a JSON script of task mutations and undo/redo steps
    Replay {
        /// Path to the script file
        script: PathBuf,

        /// History capacity (overrides TASKHIST_MAX_HISTORY)
        #[arg(long)]
        max_history: Option<usize>,

        /// Only print the final summary
        #[arg(long, short)]
        quiet: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Replay {
            script,
            max_history,
            quiet,
        } => run_replay(&script, max_history, quiet).await,
    };

    process::exit(exit_code);
}

async fn run_replay(path: &Path, max_history: Option<usize>, quiet: bool) -> i32 {
    match replay(path, max_history, quiet).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    }
}

async fn replay(path: &Path, max_history: Option<usize>, quiet: bool) -> Result<(), CliError> {
    let config = match max_history {
        Some(n) => HistoryConfig::new(n)?,
        None => HistoryConfig::from_env()?,
    };

    let text = std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let script: Script = serde_json::from_str(&text)?;

    info!(
        "replaying {} steps from {} (max history {})",
        script.steps.len(),
        path.display(),
        config.max_history
    );

    let mut session = Session::new(script.tasks, config);
    for (index, step) in script.steps.into_iter().enumerate() {
        let report = session.step(index, step).await;
        if !quiet {
            println!("{}", serde_json::to_string(&report)?);
        }
    }

    println!("{}", serde_json::to_string_pretty(&session.summary())?);
    Ok(())
}
