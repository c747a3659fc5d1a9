//! Cheevos CLI - run achievement sets against RAM dumps
//!
//! # Commands
//!
//! - `cheevos run` - Load a set and a RAM dump, run frames, print events
//! - `cheevos check` - Parse every script of a set and report failures
//! - `cheevos size` - Print the state size of a single script
//!
//! # Usage
//!
//! ```bash
//! # Run 120 frames and print events as JSON lines
//! cheevos run --set game.toml --ram dump.bin --frames 120 --json
//!
//! # Validate a set file
//! cheevos check game.toml
//!
//! # State bytes needed by a trigger
//! cheevos size trigger "0xH0001=18(2)_0xH0002=52"
//! ```
//!
//! # Set file
//!
//! ```toml
//! [[achievement]]
//! id = 1
//! title = "First Steps"
//! trigger = "0xH0001=18(2)_0xH0002=52"
//!
//! [[leaderboard]]
//! id = 10
//! title = "Fastest Stage"
//! format = "FRAMES"
//! script = "STA:0xH00=1::CAN:0xH00=2::SUB:0xH00=3::VAL:0xH02"
//! ```
//!
//! Set `RUST_LOG=debug` to see parse and leaderboard transition details.

mod check;
mod run;
mod size;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// Cheevos CLI - run achievement sets against RAM dumps
#[derive(Parser)]
#[command(name = "cheevos")]
#[command(about = "Run achievement sets against RAM dumps")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a set and a RAM dump, run frames and print events
    Run(run::RunArgs),

    /// Parse every script of a set and report failures
    Check(check::CheckArgs),

    /// Print the state size of a single script
    Size(size::SizeArgs),
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run::execute(args),
        Commands::Check(args) => check::execute(args),
        Commands::Size(args) => size::execute(args),
    }
}
