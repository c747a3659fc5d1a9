//! Size command - state bytes needed by one script

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use nether_cheevos::{lboard, richpresence, trigger, value};
use std::path::PathBuf;

/// Script kinds that can be sized
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ScriptKind {
    Trigger,
    Leaderboard,
    RichPresence,
    Value,
}

/// Arguments for the size command
#[derive(Args)]
pub struct SizeArgs {
    /// Kind of script
    #[arg(value_enum)]
    pub kind: ScriptKind,

    /// Script text
    pub script: String,

    /// Treat SCRIPT as a path and read the script from that file
    #[arg(long)]
    pub file: bool,
}

/// Execute the size command
pub fn execute(args: SizeArgs) -> Result<()> {
    let script = if args.file {
        let path = PathBuf::from(&args.script);
        std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read script: {}", path.display()))?
    } else {
        args.script
    };

    let len = match args.kind {
        ScriptKind::Trigger => trigger::size(&script),
        ScriptKind::Leaderboard => lboard::size(&script),
        ScriptKind::RichPresence => richpresence::size(&script),
        ScriptKind::Value => value::size(&script),
    }
    .with_context(|| format!("Invalid {:?} script", args.kind))?;

    println!("{len}");
    Ok(())
}
