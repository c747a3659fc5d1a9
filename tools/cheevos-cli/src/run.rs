//! Run command - drive an achievement set over a RAM dump
//!
//! The dump is mapped at address 0 and stays fixed for every frame, so
//! multiple frames are only useful for hit counts and delta operands.

use anyhow::{Context, Result};
use clap::Args;
use nether_cheevos::{AchievementSet, Event, MemoryBlock, Runtime, RuntimeConfig};
use std::path::PathBuf;

/// Arguments for the run command
#[derive(Args)]
pub struct RunArgs {
    /// Achievement set file (.toml)
    #[arg(short, long)]
    pub set: PathBuf,

    /// Raw RAM dump, mapped at address 0
    #[arg(short, long)]
    pub ram: PathBuf,

    /// Number of frames to run
    #[arg(short, long, default_value = "1")]
    pub frames: u32,

    /// Runtime config file (.toml); defaults apply when omitted
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print events as JSON lines
    #[arg(long)]
    pub json: bool,
}

/// Execute the run command
pub fn execute(args: RunArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => RuntimeConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => RuntimeConfig::default(),
    };
    let set = AchievementSet::load(&args.set)
        .with_context(|| format!("Failed to load set: {}", args.set.display()))?;
    let ram = std::fs::read(&args.ram)
        .with_context(|| format!("Failed to read RAM dump: {}", args.ram.display()))?;

    let mut runtime = Runtime::new(config);
    let report = runtime.load(&set);
    tracing::info!(
        achievements = report.achievements,
        leaderboards = report.leaderboards,
        skipped = report.failures.len(),
        ram_bytes = ram.len(),
        "loaded set"
    );

    let mut memory = MemoryBlock::new(&ram);
    for frame in 0..args.frames {
        for event in runtime.do_frame(&mut memory) {
            print_event(frame, &event, args.json)?;
        }
    }

    if let Some(text) = runtime.rich_presence(&mut memory) {
        if args.json {
            println!("{}", serde_json::json!({ "rich_presence": text }));
        } else {
            println!("Rich presence: {text}");
        }
    }

    Ok(())
}

fn print_event(frame: u32, event: &Event, json: bool) -> Result<()> {
    if json {
        let mut value = serde_json::to_value(event).context("Failed to serialize event")?;
        value["frame"] = frame.into();
        println!("{value}");
        return Ok(());
    }

    match event {
        Event::AchievementTriggered { id } => println!("[{frame:>6}] achievement {id} triggered"),
        Event::LeaderboardStarted { id } => println!("[{frame:>6}] leaderboard {id} started"),
        Event::LeaderboardCanceled { id } => println!("[{frame:>6}] leaderboard {id} canceled"),
        Event::LeaderboardSubmitted {
            id,
            value,
            formatted,
        } => println!("[{frame:>6}] leaderboard {id} submitted {formatted} ({value})"),
    }
    Ok(())
}
