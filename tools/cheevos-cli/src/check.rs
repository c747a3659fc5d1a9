//! Check command - parse every script of a set

use anyhow::{Context, Result, bail};
use clap::Args;
use nether_cheevos::{AchievementSet, Runtime, RuntimeConfig, ScriptKind};
use std::path::PathBuf;

/// Arguments for the check command
#[derive(Args)]
pub struct CheckArgs {
    /// Achievement set file (.toml)
    pub set: PathBuf,
}

/// Execute the check command
pub fn execute(args: CheckArgs) -> Result<()> {
    let set = AchievementSet::load(&args.set)
        .with_context(|| format!("Failed to load set: {}", args.set.display()))?;

    let mut runtime = Runtime::new(RuntimeConfig::default());
    let report = runtime.load(&set);

    println!("=== {} ===", args.set.display());
    println!("  Achievements: {}/{}", report.achievements, set.achievements.len());
    println!("  Leaderboards: {}/{}", report.leaderboards, set.leaderboards.len());
    println!(
        "  Rich presence: {}",
        match (&set.rich_presence, report.rich_presence) {
            (None, _) => "none",
            (Some(_), true) => "ok",
            (Some(_), false) => "invalid",
        }
    );

    if report.is_clean() {
        println!("All scripts parsed");
        return Ok(());
    }

    for failure in &report.failures {
        match failure.kind {
            ScriptKind::Achievement => println!("  achievement {}: {}", failure.id, failure.error),
            ScriptKind::Leaderboard => println!("  leaderboard {}: {}", failure.id, failure.error),
            ScriptKind::RichPresence => println!("  rich presence: {}", failure.error),
        }
    }
    bail!("{} script(s) failed to parse", report.failures.len())
}
