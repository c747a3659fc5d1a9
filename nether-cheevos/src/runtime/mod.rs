//! Achievement runtime
//!
//! Owns every script of a game and drives them once per frame:
//!
//! - achievements fire once, and only after their trigger has been seen
//!   false (a save state loaded mid-unlock must not award it);
//! - leaderboards report start, cancel and submit transitions;
//! - rich presence renders on demand.
//!
//! Scripts that fail to parse are logged and skipped; the rest of the set
//! still runs.

mod set;

#[cfg(test)]
mod tests;

pub use set::{AchievementEntry, AchievementSet, LeaderboardEntry};

use serde::Serialize;

use crate::config::RuntimeConfig;
use crate::error::{Error, Result};
use crate::format::Format;
use crate::lboard::{self, Leaderboard, LeaderboardState};
use crate::memory::Peek;
use crate::options::ParseOptions;
use crate::richpresence::{self, RichPresence};
use crate::state::StateSnapshot;
use crate::trigger::{self, Trigger};

/// Something that happened during a frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    AchievementTriggered { id: u32 },
    LeaderboardStarted { id: u32 },
    LeaderboardCanceled { id: u32 },
    LeaderboardSubmitted { id: u32, value: u32, formatted: String },
}

/// Which kind of script failed to load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptKind {
    Achievement,
    Leaderboard,
    RichPresence,
}

/// A script that was skipped while loading
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    pub kind: ScriptKind,
    /// Achievement or leaderboard id; 0 for rich presence
    pub id: u32,
    pub error: Error,
}

/// Summary of [`Runtime::load`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub achievements: usize,
    pub leaderboards: usize,
    pub rich_presence: bool,
    pub failures: Vec<LoadFailure>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

struct Achievement {
    id: u32,
    title: String,
    trigger: Trigger,
    /// Still eligible to fire
    active: bool,
    /// Last frame's result was true; must see false before firing
    waiting: bool,
}

struct TrackedLeaderboard {
    id: u32,
    title: String,
    format: Format,
    lboard: Leaderboard,
}

/// State of every script, captured by [`Runtime::snapshot`]
#[derive(Debug, Clone)]
pub struct RuntimeSnapshot {
    achievements: Vec<(bool, bool, StateSnapshot)>,
    leaderboards: Vec<StateSnapshot>,
    rich_presence: Option<StateSnapshot>,
}

/// Drives a loaded achievement set frame by frame
pub struct Runtime {
    config: RuntimeConfig,
    options: ParseOptions,
    achievements: Vec<Achievement>,
    leaderboards: Vec<TrackedLeaderboard>,
    rich_presence: Option<RichPresence>,
}

impl Runtime {
    pub fn new(config: RuntimeConfig) -> Self {
        let options = config.parse_options();
        Self::with_options(config, options)
    }

    /// Use `options` for every script (custom operands). The frame rate
    /// always comes from `config`.
    pub fn with_options(config: RuntimeConfig, options: ParseOptions) -> Self {
        let options = options.with_fps(config.fps);
        Self {
            config,
            options,
            achievements: Vec::new(),
            leaderboards: Vec::new(),
            rich_presence: None,
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Replace the loaded scripts with `set`
    pub fn load(&mut self, set: &AchievementSet) -> LoadReport {
        let mut report = LoadReport::default();
        self.achievements.clear();
        self.leaderboards.clear();
        self.rich_presence = None;

        for entry in &set.achievements {
            let parsed = parse_owned(
                &entry.trigger,
                &self.options,
                trigger::size_with,
                trigger::parse_with::<Vec<u8>>,
            );
            match parsed {
                Ok(trigger) => self.achievements.push(Achievement {
                    id: entry.id,
                    title: entry.title.clone(),
                    trigger,
                    active: true,
                    waiting: self.config.require_false_before_trigger,
                }),
                Err(error) => {
                    tracing::warn!(id = entry.id, title = %entry.title, %error, "skipping achievement");
                    report.failures.push(LoadFailure {
                        kind: ScriptKind::Achievement,
                        id: entry.id,
                        error,
                    });
                }
            }
        }

        for entry in &set.leaderboards {
            let parsed = parse_owned(
                &entry.script,
                &self.options,
                lboard::size_with,
                lboard::parse_with::<Vec<u8>>,
            );
            match parsed {
                Ok(lboard) => self.leaderboards.push(TrackedLeaderboard {
                    id: entry.id,
                    title: entry.title.clone(),
                    format: Format::parse(&entry.format),
                    lboard,
                }),
                Err(error) => {
                    tracing::warn!(id = entry.id, title = %entry.title, %error, "skipping leaderboard");
                    report.failures.push(LoadFailure {
                        kind: ScriptKind::Leaderboard,
                        id: entry.id,
                        error,
                    });
                }
            }
        }

        if let Some(script) = &set.rich_presence {
            let parsed = parse_owned(
                script,
                &self.options,
                richpresence::size_with,
                richpresence::parse_with::<Vec<u8>>,
            );
            match parsed {
                Ok(rp) => self.rich_presence = Some(rp),
                Err(error) => {
                    tracing::warn!(%error, "skipping rich presence");
                    report.failures.push(LoadFailure {
                        kind: ScriptKind::RichPresence,
                        id: 0,
                        error,
                    });
                }
            }
        }

        report.achievements = self.achievements.len();
        report.leaderboards = self.leaderboards.len();
        report.rich_presence = self.rich_presence.is_some();
        tracing::debug!(
            achievements = report.achievements,
            leaderboards = report.leaderboards,
            rich_presence = report.rich_presence,
            failures = report.failures.len(),
            "loaded achievement set"
        );
        report
    }

    /// Evaluate one frame of every achievement and leaderboard
    pub fn do_frame<P: Peek + ?Sized>(&mut self, peek: &mut P) -> Vec<Event> {
        let mut events = Vec::new();

        for cheevo in self.achievements.iter_mut().filter(|cheevo| cheevo.active) {
            let valid = cheevo.trigger.evaluate(peek);
            if cheevo.waiting {
                cheevo.trigger.reset();
            } else if valid {
                tracing::info!(id = cheevo.id, title = %cheevo.title, "achievement triggered");
                cheevo.active = false;
                events.push(Event::AchievementTriggered { id: cheevo.id });
            }
            cheevo.waiting = valid && self.config.require_false_before_trigger;
        }

        for tracked in &mut self.leaderboards {
            let (state, value) = tracked.lboard.evaluate(peek);
            let id = tracked.id;
            match state {
                LeaderboardState::Inactive | LeaderboardState::Active => {}
                LeaderboardState::Started => {
                    tracing::info!(id, title = %tracked.title, "leaderboard started");
                    events.push(Event::LeaderboardStarted { id });
                }
                LeaderboardState::Canceled => {
                    tracing::debug!(id, title = %tracked.title, "leaderboard canceled");
                    events.push(Event::LeaderboardCanceled { id });
                }
                LeaderboardState::Triggered if value == 0 && self.config.reject_zero_submissions => {
                    tracing::warn!(id, title = %tracked.title, "leaderboard tried to submit 0");
                    events.push(Event::LeaderboardCanceled { id });
                }
                LeaderboardState::Triggered => {
                    let formatted = tracked.format.format(value, self.config.fps);
                    tracing::info!(id, title = %tracked.title, value, %formatted, "leaderboard submitted");
                    events.push(Event::LeaderboardSubmitted { id, value, formatted });
                }
            }
        }

        events
    }

    /// Render the rich presence string, truncated to the configured length
    pub fn rich_presence<P: Peek + ?Sized>(&mut self, peek: &mut P) -> Option<String> {
        let rp = self.rich_presence.as_mut()?;
        let mut buf = vec![0u8; self.config.rich_presence_max_len];
        let len = rp.render_into(&mut buf, peek);
        Some(String::from_utf8_lossy(&buf[..len]).into_owned())
    }

    /// The game was reset: every trigger starts over and must be seen false
    /// again, and running leaderboards wait for start to go false
    pub fn reset_game(&mut self) {
        for cheevo in &mut self.achievements {
            cheevo.trigger.reset();
            cheevo.waiting = self.config.require_false_before_trigger;
        }
        for tracked in &mut self.leaderboards {
            tracked.lboard.suspend();
        }
        if let Some(rp) = &mut self.rich_presence {
            rp.reset();
        }
        tracing::debug!("game reset");
    }

    /// Whether achievement `id` is loaded and has not fired yet
    pub fn is_achievement_active(&self, id: u32) -> Option<bool> {
        self.achievement(id).map(|cheevo| cheevo.active)
    }

    /// Measured progress of achievement `id`, as `(current, target)`
    pub fn measured(&self, id: u32) -> Option<(u32, u32)> {
        self.achievement(id)?.trigger.measured()
    }

    /// Whether leaderboard `id` has an attempt running
    pub fn is_leaderboard_active(&self, id: u32) -> Option<bool> {
        self.leaderboards
            .iter()
            .find(|tracked| tracked.id == id)
            .map(|tracked| tracked.lboard.is_active())
    }

    fn achievement(&self, id: u32) -> Option<&Achievement> {
        self.achievements.iter().find(|cheevo| cheevo.id == id)
    }

    /// Ids of achievements that can still fire
    pub fn active_achievements(&self) -> impl Iterator<Item = u32> + '_ {
        self.achievements
            .iter()
            .filter(|cheevo| cheevo.active)
            .map(|cheevo| cheevo.id)
    }

    pub fn achievement_count(&self) -> usize {
        self.achievements.len()
    }

    pub fn leaderboard_count(&self) -> usize {
        self.leaderboards.len()
    }

    pub fn has_rich_presence(&self) -> bool {
        self.rich_presence.is_some()
    }

    /// Capture the state of every script
    pub fn snapshot(&self) -> RuntimeSnapshot {
        RuntimeSnapshot {
            achievements: self
                .achievements
                .iter()
                .map(|cheevo| (cheevo.active, cheevo.waiting, cheevo.trigger.snapshot()))
                .collect(),
            leaderboards: self
                .leaderboards
                .iter()
                .map(|tracked| tracked.lboard.snapshot())
                .collect(),
            rich_presence: self.rich_presence.as_ref().map(|rp| rp.snapshot()),
        }
    }

    /// Restore a snapshot taken from this runtime with the same set loaded.
    /// Nothing is restored unless every script accepts its state.
    pub fn restore(&mut self, snapshot: &RuntimeSnapshot) -> Result<()> {
        if snapshot.achievements.len() != self.achievements.len()
            || snapshot.leaderboards.len() != self.leaderboards.len()
            || snapshot.rich_presence.is_some() != self.rich_presence.is_some()
        {
            return Err(Error::InvalidState);
        }

        let backup = self.snapshot();
        if let Err(error) = self.apply(snapshot) {
            // backup came from these very handles, so it always applies
            let _ = self.apply(&backup);
            return Err(error);
        }
        Ok(())
    }

    fn apply(&mut self, snapshot: &RuntimeSnapshot) -> Result<()> {
        for (cheevo, (active, waiting, state)) in self.achievements.iter_mut().zip(&snapshot.achievements) {
            cheevo.trigger.restore(state)?;
            cheevo.active = *active;
            cheevo.waiting = *waiting;
        }
        for (tracked, state) in self.leaderboards.iter_mut().zip(&snapshot.leaderboards) {
            tracked.lboard.restore(state)?;
        }
        if let (Some(rp), Some(state)) = (&mut self.rich_presence, &snapshot.rich_presence) {
            rp.restore(state)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("config", &self.config)
            .field("achievements", &self.achievements.len())
            .field("leaderboards", &self.leaderboards.len())
            .field("rich_presence", &self.rich_presence.is_some())
            .finish()
    }
}

/// Size then parse `script` into an owned buffer
fn parse_owned<H>(
    script: &str,
    options: &ParseOptions,
    size: impl Fn(&str, &ParseOptions) -> Result<usize>,
    parse: impl Fn(Vec<u8>, &str, &ParseOptions) -> Result<H>,
) -> Result<H> {
    let len = size(script, options)?;
    parse(vec![0u8; len], script, options)
}
