//! Nether-Cheevos: achievement script engine for Nethercore
//!
//! This crate parses the small text scripts that describe achievements,
//! leaderboards and rich presence over emulated console memory, and
//! evaluates them once per frame.
//!
//! # Key Features
//!
//! - **Two-pass parsing**: sizing a script runs the full parser, so a parse
//!   into a caller buffer never fails halfway
//! - **Split definition and state**: parsed definitions are immutable and
//!   shareable; all mutable state lives in one flat buffer that can be
//!   snapshotted and restored
//! - **No owned memory**: every read goes through the host's [`Peek`]
//! - **Runtime manager**: [`Runtime`] drives a whole achievement set and
//!   reports [`Event`]s
//!
//! # Script Overview
//!
//! - Trigger: `0xH0001=18(2)_0xH0002=52_R:0xL0004=4`, with alternative
//!   groups after `S`
//! - Leaderboard: `STA:<trigger>::CAN:<trigger>::SUB:<trigger>::VAL:<value>`
//! - Value: `0xH0001*2_0xH0002$0xH0003`
//! - Rich presence: `Lookup:`, `Format:` and `Display:` sections
//!
//! # Usage
//!
//! ```ignore
//! use nether_cheevos::{MemoryBlock, trigger};
//!
//! let script = "0xH0001=18(2)_0xH0002=52";
//! let len = trigger::size(script)?;
//! let mut trigger = trigger::parse(vec![0u8; len], script)?;
//!
//! let ram = [0x00, 0x12, 0x34, 0xAB, 0x56];
//! let mut memory = MemoryBlock::new(&ram);
//! assert!(!trigger.evaluate(&mut memory));
//! assert!(trigger.evaluate(&mut memory));
//! ```

mod cursor;

pub mod condition;
pub mod condset;
pub mod config;
pub mod custom;
pub mod error;
pub mod format;
pub mod lboard;
pub mod memory;
pub mod operand;
pub mod options;
pub mod richpresence;
pub mod runtime;
pub mod state;
pub mod term;
pub mod trigger;
pub mod value;

pub use condition::{Comparator, Condition, ConditionFlag};
pub use condset::ConditionSet;
pub use config::{ConfigError, RuntimeConfig};
pub use custom::{CustomOperandEvaluator, FunctionTable};
pub use error::{Error, Result};
pub use format::{DEFAULT_FPS, Format};
pub use lboard::{Leaderboard, LeaderboardDef, LeaderboardState};
pub use memory::{MemoryBlock, Peek};
pub use operand::{MemSize, Operand, OperandKind};
pub use options::ParseOptions;
pub use richpresence::{Lookup, RichPresence, RichPresenceDef};
pub use runtime::{
    AchievementEntry, AchievementSet, Event, LeaderboardEntry, LoadFailure, LoadReport, Runtime,
    RuntimeSnapshot, ScriptKind,
};
pub use state::{Definition, Handle, StateSnapshot};
pub use term::Term;
pub use trigger::{Trigger, TriggerDef, TriggerExpr};
pub use value::{Value, ValueDef, ValueExpr};
