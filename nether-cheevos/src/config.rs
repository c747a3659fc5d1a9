//! Runtime configuration
//!
//! Loaded from a TOML file. Every field is optional; anything missing takes
//! its default.
//!
//! ```toml
//! fps = 60
//! require_false_before_trigger = true
//! rich_presence_max_len = 256
//! reject_zero_submissions = true
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::format::DEFAULT_FPS;
use crate::options::ParseOptions;

/// Errors loading a [`RuntimeConfig`]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Settings for a [`Runtime`](crate::runtime::Runtime)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Frame rate used by the `FRAMES` format (default: 60)
    #[serde(default = "default_fps")]
    pub fps: u32,
    /// Achievements must be seen false before they can fire (default: true)
    #[serde(default = "default_true")]
    pub require_false_before_trigger: bool,
    /// Rich presence strings are truncated to this many bytes (default: 256)
    #[serde(default = "default_rich_presence_max_len")]
    pub rich_presence_max_len: usize,
    /// Report leaderboard submissions of 0 as canceled (default: true)
    #[serde(default = "default_true")]
    pub reject_zero_submissions: bool,
}

fn default_fps() -> u32 {
    DEFAULT_FPS
}
fn default_true() -> bool {
    true
}
fn default_rich_presence_max_len() -> usize {
    256
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            require_false_before_trigger: default_true(),
            rich_presence_max_len: default_rich_presence_max_len(),
            reject_zero_submissions: default_true(),
        }
    }
}

impl RuntimeConfig {
    /// Parse a config from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Read and parse a config file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse options matching this config
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions::default().with_fps(self.fps)
    }
}
