//! Achievement set files
//!
//! ```toml
//! rich_presence = """
//! Display:
//! Playing
//! """
//!
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

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// One achievement in a set file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementEntry {
    pub id: u32,
    #[serde(default)]
    pub title: String,
    /// Trigger script
    pub trigger: String,
}

/// One leaderboard in a set file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub id: u32,
    #[serde(default)]
    pub title: String,
    /// Format name for submitted values (default: VALUE)
    #[serde(default = "default_format")]
    pub format: String,
    /// Leaderboard script
    pub script: String,
}

fn default_format() -> String {
    "VALUE".to_string()
}

/// Every script a game provides
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementSet {
    #[serde(default, rename = "achievement")]
    pub achievements: Vec<AchievementEntry>,
    #[serde(default, rename = "leaderboard")]
    pub leaderboards: Vec<LeaderboardEntry>,
    #[serde(default)]
    pub rich_presence: Option<String>,
}

impl AchievementSet {
    /// Parse a set from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Read and parse a set file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}
