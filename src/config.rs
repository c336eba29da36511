use crate::surface::Pacing;
use crate::{GraderError, RuleSet, SnapshotStore};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "config.toml";

/// Settings read from `config.toml`.
///
/// Every section is optional:
///
/// ```toml
/// snapshot_dir = "/home/me/grading"
///
/// [rules]
/// kind = "participation"
/// late_grace_minutes = 180
/// word_range = { min = 100, max = 150 }
///
/// [pacing]
/// step_delay_ms = 1000
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct GraderConfig {
    pub rules: RuleSet,
    pub pacing: Pacing,
    pub snapshot_dir: Option<PathBuf>,
}

impl GraderConfig {
    /// `<config_dir>/canvas_discussion_grader/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(env!("CARGO_PKG_NAME")).join(CONFIG_FILE))
    }

    pub fn from_toml(text: &str) -> Result<Self, GraderError> {
        let config: GraderConfig = toml::from_str(text)?;
        config.rules.validate()?;
        Ok(config)
    }

    /// Loads `path`, or the default location when `path` is `None`.
    ///
    /// An explicit path must exist; a missing default file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, GraderError> {
        match path {
            Some(path) => Self::from_toml(&fs::read_to_string(path)?),
            None => match Self::default_path() {
                Some(path) if path.exists() => {
                    log::info!("using configuration from {}", path.display());
                    Self::from_toml(&fs::read_to_string(path)?)
                }
                _ => Ok(GraderConfig::default()),
            },
        }
    }

    /// Where snapshots go: the configured directory or the user data dir.
    pub fn snapshot_dir(&self) -> Option<PathBuf> {
        self.snapshot_dir.clone().or_else(SnapshotStore::default_dir)
    }
}
