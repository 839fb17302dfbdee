//! Engine configuration
//!
//! Stored as `replay.json`. Every field has a default, so a partial or
//! missing file still yields a usable configuration.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::playback::PlaybackConfig;
use crate::recorder::RecorderConfig;
use crate::timeline::default_replay_dir;

/// Default configuration file name
pub const CONFIG_FILE_NAME: &str = "replay.json";

/// Combined recorder and playback configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Team label stamped on new recordings
    pub team: String,
    /// Where recordings are saved; `None` uses the platform data directory
    pub replay_dir: Option<PathBuf>,
    /// Sampling settings for new recordings
    pub recorder: RecorderConfig,
    /// Speed, step cap and end policy for playback
    pub playback: PlaybackConfig,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            team: "unknown".to_string(),
            replay_dir: None,
            recorder: RecorderConfig::default(),
            playback: PlaybackConfig::default(),
        }
    }
}

impl ReplayConfig {
    /// Load from a JSON file. A missing file gives the defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Save as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(path, content)
    }

    /// Directory recordings go to
    pub fn replay_dir(&self) -> PathBuf {
        self.replay_dir.clone().unwrap_or_else(default_replay_dir)
    }
}
