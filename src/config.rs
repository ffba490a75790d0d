use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::audio::SoundPreset;
use crate::error::ConfigError;

pub const DEFAULT_TICK_HZ: u32 = 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Playback thread cadence
    pub tick_hz: u32,
    pub looping: bool,
    pub speed: f64,
    /// Substring of the MIDI output port to open; first port if unset.
    pub midi_port: Option<String>,
    /// Exactly sixteen entries when present.
    pub presets: Option<Vec<SoundPreset>>,
    pub registered_channels: Vec<u8>,
    pub muted_channels: Vec<u8>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            tick_hz: DEFAULT_TICK_HZ,
            looping: true,
            speed: 1.0,
            midi_port: None,
            presets: None,
            registered_channels: Vec::new(),
            muted_channels: Vec::new(),
        }
    }
}

impl PlayerConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.tick_hz.max(1)))
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let ron_string = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
        fs::write(path, ron_string)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let ron_string = fs::read_to_string(path)?;
        let config: PlayerConfig = ron::from_str(&ron_string)?;
        Ok(config)
    }
}
