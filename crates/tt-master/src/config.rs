//! Engine settings, loadable from TOML.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from loading or validating an [`EngineConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("{field} must be {requirement}")]
    Invalid {
        field: &'static str,
        requirement: &'static str,
    },
}

/// Timing, output and grid settings.
///
/// Every key is optional in TOML; missing keys take the defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Offline render rate in Hz. Live playback uses the device rate.
    pub sample_rate: u32,
    /// Time between row ticks.
    pub tick_ms: u32,
    /// Length of row-triggered notes.
    pub row_note_ms: u32,
    /// Length of previewed notes.
    pub preview_note_ms: u32,
    /// Linear master volume in `[0, 1]`.
    pub global_volume: f64,
    pub tracks: usize,
    pub rows: u16,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            tick_ms: 250,
            row_note_ms: 150,
            preview_note_ms: 250,
            global_volume: 1.0,
            tracks: 8,
            rows: 64,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str::<Self>(text)?.validated()
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(self)?)
    }

    /// Check ranges; clamps the volume into `[0, 1]`.
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        let invalid = |field, requirement| ConfigError::Invalid { field, requirement };
        if self.sample_rate == 0 {
            return Err(invalid("sample_rate", "greater than 0"));
        }
        if self.tick_ms == 0 {
            return Err(invalid("tick_ms", "greater than 0"));
        }
        if self.tracks == 0 {
            return Err(invalid("tracks", "at least 1"));
        }
        if self.rows == 0 {
            return Err(invalid("rows", "at least 1"));
        }
        if self.global_volume.is_nan() {
            return Err(invalid("global_volume", "a number"));
        }
        self.global_volume = self.global_volume.clamp(0.0, 1.0);
        Ok(self)
    }

    /// Frames between two ticks at the offline sample rate.
    pub fn tick_frames(&self) -> usize {
        ms_to_frames(self.tick_ms, self.sample_rate)
    }
}

pub(crate) fn ms_to_frames(ms: u32, sample_rate: u32) -> usize {
    (sample_rate as u64 * ms as u64 / 1000) as usize
}
