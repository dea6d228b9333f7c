//! Engine configuration: device selection, initial song parameters, and
//! recording output directory. Loadable from TOML via `toml`/`serde`, or
//! built programmatically with [`EngineConfig::default`] plus setters.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use vamp_core::time::TimeSignature;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub sample_rate: u32,
    pub buffer_size: u32,
    pub channels: u16,
    pub input_device_name: Option<String>,
    pub output_device_name: Option<String>,

    pub initial_tempo_bpm: f64,
    pub initial_time_signature: (u8, u8),
    pub count_in_bars: u32,

    /// Where `vamp-recording` writes finalized capture WAV files.
    pub recording_output_dir: PathBuf,

    /// Capacity of the control -> audio thread RT command queue.
    pub command_queue_capacity: usize,
    /// Capacity of the audio -> control thread event channel.
    pub event_channel_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            buffer_size: 256,
            channels: 2,
            input_device_name: None,
            output_device_name: None,
            initial_tempo_bpm: 120.0,
            initial_time_signature: (4, 4),
            count_in_bars: 1,
            recording_output_dir: PathBuf::from("recordings"),
            command_queue_capacity: 256,
            event_channel_capacity: 256,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn time_signature(&self) -> Result<TimeSignature> {
        let (beats_per_bar, beat_unit) = self.initial_time_signature;
        Ok(TimeSignature::new(beats_per_bar, beat_unit)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_a_valid_time_signature() {
        let config = EngineConfig::default();
        assert!(config.time_signature().is_ok());
    }

    #[test]
    fn round_trips_through_toml() {
        let config = EngineConfig::default();
        let text = toml::to_string(&config).unwrap();
        let parsed = EngineConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed.sample_rate, config.sample_rate);
        assert_eq!(parsed.initial_time_signature, config.initial_time_signature);
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(EngineConfig::from_toml_str("not valid toml = [").is_err());
    }
}
