//! Builder for configuring and constructing a [`VampEngine`].

use std::sync::Arc;

use crate::config::EngineConfig;
use crate::engine::VampEngine;
use crate::error::Result;
use vamp_core::output::{AudioDriver, CpalAudioDriver, NullAudioDriver};
use vamp_core::plugin_host::{NullPluginHost, PluginHost};
use vamp_midi::driver::{MidiDriver, NullMidiDriver};

/// Configures and assembles a [`VampEngine`]. Every subsystem has a
/// headless default (`NullAudioDriver`, `NullPluginHost`, `NullMidiDriver`)
/// so a builder with no overrides still builds, which the test suite
/// relies on; a real host swaps in `CpalAudioDriver` and a real plugin
/// host before calling [`EngineBuilder::build`].
pub struct EngineBuilder {
    config: EngineConfig,
    plugin_host: Option<Arc<dyn PluginHost>>,
    audio_driver: Option<Box<dyn AudioDriver>>,
    midi_driver: Option<Box<dyn MidiDriver>>,
    headless: bool,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            config: EngineConfig::default(),
            plugin_host: None,
            audio_driver: None,
            midi_driver: None,
            headless: false,
        }
    }
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn sample_rate(mut self, sample_rate: u32) -> Self {
        self.config.sample_rate = sample_rate;
        self
    }

    pub fn buffer_size(mut self, buffer_size: u32) -> Self {
        self.config.buffer_size = buffer_size;
        self
    }

    pub fn channels(mut self, channels: u16) -> Self {
        self.config.channels = channels;
        self
    }

    pub fn tempo_bpm(mut self, tempo_bpm: f64) -> Self {
        self.config.initial_tempo_bpm = tempo_bpm;
        self
    }

    pub fn time_signature(mut self, numerator: u8, denominator: u8) -> Self {
        self.config.initial_time_signature = (numerator, denominator);
        self
    }

    pub fn count_in_bars(mut self, bars: u32) -> Self {
        self.config.count_in_bars = bars;
        self
    }

    pub fn recording_output_dir(mut self, dir: impl Into<std::path::PathBuf>) -> Self {
        self.config.recording_output_dir = dir.into();
        self
    }

    pub fn plugin_host(mut self, host: Arc<dyn PluginHost>) -> Self {
        self.plugin_host = Some(host);
        self
    }

    pub fn audio_driver(mut self, driver: Box<dyn AudioDriver>) -> Self {
        self.audio_driver = Some(driver);
        self
    }

    pub fn midi_driver(mut self, driver: Box<dyn MidiDriver>) -> Self {
        self.midi_driver = Some(driver);
        self
    }

    /// Forces `NullAudioDriver`/`NullMidiDriver` even if real ones were
    /// supplied, for tests that want to assert on headless behavior
    /// without touching real devices.
    pub fn headless(mut self) -> Self {
        self.headless = true;
        self
    }

    pub fn build(self) -> Result<VampEngine> {
        let plugin_host = self.plugin_host.unwrap_or_else(|| Arc::new(NullPluginHost::default()));

        let audio_driver: Box<dyn AudioDriver> = if self.headless {
            Box::new(NullAudioDriver::new(self.config.channels))
        } else {
            match self.audio_driver {
                Some(driver) => driver,
                None => Box::new(CpalAudioDriver::default()),
            }
        };

        let midi_driver: Box<dyn MidiDriver> = if self.headless {
            Box::new(NullMidiDriver::default())
        } else {
            self.midi_driver.unwrap_or_else(|| Box::new(NullMidiDriver::default()))
        };

        VampEngine::new(self.config, plugin_host, audio_driver, midi_driver)
    }
}
