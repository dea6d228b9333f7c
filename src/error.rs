//! Centralized error type for the vamp umbrella crate.
//!
//! Wraps all subsystem errors so `?` propagates naturally across crate
//! boundaries, the way the teacher's `src/error.rs` aggregates its
//! subsystem crates.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] vamp_core::Error),

    #[error("midi: {0}")]
    Midi(#[from] vamp_midi::Error),

    #[error("automation: {0}")]
    Automation(#[from] vamp_automation::Error),

    #[error("recording: {0}")]
    Recording(#[from] vamp_recording::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("wav: {0}")]
    Wav(#[from] hound::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
