//! vamp-core: clock & time map, score model, RT command queue, playback
//! scheduler, and transport for the vamp live-looper engine.
//!
//! This crate owns everything that runs on or feeds the audio callback
//! thread. It defines the opaque [`plugin_host::PluginHost`] and
//! [`output::AudioDriver`] traits the rest of the engine is built against,
//! but ships no concrete plugin bridge — only the `cpal` output adapter and
//! deterministic test doubles.

pub mod audio_source;
pub mod error;
pub mod events;
pub mod ids;
pub mod lockfree;
pub mod output;
pub mod plugin_host;
pub mod queue;
pub mod scheduler;
pub mod score;
pub mod time;
pub mod transport;

pub use error::{Error, Result};
