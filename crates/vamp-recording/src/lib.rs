//! vamp-recording: the Recording Manager, capture ring, background WAV
//! writer, and peak accumulator for punch-in/out audio capture.
//!
//! The RT-facing surface is [`manager::RecordingManager::process_callback`]:
//! it takes the set of armed containers intersecting the current callback
//! plus the raw input block, and never blocks or allocates on the hot
//! path — opening, writing, and finalizing capture sinks all happen on a
//! background thread reached through a lock-free ring.

pub mod capture;
pub mod error;
pub mod manager;
pub mod peaks;
pub mod writer;

pub use error::{Error, Result};
pub use manager::{ArmedRange, RecordingEvent, RecordingManager};
