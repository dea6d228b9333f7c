//! vamp-midi: MIDI trigger parsing, routing/mapping, learn, activity
//! monitoring, and output for the vamp live-looper engine.
//!
//! Input words arrive as the 32-bit raw encoding the MIDI driver boundary
//! defines (§6); [`trigger::parse_word`] turns them into a typed
//! [`trigger::MidiTrigger`] plus a channel. Everything downstream — the
//! control dispatcher, the parameter dispatcher, learn, and the raw
//! monitor — fans out from there (§4.8).

pub mod driver;
pub mod error;
pub mod fabric;
pub mod learn;
pub mod monitor;
pub mod routing;
pub mod trigger;

pub use error::{Error, Result};
pub use fabric::MidiFabric;
pub use trigger::MidiTrigger;
