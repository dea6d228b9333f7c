//! Transport: play/stop/seek/count-in/loop, playhead ownership, and UI sync.

mod fsm;
mod handle;
mod manager;
mod metronome;

pub use fsm::{TransportEvent, TransportFsm, TransportState, TransitionResult};
pub use handle::{MetronomeHandle, TransportHandle};
pub use manager::TransportManager;
pub use metronome::MetronomeState;
