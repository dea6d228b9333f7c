//! Non-fatal engine events, delivered to the control thread on a bounded
//! lock-free ring and mirrored to `tracing` so a host gets structured logs
//! even before it wires up the event channel (§6/§7 policy).

use crate::ids::{ContainerId, TrackId};
use crossbeam_channel::{Receiver, Sender};

#[derive(Debug, Clone)]
pub enum EngineEvent {
    MissingSourceRecording { container: ContainerId },
    PluginProcessFailure { track: TrackId, message: String },
    PluginSlotBypassedPermanently { track: TrackId },
    AudioDeviceUnderrun { count: u64 },
    MidiDeviceDisappeared { device_id: String },
    RecordingSinkFailure { container: ContainerId, message: String },
    UnknownAction { container: ContainerId },
}

impl EngineEvent {
    /// Emit this event to `tracing` at the severity its §7 policy implies.
    pub fn log(&self) {
        match self {
            EngineEvent::MissingSourceRecording { container } => {
                tracing::warn!(?container, "missing source recording, contributing silence");
            }
            EngineEvent::PluginProcessFailure { track, message } => {
                tracing::warn!(?track, %message, "plugin process failure, slot bypassed for this callback");
            }
            EngineEvent::PluginSlotBypassedPermanently { track } => {
                tracing::error!(?track, "plugin slot bypassed permanently after repeated failures");
            }
            EngineEvent::AudioDeviceUnderrun { count } => {
                tracing::warn!(count, "audio device underrun");
            }
            EngineEvent::MidiDeviceDisappeared { device_id } => {
                tracing::warn!(%device_id, "midi device disappeared");
            }
            EngineEvent::RecordingSinkFailure { container, message } => {
                tracing::error!(?container, %message, "recording sink failure, recording stopped");
            }
            EngineEvent::UnknownAction { container } => {
                tracing::warn!(?container, "unknown or malformed container action skipped");
            }
        }
    }
}

/// Bounded channel carrying events from the audio thread to the control
/// thread. `crossbeam_channel`'s bounded sender's `try_send` never blocks,
/// which is what makes this RT-safe to call from the audio thread.
pub fn event_channel(capacity: usize) -> (Sender<EngineEvent>, Receiver<EngineEvent>) {
    crossbeam_channel::bounded(capacity)
}
