//! # vamp - Real-time Live-Looper Engine
//!
//! Umbrella crate that coordinates:
//! - **vamp-core** - Score model, snapshot publication, transport, playback scheduler
//! - **vamp-midi** - MIDI triggers, routing/mapping, learn, activity monitoring
//! - **vamp-automation** - Per-callback automation breakpoint evaluation
//! - **vamp-recording** - Input capture, finalized-recording handoff
//!
//! ## Quick start
//!
//! ```ignore
//! use vamp::prelude::*;
//!
//! let engine = VampEngine::builder()
//!     .sample_rate(48_000)
//!     .headless()
//!     .build()?;
//!
//! engine.start_audio()?;
//! engine.play();
//! ```

pub mod builder;
pub mod callback;
pub mod config;
pub mod controls;
pub mod engine;
pub mod error;
pub mod wav_source;

pub use builder::EngineBuilder;
pub use config::EngineConfig;
pub use engine::VampEngine;
pub use error::{Error, Result};

/// Re-export of vamp-core for direct access to the score model, transport,
/// and scheduler types.
pub use vamp_core as core;
pub use vamp_core::{
    ids::{
        AutomationLaneId, ContainerId, IdAllocator, MarkerId, SourceRecordingId, TrackId,
    },
    score::{
        AudioDeviceSettings, AutomationBreakpoint, AutomationLane, Container, ContainerAction,
        ContainerPayload, Crossfade, CurveType, EffectNode, EffectPath, EffectTarget, Fade, LoopPolicy,
        MetronomeConfig, MidiDestination, MidiInputFilter, MidiMessageKind, MidiNoteEvent, MidiSequence,
        MixParams, OverridableField, Project, SectionRegion, SendParams, Song, SourceRecording, Track,
        TrackKind, TriggerAction,
    },
    transport::{MetronomeHandle, TransportHandle, TransportState},
};

pub use vamp_midi as midi;
pub use vamp_midi::{
    driver::{MidiDriver, MidiPortInfo, NullMidiDriver},
    learn::LearnTarget,
    monitor::LoggedMessage,
    routing::{ContinuousControl, MappableControl, MappingTarget, ParameterMapping},
    MidiTrigger,
};

pub use vamp_automation as automation;
pub use vamp_recording as recording;
pub use vamp_recording::RecordingEvent;

/// Convenience prelude for common imports.
pub mod prelude {
    pub use crate::{EngineBuilder, EngineConfig, Error, Result, VampEngine};

    pub use crate::core::{
        AutomationBreakpoint, Container, ContainerAction, ContainerPayload, Crossfade, CurveType,
        EffectPath, Fade, LoopPolicy, MetronomeConfig, MixParams, Project, SectionRegion, SendParams,
        Song, Track, TrackKind, TriggerAction,
    };
    pub use crate::core::ids::{ContainerId, IdAllocator, MarkerId, TrackId};

    pub use crate::midi::{ContinuousControl, MappableControl, MappingTarget, MidiTrigger};
}
