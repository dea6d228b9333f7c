//! Score model entity types: the durable, serializable description of a
//! project. These are plain data; the scheduler reads them through a
//! [`crate::score::snapshot::ScoreSnapshot`], never in place.

use crate::ids::{AutomationLaneId, ContainerId, MarkerId, SourceRecordingId, TrackId};
use crate::score::curve::CurveType;
use crate::time::TimeSignature;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub songs: Vec<Song>,
    pub current_song: usize,
    pub source_recordings: Vec<SourceRecording>,
    pub audio_device: AudioDeviceSettings,
}

impl Project {
    pub fn current_song(&self) -> Option<&Song> {
        self.songs.get(self.current_song)
    }

    pub fn source_recording(&self, id: SourceRecordingId) -> Option<&SourceRecording> {
        self.source_recordings.iter().find(|r| r.id == id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioDeviceSettings {
    pub sample_rate: u32,
    pub channels: u16,
    pub input_device_name: Option<String>,
    pub output_device_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Song {
    pub name: String,
    pub signature: TimeSignature,
    pub tempo_bpm: f64,
    pub count_in_bars: u32,
    pub metronome: MetronomeConfig,
    pub tracks: Vec<Track>,
    pub sections: Vec<SectionRegion>,
}

impl Song {
    pub fn track(&self, id: TrackId) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }

    pub fn master_track(&self) -> Option<&Track> {
        self.tracks.iter().find(|t| t.kind == TrackKind::Master)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MetronomeConfig {
    pub enabled: bool,
    pub volume: f32,
    pub accent_first_beat: bool,
}

impl Default for MetronomeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            volume: 0.8,
            accent_first_beat: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackKind {
    Audio,
    Midi,
    Bus,
    Backing,
    Master,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub kind: TrackKind,
    pub name: String,
    pub mix: MixParams,
    pub record_armed: bool,
    pub mute: bool,
    pub solo: bool,
    pub effect_chain: Vec<EffectNode>,
    pub midi_input_filter: MidiInputFilter,
    pub containers: Vec<Container>,
    pub crossfades: Vec<Crossfade>,
    /// Raw `PluginHandle` of the instrument hosted on this track, if any.
    pub instrument_handle: Option<u64>,
}

impl Track {
    pub fn container(&self, id: ContainerId) -> Option<&Container> {
        self.containers.iter().find(|c| c.id == id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MixParams {
    pub gain: f32,
    /// -1.0 (hard left) to 1.0 (hard right).
    pub pan: f32,
    pub sends: Vec<SendParams>,
}

impl Default for MixParams {
    fn default() -> Self {
        Self {
            gain: 1.0,
            pan: 0.0,
            sends: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SendParams {
    pub target_track: TrackId,
    pub amount: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectNode {
    pub plugin_identifier: String,
    pub bypass: bool,
    /// Raw `PluginHandle` lent to the RT thread by the control thread's
    /// plugin lifecycle management; `None` until the host has instantiated
    /// this slot, in which case the scheduler treats it as bypassed.
    pub handle: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MidiInputFilter {
    pub device_id: Option<String>,
    pub channel: Option<u8>,
}

impl MidiInputFilter {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn matches(&self, device_id: &str, channel: u8) -> bool {
        let device_ok = self
            .device_id
            .as_ref()
            .is_none_or(|d| d == device_id);
        let channel_ok = self.channel.is_none_or(|c| c == channel);
        device_ok && channel_ok
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoopPolicy {
    None,
    Loop,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Fade {
    pub duration_bars: f64,
    pub curve: CurveType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ContainerPayload {
    Audio {
        recording_ref: SourceRecordingId,
        audio_start_offset_bars: f64,
        gain: f32,
    },
    Midi {
        sequence: MidiSequence,
    },
    Empty,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MidiSequence {
    pub notes: Vec<MidiNoteEvent>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MidiNoteEvent {
    pub pitch: u8,
    pub velocity: u8,
    pub start_beat: f64,
    pub duration_beats: f64,
    pub channel: u8,
}

/// Which fields of a clone container have been overridden from its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverridableField {
    Payload,
    EnterFade,
    ExitFade,
    LoopPolicy,
    OnEnterActions,
    OnExitActions,
    AutomationLanes,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Container {
    pub id: ContainerId,
    pub track_id: TrackId,
    pub start_bar: f64,
    pub length_bars: f64,
    pub payload: ContainerPayload,
    pub enter_fade: Option<Fade>,
    pub exit_fade: Option<Fade>,
    pub loop_policy: LoopPolicy,
    pub record_armed: bool,
    pub is_clone: bool,
    pub source_container_id: Option<ContainerId>,
    pub overridden_fields: Vec<OverridableField>,
    pub on_enter_actions: Vec<ContainerAction>,
    pub on_exit_actions: Vec<ContainerAction>,
    pub automation_lanes: Vec<AutomationLane>,
}

impl Container {
    pub fn end_bar(&self) -> f64 {
        self.start_bar + self.length_bars
    }

    pub fn intersects_bars(&self, lo: f64, hi: f64) -> bool {
        self.start_bar < hi && self.end_bar() > lo
    }

    pub fn overrides(&self, field: OverridableField) -> bool {
        self.overridden_fields.contains(&field)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Crossfade {
    pub container_a: ContainerId,
    pub container_b: ContainerId,
    pub curve: CurveType,
}

impl Crossfade {
    pub fn involves(&self, id: ContainerId) -> bool {
        self.container_a == id || self.container_b == id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionRegion {
    pub id: MarkerId,
    pub start_bar: f64,
    pub end_bar: f64,
    pub name: String,
    pub color: [u8; 3],
}

/// Opaque handle to an immutable recorded or imported audio asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRecording {
    pub id: SourceRecordingId,
    pub channels: u16,
    pub sample_rate: u32,
    pub duration_samples: u64,
    pub peaks: Vec<f32>,
}

impl SourceRecording {
    pub fn duration_bars(&self, samples_per_bar: f64) -> f64 {
        self.duration_samples as f64 / samples_per_bar
    }
}

/// Resolvable target for automation and immediate parameter sets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectPath {
    pub track_id: TrackId,
    pub target: EffectTarget,
    pub parameter_address: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectTarget {
    Effect(usize),
    Instrument,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AutomationBreakpoint {
    pub position_bars: f64,
    /// Normalized value in [0, 1]; the plugin host maps it to native units.
    pub value: f32,
    pub curve: CurveType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationLane {
    pub id: AutomationLaneId,
    pub target: EffectPath,
    pub breakpoints: Vec<AutomationBreakpoint>,
}

impl AutomationLane {
    pub fn is_sorted(&self) -> bool {
        self.breakpoints
            .windows(2)
            .all(|w| w[0].position_bars < w[1].position_bars)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ContainerAction {
    SendMidi {
        channel: u8,
        message: MidiMessageKind,
        destination: MidiDestination,
    },
    TriggerContainer {
        target: ContainerId,
        action: TriggerAction,
    },
    SetParameter {
        path: EffectPath,
        value: f32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerAction {
    Start,
    Stop,
    ArmRecord,
    DisarmRecord,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum MidiMessageKind {
    NoteOn { note: u8, velocity: u8 },
    NoteOff { note: u8, velocity: u8 },
    ControlChange { controller: u8, value: u8 },
    ProgramChange { program: u8 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MidiDestination {
    InternalTrack(TrackId),
    ExternalPort(String),
}
