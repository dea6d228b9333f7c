//! Bridges MIDI-originated and action-originated control events back onto
//! the control thread.
//!
//! `vamp-midi`'s routing dispatch and `vamp-core`'s own action dispatcher
//! both execute on threads other than the one that owns [`crate::engine::VampEngine`]'s
//! project edits (the MIDI input thread and the audio thread,
//! respectively), so neither can call `VampEngine` methods directly. Both
//! land here through a small set of sinks that funnel into one bounded
//! channel; [`crate::engine::VampEngine::pump_controls`] drains it on
//! whatever thread the host calls it from.

use crossbeam_channel::Sender;
use std::sync::Arc;
use vamp_core::ids::ContainerId;
use vamp_core::plugin_host::{HostMidiEvent, HostMidiKind, PluginHandle, PluginHost};
use vamp_core::score::{EffectPath, EffectTarget, MidiDestination, MidiMessageKind, Project, TriggerAction};
use vamp_core::scheduler::ActionSink;
use vamp_midi::fabric::{ContainerTriggerSink, ControlSink, ParameterSink};
use vamp_midi::routing::{ContinuousControl, MappableControl};
use vamp_midi::MidiFabric;

/// Everything a MIDI trigger or an `onEnter`/`onExit` container action can
/// ask the control thread to do.
#[derive(Debug, Clone)]
pub enum ControlCommand {
    Control(MappableControl),
    Continuous(ContinuousControl, f32),
    ContainerTrigger(ContainerId, TriggerAction),
}

/// Resolves an `EffectPath` against a snapshot and applies the value
/// through the plugin host's immediate-set entry point. Shared by the
/// MIDI parameter bridge and the RT action sink so a CC-driven set and an
/// action-driven set resolve the handle the same way.
pub fn apply_parameter(host: &dyn PluginHost, project: &Project, path: &EffectPath, value: f32) {
    let Some(song) = project.current_song() else { return };
    let Some(track) = song.track(path.track_id) else { return };
    let handle = match path.target {
        EffectTarget::Instrument => track.instrument_handle,
        EffectTarget::Effect(idx) => track.effect_chain.get(idx).and_then(|e| e.handle),
    };
    if let Some(raw) = handle {
        let _ = host.set_parameter_immediate(PluginHandle(raw), &path.parameter_address, value);
    }
}

/// Feeds `vamp-midi`'s control/continuous/container-trigger dispatch into
/// the shared [`ControlCommand`] channel. Cheap to clone — it only holds a
/// `Sender`.
#[derive(Clone)]
pub struct MidiControlBridge {
    tx: Sender<ControlCommand>,
}

impl MidiControlBridge {
    pub fn new(tx: Sender<ControlCommand>) -> Self {
        Self { tx }
    }
}

impl ControlSink for MidiControlBridge {
    fn control(&mut self, control: MappableControl) {
        let _ = self.tx.try_send(ControlCommand::Control(control));
    }

    fn continuous(&mut self, control: ContinuousControl, value: f32) {
        let _ = self.tx.try_send(ControlCommand::Continuous(control, value));
    }
}

impl ContainerTriggerSink for MidiControlBridge {
    fn trigger_container(&mut self, target: ContainerId, action: TriggerAction) {
        let _ = self.tx.try_send(ControlCommand::ContainerTrigger(target, action));
    }
}

/// Feeds `vamp-midi`'s parameter dispatch (CC learn/mapping) straight into
/// the plugin host, the same immediate-apply path `EngineActionSink` uses.
pub struct MidiParameterBridge {
    pub host: Arc<dyn PluginHost>,
    pub snapshot: vamp_core::score::SnapshotHandle,
}

impl ParameterSink for MidiParameterBridge {
    fn set_parameter(&mut self, path: &EffectPath, value: f32) {
        apply_parameter(&*self.host, &self.snapshot.load(), path, value);
    }
}

/// The scheduler's [`ActionSink`]: executes `onEnter`/`onExit` container
/// actions against the live MIDI fabric, the control-command channel, and
/// the plugin host. Runs on the audio thread inside
/// `PlaybackScheduler::process`, so every branch here must stay
/// allocation-free and must never block for long. `midi` is guarded by a
/// `parking_lot::Mutex` rather than something wait-free — the same
/// trade-off `TransportHandle` makes for its command sender — since a MIDI
/// send is already a rare, latency-insensitive side effect compared to the
/// mix itself.
pub struct EngineActionSink {
    pub midi: Arc<parking_lot::Mutex<MidiFabric>>,
    pub plugin_host: Arc<dyn PluginHost>,
    pub snapshot: vamp_core::score::SnapshotHandle,
    pub controls_tx: Sender<ControlCommand>,
}

impl ActionSink for EngineActionSink {
    fn send_midi(
        &mut self,
        destination: &MidiDestination,
        channel: u8,
        sample_offset: usize,
        message: MidiMessageKind,
    ) {
        <MidiFabric as ActionSink>::send_midi(&mut self.midi.lock(), destination, channel, sample_offset, message);
    }

    fn trigger_container(&mut self, target: ContainerId, action: TriggerAction, _sample_offset: usize) {
        let _ = self.controls_tx.try_send(ControlCommand::ContainerTrigger(target, action));
    }

    fn set_parameter(&mut self, path: &EffectPath, value: f32, _sample_offset: usize) {
        apply_parameter(&*self.plugin_host, &self.snapshot.load(), path, value);
    }

    /// Forces every in-flight note off: CC123 on every channel to every
    /// track's instrument, plus whatever external ports the MIDI fabric has
    /// ever sent to. Invoked on stop, seek-while-playing, loop wrap, and
    /// `set_loop` (§4.3, §4.4, §5).
    fn all_notes_off(&mut self, sample_offset: usize) {
        let project = self.snapshot.load();
        if let Some(song) = project.current_song() {
            let events: Vec<HostMidiEvent> = (0..16u8)
                .map(|channel| HostMidiEvent {
                    sample_offset,
                    channel,
                    kind: HostMidiKind::ControlChange { controller: 123, value: 0 },
                })
                .collect();
            for track in &song.tracks {
                if let Some(raw_handle) = track.instrument_handle {
                    let handle = PluginHandle(raw_handle);
                    let _ = self.plugin_host.process(handle, &[], &mut [], &events, &[], false);
                }
            }
        }
        drop(project);
        <MidiFabric as ActionSink>::all_notes_off(&mut self.midi.lock(), sample_offset);
    }
}
