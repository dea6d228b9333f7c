//! Ties the raw monitor, activity monitor, routing table, learn session,
//! and driver output together, and adapts the whole thing to the
//! scheduler's `ActionSink` boundary so `vamp-core` never has to know
//! `vamp-midi` exists.

use crate::driver::{MidiDriver, MidiPortInfo, NullMidiDriver};
use crate::error::Result;
use crate::learn::LearnSession;
use crate::monitor::{ActivityMonitor, RawMonitor};
use crate::routing::{Dispatch, RoutingTable};
use crate::trigger::{parse_word, MidiMessage};
use std::collections::HashSet;
use vamp_core::ids::{ContainerId, TrackId};
use vamp_core::score::{EffectPath, MidiDestination, MidiMessageKind, TriggerAction};
use vamp_core::scheduler::ActionSink;

/// MIDI CC number for "All Notes Off" (§4.3, §4.4, §5).
const ALL_NOTES_OFF_CONTROLLER: u8 = 123;

/// Where a container/track trigger produced by MIDI routing or the
/// scheduler's own action dispatcher should land. The fabric doesn't own a
/// transport or an automation evaluator, so both are injected — this is
/// the same pattern `PlaybackScheduler` uses for its own `ActionSink`.
pub trait ContainerTriggerSink: Send {
    fn trigger_container(&mut self, target: ContainerId, action: TriggerAction);
}

pub trait ParameterSink: Send {
    fn set_parameter(&mut self, path: &EffectPath, value: f32);
}

/// No-op doubles for headless operation or tests that only care about the
/// MIDI side of the fabric.
pub struct NullContainerTriggerSink;
impl ContainerTriggerSink for NullContainerTriggerSink {
    fn trigger_container(&mut self, _target: ContainerId, _action: TriggerAction) {}
}

pub struct NullParameterSink;
impl ParameterSink for NullParameterSink {
    fn set_parameter(&mut self, _path: &EffectPath, _value: f32) {}
}

/// Receives the discrete/continuous half of routing dispatch (§4.8 item 2):
/// play/pause, stop, record arm, song navigation, mute/solo/select, and
/// continuous volume/pan/send. Kept separate from [`ParameterSink`] because
/// these map onto the control surface's transport/mixer API, not a plugin
/// parameter.
pub trait ControlSink: Send {
    fn control(&mut self, control: crate::routing::MappableControl);
    fn continuous(&mut self, control: crate::routing::ContinuousControl, value: f32);
}

pub struct NullControlSink;
impl ControlSink for NullControlSink {
    fn control(&mut self, _control: crate::routing::MappableControl) {}
    fn continuous(&mut self, _control: crate::routing::ContinuousControl, _value: f32) {}
}

/// The live MIDI subsystem: owns the driver, the routing/learn state, and
/// the monitors, and is the control thread's single point of contact for
/// "a MIDI message arrived" and "the engine wants to send one out".
pub struct MidiFabric {
    driver: Box<dyn MidiDriver>,
    routing: RoutingTable,
    learn: LearnSession,
    raw_monitor: RawMonitor,
    activity: ActivityMonitor,
    container_sink: Box<dyn ContainerTriggerSink>,
    parameter_sink: Box<dyn ParameterSink>,
    control_sink: Box<dyn ControlSink>,
    track_filters: Vec<(TrackId, u8)>,
    /// External port names a `SendMidi` action has actually targeted.
    /// `enumerate_outputs` opens a fresh device handle on every call and
    /// isn't RT-safe, so `all_notes_off` broadcasts to this set instead of
    /// re-enumerating.
    known_destinations: HashSet<String>,
}

impl MidiFabric {
    pub fn new(driver: Box<dyn MidiDriver>) -> Self {
        Self {
            driver,
            routing: RoutingTable::new(),
            learn: LearnSession::new(),
            raw_monitor: RawMonitor::default(),
            activity: ActivityMonitor::new(),
            container_sink: Box::new(NullContainerTriggerSink),
            parameter_sink: Box::new(NullParameterSink),
            control_sink: Box::new(NullControlSink),
            track_filters: Vec::new(),
            known_destinations: HashSet::new(),
        }
    }

    pub fn headless() -> Self {
        Self::new(Box::new(NullMidiDriver::new()))
    }

    pub fn set_container_sink(&mut self, sink: Box<dyn ContainerTriggerSink>) {
        self.container_sink = sink;
    }

    pub fn set_parameter_sink(&mut self, sink: Box<dyn ParameterSink>) {
        self.parameter_sink = sink;
    }

    pub fn set_control_sink(&mut self, sink: Box<dyn ControlSink>) {
        self.control_sink = sink;
    }

    pub fn routing(&self) -> &RoutingTable {
        &self.routing
    }

    pub fn routing_mut(&mut self) -> &mut RoutingTable {
        &mut self.routing
    }

    pub fn learn(&mut self) -> &mut LearnSession {
        &mut self.learn
    }

    pub fn raw_monitor(&self) -> &RawMonitor {
        &self.raw_monitor
    }

    pub fn activity(&self) -> &ActivityMonitor {
        &self.activity
    }

    pub fn enumerate_inputs(&self) -> Result<Vec<MidiPortInfo>> {
        self.driver.enumerate_inputs()
    }

    pub fn enumerate_outputs(&self) -> Result<Vec<MidiPortInfo>> {
        self.driver.enumerate_outputs()
    }

    /// A track's MIDI input filter, as `(track, channel)`; used to bump
    /// activity timestamps independently of whether anything is routed.
    pub fn set_track_filter(&mut self, track: TrackId, channel: u8) {
        self.track_filters.retain(|(t, _)| *t != track);
        self.track_filters.push((track, channel));
    }

    /// Entry point for every raw word the driver delivers, on whichever
    /// thread the driver calls back on. Logs it, bumps activity, and
    /// either feeds learn or dispatches through the routing table.
    pub fn handle_raw_word(&mut self, source_device: &str, word: u32) {
        let Ok(message) = parse_word(word) else {
            return;
        };
        self.handle_message(source_device, message);
    }

    fn handle_message(&mut self, source_device: &str, message: MidiMessage) {
        self.raw_monitor.record(source_device, message);

        for (track, channel) in &self.track_filters {
            if *channel == message.channel() {
                self.activity.mark(track.0);
            }
        }

        let Some(trigger) = message.trigger() else {
            return;
        };

        if self.learn.capture(trigger, &mut self.routing).is_some() {
            return;
        }

        let normalized = message.normalized_value().unwrap_or(0.0);
        match self.routing.dispatch(trigger, normalized) {
            Dispatch::Control(control) => self.control_sink.control(control),
            Dispatch::Continuous(control, value) => self.control_sink.continuous(control, value),
            Dispatch::Parameters(values) => {
                for (path, value) in values {
                    self.parameter_sink.set_parameter(&path, value);
                }
            }
            Dispatch::Unmapped => {}
        }
    }

    pub fn send_external(&self, destination_name: &str, bytes: &[u8]) -> Result<()> {
        self.driver.send_to_output(destination_name, bytes)
    }
}

impl ActionSink for MidiFabric {
    fn send_midi(
        &mut self,
        destination: &MidiDestination,
        channel: u8,
        _sample_offset: usize,
        message: MidiMessageKind,
    ) {
        let full = match message {
            MidiMessageKind::NoteOn { note, velocity } => MidiMessage::NoteOn { channel, note, velocity },
            MidiMessageKind::NoteOff { note, velocity } => MidiMessage::NoteOff { channel, note, velocity },
            MidiMessageKind::ControlChange { controller, value } => {
                MidiMessage::ControlChange { channel, controller, value }
            }
            MidiMessageKind::ProgramChange { program } => MidiMessage::ProgramChange { channel, program },
        };
        match destination {
            MidiDestination::ExternalPort(name) => {
                if self.driver.send_to_output(name, &full.to_bytes()).is_ok() {
                    self.known_destinations.insert(name.clone());
                }
            }
            MidiDestination::InternalTrack(_track) => {
                // Internal routing back into the score model isn't this
                // crate's concern; the umbrella engine owns the bridge from
                // a container's internal MIDI destination to whatever plays
                // it (instrument plugin host, another container).
            }
        }
    }

    fn trigger_container(&mut self, target: ContainerId, action: TriggerAction, _sample_offset: usize) {
        self.container_sink.trigger_container(target, action);
    }

    fn set_parameter(&mut self, path: &EffectPath, value: f32, _sample_offset: usize) {
        self.parameter_sink.set_parameter(path, value);
    }

    /// Broadcasts CC123 on every channel to every external port this
    /// fabric has ever sent to. Internal-track instruments are the
    /// umbrella engine's own `ActionSink` responsibility (it holds the
    /// plugin host this fabric doesn't).
    fn all_notes_off(&mut self, _sample_offset: usize) {
        for name in &self.known_destinations {
            for channel in 0..16u8 {
                let message = MidiMessage::ControlChange {
                    channel,
                    controller: ALL_NOTES_OFF_CONTROLLER,
                    value: 0,
                };
                let _ = self.driver.send_to_output(name, &message.to_bytes());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::MappableControl;
    use vamp_core::score::EffectTarget;

    #[test]
    fn unmapped_message_is_logged_but_not_dispatched() {
        let mut fabric = MidiFabric::headless();
        fabric.handle_raw_word("test", 0x00_90_3C_64);
        assert_eq!(fabric.raw_monitor().len(), 1);
    }

    #[test]
    fn track_filter_bumps_activity_on_matching_channel() {
        let mut fabric = MidiFabric::headless();
        fabric.set_track_filter(TrackId(1), 0);
        fabric.handle_raw_word("test", 0x00_90_3C_64);
        assert!(fabric.activity().is_active(1));
    }

    #[test]
    fn learn_capture_intercepts_the_next_trigger() {
        let mut fabric = MidiFabric::headless();
        fabric.learn().start(crate::learn::LearnTarget::Control(MappableControl::Stop));
        fabric.handle_raw_word("test", 0x00_90_3C_64);
        assert!(matches!(
            fabric.routing().dispatch(crate::trigger::MidiTrigger::NoteOn { channel: 0, note: 0x3C }, 1.0),
            Dispatch::Control(MappableControl::Stop)
        ));
    }

    #[test]
    fn parameter_mapping_dispatches_through_parameter_sink() {
        let mut fabric = MidiFabric::headless();
        let path = EffectPath {
            track_id: TrackId(1),
            target: EffectTarget::Effect(0),
            parameter_address: "cutoff".into(),
        };
        fabric.routing_mut().add_parameter_mapping(
            crate::trigger::MidiTrigger::Cc { channel: 0, controller: 11 },
            crate::routing::ParameterMapping { path, min: 0.0, max: 1.0 },
        );

        // Install a recording sink, then feed a CC message on controller 11.
        let recorded = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        struct Bridge(std::rc::Rc<std::cell::RefCell<Vec<(String, f32)>>>);
        unsafe impl Send for Bridge {}
        impl ParameterSink for Bridge {
            fn set_parameter(&mut self, path: &EffectPath, value: f32) {
                self.0.borrow_mut().push((path.parameter_address.clone(), value));
            }
        }
        fabric.set_parameter_sink(Box::new(Bridge(recorded.clone())));

        fabric.handle_raw_word("test", 0x00_B0_0B_7F);
        assert_eq!(recorded.borrow().len(), 1);
        assert_eq!(recorded.borrow()[0].0, "cutoff");
    }
}
