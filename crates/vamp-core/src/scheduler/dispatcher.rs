//! Action Dispatcher: executes `onEnter`/`onExit` container actions at the
//! sample-offset a bar boundary was actually crossed within a callback.

use crate::events::EngineEvent;
use crate::ids::ContainerId;
use crate::score::{Container, ContainerAction, EffectPath, MidiDestination, MidiMessageKind, Song, TriggerAction};
use crossbeam_channel::Sender;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossingKind {
    Enter,
    Exit,
}

#[derive(Debug, Clone, Copy)]
pub struct BarCrossing {
    pub container_id: ContainerId,
    pub sample_offset: usize,
    pub kind: CrossingKind,
}

/// Side-effect sink the dispatcher executes actions against. Kept generic
/// so `vamp-core` doesn't depend on `vamp-midi`'s concrete routing or
/// `vamp-automation`'s evaluator — the umbrella crate wires a concrete
/// implementation at startup.
pub trait ActionSink {
    fn send_midi(
        &mut self,
        destination: &MidiDestination,
        channel: u8,
        sample_offset: usize,
        message: MidiMessageKind,
    );
    fn trigger_container(&mut self, target: ContainerId, action: TriggerAction, sample_offset: usize);
    fn set_parameter(&mut self, path: &EffectPath, value: f32, sample_offset: usize);
    fn all_notes_off(&mut self, sample_offset: usize);
}

/// Per-callback automation evaluation, injected the same way `ActionSink`
/// is: `vamp-core` defines the seam, `vamp-automation` implements it, the
/// umbrella engine wires the concrete evaluator in at startup.
pub trait AutomationHook: Send {
    fn evaluate(
        &mut self,
        song: &Song,
        container: &Container,
        callback_start_bar: f64,
        callback_end_bar: f64,
        bar_to_sample_offset: &dyn Fn(f64) -> usize,
        sink: &mut dyn ActionSink,
    );
}

/// No-op hook for headless operation or tests that don't exercise
/// automation lanes.
pub struct NullAutomationHook;

impl AutomationHook for NullAutomationHook {
    fn evaluate(
        &mut self,
        _song: &Song,
        _container: &Container,
        _callback_start_bar: f64,
        _callback_end_bar: f64,
        _bar_to_sample_offset: &dyn Fn(f64) -> usize,
        _sink: &mut dyn ActionSink,
    ) {
    }
}

pub struct ActionDispatcher;

impl ActionDispatcher {
    pub fn new() -> Self {
        Self
    }

    /// Execute every crossing's listed actions, in order, against `sink`.
    /// `actions_for` resolves a crossing to its action list (enter vs exit
    /// actions come from the container itself).
    pub fn dispatch<'a>(
        &self,
        crossings: &[BarCrossing],
        actions_for: impl Fn(ContainerId, CrossingKind) -> Option<&'a [ContainerAction]>,
        sink: &mut dyn ActionSink,
        events: &Sender<EngineEvent>,
    ) {
        for crossing in crossings {
            let Some(actions) = actions_for(crossing.container_id, crossing.kind) else {
                let _ = events.try_send(EngineEvent::UnknownAction {
                    container: crossing.container_id,
                });
                continue;
            };
            for action in actions {
                match action {
                    ContainerAction::SendMidi {
                        channel,
                        message,
                        destination,
                    } => {
                        sink.send_midi(destination, *channel, crossing.sample_offset, *message);
                    }
                    ContainerAction::TriggerContainer { target, action } => {
                        sink.trigger_container(*target, *action, crossing.sample_offset);
                    }
                    ContainerAction::SetParameter { path, value } => {
                        sink.set_parameter(path, *value, crossing.sample_offset);
                    }
                }
            }
        }
    }
}

impl Default for ActionDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::EffectTarget;

    #[derive(Default)]
    struct RecordingSink {
        midi_sent: Vec<(u8, usize)>,
        triggered: Vec<(ContainerId, TriggerAction)>,
        parameters_set: Vec<(String, f32)>,
        notes_off: Vec<usize>,
    }

    impl ActionSink for RecordingSink {
        fn send_midi(
            &mut self,
            _destination: &MidiDestination,
            channel: u8,
            sample_offset: usize,
            _message: MidiMessageKind,
        ) {
            self.midi_sent.push((channel, sample_offset));
        }

        fn trigger_container(&mut self, target: ContainerId, action: TriggerAction, _sample_offset: usize) {
            self.triggered.push((target, action));
        }

        fn set_parameter(&mut self, path: &EffectPath, value: f32, _sample_offset: usize) {
            self.parameters_set.push((path.parameter_address.clone(), value));
        }

        fn all_notes_off(&mut self, sample_offset: usize) {
            self.notes_off.push(sample_offset);
        }
    }

    #[test]
    fn dispatches_enter_actions_in_order() {
        let container_id = ContainerId(1);
        let actions = vec![
            ContainerAction::SendMidi {
                channel: 0,
                message: MidiMessageKind::NoteOn { note: 60, velocity: 100 },
                destination: MidiDestination::ExternalPort("out".into()),
            },
            ContainerAction::SetParameter {
                path: EffectPath {
                    track_id: crate::ids::TrackId(1),
                    target: EffectTarget::Effect(0),
                    parameter_address: "cutoff".into(),
                },
                value: 0.5,
            },
        ];

        let crossings = vec![BarCrossing {
            container_id,
            sample_offset: 12,
            kind: CrossingKind::Enter,
        }];

        let mut sink = RecordingSink::default();
        let (tx, _rx) = crate::events::event_channel(4);
        ActionDispatcher::new().dispatch(
            &crossings,
            |id, kind| {
                if id == container_id && kind == CrossingKind::Enter {
                    Some(actions.as_slice())
                } else {
                    None
                }
            },
            &mut sink,
            &tx,
        );

        assert_eq!(sink.midi_sent, vec![(0, 12)]);
        assert_eq!(sink.parameters_set, vec![("cutoff".to_string(), 0.5)]);
    }

    #[test]
    fn unresolved_container_is_skipped_and_reported() {
        let crossings = vec![BarCrossing {
            container_id: ContainerId(99),
            sample_offset: 0,
            kind: CrossingKind::Exit,
        }];
        let mut sink = RecordingSink::default();
        let (tx, rx) = crate::events::event_channel(4);
        ActionDispatcher::new().dispatch(&crossings, |_, _| None, &mut sink, &tx);
        assert!(sink.midi_sent.is_empty());
        assert!(matches!(
            rx.try_recv(),
            Ok(EngineEvent::UnknownAction { container }) if container == ContainerId(99)
        ));
    }
}
