//! Control dispatcher and parameter dispatcher (§4.8 items 2-3): a
//! trigger-keyed routing table from `MidiTrigger` to either a discrete
//! `MappableControl`, a continuous control, or one or more parameter
//! mappings.

use crate::trigger::MidiTrigger;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use vamp_core::score::EffectPath;

/// Discrete transport/mixer controls a `NoteOn` trigger can fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MappableControl {
    PlayPause,
    Stop,
    RecordArm,
    NextSong,
    PreviousSong,
    MetronomeToggle,
    TrackMute(u64),
    TrackSolo(u64),
    TrackSelect(u64),
    SongSelect(usize),
}

/// Continuous controls, driven by a CC's scaled `[0, 1]` value. Per the
/// spec's open question, continuous controls never also fire a
/// `MappableControl` — the two paths are mutually exclusive by design.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContinuousControl {
    TrackVolume(u64),
    TrackPan(u64),
    TrackSend(u64, usize),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MappingTarget {
    Control(MappableControl),
    Continuous(ContinuousControl),
}

/// A CC mapped to one or more effect parameters, each with its own
/// `[min, max]` output range (§4.8 item 3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterMapping {
    pub path: EffectPath,
    pub min: f32,
    pub max: f32,
}

impl ParameterMapping {
    pub fn scale(&self, normalized: f32) -> f32 {
        self.min + normalized.clamp(0.0, 1.0) * (self.max - self.min)
    }
}

/// The full routing table: control/continuous mappings plus parameter
/// mappings, both keyed by trigger. Lives on the control thread; edits
/// replace entries directly (no RT-safety constraint here — this table is
/// read by the input thread, not the audio thread).
#[derive(Default)]
pub struct RoutingTable {
    controls: HashMap<MidiTrigger, MappingTarget>,
    parameters: HashMap<MidiTrigger, Vec<ParameterMapping>>,
}

/// Result of dispatching one incoming trigger against the routing table.
#[derive(Debug, Clone)]
pub enum Dispatch {
    Control(MappableControl),
    Continuous(ContinuousControl, f32),
    Parameters(Vec<(EffectPath, f32)>),
    Unmapped,
}

impl RoutingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn map_control(&mut self, trigger: MidiTrigger, target: MappableControl) {
        self.controls.insert(trigger, MappingTarget::Control(target));
    }

    pub fn map_continuous(&mut self, trigger: MidiTrigger, target: ContinuousControl) {
        self.controls.insert(trigger, MappingTarget::Continuous(target));
    }

    pub fn add_parameter_mapping(&mut self, trigger: MidiTrigger, mapping: ParameterMapping) {
        self.parameters.entry(trigger).or_default().push(mapping);
    }

    pub fn set_parameter_mappings(&mut self, trigger: MidiTrigger, mappings: Vec<ParameterMapping>) {
        self.parameters.insert(trigger, mappings);
    }

    pub fn remove_mapping(&mut self, trigger: MidiTrigger) {
        self.controls.remove(&trigger);
        self.parameters.remove(&trigger);
    }

    pub fn control_for(&self, trigger: MidiTrigger) -> Option<&MappingTarget> {
        self.controls.get(&trigger)
    }

    pub fn parameters_for(&self, trigger: MidiTrigger) -> Option<&[ParameterMapping]> {
        self.parameters.get(&trigger).map(|v| v.as_slice())
    }

    /// Dispatch a trigger with its scaled `[0, 1]` value. A trigger may
    /// simultaneously carry a control/continuous mapping and one or more
    /// parameter mappings — both are resolved, but `Dispatch` only carries
    /// one variant, so control/continuous takes priority (it is the
    /// discrete, one-shot path) and parameters are folded in whenever
    /// present instead, matching how `setMidiParameterMappings` coexists
    /// with `setMidiMappings` in the control surface (§6).
    pub fn dispatch(&self, trigger: MidiTrigger, normalized_value: f32) -> Dispatch {
        if let Some(mappings) = self.parameters_for(trigger) {
            if !mappings.is_empty() {
                return Dispatch::Parameters(
                    mappings
                        .iter()
                        .map(|m| (m.path.clone(), m.scale(normalized_value)))
                        .collect(),
                );
            }
        }
        match self.control_for(trigger) {
            Some(MappingTarget::Control(c)) => Dispatch::Control(*c),
            Some(MappingTarget::Continuous(c)) => Dispatch::Continuous(*c, normalized_value),
            None => Dispatch::Unmapped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vamp_core::ids::TrackId;
    use vamp_core::score::EffectTarget;

    fn trigger() -> MidiTrigger {
        MidiTrigger::Cc { channel: 0, controller: 11 }
    }

    #[test]
    fn unmapped_trigger_dispatches_to_unmapped() {
        let table = RoutingTable::new();
        assert!(matches!(table.dispatch(trigger(), 0.5), Dispatch::Unmapped));
    }

    #[test]
    fn mapped_control_dispatches_as_control() {
        let mut table = RoutingTable::new();
        table.map_control(trigger(), MappableControl::PlayPause);
        assert!(matches!(
            table.dispatch(trigger(), 1.0),
            Dispatch::Control(MappableControl::PlayPause)
        ));
    }

    #[test]
    fn parameter_mapping_scales_into_range() {
        let mut table = RoutingTable::new();
        let path = EffectPath {
            track_id: TrackId(1),
            target: EffectTarget::Effect(0),
            parameter_address: "cutoff".into(),
        };
        table.add_parameter_mapping(
            trigger(),
            ParameterMapping {
                path: path.clone(),
                min: 0.2,
                max: 0.8,
            },
        );
        let dispatch = table.dispatch(trigger(), 64.0 / 127.0);
        match dispatch {
            Dispatch::Parameters(values) => {
                assert_eq!(values.len(), 1);
                assert!((values[0].1 - (0.2 + (64.0 / 127.0) * 0.6)).abs() < 1e-5);
            }
            other => panic!("expected Parameters, got {other:?}"),
        }
    }

    #[test]
    fn parameter_mapping_takes_priority_over_control() {
        let mut table = RoutingTable::new();
        table.map_control(trigger(), MappableControl::Stop);
        table.add_parameter_mapping(
            trigger(),
            ParameterMapping {
                path: EffectPath {
                    track_id: TrackId(1),
                    target: EffectTarget::Instrument,
                    parameter_address: "gain".into(),
                },
                min: 0.0,
                max: 1.0,
            },
        );
        assert!(matches!(table.dispatch(trigger(), 0.5), Dispatch::Parameters(_)));
    }

    #[test]
    fn remove_mapping_clears_both_tables() {
        let mut table = RoutingTable::new();
        table.map_control(trigger(), MappableControl::Stop);
        table.remove_mapping(trigger());
        assert!(matches!(table.dispatch(trigger(), 0.0), Dispatch::Unmapped));
    }
}
