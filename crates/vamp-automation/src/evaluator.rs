//! Sample-accurate breakpoint evaluation: for each active lane, walks the
//! breakpoints the callback's bar range crosses and emits one
//! `setParameter` per segment boundary, the same way the scheduler emits
//! one fade-gain update per sample rather than one per callback.

use tracing::trace;
use vamp_core::score::{AutomationLane, Container, EffectTarget, Song};
use vamp_core::scheduler::{ActionSink, AutomationHook};

pub struct AutomationEvaluator;

impl AutomationEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// Evaluate every lane on `container` against `[callback_start_bar,
    /// callback_end_bar)`. `bar_to_sample_offset` converts an absolute bar
    /// position that falls inside this callback into the sample offset the
    /// sink should stamp the update with.
    pub fn evaluate_container(
        &self,
        song: &Song,
        container: &Container,
        callback_start_bar: f64,
        callback_end_bar: f64,
        bar_to_sample_offset: &dyn Fn(f64) -> usize,
        sink: &mut dyn ActionSink,
    ) {
        for lane in &container.automation_lanes {
            if !path_resolves(song, lane) {
                trace!(lane = ?lane.id, "automation lane target unresolved, skipping");
                continue;
            }
            evaluate_lane(lane, callback_start_bar, callback_end_bar, bar_to_sample_offset, sink);
        }
    }
}

impl Default for AutomationEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl AutomationHook for AutomationEvaluator {
    fn evaluate(
        &mut self,
        song: &Song,
        container: &Container,
        callback_start_bar: f64,
        callback_end_bar: f64,
        bar_to_sample_offset: &dyn Fn(f64) -> usize,
        sink: &mut dyn ActionSink,
    ) {
        AutomationEvaluator::evaluate_container(
            self,
            song,
            container,
            callback_start_bar,
            callback_end_bar,
            bar_to_sample_offset,
            sink,
        );
    }
}

fn path_resolves(song: &Song, lane: &AutomationLane) -> bool {
    let Some(track) = song.track(lane.target.track_id) else {
        return false;
    };
    match lane.target.target {
        EffectTarget::Instrument => track.instrument_handle.is_some(),
        EffectTarget::Effect(idx) => track.effect_chain.get(idx).is_some_and(|e| e.handle.is_some()),
    }
}

fn evaluate_lane(
    lane: &AutomationLane,
    start: f64,
    end: f64,
    bar_to_sample_offset: &dyn Fn(f64) -> usize,
    sink: &mut dyn ActionSink,
) {
    if lane.breakpoints.is_empty() || end <= start {
        return;
    }

    let mut boundaries: Vec<f64> = lane
        .breakpoints
        .iter()
        .map(|bp| bp.position_bars)
        .filter(|&bar| bar > start && bar < end)
        .collect();
    boundaries.push(end);
    boundaries.sort_by(|a, b| a.partial_cmp(b).unwrap());
    boundaries.dedup_by(|a, b| (*a - *b).abs() < 1e-9);

    for bar in boundaries {
        let value = value_at(lane, bar);
        let offset = bar_to_sample_offset(bar);
        sink.set_parameter(&lane.target, value, offset);
    }
}

/// Value at an absolute bar position, holding at the first/last breakpoint
/// outside the lane's span. Each breakpoint's curve shapes the segment that
/// leaves it, heading toward the next breakpoint.
pub fn value_at(lane: &AutomationLane, position_bars: f64) -> f32 {
    let bps = &lane.breakpoints;
    let Some(first) = bps.first() else {
        return 0.0;
    };
    if position_bars <= first.position_bars {
        return first.value;
    }
    let last = bps.last().unwrap();
    if position_bars >= last.position_bars {
        return last.value;
    }
    for segment in bps.windows(2) {
        let (a, b) = (&segment[0], &segment[1]);
        if position_bars >= a.position_bars && position_bars <= b.position_bars {
            let span = b.position_bars - a.position_bars;
            let t = if span > 0.0 {
                ((position_bars - a.position_bars) / span) as f32
            } else {
                1.0
            };
            return a.curve.interpolate(a.value, b.value, t);
        }
    }
    last.value
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use vamp_core::ids::{AutomationLaneId, ContainerId, TrackId};
    use vamp_core::score::{
        AudioDeviceSettings, AutomationBreakpoint, Container, ContainerPayload, CurveType, EffectNode,
        EffectPath, LoopPolicy, MetronomeConfig, MidiInputFilter, MixParams, OverridableField, Project,
        Song, Track, TrackKind,
    };
    use vamp_core::time::TimeSignature;

    fn lane(breakpoints: Vec<AutomationBreakpoint>) -> AutomationLane {
        AutomationLane {
            id: AutomationLaneId(1),
            target: EffectPath {
                track_id: TrackId(1),
                target: EffectTarget::Effect(0),
                parameter_address: "cutoff".into(),
            },
            breakpoints,
        }
    }

    fn song_with_resolvable_track() -> Song {
        Song {
            name: "song".into(),
            signature: TimeSignature::new(4, 4).unwrap(),
            tempo_bpm: 120.0,
            count_in_bars: 0,
            metronome: MetronomeConfig::default(),
            sections: Vec::new(),
            tracks: vec![Track {
                id: TrackId(1),
                kind: TrackKind::Audio,
                name: "t".into(),
                mix: MixParams::default(),
                record_armed: false,
                mute: false,
                solo: false,
                effect_chain: vec![EffectNode {
                    plugin_identifier: "gain".into(),
                    bypass: false,
                    handle: Some(1),
                }],
                midi_input_filter: MidiInputFilter::any(),
                containers: Vec::new(),
                crossfades: Vec::new(),
                instrument_handle: None,
            }],
        }
    }

    fn container_with(lanes: Vec<AutomationLane>) -> Container {
        Container {
            id: ContainerId(1),
            track_id: TrackId(1),
            start_bar: 0.0,
            length_bars: 8.0,
            payload: ContainerPayload::Empty,
            enter_fade: None,
            exit_fade: None,
            loop_policy: LoopPolicy::None,
            record_armed: false,
            is_clone: false,
            source_container_id: None,
            overridden_fields: Vec::<OverridableField>::new(),
            on_enter_actions: Vec::new(),
            on_exit_actions: Vec::new(),
            automation_lanes: lanes,
        }
    }

    #[test]
    fn linear_ramp_interpolates_midpoint() {
        let lane = lane(vec![
            AutomationBreakpoint {
                position_bars: 0.0,
                value: 0.0,
                curve: CurveType::Linear,
            },
            AutomationBreakpoint {
                position_bars: 4.0,
                value: 1.0,
                curve: CurveType::Linear,
            },
        ]);
        assert_relative_eq!(value_at(&lane, 2.0), 0.5, epsilon = 1e-5);
    }

    #[test]
    fn position_before_first_breakpoint_holds_first_value() {
        let lane = lane(vec![AutomationBreakpoint {
            position_bars: 4.0,
            value: 0.3,
            curve: CurveType::Linear,
        }]);
        assert_relative_eq!(value_at(&lane, 0.0), 0.3);
    }

    #[test]
    fn position_after_last_breakpoint_holds_last_value() {
        let lane = lane(vec![
            AutomationBreakpoint {
                position_bars: 0.0,
                value: 0.0,
                curve: CurveType::Linear,
            },
            AutomationBreakpoint {
                position_bars: 4.0,
                value: 0.9,
                curve: CurveType::Linear,
            },
        ]);
        assert_relative_eq!(value_at(&lane, 100.0), 0.9);
    }

    #[derive(Default)]
    struct RecordingSink {
        calls: Vec<(String, f32, usize)>,
    }

    impl ActionSink for RecordingSink {
        fn send_midi(
            &mut self,
            _destination: &vamp_core::score::MidiDestination,
            _channel: u8,
            _sample_offset: usize,
            _message: vamp_core::score::MidiMessageKind,
        ) {
        }

        fn trigger_container(
            &mut self,
            _target: ContainerId,
            _action: vamp_core::score::TriggerAction,
            _sample_offset: usize,
        ) {
        }

        fn set_parameter(&mut self, path: &EffectPath, value: f32, sample_offset: usize) {
            self.calls.push((path.parameter_address.clone(), value, sample_offset));
        }

        fn all_notes_off(&mut self, _sample_offset: usize) {}
    }

    #[test]
    fn emits_one_update_per_breakpoint_crossed_in_callback() {
        let song = song_with_resolvable_track();
        let container = container_with(vec![lane(vec![
            AutomationBreakpoint {
                position_bars: 0.0,
                value: 0.0,
                curve: CurveType::Linear,
            },
            AutomationBreakpoint {
                position_bars: 1.0,
                value: 1.0,
                curve: CurveType::Linear,
            },
            AutomationBreakpoint {
                position_bars: 2.0,
                value: 0.0,
                curve: CurveType::Linear,
            },
        ])]);

        let mut sink = RecordingSink::default();
        let evaluator = AutomationEvaluator::new();
        evaluator.evaluate_container(&song, &container, 0.5, 2.5, &|bar| (bar * 100.0) as usize, &mut sink);

        // Breakpoint at 1.0 falls inside (0.5, 2.5), plus the callback end at 2.5.
        assert_eq!(sink.calls.len(), 2);
        assert_eq!(sink.calls[0].2, 100);
        assert_relative_eq!(sink.calls[0].1, 1.0, epsilon = 1e-5);
        assert_eq!(sink.calls[1].2, 250);
    }

    #[test]
    fn unresolved_effect_slot_is_silently_skipped() {
        let mut song = song_with_resolvable_track();
        song.tracks[0].effect_chain.clear();
        let container = container_with(vec![lane(vec![
            AutomationBreakpoint {
                position_bars: 0.0,
                value: 0.0,
                curve: CurveType::Linear,
            },
            AutomationBreakpoint {
                position_bars: 2.0,
                value: 1.0,
                curve: CurveType::Linear,
            },
        ])]);

        let mut sink = RecordingSink::default();
        AutomationEvaluator::new().evaluate_container(&song, &container, 0.0, 1.0, &|bar| bar as usize, &mut sink);
        assert!(sink.calls.is_empty());
    }

    #[test]
    fn unresolved_track_is_silently_skipped() {
        let project = Project {
            songs: vec![song_with_resolvable_track()],
            current_song: 0,
            source_recordings: Vec::new(),
            audio_device: AudioDeviceSettings {
                sample_rate: 48_000,
                channels: 2,
                input_device_name: None,
                output_device_name: None,
            },
        };
        let song = project.current_song().unwrap();
        let mut lane_no_track = lane(vec![AutomationBreakpoint {
            position_bars: 0.0,
            value: 0.5,
            curve: CurveType::Linear,
        }]);
        lane_no_track.target.track_id = TrackId(99);
        let container = container_with(vec![lane_no_track]);

        let mut sink = RecordingSink::default();
        AutomationEvaluator::new().evaluate_container(song, &container, 0.0, 1.0, &|bar| bar as usize, &mut sink);
        assert!(sink.calls.is_empty());
    }
}
