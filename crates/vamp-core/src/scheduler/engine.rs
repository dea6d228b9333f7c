//! Playback Scheduler: the per-callback mixer. Selects active containers,
//! reads audio/MIDI, applies fades/crossfades/automation, sums into track
//! buses, runs effect chains through the plugin host, and mixes to master.

use crate::audio_source::AudioSource;
use crate::events::EngineEvent;
use crate::ids::{ContainerId, TrackId};
use crate::plugin_host::{HostMidiEvent, HostMidiKind, PluginHandle, PluginHost};
use crate::queue::{CommandReceiver, RtCommand};
use crate::score::{
    Container, ContainerPayload, CurveType, MidiMessageKind, Project, Song, SnapshotHandle, Track,
    TrackKind,
};
use crate::scheduler::buffers::ScratchBuffers;
use crate::scheduler::dispatcher::{ActionDispatcher, ActionSink, AutomationHook, BarCrossing, CrossingKind};
use crate::scheduler::mixer::{add_scaled, apply_gain_pan};
use crate::time::TimeMap;
use crate::transport::{MetronomeState, TransportEvent, TransportManager, TransportState};
use crossbeam_channel::Sender;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

pub struct PlaybackScheduler {
    snapshot: SnapshotHandle,
    transport: Arc<TransportManager>,
    metronome: Arc<MetronomeState>,
    receiver: CommandReceiver,
    plugin_host: Arc<dyn PluginHost>,
    audio_source: Arc<dyn AudioSource>,
    action_sink: Box<dyn ActionSink + Send>,
    automation: Box<dyn AutomationHook>,
    events: Sender<EngineEvent>,
    dispatcher: ActionDispatcher,
    buffers: ScratchBuffers,
    sample_rate: f64,
    channels: usize,
    count_in_elapsed_samples: u64,
    last_click_beat: i64,
    click_phase: usize,
    click_gain_now: f32,
    crossing_scratch: Vec<BarCrossing>,
    midi_scratch: Vec<HostMidiEvent>,
    plugin_failures: HashMap<u64, u32>,
    /// Containers already reported missing a source recording this
    /// transport run; cleared on transport start/stop so a later run
    /// re-reports (§6 "once per container per transport run").
    missing_recording_reported: HashSet<ContainerId>,
}

/// Maximum consecutive process() failures before a plugin slot is
/// permanently bypassed and reported as fatal-to-slot (§7).
const MAX_PLUGIN_FAILURES: u32 = 8;

/// Length of the decaying click transient. Short enough to never overlap
/// the next beat at any sane tempo.
const CLICK_DURATION_SECS: f64 = 0.03;

impl PlaybackScheduler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        snapshot: SnapshotHandle,
        transport: Arc<TransportManager>,
        metronome: Arc<MetronomeState>,
        receiver: CommandReceiver,
        plugin_host: Arc<dyn PluginHost>,
        audio_source: Arc<dyn AudioSource>,
        action_sink: Box<dyn ActionSink + Send>,
        automation: Box<dyn AutomationHook>,
        events: Sender<EngineEvent>,
        sample_rate: f64,
        channels: usize,
        max_frames: usize,
    ) -> Self {
        Self {
            snapshot,
            transport,
            metronome,
            receiver,
            plugin_host,
            audio_source,
            action_sink,
            automation,
            events,
            dispatcher: ActionDispatcher::new(),
            buffers: ScratchBuffers::new(channels, max_frames),
            sample_rate,
            channels,
            count_in_elapsed_samples: 0,
            last_click_beat: -1,
            click_phase: 0,
            click_gain_now: 0.0,
            crossing_scratch: Vec::with_capacity(32),
            midi_scratch: Vec::with_capacity(64),
            plugin_failures: HashMap::new(),
            missing_recording_reported: HashSet::new(),
        }
    }

    /// Render `frames` of interleaved audio into `out`. Called once per
    /// audio callback from the driver's RT thread.
    pub fn process(&mut self, frames: usize, out: &mut [f32]) {
        let outcome = self.receiver.drain_into_commands(
            &self.transport,
            &self.snapshot,
            self.sample_rate,
            self.action_sink.as_mut(),
        );
        if outcome.reset_missing_recording {
            self.missing_recording_reported.clear();
        }
        if outcome.all_notes_off {
            self.action_sink.all_notes_off(0);
        }

        let snapshot = self.snapshot.load();
        let Some(song) = snapshot.current_song() else {
            out.fill(0.0);
            return;
        };

        let time_map = TimeMap::new(self.sample_rate, song.tempo_bpm, song.signature);
        self.buffers.ensure_tracks(song.tracks.len());
        self.buffers.clear(frames);
        self.crossing_scratch.clear();

        match self.transport.state() {
            TransportState::Stopped | TransportState::Paused => {
                out[..frames * self.channels].fill(0.0);
                return;
            }
            TransportState::CountIn { .. } => {
                let beats_per_bar = song.signature.beats_per_bar as u32;
                let click_start = self.count_in_elapsed_samples;
                self.advance_count_in(frames, &time_map, beats_per_bar);
                out[..frames * self.channels].fill(0.0);
                self.render_metronome_click(frames, &time_map, beats_per_bar, click_start, out);
                return;
            }
            TransportState::Playing => {}
        }

        let t0 = self.transport.rt_sample_position();
        let bar_lo = time_map.bar_at(t0);
        let bar_hi = time_map.bar_at(t0 + frames as u64);

        for (index, track) in song.tracks.iter().enumerate() {
            if track.kind == TrackKind::Master {
                continue;
            }
            self.render_track(song, track, index, frames, bar_lo, bar_hi, &time_map);
        }

        if let Some(master) = song.master_track() {
            self.mix_sends_into_master(song, frames);
            self.run_plugin_chain_master(master, frames);
        }

        let out_len = frames * self.channels;
        out[..out_len].copy_from_slice(&self.buffers.master_bus[..out_len]);
        self.render_metronome_click(frames, &time_map, song.signature.beats_per_bar as u32, t0, out);

        self.transport.advance(frames as u64, &time_map);
        let bar_now = time_map.bar_at(self.transport.rt_sample_position());
        if let Some(wrap_bar) = self.transport.loop_wrap_target(bar_now) {
            let wrap_samples = time_map.samples_at_bar(wrap_bar).round().max(0.0) as u64;
            self.transport.seek_samples(wrap_samples);
            self.action_sink.all_notes_off(frames.saturating_sub(1));
        }

        let dispatcher = std::mem::replace(&mut self.dispatcher, ActionDispatcher::new());
        let crossings = std::mem::take(&mut self.crossing_scratch);
        dispatcher.dispatch(
            &crossings,
            |container_id, kind| find_container_actions(song, container_id, kind),
            self.action_sink.as_mut(),
            &self.events,
        );
        self.dispatcher = dispatcher;
        self.crossing_scratch = crossings;
    }

    fn advance_count_in(&mut self, frames: usize, time_map: &TimeMap, _beats_per_bar: u32) {
        self.count_in_elapsed_samples += frames as u64;
        let elapsed_bars = self.count_in_elapsed_samples as f64 / time_map.samples_per_bar();
        if elapsed_bars >= 1.0 {
            self.count_in_elapsed_samples = 0;
            self.transport.apply(TransportEvent::BarElapsed);
            if matches!(self.transport.state(), TransportState::Playing) {
                self.transport.seek_samples(0);
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn render_track(
        &mut self,
        song: &Song,
        track: &Track,
        index: usize,
        frames: usize,
        bar_lo: f64,
        bar_hi: f64,
        time_map: &TimeMap,
    ) {
        self.midi_scratch.clear();

        for container in &track.containers {
            if !container.intersects_bars(bar_lo, bar_hi) {
                continue;
            }
            self.record_crossings(container, bar_lo, bar_hi);
            self.automation.evaluate(
                song,
                container,
                bar_lo,
                bar_hi,
                &|bar| bar_to_offset(bar, bar_lo, time_map, frames),
                self.action_sink.as_mut(),
            );
            match &container.payload {
                ContainerPayload::Audio {
                    recording_ref,
                    audio_start_offset_bars,
                    gain,
                } => {
                    self.mix_audio_container(
                        track,
                        index,
                        container,
                        *recording_ref,
                        *audio_start_offset_bars,
                        *gain,
                        frames,
                        bar_lo,
                        time_map,
                    );
                }
                ContainerPayload::Midi { sequence } => {
                    self.collect_midi_events(container, sequence, bar_lo, bar_hi, time_map, frames);
                }
                ContainerPayload::Empty => {}
            }
        }

        let midi_events = std::mem::take(&mut self.midi_scratch);
        self.run_plugin_chain(track, index, frames, &midi_events);
        self.midi_scratch = midi_events;

        let bus = self.buffers.track_bus(index);
        apply_gain_pan(&mut bus[..frames * self.channels], self.channels, track.mix.gain, track.mix.pan);

        for send in &track.mix.sends {
            if let Some(target_index) = song.tracks.iter().position(|t| t.id == send.target_track) {
                let (amount, len) = (send.amount, frames * self.channels);
                let src: Vec<f32> = self.buffers.track_bus(index)[..len].to_vec();
                add_scaled(&mut self.buffers.track_bus(target_index)[..len], &src, amount);
            }
        }
    }

    fn mix_sends_into_master(&mut self, song: &Song, frames: usize) {
        let len = frames * self.channels;
        for track in &song.tracks {
            if track.kind == TrackKind::Master {
                continue;
            }
            let Some(index) = song.tracks.iter().position(|t| t.id == track.id) else {
                continue;
            };
            let src: Vec<f32> = self.buffers.track_bus(index)[..len].to_vec();
            add_scaled(&mut self.buffers.master_bus[..len], &src, 1.0);
        }
    }

    /// Synthesize metronome clicks for whichever beat boundaries
    /// `[sample_pos_start, sample_pos_start + frames)` crosses, added
    /// directly into the callback's output (not the master bus, so the
    /// click is monitor-only and never lands in a recording or export).
    fn render_metronome_click(
        &mut self,
        frames: usize,
        time_map: &TimeMap,
        beats_per_bar: u32,
        sample_pos_start: u64,
        out: &mut [f32],
    ) {
        if beats_per_bar == 0 {
            return;
        }
        let samples_per_beat = time_map.samples_per_bar() / beats_per_bar as f64;
        if samples_per_beat <= 0.0 {
            return;
        }
        let click_length = ((self.sample_rate * CLICK_DURATION_SECS) as usize).max(1);

        for i in 0..frames {
            let sample_pos = sample_pos_start + i as u64;
            let beat_index = (sample_pos as f64 / samples_per_beat).floor() as i64;
            if beat_index != self.last_click_beat {
                self.last_click_beat = beat_index;
                let beat_in_bar = beat_index.rem_euclid(beats_per_bar as i64) as u32;
                self.click_gain_now = self.metronome.click_gain(beat_in_bar);
                self.click_phase = 0;
            }
            if self.click_gain_now > 0.0 && self.click_phase < click_length {
                let t = self.click_phase as f32 / click_length as f32;
                let envelope = (1.0 - t) * (1.0 - t);
                let sample = self.click_gain_now * envelope;
                for ch in 0..self.channels {
                    out[i * self.channels + ch] += sample;
                }
                self.click_phase += 1;
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn mix_audio_container(
        &mut self,
        track: &Track,
        index: usize,
        container: &Container,
        recording_ref: crate::ids::SourceRecordingId,
        audio_start_offset_bars: f64,
        gain: f32,
        frames: usize,
        bar_lo: f64,
        time_map: &TimeMap,
    ) {
        let offset_bars = bar_lo - container.start_bar + audio_start_offset_bars;
        let offset_samples = (offset_bars * time_map.samples_per_bar()).max(0.0) as u64;

        let len = frames * self.channels;
        {
            let scratch = &mut self.buffers.container_scratch()[..len];
            let read = self
                .audio_source
                .read(recording_ref, offset_samples, self.channels as u16, scratch);
            if read == 0 && self.missing_recording_reported.insert(container.id) {
                let _ = self.events.try_send(EngineEvent::MissingSourceRecording {
                    container: container.id,
                });
            }
        }

        for i in 0..frames {
            let bar_here = time_map.bar_at(
                self.transport.rt_sample_position() + i as u64,
            );
            let fade = fade_gain(container, bar_here);
            let cross = crossfade_or_tiebreak_weight(track, container, bar_here);
            let sample_gain = gain * fade * cross;
            for ch in 0..self.channels {
                let pos = i * self.channels + ch;
                self.buffers.container_scratch()[pos] *= sample_gain;
            }
        }

        let src: Vec<f32> = self.buffers.container_scratch()[..len].to_vec();
        add_scaled(&mut self.buffers.track_bus(index)[..len], &src, 1.0);
    }

    fn collect_midi_events(
        &mut self,
        container: &Container,
        sequence: &crate::score::MidiSequence,
        bar_lo: f64,
        bar_hi: f64,
        time_map: &TimeMap,
        frames: usize,
    ) {
        let beats_per_bar = time_map.signature().beats_per_bar as f64;
        for note in &sequence.notes {
            let start_bar = container.start_bar + note.start_beat / beats_per_bar;
            let end_bar = container.start_bar + (note.start_beat + note.duration_beats) / beats_per_bar;

            if start_bar >= bar_lo && start_bar < bar_hi {
                let offset = bar_to_offset(start_bar, bar_lo, time_map, frames);
                self.midi_scratch.push(HostMidiEvent {
                    sample_offset: offset,
                    channel: note.channel,
                    kind: HostMidiKind::NoteOn {
                        note: note.pitch,
                        velocity: note.velocity,
                    },
                });
            }
            if end_bar >= bar_lo && end_bar < bar_hi {
                let offset = bar_to_offset(end_bar, bar_lo, time_map, frames);
                self.midi_scratch.push(HostMidiEvent {
                    sample_offset: offset,
                    channel: note.channel,
                    kind: HostMidiKind::NoteOff {
                        note: note.pitch,
                        velocity: 0,
                    },
                });
            }
        }
    }

    fn record_crossings(&mut self, container: &Container, bar_lo: f64, bar_hi: f64) {
        if container.start_bar >= bar_lo && container.start_bar < bar_hi {
            self.crossing_scratch.push(BarCrossing {
                container_id: container.id,
                sample_offset: 0,
                kind: CrossingKind::Enter,
            });
        }
        let end_bar = container.end_bar();
        if end_bar >= bar_lo && end_bar < bar_hi {
            self.crossing_scratch.push(BarCrossing {
                container_id: container.id,
                sample_offset: 0,
                kind: CrossingKind::Exit,
            });
        }
    }

    fn run_plugin_chain(
        &mut self,
        track: &Track,
        index: usize,
        frames: usize,
        midi_events: &[HostMidiEvent],
    ) {
        let channels = self.channels;
        let len = frames * channels;

        if let Some(raw_handle) = track.instrument_handle {
            let handle = PluginHandle(raw_handle);
            let input = vec![0.0f32; len];
            let in_bufs: Vec<&[f32]> = (0..channels).map(|_| input.as_slice()).collect();
            let mut scratch = vec![0.0f32; len];
            let result = {
                let mut out_bufs: Vec<&mut [f32]> = vec![&mut scratch];
                self.plugin_host
                    .process(handle, &in_bufs, &mut out_bufs, midi_events, &[], false)
            };
            self.note_plugin_result(track.id, raw_handle, result);
            add_scaled(&mut self.buffers.track_bus(index)[..len], &scratch, 1.0);
        }

        for effect in &track.effect_chain {
            let Some(raw_handle) = effect.handle else { continue };
            let handle = PluginHandle(raw_handle);
            let bus_copy: Vec<f32> = self.buffers.track_bus(index)[..len].to_vec();
            let mut out = vec![0.0f32; len];
            let result = {
                let in_bufs: Vec<&[f32]> = vec![&bus_copy];
                let mut out_bufs: Vec<&mut [f32]> = vec![&mut out];
                self.plugin_host
                    .process(handle, &in_bufs, &mut out_bufs, &[], &[], effect.bypass)
            };
            self.note_plugin_result(track.id, raw_handle, result);
            self.buffers.track_bus(index)[..len].copy_from_slice(&out);
        }
    }

    /// Same shape as [`Self::run_plugin_chain`] but targets the master bus
    /// directly rather than an indexed track bus, since the master channel
    /// isn't addressed through [`ScratchBuffers::track_bus`].
    fn run_plugin_chain_master(&mut self, master: &Track, frames: usize) {
        let channels = self.channels;
        let len = frames * channels;

        if let Some(raw_handle) = master.instrument_handle {
            let handle = PluginHandle(raw_handle);
            let input = vec![0.0f32; len];
            let in_bufs: Vec<&[f32]> = (0..channels).map(|_| input.as_slice()).collect();
            let mut scratch = vec![0.0f32; len];
            let result = {
                let mut out_bufs: Vec<&mut [f32]> = vec![&mut scratch];
                self.plugin_host
                    .process(handle, &in_bufs, &mut out_bufs, &[], &[], false)
            };
            self.note_plugin_result(master.id, raw_handle, result);
            add_scaled(&mut self.buffers.master_bus[..len], &scratch, 1.0);
        }

        for effect in &master.effect_chain {
            let Some(raw_handle) = effect.handle else { continue };
            let handle = PluginHandle(raw_handle);
            let bus_copy: Vec<f32> = self.buffers.master_bus[..len].to_vec();
            let mut out = vec![0.0f32; len];
            let result = {
                let in_bufs: Vec<&[f32]> = vec![&bus_copy];
                let mut out_bufs: Vec<&mut [f32]> = vec![&mut out];
                self.plugin_host
                    .process(handle, &in_bufs, &mut out_bufs, &[], &[], effect.bypass)
            };
            self.note_plugin_result(master.id, raw_handle, result);
            self.buffers.master_bus[..len].copy_from_slice(&out);
        }
    }

    fn note_plugin_result(&mut self, track_id: TrackId, raw_handle: u64, result: crate::error::Result<()>) {
        match result {
            Ok(()) => {
                self.plugin_failures.remove(&raw_handle);
            }
            Err(err) => {
                let count = self.plugin_failures.entry(raw_handle).or_insert(0);
                *count += 1;
                let _ = self.events.try_send(EngineEvent::PluginProcessFailure {
                    track: track_id,
                    message: err.to_string(),
                });
                if *count >= MAX_PLUGIN_FAILURES {
                    let _ = self
                        .events
                        .try_send(EngineEvent::PluginSlotBypassedPermanently { track: track_id });
                }
            }
        }
    }
}

fn fade_gain(container: &Container, bar_here: f64) -> f32 {
    let mut gain = 1.0f32;
    if let Some(fade) = container.enter_fade {
        let fade_end = container.start_bar + fade.duration_bars;
        if bar_here < fade_end && fade.duration_bars > 0.0 {
            let t = ((bar_here - container.start_bar) / fade.duration_bars) as f32;
            gain *= fade.curve.interpolate(0.0, 1.0, t);
        }
    }
    if let Some(fade) = container.exit_fade {
        let fade_start = container.end_bar() - fade.duration_bars;
        if bar_here > fade_start && fade.duration_bars > 0.0 {
            let t = ((bar_here - fade_start) / fade.duration_bars) as f32;
            gain *= fade.curve.interpolate(1.0, 0.0, t);
        }
    }
    gain
}

/// Weight applied to a container's samples where it overlaps a sibling on
/// the same track. With a `Crossfade` record joining the two, both sides
/// are mixed with the specified curve across the overlap. Without one
/// (§4.3 tie-break), the later-starting container takes over at its
/// startBar and the earlier one goes silent from that point on, even
/// though its own bar range hasn't ended yet.
fn crossfade_or_tiebreak_weight(track: &Track, container: &Container, bar_here: f64) -> f32 {
    let is_active_at = |c: &Container| c.start_bar <= bar_here && bar_here < c.end_bar();

    for other in &track.containers {
        if other.id == container.id || !is_active_at(other) {
            continue;
        }

        if let Some(cf) = track
            .crossfades
            .iter()
            .find(|cf| cf.involves(container.id) && cf.involves(other.id))
        {
            let lo = container.start_bar.max(other.start_bar);
            let hi = container.end_bar().min(other.end_bar());
            if hi <= lo {
                continue;
            }
            let u = ((bar_here - lo) / (hi - lo)).clamp(0.0, 1.0) as f32;
            return if cf.container_a == container.id {
                cf.curve.interpolate(1.0, 0.0, u)
            } else {
                cf.curve.interpolate(0.0, 1.0, u)
            };
        }

        let other_is_later = other.start_bar > container.start_bar
            || (other.start_bar == container.start_bar && other.id.raw() > container.id.raw());
        if other_is_later {
            return 0.0;
        }
    }

    1.0
}

fn bar_to_offset(bar: f64, bar_lo: f64, time_map: &TimeMap, frames: usize) -> usize {
    let offset = ((bar - bar_lo) * time_map.samples_per_bar()).round() as i64;
    offset.clamp(0, frames as i64 - 1) as usize
}

fn find_container_actions<'a>(
    song: &'a Song,
    container_id: ContainerId,
    kind: CrossingKind,
) -> Option<&'a [crate::score::ContainerAction]> {
    for track in &song.tracks {
        if let Some(container) = track.container(container_id) {
            return Some(match kind {
                CrossingKind::Enter => &container.on_enter_actions,
                CrossingKind::Exit => &container.on_exit_actions,
            });
        }
    }
    None
}

/// Action sink that discards every action, for headless operation or tests
/// that don't care about MIDI routing or automation — the scheduler still
/// needs *an* `ActionSink` to construct, the same way it needs a
/// `PluginHost`/`AudioSource` even when neither is exercised.
pub struct NullActionSink;

impl ActionSink for NullActionSink {
    fn send_midi(
        &mut self,
        _destination: &crate::score::MidiDestination,
        _channel: u8,
        _sample_offset: usize,
        _message: MidiMessageKind,
    ) {
    }

    fn trigger_container(
        &mut self,
        _target: ContainerId,
        _action: crate::score::TriggerAction,
        _sample_offset: usize,
    ) {
    }

    fn set_parameter(&mut self, _path: &crate::score::EffectPath, _value: f32, _sample_offset: usize) {}

    fn all_notes_off(&mut self, _sample_offset: usize) {}
}

/// Follow-up work `drain_into_commands` determined is needed but can't
/// safely perform itself, since it only has access to the `ActionSink` and
/// not the scheduler's own dedup state.
#[derive(Default)]
struct DrainOutcome {
    /// A command that changes where/whether playback continues landed this
    /// callback (stop, seek, loop change, shutdown): every in-flight MIDI
    /// note must be force-released before anything else renders (§4.3,
    /// §4.4, §5).
    all_notes_off: bool,
    /// Transport started or stopped a run: per-run dedup state (e.g.
    /// already-reported missing recordings) should reset.
    reset_missing_recording: bool,
}

trait CommandReceiverExt {
    fn drain_into_commands(
        &mut self,
        transport: &Arc<TransportManager>,
        snapshot: &SnapshotHandle,
        sample_rate: f64,
        action_sink: &mut dyn ActionSink,
    ) -> DrainOutcome;
}

impl CommandReceiverExt for CommandReceiver {
    fn drain_into_commands(
        &mut self,
        transport: &Arc<TransportManager>,
        snapshot: &SnapshotHandle,
        sample_rate: f64,
        action_sink: &mut dyn ActionSink,
    ) -> DrainOutcome {
        let mut outcome = DrainOutcome::default();
        self.drain(|command| match command {
            RtCommand::InstallSnapshot(project) => {
                // RT-safe: the control thread already built this `Arc`, so
                // installing it is a pointer swap with no allocation or
                // deep clone on this thread (§4.2).
                snapshot.install_arc(project);
            }
            RtCommand::StartTransport { .. } => {
                transport.apply(TransportEvent::Play);
                outcome.reset_missing_recording = true;
            }
            RtCommand::StopTransport => {
                transport.apply(TransportEvent::Stop);
                outcome.all_notes_off = true;
                outcome.reset_missing_recording = true;
            }
            RtCommand::PauseTransport => {
                transport.apply(TransportEvent::Pause);
            }
            RtCommand::ResumeTransport => {
                transport.apply(TransportEvent::Resume);
            }
            RtCommand::SeekTo { bar } => {
                // Seek is resolved against whatever snapshot is current
                // right now (§4.3 "seek while playing": flush ring state,
                // resume scheduling at the next callback boundary). The
                // per-track ring flush itself happens implicitly: the
                // scheduler recomputes every container's read offset from
                // `bar_lo` each callback, so there is no stale ring state
                // to carry over.
                if let Some(song) = snapshot.load().current_song() {
                    let time_map =
                        crate::time::TimeMap::new(sample_rate, song.tempo_bpm, song.signature);
                    let samples = time_map.samples_at_bar(bar).max(0.0).round() as u64;
                    transport.seek_samples(samples);
                }
                outcome.all_notes_off = true;
            }
            RtCommand::SetLoop { range } => {
                transport.set_loop(range);
                outcome.all_notes_off = true;
            }
            RtCommand::SetCountInBars { bars } => {
                transport.set_count_in_bars(bars);
            }
            RtCommand::ArmRecord { container, armed } => {
                let action = if armed {
                    crate::score::TriggerAction::ArmRecord
                } else {
                    crate::score::TriggerAction::DisarmRecord
                };
                action_sink.trigger_container(container, action, 0);
            }
            RtCommand::SetParameterImmediate { path, value } => {
                action_sink.set_parameter(&path, value, 0);
            }
            RtCommand::Shutdown => {
                transport.apply(TransportEvent::Shutdown);
                outcome.all_notes_off = true;
            }
        });
        outcome
    }
}
