//! Top-level engine that coordinates the score model, transport, playback
//! scheduler, recording manager, and MIDI fabric behind one control
//! surface, the way the teacher's `TuttiEngine` coordinates its
//! subsystems.

use crate::callback::{EngineCallback, ProjectCloneResolver};
use crate::config::EngineConfig;
use crate::controls::{ControlCommand, EngineActionSink, MidiControlBridge, MidiParameterBridge};
use crate::error::{Error, Result};
use crate::wav_source::WavFileAudioSource;
use crossbeam_channel::Receiver;
use std::sync::{Arc, Mutex as StdMutex};
use vamp_automation::AutomationEvaluator;
use vamp_core::audio_source::AudioSource;
use vamp_core::events::{event_channel, EngineEvent};
use vamp_core::ids::{AutomationLaneId, ContainerId, IdAllocator, MarkerId, TrackId};
use vamp_core::output::{AudioDriver, AudioCallback};
use vamp_core::plugin_host::PluginHost;
use vamp_core::queue::{command_queue, CommandSender, RtCommand};
use vamp_core::score::{
    validate_project, AudioDeviceSettings, AutomationBreakpoint, AutomationLane, Container, ContainerAction,
    ContainerPayload, Crossfade, CurveType, EffectPath, Fade, LoopPolicy, MetronomeConfig, MidiInputFilter,
    MixParams, Project, SectionRegion, SendParams, Song, SnapshotHandle, Track, TrackKind,
};
use vamp_core::transport::{MetronomeState, TransportHandle, TransportManager};
use vamp_midi::routing::{MappableControl, ParameterMapping};
use vamp_midi::trigger::MidiTrigger;
use vamp_midi::{learn::LearnTarget, monitor::LoggedMessage, MidiFabric};
use vamp_recording::{RecordingEvent, RecordingManager};

fn default_project(config: &EngineConfig, id_alloc: &IdAllocator) -> Result<Project> {
    let signature = config.time_signature()?;
    let master = Track {
        id: id_alloc.alloc_track(),
        kind: TrackKind::Master,
        name: "Master".into(),
        mix: MixParams::default(),
        record_armed: false,
        mute: false,
        solo: false,
        effect_chain: Vec::new(),
        midi_input_filter: MidiInputFilter::any(),
        containers: Vec::new(),
        crossfades: Vec::new(),
        instrument_handle: None,
    };
    let song = Song {
        name: "Untitled".into(),
        signature,
        tempo_bpm: config.initial_tempo_bpm,
        count_in_bars: config.count_in_bars,
        metronome: MetronomeConfig::default(),
        tracks: vec![master],
        sections: Vec::new(),
    };
    Ok(Project {
        songs: vec![song],
        current_song: 0,
        source_recordings: Vec::new(),
        audio_device: AudioDeviceSettings {
            sample_rate: config.sample_rate,
            channels: config.channels,
            input_device_name: config.input_device_name.clone(),
            output_device_name: config.output_device_name.clone(),
        },
    })
}

fn current_song_mut(project: &mut Project) -> Result<&mut Song> {
    let index = project.current_song;
    project
        .songs
        .get_mut(index)
        .ok_or_else(|| Error::Core(vamp_core::Error::InvalidEdit("no current song".into())))
}

fn find_track_mut<'a>(song: &'a mut Song, id: TrackId) -> Result<&'a mut Track> {
    song.tracks
        .iter_mut()
        .find(|t| t.id == id)
        .ok_or(Error::Core(vamp_core::Error::TrackNotFound(id)))
}

fn find_container_mut<'a>(song: &'a mut Song, id: ContainerId) -> Result<&'a mut Container> {
    song.tracks
        .iter_mut()
        .flat_map(|t| t.containers.iter_mut())
        .find(|c| c.id == id)
        .ok_or(Error::Core(vamp_core::Error::ContainerNotFound(id)))
}

/// Coordinates the score model, transport, playback scheduler, recording
/// manager, and MIDI fabric. Construction wires every RT-safe seam
/// (`ActionSink`, `AutomationHook`, `AudioSource`) before the audio driver
/// is ever started; `start_audio` hands the assembled scheduler to the
/// driver exactly once.
pub struct VampEngine {
    config: EngineConfig,
    id_alloc: Arc<IdAllocator>,
    project: Arc<parking_lot::Mutex<Project>>,
    snapshot: SnapshotHandle,
    command_sender: Arc<StdMutex<CommandSender>>,
    transport: TransportHandle,
    transport_manager: Arc<TransportManager>,
    scheduler: StdMutex<Option<Box<dyn AudioCallback>>>,
    audio_driver: StdMutex<Box<dyn AudioDriver>>,
    plugin_host: Arc<dyn PluginHost>,
    audio_source: Arc<WavFileAudioSource>,
    recording: Arc<RecordingManager>,
    recording_events: Receiver<RecordingEvent>,
    midi: Arc<parking_lot::Mutex<MidiFabric>>,
    controls_tx: crossbeam_channel::Sender<ControlCommand>,
    controls_rx: Receiver<ControlCommand>,
    engine_events: Receiver<EngineEvent>,
    engine_events_tx: crossbeam_channel::Sender<EngineEvent>,
}

impl VampEngine {
    /// Assembles every subsystem and opens the audio device, but does not
    /// start the callback — call [`VampEngine::start_audio`] once the host
    /// is ready to hear sound.
    pub fn new(
        config: EngineConfig,
        plugin_host: Arc<dyn PluginHost>,
        mut audio_driver: Box<dyn AudioDriver>,
        midi_driver: Box<dyn vamp_midi::driver::MidiDriver>,
    ) -> Result<Self> {
        let id_alloc = Arc::new(IdAllocator::new());
        let initial_project = default_project(&config, &id_alloc)?;
        let metronome_cfg = initial_project.songs[0].metronome;
        let snapshot = SnapshotHandle::new(initial_project.clone());
        let project = Arc::new(parking_lot::Mutex::new(initial_project));

        let (sender, receiver) = command_queue(config.command_queue_capacity);
        let command_sender = Arc::new(StdMutex::new(sender));

        let transport_manager = Arc::new(TransportManager::new(config.count_in_bars));
        let metronome_state = Arc::new(MetronomeState::new(
            metronome_cfg.enabled,
            metronome_cfg.volume,
            metronome_cfg.accent_first_beat,
        ));
        let transport = TransportHandle::new(
            Arc::clone(&transport_manager),
            Arc::clone(&metronome_state),
            Arc::clone(&command_sender),
        );

        let (engine_events_tx, engine_events) = event_channel(config.event_channel_capacity);
        let (controls_tx, controls_rx) = crossbeam_channel::bounded(256);

        let audio_source = Arc::new(WavFileAudioSource::new());

        let mut midi_fabric = MidiFabric::new(midi_driver);
        midi_fabric.set_control_sink(Box::new(MidiControlBridge::new(controls_tx.clone())));
        midi_fabric.set_container_sink(Box::new(MidiControlBridge::new(controls_tx.clone())));
        midi_fabric.set_parameter_sink(Box::new(MidiParameterBridge {
            host: Arc::clone(&plugin_host),
            snapshot: snapshot.clone(),
        }));
        let midi = Arc::new(parking_lot::Mutex::new(midi_fabric));

        let action_sink = Box::new(EngineActionSink {
            midi: Arc::clone(&midi),
            plugin_host: Arc::clone(&plugin_host),
            snapshot: snapshot.clone(),
            controls_tx: controls_tx.clone(),
        });
        let automation_hook = Box::new(AutomationEvaluator::new());

        let (recording_events_tx, recording_events) = crossbeam_channel::bounded(config.event_channel_capacity);
        let recording = Arc::new(RecordingManager::new(
            config.recording_output_dir.clone(),
            Arc::clone(&id_alloc),
            recording_events_tx,
        ));

        audio_driver.set_underrun_sink(Arc::clone(&transport_manager), engine_events_tx.clone());
        audio_driver.open_device(config.sample_rate, config.buffer_size)?;
        let latency = audio_driver.output_latency_in_samples();
        transport_manager.set_output_latency_samples(latency);

        let scheduler = vamp_core::scheduler::PlaybackScheduler::new(
            snapshot.clone(),
            Arc::clone(&transport_manager),
            Arc::clone(&metronome_state),
            receiver,
            Arc::clone(&plugin_host),
            Arc::clone(&audio_source) as Arc<dyn AudioSource>,
            action_sink,
            automation_hook,
            engine_events_tx.clone(),
            config.sample_rate as f64,
            config.channels as usize,
            config.buffer_size as usize,
        );

        let callback = EngineCallback::new(
            scheduler,
            Arc::clone(&recording),
            snapshot.clone(),
            Arc::clone(&transport_manager),
            config.sample_rate as f64,
            config.channels,
            Box::new(ProjectCloneResolver::new(Arc::clone(&project))),
        );

        Ok(Self {
            config,
            id_alloc,
            project,
            snapshot,
            command_sender,
            transport,
            transport_manager,
            scheduler: StdMutex::new(Some(Box::new(callback))),
            audio_driver: StdMutex::new(audio_driver),
            plugin_host,
            audio_source,
            recording,
            recording_events,
            midi,
            controls_tx,
            controls_rx,
            engine_events,
            engine_events_tx,
        })
    }

    /// Starts the audio callback; only ever succeeds once per engine
    /// instance, since the callback takes the scheduler out of its slot.
    pub fn start_audio(&self) -> Result<()> {
        let callback = self
            .scheduler
            .lock()
            .expect("scheduler mutex poisoned")
            .take()
            .ok_or_else(|| Error::Core(vamp_core::Error::InvalidEdit("audio already started".into())))?;
        self.audio_driver
            .lock()
            .expect("audio driver mutex poisoned")
            .start_callback(callback)?;
        Ok(())
    }

    pub fn stop_audio(&self) -> Result<()> {
        self.audio_driver.lock().expect("audio driver mutex poisoned").stop_callback()?;
        Ok(())
    }

    /// Renders one block directly, bypassing the audio driver entirely —
    /// for offline bounce-style hosts and for driving the engine
    /// deterministically in tests, since `NullAudioDriver` never calls
    /// back on its own. Only usable before [`VampEngine::start_audio`]
    /// has taken the callback.
    pub fn render_block(&self, input: &[f32], output: &mut [f32], frames: usize) -> Result<()> {
        let mut guard = self.scheduler.lock().expect("scheduler mutex poisoned");
        let callback = guard
            .as_mut()
            .ok_or_else(|| Error::Core(vamp_core::Error::InvalidEdit("audio already started".into())))?;
        callback.render(input, output, frames, self.config.channels as usize);
        Ok(())
    }

    fn send_rt(&self, command: RtCommand) -> Result<()> {
        let mut sender = self.command_sender.lock().expect("command sender poisoned");
        sender.send(command).map_err(|_| Error::Core(vamp_core::Error::QueueFull))
    }

    fn edit(&self, f: impl FnOnce(&mut Project) -> Result<()>) -> Result<()> {
        let mut project = self.project.lock();
        let mut candidate = project.clone();
        f(&mut candidate)?;
        validate_project(&candidate)?;
        *project = candidate.clone();
        self.send_rt(RtCommand::InstallSnapshot(Arc::new(candidate)))
    }

    // ---- Transport (§6) ----

    pub fn play(&self) {
        self.transport.clone().play();
    }

    pub fn stop(&self) {
        self.transport.clone().stop();
    }

    pub fn toggle_play_pause(&self) {
        if self.transport.is_playing() {
            self.transport.clone().pause();
        } else if self.transport.is_paused() {
            self.transport.clone().resume();
        } else {
            self.transport.clone().play();
        }
    }

    pub fn seek(&self, bar: f64) {
        self.transport.clone().seek(bar);
    }

    pub fn set_loop(&self, range: Option<(f64, f64)>) {
        self.transport.clone().set_loop(range);
    }

    pub fn set_count_in_bars(&self, bars: u32) -> Result<()> {
        self.transport.clone().set_count_in_bars(bars);
        self.edit(|project| {
            current_song_mut(project)?.count_in_bars = bars;
            Ok(())
        })
    }

    pub fn set_metronome_config(&self, config: MetronomeConfig) -> Result<()> {
        let metronome = self.transport.metronome();
        metronome.volume(config.volume).accent_first_beat(config.accent_first_beat);
        if config.enabled {
            self.transport.metronome().on();
        } else {
            self.transport.metronome().off();
        }
        self.edit(|project| {
            current_song_mut(project)?.metronome = config;
            Ok(())
        })
    }

    // ---- Score edits: tracks (§6) ----

    pub fn create_track(&self, kind: TrackKind, name: impl Into<String>) -> Result<TrackId> {
        let id = self.id_alloc.alloc_track();
        let name = name.into();
        self.edit(|project| {
            current_song_mut(project)?.tracks.push(Track {
                id,
                kind,
                name,
                mix: MixParams::default(),
                record_armed: false,
                mute: false,
                solo: false,
                effect_chain: Vec::new(),
                midi_input_filter: MidiInputFilter::any(),
                containers: Vec::new(),
                crossfades: Vec::new(),
                instrument_handle: None,
            });
            Ok(())
        })?;
        Ok(id)
    }

    pub fn delete_track(&self, id: TrackId) -> Result<()> {
        self.edit(|project| {
            let song = current_song_mut(project)?;
            let before = song.tracks.len();
            song.tracks.retain(|t| t.id != id);
            if song.tracks.len() == before {
                return Err(Error::Core(vamp_core::Error::TrackNotFound(id)));
            }
            Ok(())
        })
    }

    pub fn rename_track(&self, id: TrackId, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        self.edit(|project| {
            find_track_mut(current_song_mut(project)?, id)?.name = name;
            Ok(())
        })
    }

    pub fn move_track(&self, id: TrackId, to_index: usize) -> Result<()> {
        self.edit(|project| {
            let song = current_song_mut(project)?;
            let from = song
                .tracks
                .iter()
                .position(|t| t.id == id)
                .ok_or(Error::Core(vamp_core::Error::TrackNotFound(id)))?;
            let track = song.tracks.remove(from);
            let to_index = to_index.min(song.tracks.len());
            song.tracks.insert(to_index, track);
            Ok(())
        })
    }

    pub fn set_mix_params(&self, id: TrackId, gain: f32, pan: f32, sends: Vec<SendParams>) -> Result<()> {
        self.edit(|project| {
            let track = find_track_mut(current_song_mut(project)?, id)?;
            track.mix.gain = gain;
            track.mix.pan = pan;
            track.mix.sends = sends;
            Ok(())
        })
    }

    pub fn set_track_mute(&self, id: TrackId, mute: bool) -> Result<()> {
        self.edit(|project| {
            find_track_mut(current_song_mut(project)?, id)?.mute = mute;
            Ok(())
        })
    }

    pub fn set_track_solo(&self, id: TrackId, solo: bool) -> Result<()> {
        self.edit(|project| {
            find_track_mut(current_song_mut(project)?, id)?.solo = solo;
            Ok(())
        })
    }

    // ---- Score edits: containers (§6) ----

    #[allow(clippy::too_many_arguments)]
    pub fn create_container(
        &self,
        track_id: TrackId,
        start_bar: f64,
        length_bars: f64,
        payload: ContainerPayload,
    ) -> Result<ContainerId> {
        let id = self.id_alloc.alloc_container();
        self.edit(|project| {
            let track = find_track_mut(current_song_mut(project)?, track_id)?;
            track.containers.push(Container {
                id,
                track_id,
                start_bar,
                length_bars,
                payload,
                enter_fade: None,
                exit_fade: None,
                loop_policy: LoopPolicy::None,
                record_armed: false,
                is_clone: false,
                source_container_id: None,
                overridden_fields: Vec::new(),
                on_enter_actions: Vec::new(),
                on_exit_actions: Vec::new(),
                automation_lanes: Vec::new(),
            });
            Ok(())
        })?;
        Ok(id)
    }

    pub fn delete_container(&self, id: ContainerId) -> Result<()> {
        self.edit(|project| {
            let song = current_song_mut(project)?;
            let mut found = false;
            for track in &mut song.tracks {
                let before = track.containers.len();
                track.containers.retain(|c| c.id != id);
                found |= track.containers.len() != before;
                track.crossfades.retain(|cf| !cf.involves(id));
            }
            if !found {
                return Err(Error::Core(vamp_core::Error::ContainerNotFound(id)));
            }
            Ok(())
        })
    }

    pub fn move_container(&self, id: ContainerId, start_bar: f64) -> Result<()> {
        self.edit(|project| {
            find_container_mut(current_song_mut(project)?, id)?.start_bar = start_bar;
            Ok(())
        })
    }

    pub fn set_fades(&self, id: ContainerId, enter: Option<Fade>, exit: Option<Fade>) -> Result<()> {
        self.edit(|project| {
            let container = find_container_mut(current_song_mut(project)?, id)?;
            container.enter_fade = enter;
            container.exit_fade = exit;
            Ok(())
        })
    }

    pub fn set_crossfade(&self, track_id: TrackId, container_a: ContainerId, container_b: ContainerId, curve: CurveType) -> Result<()> {
        self.edit(|project| {
            let track = find_track_mut(current_song_mut(project)?, track_id)?;
            track.crossfades.retain(|cf| !(cf.involves(container_a) && cf.involves(container_b)));
            track.crossfades.push(Crossfade {
                container_a,
                container_b,
                curve,
            });
            Ok(())
        })
    }

    pub fn set_automation_breakpoints(
        &self,
        container_id: ContainerId,
        target: EffectPath,
        breakpoints: Vec<AutomationBreakpoint>,
    ) -> Result<AutomationLaneId> {
        let id = self.id_alloc.alloc_automation_lane();
        self.edit(|project| {
            let container = find_container_mut(current_song_mut(project)?, container_id)?;
            container.automation_lanes.retain(|l| l.target != target);
            container.automation_lanes.push(AutomationLane { id, target, breakpoints });
            Ok(())
        })?;
        Ok(id)
    }

    pub fn set_container_actions(
        &self,
        id: ContainerId,
        on_enter: Vec<ContainerAction>,
        on_exit: Vec<ContainerAction>,
    ) -> Result<()> {
        self.edit(|project| {
            let container = find_container_mut(current_song_mut(project)?, id)?;
            container.on_enter_actions = on_enter;
            container.on_exit_actions = on_exit;
            Ok(())
        })
    }

    // ---- Score edits: sections (§6) ----

    pub fn create_section(&self, start_bar: f64, end_bar: f64, name: impl Into<String>, color: [u8; 3]) -> Result<MarkerId> {
        let id = self.id_alloc.alloc_marker();
        let name = name.into();
        self.edit(|project| {
            current_song_mut(project)?.sections.push(SectionRegion {
                id,
                start_bar,
                end_bar,
                name,
                color,
            });
            Ok(())
        })?;
        Ok(id)
    }

    pub fn delete_section(&self, id: MarkerId) -> Result<()> {
        self.edit(|project| {
            let song = current_song_mut(project)?;
            let before = song.sections.len();
            song.sections.retain(|s| s.id != id);
            if song.sections.len() == before {
                return Err(Error::Core(vamp_core::Error::InvalidEdit(format!("section {id:?} not found"))));
            }
            Ok(())
        })
    }

    // ---- Recording (§6) ----

    /// Enqueues an arm/disarm request through the RT command queue, which
    /// forwards it to the action sink as a `TriggerContainer` action; the
    /// actual project edit happens when [`VampEngine::pump_controls`]
    /// observes it come back on the control channel, the same round trip
    /// an `onEnter` action's `ArmRecord` takes.
    pub fn arm_container_record(&self, container: ContainerId, armed: bool) -> Result<()> {
        self.send_rt(RtCommand::ArmRecord { container, armed })
    }

    fn apply_arm_record(&self, container: ContainerId, armed: bool) -> Result<()> {
        self.edit(|project| {
            find_container_mut(current_song_mut(project)?, container)?.record_armed = armed;
            Ok(())
        })
    }

    // ---- Mapping (§6) ----

    pub fn set_midi_mappings(&self, trigger: MidiTrigger, target: vamp_midi::routing::MappingTarget) {
        let mut midi = self.midi.lock();
        match target {
            vamp_midi::routing::MappingTarget::Control(c) => midi.routing_mut().map_control(trigger, c),
            vamp_midi::routing::MappingTarget::Continuous(c) => midi.routing_mut().map_continuous(trigger, c),
        }
    }

    pub fn set_midi_parameter_mappings(&self, trigger: MidiTrigger, mappings: Vec<ParameterMapping>) {
        self.midi.lock().routing_mut().set_parameter_mappings(trigger, mappings);
    }

    pub fn start_learn(&self, target: LearnTarget) {
        self.midi.lock().learn().start(target);
    }

    pub fn cancel_learn(&self) {
        self.midi.lock().learn().cancel();
    }

    /// Entry point for the MIDI driver boundary's `subscribeInput`
    /// callback: hands a raw word off to the fabric for logging, learn
    /// capture, and routing dispatch. A host wires this to every port it
    /// subscribes to; tests call it directly to drive MIDI scenarios
    /// without a real device.
    pub fn handle_midi_input(&self, source_device: &str, word: u32) {
        self.midi.lock().handle_raw_word(source_device, word);
    }

    // ---- Observation (§6) ----

    /// Lends the same snapshot handle the audio thread reads from, for a
    /// host that wants to display current score state (or serialize a
    /// project bundle) without going through the mutating edit surface.
    pub fn snapshot_handle(&self) -> SnapshotHandle {
        self.snapshot.clone()
    }

    pub fn published_bar(&self) -> f64 {
        self.transport.published_bar()
    }

    pub fn published_sample_position(&self) -> u64 {
        self.transport.published_sample_position()
    }

    pub fn underrun_count(&self) -> u64 {
        self.transport.underrun_count()
    }

    pub fn recording_peaks_for(&self, container: ContainerId) -> Vec<f32> {
        self.recording.recent_peaks(container)
    }

    pub fn midi_activity_for_track(&self, id: TrackId) -> bool {
        self.midi.lock().activity().is_active(id.raw())
    }

    pub fn recent_midi_log(&self) -> Vec<LoggedMessage> {
        self.midi.lock().raw_monitor().recent().cloned().collect()
    }

    // ---- Pumps: drain the handoff channels the RT thread and the MIDI
    // input thread use to hand work back to the control thread. A host
    // calls these periodically (e.g. once per UI tick); none of them
    // block. ----

    /// Applies every control command the MIDI fabric or an `onEnter`/
    /// `onExit` action queued since the last call.
    pub fn pump_controls(&self) {
        while let Ok(command) = self.controls_rx.try_recv() {
            self.apply_control_command(command);
        }
    }

    fn apply_control_command(&self, command: ControlCommand) {
        use vamp_core::score::TriggerAction;
        match command {
            ControlCommand::Control(MappableControl::PlayPause) => self.toggle_play_pause(),
            ControlCommand::Control(MappableControl::Stop) => self.stop(),
            ControlCommand::Control(MappableControl::RecordArm) => {
                tracing::debug!("bare RecordArm control has no resolvable target container, ignoring");
            }
            ControlCommand::Control(MappableControl::NextSong) => self.select_song_relative(1),
            ControlCommand::Control(MappableControl::PreviousSong) => self.select_song_relative(-1),
            ControlCommand::Control(MappableControl::MetronomeToggle) => {
                let metronome = self.transport.metronome();
                if metronome.is_on() {
                    self.transport.metronome().off();
                } else {
                    self.transport.metronome().on();
                }
            }
            ControlCommand::Control(MappableControl::TrackMute(raw)) => {
                let _ = self.toggle_track_mute(TrackId(raw));
            }
            ControlCommand::Control(MappableControl::TrackSolo(raw)) => {
                let _ = self.toggle_track_solo(TrackId(raw));
            }
            ControlCommand::Control(MappableControl::TrackSelect(_)) => {
                // Track selection is host UI state; the engine has none to update.
            }
            ControlCommand::Control(MappableControl::SongSelect(index)) => {
                let _ = self.select_song(index);
            }
            ControlCommand::Continuous(vamp_midi::routing::ContinuousControl::TrackVolume(raw), value) => {
                let _ = self.set_track_gain(TrackId(raw), value);
            }
            ControlCommand::Continuous(vamp_midi::routing::ContinuousControl::TrackPan(raw), value) => {
                let _ = self.set_track_gain_pan(TrackId(raw), value * 2.0 - 1.0);
            }
            ControlCommand::Continuous(vamp_midi::routing::ContinuousControl::TrackSend(raw, index), value) => {
                let _ = self.set_track_send(TrackId(raw), index, value);
            }
            ControlCommand::ContainerTrigger(target, TriggerAction::ArmRecord) => {
                let _ = self.apply_arm_record(target, true);
            }
            ControlCommand::ContainerTrigger(target, TriggerAction::DisarmRecord) => {
                let _ = self.apply_arm_record(target, false);
            }
            ControlCommand::ContainerTrigger(target, TriggerAction::Start | TriggerAction::Stop) => {
                tracing::debug!(?target, "container start/stop suppression is not modeled, ignoring trigger");
            }
        }
    }

    fn select_song(&self, index: usize) -> Result<()> {
        self.edit(|project| {
            if index >= project.songs.len() {
                return Err(Error::Core(vamp_core::Error::InvalidEdit(format!("song index {index} out of range"))));
            }
            project.current_song = index;
            Ok(())
        })
    }

    fn select_song_relative(&self, delta: i64) {
        let count = self.project.lock().songs.len() as i64;
        if count == 0 {
            return;
        }
        let current = self.project.lock().current_song as i64;
        let next = (current + delta).rem_euclid(count) as usize;
        let _ = self.select_song(next);
    }

    fn toggle_track_mute(&self, id: TrackId) -> Result<()> {
        let currently_muted = self
            .project
            .lock()
            .current_song()
            .and_then(|s| s.track(id))
            .map(|t| t.mute)
            .unwrap_or(false);
        self.set_track_mute(id, !currently_muted)
    }

    fn toggle_track_solo(&self, id: TrackId) -> Result<()> {
        let currently_soloed = self
            .project
            .lock()
            .current_song()
            .and_then(|s| s.track(id))
            .map(|t| t.solo)
            .unwrap_or(false);
        self.set_track_solo(id, !currently_soloed)
    }

    fn set_track_gain(&self, id: TrackId, gain: f32) -> Result<()> {
        self.edit(|project| {
            find_track_mut(current_song_mut(project)?, id)?.mix.gain = gain;
            Ok(())
        })
    }

    fn set_track_gain_pan(&self, id: TrackId, pan: f32) -> Result<()> {
        self.edit(|project| {
            find_track_mut(current_song_mut(project)?, id)?.mix.pan = pan.clamp(-1.0, 1.0);
            Ok(())
        })
    }

    fn set_track_send(&self, id: TrackId, send_index: usize, amount: f32) -> Result<()> {
        self.edit(|project| {
            let track = find_track_mut(current_song_mut(project)?, id)?;
            let send = track
                .mix
                .sends
                .get_mut(send_index)
                .ok_or_else(|| Error::Core(vamp_core::Error::InvalidEdit(format!("send {send_index} not found"))))?;
            send.amount = amount;
            Ok(())
        })
    }

    /// Loads every recording finalized since the last call into the
    /// playback audio source, and retargets the finished container (and
    /// any clones of it) to read from the new source recording.
    pub fn pump_recordings(&self) -> Result<()> {
        while let Ok(event) = self.recording_events.try_recv() {
            let (container, recording, linked_containers) = match event {
                RecordingEvent::Completed { container, recording, linked_containers } => {
                    (container, recording, linked_containers)
                }
                RecordingEvent::Failed { container, message } => {
                    let _ = self
                        .engine_events_tx
                        .try_send(EngineEvent::RecordingSinkFailure { container, message });
                    continue;
                }
            };
            let path = self
                .config
                .recording_output_dir
                .join(format!("capture-{}.wav", container.raw()));
            self.audio_source.load_from_path(recording.id, &path)?;

            let id = recording.id;
            let gain = 1.0;
            self.edit(|project| {
                project.source_recordings.push(recording.clone());
                let song = current_song_mut(project)?;
                for target in std::iter::once(container).chain(linked_containers.iter().copied()) {
                    if let Ok(c) = find_container_mut(song, target) {
                        c.payload = ContainerPayload::Audio {
                            recording_ref: id,
                            audio_start_offset_bars: 0.0,
                            gain,
                        };
                        c.record_armed = false;
                    }
                }
                Ok(())
            })?;
        }
        Ok(())
    }

    /// Drains non-fatal engine events, logging each at the severity its
    /// §7 policy implies and returning them for a host that wants to
    /// surface them in a UI.
    pub fn pump_events(&self) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.engine_events.try_recv() {
            event.log();
            events.push(event);
        }
        events
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn underrun_counter_handle(&self) -> Arc<TransportManager> {
        Arc::clone(&self.transport_manager)
    }
}
