//! The object actually installed as the audio driver's [`AudioCallback`].
//!
//! Bundles the playback scheduler and the recording manager so a single
//! driver callback both renders output and captures input, matching §2's
//! "Recording Manager simultaneously consumes the input buffer" data flow.
//! Everything here runs on the audio driver's own thread; it owns no
//! locks that the control thread also takes while editing, and allocates
//! nothing per callback (the `ArmedRange` scratch vector is preallocated).

use std::sync::Arc;

use vamp_core::ids::ContainerId;
use vamp_core::output::AudioCallback;
use vamp_core::score::SnapshotHandle;
use vamp_core::scheduler::PlaybackScheduler;
use vamp_core::time::TimeMap;
use vamp_core::transport::TransportManager;
use vamp_recording::{ArmedRange, RecordingManager};

/// Resolves clones of a just-finalized recording's container that should
/// be retargeted to the new `SourceRecording`. Implemented by the control
/// thread's score index; injected so `vamp-recording` stays ignorant of
/// clone-resolution (§9 "cyclic container relationships").
pub trait LinkedContainerResolver: Send {
    fn linked_containers(&self, container: ContainerId) -> Vec<ContainerId>;
}

pub struct NullLinkedContainerResolver;
impl LinkedContainerResolver for NullLinkedContainerResolver {
    fn linked_containers(&self, _container: ContainerId) -> Vec<ContainerId> {
        Vec::new()
    }
}

/// Resolves clones against the control thread's working project. Locking a
/// `parking_lot::Mutex` from the audio thread is normally off-limits, but
/// this only runs once per finalized recording (a rare, already-latent
/// event, never once per callback), the same exception `EngineActionSink`
/// makes for MIDI sends.
pub struct ProjectCloneResolver {
    project: Arc<parking_lot::Mutex<vamp_core::score::Project>>,
}

impl ProjectCloneResolver {
    pub fn new(project: Arc<parking_lot::Mutex<vamp_core::score::Project>>) -> Self {
        Self { project }
    }
}

impl LinkedContainerResolver for ProjectCloneResolver {
    fn linked_containers(&self, container: ContainerId) -> Vec<ContainerId> {
        let project = self.project.lock();
        let Some(song) = project.current_song() else {
            return Vec::new();
        };
        song.tracks
            .iter()
            .flat_map(|t| &t.containers)
            .filter(|c| c.is_clone && c.source_container_id == Some(container))
            .map(|c| c.id)
            .collect()
    }
}

pub struct EngineCallback {
    scheduler: PlaybackScheduler,
    recording: Arc<RecordingManager>,
    snapshot: SnapshotHandle,
    transport: Arc<TransportManager>,
    sample_rate: f64,
    channels: u16,
    linked: Box<dyn LinkedContainerResolver>,
    armed_scratch: Vec<ArmedRange>,
}

impl EngineCallback {
    pub fn new(
        scheduler: PlaybackScheduler,
        recording: Arc<RecordingManager>,
        snapshot: SnapshotHandle,
        transport: Arc<TransportManager>,
        sample_rate: f64,
        channels: u16,
        linked: Box<dyn LinkedContainerResolver>,
    ) -> Self {
        Self {
            scheduler,
            recording,
            snapshot,
            transport,
            sample_rate,
            channels,
            linked,
            armed_scratch: Vec::with_capacity(16),
        }
    }
}

impl AudioCallback for EngineCallback {
    fn render(&mut self, input: &[f32], output: &mut [f32], frames: usize, channels: usize) {
        // Capture first, against the snapshot and sample position as they
        // stand at the top of this callback, mirroring the order §2
        // describes: the Recording Manager "simultaneously consumes the
        // input buffer" while the scheduler resolves the same range.
        let project = self.snapshot.load();
        if let Some(song) = project.current_song() {
            let time_map = TimeMap::new(self.sample_rate, song.tempo_bpm, song.signature);
            let t0 = self.transport.rt_sample_position();
            let bar_lo = time_map.bar_at(t0);
            let bar_hi = time_map.bar_at(t0 + frames as u64);

            self.armed_scratch.clear();
            for track in &song.tracks {
                for container in &track.containers {
                    if container.record_armed && container.intersects_bars(bar_lo, bar_hi) {
                        self.armed_scratch.push(ArmedRange {
                            container: container.id,
                            container_start_bar: container.start_bar,
                            container_end_bar: container.end_bar(),
                        });
                    }
                }
            }

            if !input.is_empty() {
                self.recording.process_callback(
                    &self.armed_scratch,
                    input,
                    self.channels,
                    self.sample_rate as u32,
                    bar_lo,
                    bar_hi,
                    time_map.samples_per_bar(),
                    |container| self.linked.linked_containers(container),
                );
            }
        }
        drop(project);

        self.scheduler.process(frames, output);
        debug_assert_eq!(channels, self.channels as usize);
    }
}
