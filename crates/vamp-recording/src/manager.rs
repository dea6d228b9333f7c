//! Recording Manager: per-container capture sessions keyed by bar-range
//! intersection with the current callback, mirroring the teacher's
//! `RecordingManager` (sparse `DashMap` storage, audio-thread touches kept
//! minimal, real work delegated to a background thread).

use crate::capture::{new_capture_ring, CaptureProducer};
use crate::error::Result;
use crate::peaks::PeakAccumulator;
use crate::writer::{RecordingWriter, WriterCommand};
use dashmap::DashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;
use vamp_core::ids::{ContainerId, IdAllocator};
use vamp_core::score::SourceRecording;

const CAPTURE_BUFFER_MS: f32 = 2000.0;
const PEAK_RING_CAPACITY: usize = 4096;

/// A container currently in record-arm range for this callback, resolved
/// by the caller from the current snapshot.
#[derive(Debug, Clone, Copy)]
pub struct ArmedRange {
    pub container: ContainerId,
    /// Musical bar range of the container itself (its full extent).
    pub container_start_bar: f64,
    pub container_end_bar: f64,
}

pub enum RecordingEvent {
    Completed {
        container: ContainerId,
        recording: SourceRecording,
        linked_containers: Vec<ContainerId>,
    },
    /// A capture sink hit a disk-write error. The writer thread has already
    /// dropped it from its active sinks; the session accumulated so far is
    /// lost but the transport keeps running.
    Failed {
        container: ContainerId,
        message: String,
    },
}

struct Session {
    producer: CaptureProducer,
    peaks: PeakAccumulator,
    sample_rate: u32,
    channels: u16,
}

pub struct RecordingManager {
    sessions: DashMap<ContainerId, Session>,
    writer: RecordingWriter,
    id_alloc: Arc<IdAllocator>,
    events: crossbeam_channel::Sender<RecordingEvent>,
    output_dir: PathBuf,
}

impl RecordingManager {
    pub fn new(
        output_dir: PathBuf,
        id_alloc: Arc<IdAllocator>,
        events: crossbeam_channel::Sender<RecordingEvent>,
    ) -> Self {
        Self {
            sessions: DashMap::new(),
            writer: RecordingWriter::spawn(events.clone()),
            id_alloc,
            events,
            output_dir,
        }
    }

    pub fn is_recording(&self, container: ContainerId) -> bool {
        self.sessions.contains_key(&container)
    }

    /// Peaks completed since the last drain, for a UI meter.
    pub fn recent_peaks(&self, container: ContainerId) -> Vec<f32> {
        self.sessions
            .get_mut(&container)
            .map(|mut session| session.peaks.drain(false))
            .unwrap_or_default()
    }

    /// Called once per audio callback with the set of armed containers
    /// whose bar range intersects `[callback_start_bar, callback_end_bar)`,
    /// plus the raw input this callback captured (interleaved,
    /// `channels`-wide). `linked_containers_for` resolves clones of the
    /// recorded container that should be retargeted once it finalizes.
    pub fn process_callback(
        &self,
        armed: &[ArmedRange],
        input: &[f32],
        channels: u16,
        sample_rate: u32,
        callback_start_bar: f64,
        callback_end_bar: f64,
        samples_per_bar: f64,
        linked_containers_for: impl Fn(ContainerId) -> Vec<ContainerId>,
    ) {
        let window_frames = ((samples_per_bar / 256.0).round() as usize).max(1);

        for range in armed {
            let lo = range.container_start_bar.max(callback_start_bar);
            let hi = range.container_end_bar.min(callback_end_bar);
            if lo >= hi {
                // No overlap this callback; if a session was open and the
                // container's range has already passed, finalize it.
                if self.sessions.contains_key(&range.container) && callback_start_bar >= range.container_end_bar {
                    self.finalize(range.container, &linked_containers_for(range.container));
                }
                continue;
            }

            let frame_start = ((lo - callback_start_bar) * samples_per_bar).round() as usize;
            let frame_end = ((hi - callback_start_bar) * samples_per_bar).round() as usize;
            let sample_start = frame_start * channels as usize;
            let sample_end = (frame_end * channels as usize).min(input.len());
            if sample_start >= sample_end {
                continue;
            }
            let slice = &input[sample_start..sample_end];

            if !self.sessions.contains_key(&range.container) {
                self.open(range.container, channels, sample_rate, window_frames);
            }

            if let Some(mut session) = self.sessions.get_mut(&range.container) {
                let channel_count = session.channels as usize;
                for frame in slice.chunks_exact(channel_count) {
                    if !session.producer.write_frame(frame) {
                        warn!(container = ?range.container, "capture ring full, dropped frame");
                    }
                }
                session.peaks.push_frames(slice);
            }

            if hi >= range.container_end_bar {
                self.finalize(range.container, &linked_containers_for(range.container));
            }
        }
    }

    fn open(&self, container: ContainerId, channels: u16, sample_rate: u32, window_frames: usize) {
        let path = self.output_dir.join(format!("capture-{}.wav", container.raw()));
        let (producer, consumer) = new_capture_ring(container, sample_rate, channels, CAPTURE_BUFFER_MS);
        let opened = self.writer.sender().send(WriterCommand::Open {
            container,
            path,
            sample_rate,
            channels,
            consumer,
        });
        if opened.is_err() {
            warn!(?container, "recording writer thread unavailable, capture not opened");
            return;
        }
        self.sessions.insert(
            container,
            Session {
                producer,
                peaks: PeakAccumulator::new(window_frames, channels as usize, PEAK_RING_CAPACITY),
                sample_rate,
                channels,
            },
        );
    }

    fn finalize(&self, container: ContainerId, linked_containers: &[ContainerId]) {
        let Some((_, mut session)) = self.sessions.remove(&container) else {
            return;
        };
        let peaks = session.peaks.drain(true);
        let (tx, rx) = crossbeam_channel::bounded(1);
        if self
            .writer
            .sender()
            .send(WriterCommand::Finalize { container, respond: tx })
            .is_err()
        {
            warn!(?container, "recording writer thread unavailable, capture not finalized");
            return;
        }
        match rx.recv() {
            Ok(Ok(duration_samples)) => {
                let id = self.id_alloc.alloc_source_recording();
                let recording = SourceRecording {
                    id,
                    channels: session.channels,
                    sample_rate: session.sample_rate,
                    duration_samples,
                    peaks,
                };
                let _ = self.events.send(RecordingEvent::Completed {
                    container,
                    recording,
                    linked_containers: linked_containers.to_vec(),
                });
            }
            Ok(Err(e)) => warn!(?container, error = %e, "failed to finalize capture sink"),
            Err(_) => warn!(?container, "recording writer did not respond to finalize"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opening_and_finalizing_without_overlap_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, _rx) = crossbeam_channel::unbounded();
        let manager = RecordingManager::new(dir.path().to_path_buf(), Arc::new(IdAllocator::new()), tx);
        let armed = [ArmedRange {
            container: ContainerId(1),
            container_start_bar: 10.0,
            container_end_bar: 12.0,
        }];
        manager.process_callback(&armed, &[0.0; 256], 2, 48_000, 0.0, 1.0, 128.0, |_| Vec::new());
        assert!(!manager.is_recording(ContainerId(1)));
    }

    #[test]
    fn recording_through_full_container_range_emits_completed_event() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, rx) = crossbeam_channel::unbounded();
        let manager = RecordingManager::new(dir.path().to_path_buf(), Arc::new(IdAllocator::new()), tx);
        let armed = [ArmedRange {
            container: ContainerId(7),
            container_start_bar: 0.0,
            container_end_bar: 1.0,
        }];
        let samples_per_bar = 128.0;
        let input = vec![0.25f32; samples_per_bar as usize * 2];
        manager.process_callback(&armed, &input, 2, 48_000, 0.0, 1.0, samples_per_bar, |_| Vec::new());

        let event = rx.recv_timeout(std::time::Duration::from_secs(2)).expect("no event");
        match event {
            RecordingEvent::Completed { container, recording, .. } => {
                assert_eq!(container, ContainerId(7));
                assert_eq!(recording.channels, 2);
                assert!(recording.duration_samples > 0);
            }
        }
        assert!(!manager.is_recording(ContainerId(7)));
    }
}
