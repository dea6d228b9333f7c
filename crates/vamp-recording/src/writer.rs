//! Background disk writer, grounded on the teacher's butler thread: a
//! dedicated thread drains capture rings and writes WAV files so the audio
//! thread never touches the filesystem.

use crate::capture::CaptureConsumer;
use crate::error::{Error, Result};
use crate::manager::RecordingEvent;
use hound::{SampleFormat, WavSpec, WavWriter};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};
use vamp_core::ids::ContainerId;

const FLUSH_INTERVAL: Duration = Duration::from_millis(20);
/// Read at most this many samples per drain pass, so one very full ring
/// doesn't starve the others sharing the writer thread.
const MAX_SAMPLES_PER_FLUSH: usize = 1 << 16;

pub enum WriterCommand {
    Open {
        container: ContainerId,
        path: PathBuf,
        sample_rate: u32,
        channels: u16,
        consumer: CaptureConsumer,
    },
    Finalize {
        container: ContainerId,
        respond: crossbeam_channel::Sender<Result<u64>>,
    },
}

struct OpenSink {
    writer: WavWriter<BufWriter<File>>,
    consumer: CaptureConsumer,
}

fn drain_into(sink: &mut OpenSink, max_samples: usize) -> Result<usize> {
    let available = sink.consumer.available_samples().min(max_samples);
    if available == 0 {
        return Ok(0);
    }
    let mut buffer = vec![0.0f32; available];
    let read = sink.consumer.read_into(&mut buffer);
    for &sample in &buffer[..read] {
        sink.writer.write_sample(sample)?;
    }
    let channels = sink.consumer.meta().channels as u64;
    if channels > 0 {
        sink.consumer.add_frames_written(read as u64 / channels);
    }
    Ok(read)
}

fn writer_loop(
    rx: crossbeam_channel::Receiver<WriterCommand>,
    events: crossbeam_channel::Sender<RecordingEvent>,
    shutdown: Arc<AtomicBool>,
) {
    let mut sinks: HashMap<ContainerId, OpenSink> = HashMap::new();

    loop {
        if shutdown.load(Ordering::Relaxed) {
            break;
        }
        match rx.recv_timeout(FLUSH_INTERVAL) {
            Ok(WriterCommand::Open {
                container,
                path,
                sample_rate,
                channels,
                consumer,
            }) => {
                let spec = WavSpec {
                    channels,
                    sample_rate,
                    bits_per_sample: 32,
                    sample_format: SampleFormat::Float,
                };
                match File::create(&path).map_err(|source| Error::CreateSink { path: path.clone(), source }) {
                    Ok(file) => match WavWriter::new(BufWriter::new(file), spec) {
                        Ok(writer) => {
                            sinks.insert(container, OpenSink { writer, consumer });
                        }
                        Err(e) => warn!(?container, error = %e, "failed to open wav writer"),
                    },
                    Err(e) => warn!(?container, error = %e, "failed to create capture sink"),
                }
            }
            Ok(WriterCommand::Finalize { container, respond }) => {
                let result = match sinks.remove(&container) {
                    Some(mut sink) => {
                        // Drain whatever's left before closing.
                        while drain_into(&mut sink, MAX_SAMPLES_PER_FLUSH).unwrap_or(0) > 0 {}
                        let frames_written = sink.consumer.meta().frames_written();
                        sink.writer.finalize().map(|_| frames_written).map_err(Error::from)
                    }
                    None => Err(Error::NoActiveSession(container)),
                };
                let _ = respond.send(result);
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {}
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
        }

        let mut failed = Vec::new();
        for (&container, sink) in sinks.iter_mut() {
            if let Err(e) = drain_into(sink, MAX_SAMPLES_PER_FLUSH) {
                warn!(?container, error = %e, "capture write failed, stopping this recording");
                failed.push((container, e.to_string()));
            }
        }
        for (container, message) in failed {
            sinks.remove(&container);
            let _ = events.send(RecordingEvent::Failed { container, message });
        }
    }
    debug!("recording writer thread exiting");
}

pub struct RecordingWriter {
    command_tx: crossbeam_channel::Sender<WriterCommand>,
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl RecordingWriter {
    pub fn spawn(events: crossbeam_channel::Sender<RecordingEvent>) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = Arc::clone(&shutdown);
        let handle = thread::Builder::new()
            .name("vamp-recording-writer".into())
            .spawn(move || writer_loop(rx, events, shutdown_clone))
            .expect("failed to spawn recording writer thread");

        Self {
            command_tx: tx,
            shutdown,
            handle: Some(handle),
        }
    }

    pub fn sender(&self) -> crossbeam_channel::Sender<WriterCommand> {
        self.command_tx.clone()
    }
}

impl Drop for RecordingWriter {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
