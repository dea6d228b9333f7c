//! Disk-backed [`AudioSource`]: loads finalized recordings written by
//! `vamp-recording`'s `RecordingWriter` into memory once, then serves
//! reads the same RT-safe way [`vamp_core::audio_source::InMemoryAudioSource`]
//! does. Decoding a WAV file allocates and touches the filesystem, so it
//! only ever happens on the control thread, never from inside the audio
//! callback.

use crate::error::Result;
use std::path::Path;
use vamp_core::audio_source::{AudioSource, InMemoryAudioSource};
use vamp_core::ids::SourceRecordingId;

/// Backs reads with an in-memory store populated by decoding WAV files on
/// the control thread; the RT-facing [`AudioSource::read`] never touches
/// disk.
#[derive(Default)]
pub struct WavFileAudioSource {
    memory: InMemoryAudioSource,
}

impl WavFileAudioSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `path` as a WAV file and register it under `id`, replacing
    /// whatever was previously loaded for that id.
    pub fn load_from_path(&self, id: SourceRecordingId, path: impl AsRef<Path>) -> Result<()> {
        let mut reader = hound::WavReader::open(path.as_ref())?;
        let spec = reader.spec();
        let channels = spec.channels;

        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<std::result::Result<Vec<f32>, hound::Error>>()?,
            hound::SampleFormat::Int => {
                let max = (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|sample| sample as f32 / max))
                    .collect::<std::result::Result<Vec<f32>, hound::Error>>()?
            }
        };

        self.memory.insert(id, channels, interleaved);
        Ok(())
    }
}

impl AudioSource for WavFileAudioSource {
    fn read(&self, id: SourceRecordingId, offset_samples: u64, channels: u16, out: &mut [f32]) -> usize {
        self.memory.read(id, offset_samples, channels, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_test_wav(path: &Path, channels: u16, sample_rate: u32, frames: &[(f32, f32)]) {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &(l, r) in frames {
            writer.write_sample(l).unwrap();
            if channels == 2 {
                writer.write_sample(r).unwrap();
            }
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn loads_and_reads_back_a_stereo_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("take.wav");
        write_test_wav(&path, 2, 48_000, &[(0.1, -0.1), (0.2, -0.2)]);

        let source = WavFileAudioSource::new();
        let id = SourceRecordingId(1);
        source.load_from_path(id, &path).unwrap();

        let mut out = vec![0.0f32; 4];
        let read = source.read(id, 0, 2, &mut out);
        assert_eq!(read, 2);
        assert!((out[0] - 0.1).abs() < 1e-4);
        assert!((out[3] - -0.2).abs() < 1e-4);
    }

    #[test]
    fn missing_path_is_an_error() {
        let source = WavFileAudioSource::new();
        let _ = std::io::stdout().flush();
        assert!(source.load_from_path(SourceRecordingId(1), "/nonexistent/path.wav").is_err());
    }
}
