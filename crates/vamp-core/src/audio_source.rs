//! Read access to immutable recorded/imported audio assets. The scheduler
//! never owns PCM data itself — it reads through this trait so the actual
//! storage strategy (disk-backed via `vamp-recording`, or in-memory for
//! tests) is swappable, the same way `PluginHost`/`AudioDriver` are opaque
//! boundaries.

use crate::ids::SourceRecordingId;
use parking_lot::RwLock;
use std::collections::HashMap;

pub trait AudioSource: Send + Sync {
    /// Read up to `out.len() / channels` interleaved frames starting at
    /// `offset_samples` into `out`. Returns the number of frames actually
    /// written; the caller zero-fills the remainder when the read runs
    /// past the end of the source, per the "missing/short source
    /// contributes silence" policy.
    fn read(
        &self,
        id: SourceRecordingId,
        offset_samples: u64,
        channels: u16,
        out: &mut [f32],
    ) -> usize;
}

/// In-memory store keyed by [`SourceRecordingId`], used by tests and by
/// headless operation before a persistence collaborator is wired in.
#[derive(Default)]
pub struct InMemoryAudioSource {
    assets: RwLock<HashMap<SourceRecordingId, (u16, Vec<f32>)>>,
}

impl InMemoryAudioSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: SourceRecordingId, channels: u16, interleaved: Vec<f32>) {
        self.assets.write().insert(id, (channels, interleaved));
    }
}

impl AudioSource for InMemoryAudioSource {
    fn read(
        &self,
        id: SourceRecordingId,
        offset_samples: u64,
        channels: u16,
        out: &mut [f32],
    ) -> usize {
        let assets = self.assets.read();
        let Some((source_channels, data)) = assets.get(&id) else {
            out.fill(0.0);
            return 0;
        };
        let source_channels = *source_channels as usize;
        let frames_wanted = out.len() / channels as usize;
        let offset_frames = offset_samples as usize;
        let total_frames = data.len() / source_channels.max(1);

        if offset_frames >= total_frames {
            out.fill(0.0);
            return 0;
        }

        let available = (total_frames - offset_frames).min(frames_wanted);
        for frame in 0..available {
            for ch in 0..channels as usize {
                let src_ch = ch.min(source_channels.saturating_sub(1));
                let src_index = (offset_frames + frame) * source_channels + src_ch;
                out[frame * channels as usize + ch] = data.get(src_index).copied().unwrap_or(0.0);
            }
        }
        for sample in out.iter_mut().skip(available * channels as usize) {
            *sample = 0.0;
        }
        available
    }
}
