//! Preallocated per-callback scratch space. Allocation happens only when a
//! snapshot grows the track count past the current pool size (a control-
//! thread-driven edit, not per-sample RT work); steady-state callbacks
//! never touch the allocator.

pub struct ScratchBuffers {
    pub channels: usize,
    pub max_frames: usize,
    track_buses: Vec<Vec<f32>>,
    container_scratch: Vec<f32>,
    pub master_bus: Vec<f32>,
}

impl ScratchBuffers {
    pub fn new(channels: usize, max_frames: usize) -> Self {
        Self {
            channels,
            max_frames,
            track_buses: Vec::new(),
            container_scratch: vec![0.0; max_frames * channels],
            master_bus: vec![0.0; max_frames * channels],
        }
    }

    /// Ensure at least `count` track buses exist, sized for `max_frames`.
    pub fn ensure_tracks(&mut self, count: usize) {
        while self.track_buses.len() < count {
            self.track_buses.push(vec![0.0; self.max_frames * self.channels]);
        }
    }

    pub fn track_bus(&mut self, index: usize) -> &mut [f32] {
        &mut self.track_buses[index]
    }

    pub fn container_scratch(&mut self) -> &mut [f32] {
        &mut self.container_scratch
    }

    pub fn clear(&mut self, frames: usize) {
        let len = frames * self.channels;
        for bus in self.track_buses.iter_mut() {
            bus[..len].fill(0.0);
        }
        self.master_bus[..len].fill(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_tracks_grows_pool_without_shrinking() {
        let mut buffers = ScratchBuffers::new(2, 128);
        buffers.ensure_tracks(3);
        assert_eq!(buffers.track_buses.len(), 3);
        buffers.ensure_tracks(2);
        assert_eq!(buffers.track_buses.len(), 3);
    }

    #[test]
    fn clear_zeroes_only_the_active_frame_range() {
        let mut buffers = ScratchBuffers::new(1, 4);
        buffers.ensure_tracks(1);
        buffers.track_bus(0).fill(0.5);
        buffers.clear(4);
        assert!(buffers.track_bus(0).iter().all(|&s| s == 0.0));
    }
}
