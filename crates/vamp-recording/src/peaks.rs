//! Peak accumulation for UI meters: one peak value per fixed-size window
//! of interleaved frames, windows sized to ~1/256 of a bar.

use std::collections::VecDeque;

/// Bounded ring of peak values; `push_frames` folds whole windows as they
/// complete and carries a partial window across calls.
pub struct PeakAccumulator {
    window_frames: usize,
    channels: usize,
    ring: VecDeque<f32>,
    capacity: usize,
    current_max: f32,
    current_count: usize,
}

impl PeakAccumulator {
    pub fn new(window_frames: usize, channels: usize, capacity: usize) -> Self {
        Self {
            window_frames: window_frames.max(1),
            channels: channels.max(1),
            ring: VecDeque::with_capacity(capacity),
            capacity,
            current_max: 0.0,
            current_count: 0,
        }
    }

    /// Fold interleaved `frames` into the running peak windows, pushing a
    /// completed peak onto the bounded ring each time a window fills.
    pub fn push_frames(&mut self, interleaved: &[f32]) {
        for frame in interleaved.chunks_exact(self.channels) {
            let peak = frame.iter().fold(0.0f32, |acc, &s| acc.max(s.abs()));
            self.current_max = self.current_max.max(peak);
            self.current_count += 1;
            if self.current_count >= self.window_frames {
                self.push_peak(self.current_max);
                self.current_max = 0.0;
                self.current_count = 0;
            }
        }
    }

    fn push_peak(&mut self, value: f32) {
        if self.ring.len() == self.capacity {
            self.ring.pop_front();
        }
        self.ring.push_back(value);
    }

    /// Drain every peak pushed since the last drain, plus a final partial
    /// window if `flush_partial` is set (used on finalize).
    pub fn drain(&mut self, flush_partial: bool) -> Vec<f32> {
        if flush_partial && self.current_count > 0 {
            let remainder = self.current_max;
            self.current_max = 0.0;
            self.current_count = 0;
            self.push_peak(remainder);
        }
        self.ring.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completes_a_window_and_reports_its_peak() {
        let mut acc = PeakAccumulator::new(2, 1, 100);
        acc.push_frames(&[0.1, 0.4, 0.2, -0.9]);
        let peaks = acc.drain(false);
        assert_eq!(peaks, vec![0.4, 0.9]);
    }

    #[test]
    fn partial_window_is_dropped_unless_flushed() {
        let mut acc = PeakAccumulator::new(4, 1, 100);
        acc.push_frames(&[0.3, 0.2]);
        assert!(acc.drain(false).is_empty());

        acc.push_frames(&[0.3, 0.2]);
        let flushed = acc.drain(true);
        assert_eq!(flushed, vec![0.3]);
    }

    #[test]
    fn ring_bounds_capacity() {
        let mut acc = PeakAccumulator::new(1, 1, 2);
        acc.push_frames(&[0.1, 0.2, 0.3]);
        assert_eq!(acc.drain(false), vec![0.2, 0.3]);
    }
}
