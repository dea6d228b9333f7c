//! Clock & TimeMap: conversion between samples, musical position, and wall seconds.

mod signature;
mod snap;

pub use signature::TimeSignature;
pub use snap::SnapResolution;

/// Fixed tempo/signature/sample-rate triple that converts among the three
/// time domains the engine cares about. Tempo is constant within a song;
/// tempo maps are future work, not part of this core.
///
/// Grounded on `TransportClock`'s `beat_per_sample` precomputation, but
/// expressed as a pure value type rather than an `AudioUnit` node — the
/// scheduler owns the sample counter, this type only does arithmetic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeMap {
    sample_rate: f64,
    tempo_bpm: f64,
    signature: TimeSignature,
    samples_per_bar: f64,
}

impl TimeMap {
    pub fn new(sample_rate: f64, tempo_bpm: f64, signature: TimeSignature) -> Self {
        let samples_per_bar =
            sample_rate * 60.0 * signature.beats_per_bar as f64 / tempo_bpm;
        Self {
            sample_rate,
            tempo_bpm,
            signature,
            samples_per_bar,
        }
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn tempo_bpm(&self) -> f64 {
        self.tempo_bpm
    }

    pub fn signature(&self) -> TimeSignature {
        self.signature
    }

    pub fn samples_per_bar(&self) -> f64 {
        self.samples_per_bar
    }

    pub fn samples_per_beat(&self) -> f64 {
        self.samples_per_bar / self.signature.beats_per_bar as f64
    }

    /// 1-based fractional bar at an absolute sample position.
    #[inline]
    pub fn bar_at(&self, samples: u64) -> f64 {
        1.0 + samples as f64 / self.samples_per_bar
    }

    /// Inverse of `bar_at`: the (fractional) sample position of a 1-based bar.
    #[inline]
    pub fn samples_at_bar(&self, bar: f64) -> f64 {
        (bar - 1.0) * self.samples_per_bar
    }

    #[inline]
    pub fn seconds_at(&self, samples: u64) -> f64 {
        samples as f64 / self.sample_rate
    }

    #[inline]
    pub fn samples_at_seconds(&self, seconds: f64) -> f64 {
        seconds * self.sample_rate
    }

    /// Round `raw_bar` to the nearest grid point at `resolution`.
    pub fn snapped_bar(&self, raw_bar: f64, resolution: SnapResolution) -> f64 {
        resolution.snap(raw_bar, self.signature)
    }

    /// Rebuild with a new tempo, keeping sample rate and signature.
    pub fn with_tempo(&self, tempo_bpm: f64) -> Self {
        Self::new(self.sample_rate, tempo_bpm, self.signature)
    }

    /// Rebuild with a new signature, keeping sample rate and tempo.
    pub fn with_signature(&self, signature: TimeSignature) -> Self {
        Self::new(self.sample_rate, self.tempo_bpm, signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn map() -> TimeMap {
        TimeMap::new(44_100.0, 120.0, TimeSignature::new(4, 4).unwrap())
    }

    #[test]
    fn samples_per_bar_matches_formula() {
        let m = map();
        // 44100 * 60 * 4 / 120 = 88200
        assert_relative_eq!(m.samples_per_bar(), 88_200.0);
    }

    #[test]
    fn bar_at_sample_zero_is_bar_one() {
        let m = map();
        assert_relative_eq!(m.bar_at(0), 1.0);
    }

    #[test]
    fn bar_and_samples_at_bar_are_inverses() {
        let m = map();
        for bar in [1.0, 1.5, 2.0, 8.25] {
            let samples = m.samples_at_bar(bar);
            let back = m.bar_at(samples.round() as u64);
            assert_relative_eq!(back, bar, epsilon = 1e-6);
        }
    }

    #[test]
    fn seconds_round_trip() {
        let m = map();
        let secs = m.seconds_at(44_100);
        assert_relative_eq!(secs, 1.0);
        assert_relative_eq!(m.samples_at_seconds(secs), 44_100.0);
    }

    proptest::proptest! {
        #[test]
        fn bar_math_round_trips_within_a_sample(
            sample_rate in 8_000.0f64..192_000.0,
            tempo in 20.0f64..300.0,
            beats_per_bar in 1u8..16,
        ) {
            let sig = TimeSignature::new(beats_per_bar, 4).unwrap();
            let m = TimeMap::new(sample_rate, tempo, sig);
            let s = 123_456u64;
            let bar = m.bar_at(s);
            let back_samples = m.samples_at_bar(bar);
            proptest::prop_assert!((back_samples - s as f64).abs() <= 1.0 + 1e-6);
        }
    }
}
