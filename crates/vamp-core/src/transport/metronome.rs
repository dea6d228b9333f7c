//! Metronome state shared between the control thread (fluent configuration)
//! and the audio thread (click rendering). Grounded on the teacher's
//! `ClickState` — a small bundle of atomics behind an `Arc`.

use crate::lockfree::{AtomicFlag, AtomicFloat};

pub struct MetronomeState {
    enabled: AtomicFlag,
    volume: AtomicFloat,
    accent_first_beat: AtomicFlag,
}

impl MetronomeState {
    pub fn new(enabled: bool, volume: f32, accent_first_beat: bool) -> Self {
        Self {
            enabled: AtomicFlag::new(enabled),
            volume: AtomicFloat::new(volume),
            accent_first_beat: AtomicFlag::new(accent_first_beat),
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.set(enabled);
    }

    pub fn enabled(&self) -> bool {
        self.enabled.get()
    }

    pub fn set_volume(&self, volume: f32) {
        self.volume.set(volume.clamp(0.0, 1.0));
    }

    pub fn volume(&self) -> f32 {
        self.volume.get()
    }

    pub fn set_accent_first_beat(&self, accent: bool) {
        self.accent_first_beat.set(accent);
    }

    pub fn accent_first_beat(&self) -> bool {
        self.accent_first_beat.get()
    }

    /// Gain to apply to the click for `beat_in_bar` (0-based).
    pub fn click_gain(&self, beat_in_bar: u32) -> f32 {
        if !self.enabled() {
            return 0.0;
        }
        let accent = self.accent_first_beat() && beat_in_bar == 0;
        let accent_boost = if accent { 1.0 } else { 0.7 };
        self.volume() * accent_boost
    }
}

impl Default for MetronomeState {
    fn default() -> Self {
        Self::new(true, 0.8, true)
    }
}

impl std::fmt::Debug for MetronomeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetronomeState")
            .field("enabled", &self.enabled())
            .field("volume", &self.volume())
            .field("accent_first_beat", &self.accent_first_beat())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_metronome_has_zero_gain() {
        let m = MetronomeState::new(false, 1.0, true);
        assert_eq!(m.click_gain(0), 0.0);
    }

    #[test]
    fn accented_first_beat_is_louder() {
        let m = MetronomeState::new(true, 1.0, true);
        assert!(m.click_gain(0) > m.click_gain(1));
    }

    #[test]
    fn volume_is_clamped() {
        let m = MetronomeState::default();
        m.set_volume(3.0);
        assert_eq!(m.volume(), 1.0);
        m.set_volume(-1.0);
        assert_eq!(m.volume(), 0.0);
    }
}
