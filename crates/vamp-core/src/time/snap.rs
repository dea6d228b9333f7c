use super::TimeSignature;

/// Grid resolution for snapping a raw bar position.
///
/// `Adaptive` is resolved by the UI (it knows pixel widths); the core only
/// carries the variant so a UI-chosen resolution round-trips through the
/// control surface, and falls back to `Sixteenth` if asked to snap directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapResolution {
    Bar,
    Half,
    Quarter,
    Eighth,
    Sixteenth,
    Triplet,
    Adaptive,
}

impl SnapResolution {
    /// Fraction of a bar represented by one grid step, given a signature.
    fn grid_fraction(self, signature: TimeSignature) -> f64 {
        let beat_fraction = 1.0 / signature.beats_per_bar as f64;
        match self {
            SnapResolution::Bar => 1.0,
            SnapResolution::Half => 0.5,
            SnapResolution::Quarter => beat_fraction,
            SnapResolution::Eighth => beat_fraction / 2.0,
            SnapResolution::Sixteenth => beat_fraction / 4.0,
            SnapResolution::Triplet => beat_fraction / 3.0,
            SnapResolution::Adaptive => beat_fraction / 4.0,
        }
    }

    pub fn snap(self, raw_bar: f64, signature: TimeSignature) -> f64 {
        let step = self.grid_fraction(signature);
        if step <= 0.0 {
            return raw_bar;
        }
        let bar_index = (raw_bar - 1.0) / step;
        1.0 + bar_index.round() * step
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn snap_to_bar_rounds_to_whole_bars() {
        let sig = TimeSignature::four_four();
        assert_relative_eq!(SnapResolution::Bar.snap(2.4, sig), 2.0);
        assert_relative_eq!(SnapResolution::Bar.snap(2.6, sig), 3.0);
    }

    #[test]
    fn snap_to_quarter_rounds_to_nearest_beat() {
        let sig = TimeSignature::four_four();
        // beat fraction = 0.25 bar; 2.1 is closest to 2.0 (beat 1 of bar 2)
        assert_relative_eq!(SnapResolution::Quarter.snap(2.1, sig), 2.0, epsilon = 1e-9);
        assert_relative_eq!(SnapResolution::Quarter.snap(2.2, sig), 2.25, epsilon = 1e-9);
    }

    #[test]
    fn snap_to_sixteenth_is_finer_than_quarter() {
        let sig = TimeSignature::four_four();
        let snapped = SnapResolution::Sixteenth.snap(2.05, sig);
        assert_relative_eq!(snapped, 2.0625, epsilon = 1e-9);
    }
}
