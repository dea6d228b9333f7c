use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// A musical time signature, e.g. 4/4 or 7/8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSignature {
    pub beats_per_bar: u8,
    pub beat_unit: u8,
}

impl TimeSignature {
    pub fn new(beats_per_bar: u8, beat_unit: u8) -> Result<Self> {
        if beats_per_bar == 0 || beat_unit == 0 || !beat_unit.is_power_of_two() {
            return Err(Error::InvalidSignature {
                numerator: beats_per_bar,
                denominator: beat_unit,
            });
        }
        Ok(Self {
            beats_per_bar,
            beat_unit,
        })
    }

    pub const fn four_four() -> Self {
        Self {
            beats_per_bar: 4,
            beat_unit: 4,
        }
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::four_four()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_denominator() {
        assert!(TimeSignature::new(4, 0).is_err());
    }

    #[test]
    fn rejects_non_power_of_two_unit() {
        assert!(TimeSignature::new(4, 3).is_err());
    }

    #[test]
    fn accepts_seven_eight() {
        let sig = TimeSignature::new(7, 8).unwrap();
        assert_eq!(sig.beats_per_bar, 7);
        assert_eq!(sig.beat_unit, 8);
    }
}
