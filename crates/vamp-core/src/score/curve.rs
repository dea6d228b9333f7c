use serde::{Deserialize, Serialize};

/// Interpolation shape shared by fades, crossfades, and automation breakpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CurveType {
    Linear,
    Exponential,
    Logarithmic,
    EqualPower,
    Hold,
}

impl CurveType {
    /// Interpolate between `a` and `b` at normalized position `t` in [0, 1].
    pub fn interpolate(self, a: f32, b: f32, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            CurveType::Linear => a + (b - a) * t,
            CurveType::Exponential => {
                let a = a.max(1e-6);
                let b = b.max(1e-6);
                a * (b / a).powf(t)
            }
            CurveType::Logarithmic => {
                if t <= 0.0 {
                    a
                } else {
                    let log_t = (1.0 + 9.0 * t).log10();
                    a + (b - a) * log_t
                }
            }
            CurveType::EqualPower => {
                let angle = t * std::f32::consts::FRAC_PI_2;
                a * angle.cos() + b * angle.sin()
            }
            CurveType::Hold => a,
        }
    }
}

impl Default for CurveType {
    fn default() -> Self {
        CurveType::Linear
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn linear_interpolates_midpoint() {
        assert_relative_eq!(CurveType::Linear.interpolate(0.0, 1.0, 0.5), 0.5);
    }

    #[test]
    fn hold_ignores_t() {
        assert_relative_eq!(CurveType::Hold.interpolate(0.2, 0.9, 0.75), 0.2);
    }

    #[test]
    fn endpoints_are_exact() {
        for curve in [
            CurveType::Linear,
            CurveType::Exponential,
            CurveType::EqualPower,
        ] {
            assert_relative_eq!(curve.interpolate(0.3, 0.8, 0.0), 0.3, epsilon = 1e-5);
            assert_relative_eq!(curve.interpolate(0.3, 0.8, 1.0), 0.8, epsilon = 1e-5);
        }
    }
}
