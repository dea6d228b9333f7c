//! vamp-automation: sample-accurate evaluation of automation breakpoint
//! envelopes into `setParameter` calls.
//!
//! This crate owns no RT-thread state of its own: the umbrella engine
//! calls [`evaluator::AutomationEvaluator`] once per callback, after the
//! scheduler has resolved which containers are active, and feeds its
//! output into the same [`vamp_core::scheduler::ActionSink`] the action
//! dispatcher uses.

pub mod error;
pub mod evaluator;

pub use error::{Error, Result};
pub use evaluator::AutomationEvaluator;

use vamp_core::score::AutomationLane;

/// Reject a lane whose breakpoints aren't strictly increasing in position.
/// `vamp-core`'s own `validate_project` runs the same check project-wide
/// before a snapshot is ever published; this is for validating a single
/// edit (e.g. a UI breakpoint drag) before it's folded into one.
pub fn validate_lane(lane: &AutomationLane) -> Result<()> {
    if lane.is_sorted() {
        Ok(())
    } else {
        Err(Error::UnsortedBreakpoints(lane.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vamp_core::ids::{AutomationLaneId, TrackId};
    use vamp_core::score::{AutomationBreakpoint, CurveType, EffectPath, EffectTarget};

    fn lane(positions: &[f64]) -> AutomationLane {
        AutomationLane {
            id: AutomationLaneId(1),
            target: EffectPath {
                track_id: TrackId(1),
                target: EffectTarget::Effect(0),
                parameter_address: "gain".into(),
            },
            breakpoints: positions
                .iter()
                .map(|&p| AutomationBreakpoint {
                    position_bars: p,
                    value: 0.5,
                    curve: CurveType::Linear,
                })
                .collect(),
        }
    }

    #[test]
    fn sorted_lane_validates() {
        assert!(validate_lane(&lane(&[0.0, 1.0, 2.0])).is_ok());
    }

    #[test]
    fn unsorted_lane_is_rejected() {
        assert!(validate_lane(&lane(&[0.0, 2.0, 1.0])).is_err());
    }
}
