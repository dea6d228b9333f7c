//! Learn flow (§4.8 item 4), modeled as a state machine owned by the
//! control thread rather than a chain of one-shot closures (§9 "closures
//! as wiring").

use crate::routing::{ParameterMapping, RoutingTable};
use crate::trigger::MidiTrigger;
use vamp_core::score::EffectPath;

/// What the next captured trigger should be bound to.
#[derive(Debug, Clone)]
pub enum LearnTarget {
    Control(crate::routing::MappableControl),
    Continuous(crate::routing::ContinuousControl),
    Parameter { path: EffectPath, min: f32, max: f32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LearnState {
    Idle,
    Armed,
}

/// Learn mode is mutually exclusive: arming a new learn replaces whatever
/// was previously armed, and any existing mapping to the captured trigger
/// is replaced rather than appended to.
pub struct LearnSession {
    state: LearnState,
    target: Option<LearnTarget>,
}

impl LearnSession {
    pub fn new() -> Self {
        Self {
            state: LearnState::Idle,
            target: None,
        }
    }

    pub fn state(&self) -> &LearnState {
        &self.state
    }

    pub fn start(&mut self, target: LearnTarget) {
        self.target = Some(target);
        self.state = LearnState::Armed;
    }

    pub fn cancel(&mut self) {
        self.target = None;
        self.state = LearnState::Idle;
    }

    /// Feed the next incoming trigger. If learn is armed, this captures
    /// it into `table`, replacing any existing mapping to that trigger,
    /// and returns the bound trigger. Otherwise returns `None` and the
    /// caller should fall through to normal dispatch.
    pub fn capture(&mut self, trigger: MidiTrigger, table: &mut RoutingTable) -> Option<MidiTrigger> {
        if self.state != LearnState::Armed {
            return None;
        }
        let target = self.target.take()?;
        table.remove_mapping(trigger);
        match target {
            LearnTarget::Control(c) => table.map_control(trigger, c),
            LearnTarget::Continuous(c) => table.map_continuous(trigger, c),
            LearnTarget::Parameter { path, min, max } => {
                table.add_parameter_mapping(trigger, ParameterMapping { path, min, max })
            }
        }
        self.state = LearnState::Idle;
        Some(trigger)
    }
}

impl Default for LearnSession {
    fn default() -> Self {
        Self::new()
    }
}
