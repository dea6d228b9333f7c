//! Transport state machine: `Stopped -> CountIn -> Playing`, with `Paused`
//! reachable only from `Playing`. Structured after the teacher's
//! `TransportFSM` (event in, `TransitionResult` out), trimmed to the
//! states the looper actually needs.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Stopped,
    CountIn { bars_remaining: u32 },
    Playing,
    Paused,
}

impl Default for TransportState {
    fn default() -> Self {
        TransportState::Stopped
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransportEvent {
    Play,
    Stop,
    Pause,
    Resume,
    /// Fired by the scheduler on every bar-boundary crossing while in `CountIn`.
    BarElapsed,
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionResult {
    None,
    StateChanged(TransportState),
}

pub struct TransportFsm {
    state: TransportState,
    count_in_bars: u32,
}

impl TransportFsm {
    pub fn new(count_in_bars: u32) -> Self {
        Self {
            state: TransportState::Stopped,
            count_in_bars,
        }
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn set_count_in_bars(&mut self, bars: u32) {
        self.count_in_bars = bars;
    }

    pub fn transition(&mut self, event: TransportEvent) -> TransitionResult {
        use TransportEvent::*;
        use TransportState::*;

        let next = match (self.state, event) {
            (Stopped, Play) => {
                if self.count_in_bars > 0 {
                    CountIn {
                        bars_remaining: self.count_in_bars,
                    }
                } else {
                    Playing
                }
            }
            (CountIn { bars_remaining }, BarElapsed) => {
                if bars_remaining <= 1 {
                    Playing
                } else {
                    CountIn {
                        bars_remaining: bars_remaining - 1,
                    }
                }
            }
            (CountIn { .. }, Stop) => Stopped,
            (Playing, Pause) => Paused,
            (Paused, Resume) => Playing,
            (Paused, Stop) => Stopped,
            (Playing, Stop) => Stopped,
            (_, Shutdown) => Stopped,
            (current, _) => current,
        };

        if next == self.state {
            TransitionResult::None
        } else {
            self.state = next;
            TransitionResult::StateChanged(next)
        }
    }
}

impl Default for TransportFsm {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stopped_with_no_count_in_goes_straight_to_playing() {
        let mut fsm = TransportFsm::new(0);
        let result = fsm.transition(TransportEvent::Play);
        assert_eq!(result, TransitionResult::StateChanged(TransportState::Playing));
    }

    #[test]
    fn count_in_counts_down_then_plays() {
        let mut fsm = TransportFsm::new(2);
        fsm.transition(TransportEvent::Play);
        assert_eq!(
            fsm.state(),
            TransportState::CountIn { bars_remaining: 2 }
        );
        fsm.transition(TransportEvent::BarElapsed);
        assert_eq!(
            fsm.state(),
            TransportState::CountIn { bars_remaining: 1 }
        );
        fsm.transition(TransportEvent::BarElapsed);
        assert_eq!(fsm.state(), TransportState::Playing);
    }

    #[test]
    fn pause_resume_round_trips() {
        let mut fsm = TransportFsm::new(0);
        fsm.transition(TransportEvent::Play);
        fsm.transition(TransportEvent::Pause);
        assert_eq!(fsm.state(), TransportState::Paused);
        fsm.transition(TransportEvent::Resume);
        assert_eq!(fsm.state(), TransportState::Playing);
    }

    #[test]
    fn shutdown_stops_from_any_state() {
        let mut fsm = TransportFsm::new(1);
        fsm.transition(TransportEvent::Play);
        fsm.transition(TransportEvent::Shutdown);
        assert_eq!(fsm.state(), TransportState::Stopped);
    }

    #[test]
    fn stop_during_count_in_returns_to_stopped() {
        let mut fsm = TransportFsm::new(4);
        fsm.transition(TransportEvent::Play);
        fsm.transition(TransportEvent::Stop);
        assert_eq!(fsm.state(), TransportState::Stopped);
    }
}
