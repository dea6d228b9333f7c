//! Transport: owns the playhead, runs count-ins, and keeps a UI-facing
//! "published bar" phase-locked to the audio actually leaving the driver.
//!
//! State lives entirely in cache-line-aligned atomics so the audio thread
//! never takes a lock to advance or observe it, matching the teacher's
//! `TransportManager` (atomics) / `TransportFSM` (pure state machine) split
//! — here the FSM's enum is encoded into a couple of atomics rather than
//! mutex-guarded, since only the audio thread ever writes them.

use crate::lockfree::{AtomicDouble, AtomicFlag, AtomicSampleCounter};
use crate::time::TimeMap;
use crate::transport::fsm::{TransportEvent, TransportFsm, TransportState, TransitionResult};
use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};

const STATE_STOPPED: u8 = 0;
const STATE_COUNT_IN: u8 = 1;
const STATE_PLAYING: u8 = 2;
const STATE_PAUSED: u8 = 3;

fn encode(state: TransportState) -> (u8, u32) {
    match state {
        TransportState::Stopped => (STATE_STOPPED, 0),
        TransportState::CountIn { bars_remaining } => (STATE_COUNT_IN, bars_remaining),
        TransportState::Playing => (STATE_PLAYING, 0),
        TransportState::Paused => (STATE_PAUSED, 0),
    }
}

fn decode(tag: u8, bars_remaining: u32) -> TransportState {
    match tag {
        STATE_COUNT_IN => TransportState::CountIn { bars_remaining },
        STATE_PLAYING => TransportState::Playing,
        STATE_PAUSED => TransportState::Paused,
        _ => TransportState::Stopped,
    }
}

pub struct TransportManager {
    fsm: std::cell::UnsafeCell<TransportFsm>,
    state_tag: AtomicU8,
    count_in_remaining: AtomicU32,

    sample_position: AtomicSampleCounter,
    output_latency_samples: std::sync::atomic::AtomicU64,
    published_bar: AtomicDouble,

    loop_enabled: AtomicFlag,
    loop_start_bar: AtomicDouble,
    loop_end_bar: AtomicDouble,

    underrun_count: AtomicSampleCounter,
}

// SAFETY: `fsm` is only ever touched from the audio thread (the single
// consumer of the RT command queue that drives its transitions); every
// other thread observes transport state exclusively through the atomics
// above. This mirrors the teacher's `unsafe impl Send` justification for
// its single-threaded-access RT state.
unsafe impl Sync for TransportManager {}

impl TransportManager {
    pub fn new(count_in_bars: u32) -> Self {
        Self {
            fsm: std::cell::UnsafeCell::new(TransportFsm::new(count_in_bars)),
            state_tag: AtomicU8::new(STATE_STOPPED),
            count_in_remaining: AtomicU32::new(0),
            sample_position: AtomicSampleCounter::new(0),
            output_latency_samples: std::sync::atomic::AtomicU64::new(0),
            published_bar: AtomicDouble::new(1.0),
            loop_enabled: AtomicFlag::new(false),
            loop_start_bar: AtomicDouble::new(0.0),
            loop_end_bar: AtomicDouble::new(0.0),
            underrun_count: AtomicSampleCounter::new(0),
        }
    }

    /// Audio-thread only: apply a transport event and publish the result.
    pub fn apply(&self, event: TransportEvent) -> TransitionResult {
        // SAFETY: single-writer invariant documented on the struct.
        let fsm = unsafe { &mut *self.fsm.get() };
        let result = fsm.transition(event);
        if let TransitionResult::StateChanged(state) = result {
            let (tag, remaining) = encode(state);
            self.state_tag.store(tag, Ordering::Release);
            self.count_in_remaining.store(remaining, Ordering::Release);
        }
        result
    }

    pub fn state(&self) -> TransportState {
        decode(
            self.state_tag.load(Ordering::Acquire),
            self.count_in_remaining.load(Ordering::Acquire),
        )
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.state(), TransportState::Playing)
    }

    pub fn is_count_in(&self) -> bool {
        matches!(self.state(), TransportState::CountIn { .. })
    }

    /// Audio-thread only: change how many bars the next count-in runs for.
    /// Takes effect the next time the transport transitions out of
    /// `Stopped`; a count-in already in progress keeps counting down from
    /// whatever it started with.
    pub fn set_count_in_bars(&self, bars: u32) {
        // SAFETY: single-writer invariant documented on the struct.
        let fsm = unsafe { &mut *self.fsm.get() };
        fsm.set_count_in_bars(bars);
    }

    /// Audio-thread only: advance the authoritative sample position by
    /// `frames` and republish the UI-facing bar, offset by the driver's
    /// output latency so the playhead matches what is actually audible.
    pub fn advance(&self, frames: u64, time_map: &TimeMap) {
        let new_position = self.sample_position.fetch_add(frames) + frames;
        let latency = self.output_latency_samples.load(Ordering::Acquire);
        let audible_position = new_position.saturating_sub(latency);
        self.published_bar
            .set(time_map.bar_at(audible_position));
    }

    /// Audio-thread only: apply a hard seek to an absolute sample position.
    pub fn seek_samples(&self, samples: u64) {
        self.sample_position.set(samples);
    }

    pub fn rt_sample_position(&self) -> u64 {
        self.sample_position.get()
    }

    pub fn published_bar(&self) -> f64 {
        self.published_bar.get()
    }

    pub fn set_output_latency_samples(&self, latency: u64) {
        self.output_latency_samples.store(latency, Ordering::Release);
    }

    pub fn set_loop(&self, range: Option<(f64, f64)>) {
        match range {
            Some((lo, hi)) => {
                self.loop_start_bar.set(lo);
                self.loop_end_bar.set(hi);
                self.loop_enabled.set(true);
            }
            None => self.loop_enabled.set(false),
        }
    }

    pub fn loop_range(&self) -> Option<(f64, f64)> {
        if self.loop_enabled.get() {
            Some((self.loop_start_bar.get(), self.loop_end_bar.get()))
        } else {
            None
        }
    }

    /// Audio-thread only: whether the playhead (expressed as a bar) has
    /// crossed the loop end boundary, and if so, where it should wrap to.
    pub fn loop_wrap_target(&self, current_bar: f64) -> Option<f64> {
        let (lo, hi) = self.loop_range()?;
        if hi > lo && current_bar >= hi {
            let overshoot = current_bar - hi;
            let length = hi - lo;
            Some(lo + overshoot % length)
        } else {
            None
        }
    }

    pub fn record_underrun(&self) {
        self.underrun_count.fetch_add(1);
    }

    pub fn underrun_count(&self) -> u64 {
        self.underrun_count.get()
    }
}

impl Default for TransportManager {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::TimeSignature;
    use approx::assert_relative_eq;

    fn map() -> TimeMap {
        TimeMap::new(44_100.0, 120.0, TimeSignature::four_four())
    }

    #[test]
    fn play_with_no_count_in_goes_straight_to_playing() {
        let t = TransportManager::new(0);
        t.apply(TransportEvent::Play);
        assert!(t.is_playing());
    }

    #[test]
    fn advance_publishes_latency_adjusted_bar() {
        let t = TransportManager::new(0);
        t.set_output_latency_samples(4_410); // 0.1s
        t.apply(TransportEvent::Play);
        t.advance(44_100, &map()); // one second of audio rendered
        let published = t.published_bar();
        // audible position = 44100 - 4410 = 39690 samples
        let expected = map().bar_at(39_690);
        assert_relative_eq!(published, expected, epsilon = 1e-9);
    }

    #[test]
    fn loop_wrap_preserves_overshoot() {
        let t = TransportManager::new(0);
        t.set_loop(Some((1.0, 5.0)));
        let wrapped = t.loop_wrap_target(5.25).unwrap();
        assert_relative_eq!(wrapped, 1.25);
    }

    #[test]
    fn loop_disabled_never_wraps() {
        let t = TransportManager::new(0);
        assert!(t.loop_wrap_target(100.0).is_none());
    }

    #[test]
    fn underrun_counter_accumulates() {
        let t = TransportManager::new(0);
        t.record_underrun();
        t.record_underrun();
        assert_eq!(t.underrun_count(), 2);
    }
}
