//! Raw monitor and per-track activity timestamps (§4.8 item 1).
//!
//! Every incoming message is appended to a bounded circular log (~500
//! entries) regardless of whether anything is mapped to it, and any track
//! whose MIDI input filter matches the message's device+channel gets its
//! last-activity timestamp bumped. A track reads as "active" for ~300ms
//! after its last match.

use crate::trigger::MidiMessage;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

pub const LOG_CAPACITY: usize = 500;
pub const ACTIVITY_WINDOW: Duration = Duration::from_millis(300);

#[derive(Debug, Clone)]
pub struct LoggedMessage {
    pub source_device: String,
    pub message: MidiMessage,
    pub at: Instant,
}

/// Bounded circular log of every message seen on input, for UI display.
pub struct RawMonitor {
    log: VecDeque<LoggedMessage>,
    capacity: usize,
}

impl RawMonitor {
    pub fn new(capacity: usize) -> Self {
        Self {
            log: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn record(&mut self, source_device: impl Into<String>, message: MidiMessage) {
        if self.log.len() == self.capacity {
            self.log.pop_front();
        }
        self.log.push_back(LoggedMessage {
            source_device: source_device.into(),
            message,
            at: Instant::now(),
        });
    }

    /// Most recent entries first, for a UI that shows the newest events at
    /// the top.
    pub fn recent(&self) -> impl Iterator<Item = &LoggedMessage> {
        self.log.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }
}

impl Default for RawMonitor {
    fn default() -> Self {
        Self::new(LOG_CAPACITY)
    }
}

/// Tracks the last time each track id saw a matching message.
#[derive(Default)]
pub struct ActivityMonitor {
    last_seen: std::collections::HashMap<u64, Instant>,
}

impl ActivityMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&mut self, track_raw_id: u64) {
        self.last_seen.insert(track_raw_id, Instant::now());
    }

    pub fn is_active(&self, track_raw_id: u64) -> bool {
        self.last_seen
            .get(&track_raw_id)
            .map(|t| t.elapsed() < ACTIVITY_WINDOW)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_wraps_at_capacity() {
        let mut monitor = RawMonitor::new(2);
        for i in 0..4u8 {
            monitor.record(
                "dev",
                MidiMessage::NoteOn {
                    channel: 0,
                    note: i,
                    velocity: 100,
                },
            );
        }
        assert_eq!(monitor.len(), 2);
        let notes: Vec<u8> = monitor
            .recent()
            .map(|m| match m.message {
                MidiMessage::NoteOn { note, .. } => note,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(notes, vec![3, 2]);
    }

    #[test]
    fn freshly_marked_track_is_active() {
        let mut activity = ActivityMonitor::new();
        assert!(!activity.is_active(1));
        activity.mark(1);
        assert!(activity.is_active(1));
    }
}
