//! Opaque identifiers for score model entities.
//!
//! Every id is a newtype over `u64` so tracks, containers, markers and
//! automation lanes cannot be confused for one another at a call site.
//! Ids are allocated by a single monotonic counter on the control thread;
//! the audio thread only ever compares them.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

macro_rules! entity_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl $name {
            pub const fn raw(self) -> u64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

entity_id!(TrackId);
entity_id!(ContainerId);
entity_id!(AutomationLaneId);
entity_id!(MarkerId);
entity_id!(SourceRecordingId);

/// Monotonic id allocator shared by every entity kind in a `ScoreModel`.
///
/// Tutti's node registry uses the same single-counter-per-graph pattern;
/// here one counter is shared across all entity kinds since ids only need
/// to be unique within a session, never densely packed per kind.
#[derive(Debug, Default)]
pub struct IdAllocator {
    next: AtomicU64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    pub fn alloc_track(&self) -> TrackId {
        TrackId(self.next.fetch_add(1, Ordering::Relaxed))
    }

    pub fn alloc_container(&self) -> ContainerId {
        ContainerId(self.next.fetch_add(1, Ordering::Relaxed))
    }

    pub fn alloc_automation_lane(&self) -> AutomationLaneId {
        AutomationLaneId(self.next.fetch_add(1, Ordering::Relaxed))
    }

    pub fn alloc_marker(&self) -> MarkerId {
        MarkerId(self.next.fetch_add(1, Ordering::Relaxed))
    }

    pub fn alloc_source_recording(&self) -> SourceRecordingId {
        SourceRecordingId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_monotonic() {
        let alloc = IdAllocator::new();
        let a = alloc.alloc_track();
        let b = alloc.alloc_container();
        let c = alloc.alloc_track();
        assert!(a.raw() < b.raw());
        assert!(b.raw() < c.raw());
    }
}
