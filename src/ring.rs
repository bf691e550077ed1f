// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixed-capacity ring of screen snapshots used to detect stability.

use chrono::{DateTime, Utc};

/// A timestamped screen reading. See spec.md §3.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenSnapshot {
    pub timestamp: DateTime<Utc>,
    pub screen: String,
}

/// Fixed-capacity circular buffer of the most recent screen snapshots.
///
/// Capacity equals the conversation's stability threshold (spec.md §4.4):
/// the screen is considered stable once the ring is full and every entry
/// is byte-identical.
#[derive(Debug)]
pub struct SnapshotRing {
    capacity: usize,
    buf: Vec<ScreenSnapshot>,
}

impl SnapshotRing {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "snapshot ring capacity must be positive");
        Self { capacity, buf: Vec::with_capacity(capacity) }
    }

    /// Push a new snapshot, discarding the oldest once at capacity.
    pub fn push(&mut self, snapshot: ScreenSnapshot) {
        if self.buf.len() == self.capacity {
            self.buf.remove(0);
        }
        self.buf.push(snapshot);
    }

    /// Whether the ring has accumulated a full window of snapshots yet.
    pub fn is_full(&self) -> bool {
        self.buf.len() == self.capacity
    }

    /// Whether every snapshot currently held is byte-identical. Empty and
    /// partially-filled rings are never considered stable by this check
    /// alone — callers must also check [`Self::is_full`].
    pub fn all_equal(&self) -> bool {
        match self.buf.split_first() {
            None => false,
            Some((first, rest)) => rest.iter().all(|s| s.screen == first.screen),
        }
    }

    /// The most recently pushed snapshot, if any.
    pub fn latest(&self) -> Option<&ScreenSnapshot> {
        self.buf.last()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

/// Derive the stability threshold from §4.4: `ceil(stability_length /
/// snapshot_interval) + 1`.
pub fn stability_threshold(
    screen_stability_length: std::time::Duration,
    snapshot_interval: std::time::Duration,
) -> usize {
    let stability_ms = screen_stability_length.as_millis().max(1);
    let interval_ms = snapshot_interval.as_millis().max(1);
    let divided = stability_ms.div_ceil(interval_ms);
    (divided as usize) + 1
}

#[cfg(test)]
#[path = "ring_tests.rs"]
mod tests;
