// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Injectable time source for [`ConversationMessage`](crate::message::ConversationMessage)
//! and [`ScreenSnapshot`](crate::ring::ScreenSnapshot) timestamps. Interval
//! ticking and timeouts still go through `tokio::time`, which tests control
//! with `tokio::time::pause`/`advance`; `Clock` only covers wall-clock stamps.

use chrono::{DateTime, Utc};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Real wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealClock;

impl Clock for RealClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Deterministic clock for tests: starts at a fixed instant and only moves
/// when [`FakeClock::advance`] is called.
pub struct FakeClock(parking_lot::Mutex<DateTime<Utc>>);

impl FakeClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self(parking_lot::Mutex::new(start))
    }

    pub fn advance(&self, delta: chrono::Duration) {
        let mut t = self.0.lock();
        *t += delta;
    }
}

impl Clock for FakeClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock()
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
