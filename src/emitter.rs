// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Multi-subscriber fan-out of conversation events with bounded per-subscriber
//! buffers and replay-on-subscribe. One [`EventEmitter`] is shared by the
//! Conversation (producer) and the HTTP SSE handlers (consumers).

use std::collections::{HashMap, VecDeque};

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::debug;

use crate::conversation::clock::Clock;
use crate::conversation::ConversationStatus;
use crate::message::ConversationMessage;

/// Default per-subscriber channel capacity (spec.md §4.6).
pub const DEFAULT_BUFFER: usize = 1024;
const MAX_RETAINED_ERRORS: usize = 100;

pub type SubscriberId = u64;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorLevel {
    Warn,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorEvent {
    pub time: chrono::DateTime<chrono::Utc>,
    pub level: ErrorLevel,
    pub message: String,
}

/// One item in a subscriber's channel, or replayed to a new subscriber.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    MessageUpdate(ConversationMessage),
    StatusChange(ConversationStatus),
    ScreenUpdate(String),
    Error(ErrorEvent),
}

struct Inner {
    last_messages: Vec<ConversationMessage>,
    last_status: Option<ConversationStatus>,
    last_screen: Option<String>,
    errors: VecDeque<ErrorEvent>,
    subscribers: HashMap<SubscriberId, mpsc::Sender<Event>>,
    next_id: SubscriberId,
    buffer: usize,
}

pub struct EventEmitter {
    clock: Box<dyn Clock>,
    inner: Mutex<Inner>,
}

impl EventEmitter {
    pub fn new(clock: Box<dyn Clock>) -> Self {
        Self::with_buffer(clock, DEFAULT_BUFFER)
    }

    pub fn with_buffer(clock: Box<dyn Clock>, buffer: usize) -> Self {
        Self {
            clock,
            inner: Mutex::new(Inner {
                last_messages: Vec::new(),
                last_status: None,
                last_screen: None,
                errors: VecDeque::new(),
                subscribers: HashMap::new(),
                next_id: 0,
                buffer,
            }),
        }
    }

    /// Register a new subscriber. Returns its id, a channel to read live
    /// events from, and the replay batch the caller must process first:
    /// one `MessageUpdate` per current message, then `StatusChange`, then
    /// `ScreenUpdate`, then all retained errors in chronological order.
    pub fn subscribe(&self) -> (SubscriberId, mpsc::Receiver<Event>, Vec<Event>) {
        let mut inner = self.inner.lock();
        let id = inner.next_id;
        inner.next_id += 1;

        let mut replay = Vec::with_capacity(inner.last_messages.len() + inner.errors.len() + 2);
        for msg in &inner.last_messages {
            replay.push(Event::MessageUpdate(msg.clone()));
        }
        if let Some(status) = inner.last_status {
            replay.push(Event::StatusChange(status));
        }
        if let Some(ref screen) = inner.last_screen {
            replay.push(Event::ScreenUpdate(screen.clone()));
        }
        for err in &inner.errors {
            replay.push(Event::Error(err.clone()));
        }

        let (tx, rx) = mpsc::channel(inner.buffer);
        inner.subscribers.insert(id, tx);
        (id, rx, replay)
    }

    pub fn unsubscribe(&self, id: SubscriberId) {
        self.inner.lock().subscribers.remove(&id);
    }

    /// Diff `new` against the previously emitted message list position-wise
    /// and fan out a `MessageUpdate` for every changed or appended index.
    pub fn emit_messages(&self, new: &[ConversationMessage]) {
        let mut inner = self.inner.lock();
        let max_len = new.len().max(inner.last_messages.len());
        for i in 0..max_len {
            let changed = match (new.get(i), inner.last_messages.get(i)) {
                (Some(n), Some(o)) => n != o,
                (Some(_), None) => true,
                (None, _) => false,
            };
            if changed {
                if let Some(msg) = new.get(i) {
                    fan_out(&mut inner, Event::MessageUpdate(msg.clone()));
                }
            }
        }
        inner.last_messages = new.to_vec();
    }

    pub fn emit_status(&self, status: ConversationStatus) {
        let mut inner = self.inner.lock();
        if inner.last_status == Some(status) {
            return;
        }
        inner.last_status = Some(status);
        fan_out(&mut inner, Event::StatusChange(status));
    }

    pub fn emit_screen(&self, screen: &str) {
        let screen = screen.trim_end().to_string();
        let mut inner = self.inner.lock();
        if inner.last_screen.as_deref() == Some(screen.as_str()) {
            return;
        }
        inner.last_screen = Some(screen.clone());
        fan_out(&mut inner, Event::ScreenUpdate(screen));
    }

    pub fn emit_error(&self, message: impl Into<String>, level: ErrorLevel) {
        let event = ErrorEvent { time: self.clock.now(), level, message: message.into() };
        let mut inner = self.inner.lock();
        if inner.errors.len() >= MAX_RETAINED_ERRORS {
            inner.errors.pop_front();
        }
        inner.errors.push_back(event.clone());
        fan_out(&mut inner, Event::Error(event));
    }
}

/// Non-blocking send to every subscriber; a full channel means the
/// subscriber is dropped rather than backpressuring the producer.
fn fan_out(inner: &mut Inner, event: Event) {
    inner.subscribers.retain(|id, tx| match tx.try_send(event.clone()) {
        Ok(()) => true,
        Err(mpsc::error::TrySendError::Full(_)) => {
            debug!(subscriber = id, "dropping slow subscriber");
            false
        }
        Err(mpsc::error::TrySendError::Closed(_)) => false,
    });
}

#[cfg(test)]
#[path = "emitter_tests.rs"]
mod tests;
