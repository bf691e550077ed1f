// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The PTY-backed Conversation: the core state machine of spec.md §4.4.
//! A snapshot task polls the screen and maintains the last agent message;
//! a send task drains a capacity-1 outbound queue, writes to the terminal,
//! and waits for it to stabilize. The two communicate only through
//! [`Inner`] under `state` and a coalescing [`tokio::sync::Notify`].

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::{oneshot, Notify};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::diff;
use crate::emitter::{ErrorLevel, EventEmitter};
use crate::error::{ApiError, ErrorCode};
use crate::formatter;
use crate::message::{raw_parts, render_parts, wrap_bracketed_paste, ConversationMessage, MessagePart, Role};
use crate::pty::TerminalProcess;
use crate::ring::{stability_threshold, ScreenSnapshot, SnapshotRing};

use super::{Config, Conversation, ConversationStatus};

struct OutboundItem {
    parts: Vec<MessagePart>,
    respond: oneshot::Sender<Result<(), ApiError>>,
}

struct Inner {
    messages: Vec<ConversationMessage>,
    ring: SnapshotRing,
    screen_before_last_user_message: String,
    pending_outbound: Option<OutboundItem>,
    send_in_flight: bool,
    dirty: bool,
    ready_latched: bool,
    load_attempted: bool,
    suppress_diff_until_user_message: bool,
    seen_tool_calls: HashSet<String>,
}

pub struct PtyConversation {
    config: Config,
    terminal: Arc<dyn TerminalProcess>,
    emitter: Arc<EventEmitter>,
    state: Mutex<Inner>,
    /// Notified once whenever the outbound slot frees up, so blocked
    /// `send()` callers can retry enqueuing.
    slot_freed: Notify,
    /// Single-slot, coalescing: the snapshot task notifies the send task
    /// exactly when the queue is non-empty and the screen is stable.
    stability_signal: Notify,
    shutdown: CancellationToken,
}

impl PtyConversation {
    pub fn new(
        config: Config,
        terminal: Arc<dyn TerminalProcess>,
        emitter: Arc<EventEmitter>,
        shutdown: CancellationToken,
    ) -> Self {
        let threshold = stability_threshold(config.screen_stability_length, config.snapshot_interval);
        let now = config.clock.now();
        let messages = vec![ConversationMessage::new(0, Role::Agent, String::new(), now)];

        let pending_outbound = if config.initial_prompt.is_empty() {
            None
        } else {
            let (respond, _unawaited) = oneshot::channel();
            Some(OutboundItem { parts: config.initial_prompt.clone(), respond })
        };

        let inner = Inner {
            messages,
            ring: SnapshotRing::new(threshold),
            screen_before_last_user_message: String::new(),
            pending_outbound,
            send_in_flight: false,
            dirty: false,
            ready_latched: false,
            load_attempted: false,
            suppress_diff_until_user_message: false,
            seen_tool_calls: HashSet::new(),
        };

        Self {
            config,
            terminal,
            emitter,
            state: Mutex::new(inner),
            slot_freed: Notify::new(),
            stability_signal: Notify::new(),
            shutdown,
        }
    }

    fn agent_type(&self) -> crate::agent_type::AgentType {
        self.config.agent_type
    }

    async fn send_impl(&self, parts: Vec<MessagePart>) -> Result<(), ApiError> {
        let rendered = render_parts(&parts);
        if rendered != rendered.trim() {
            return Err(ApiError::new(ErrorCode::Whitespace, "message must not have leading or trailing whitespace"));
        }
        if rendered.trim().is_empty() {
            return Err(ApiError::new(ErrorCode::Empty, "message must not be empty"));
        }
        if self.status() != ConversationStatus::Stable {
            return Err(ApiError::new(ErrorCode::Changing, "conversation is not stable"));
        }

        let (respond, result_rx) = oneshot::channel();
        loop {
            {
                let mut st = self.state.lock();
                if st.pending_outbound.is_none() {
                    st.pending_outbound = Some(OutboundItem { parts, respond });
                    break;
                }
            }
            self.slot_freed.notified().await;
        }

        result_rx.await.map_err(|_| ApiError::new(ErrorCode::Internal, "conversation shut down before send completed"))?
    }

    async fn snapshot_loop(&self) {
        let mut interval = tokio::time::interval(self.config.snapshot_interval);
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => return,
                _ = interval.tick() => self.snapshot_tick().await,
            }
        }
    }

    async fn snapshot_tick(&self) {
        let screen = self.terminal.read_screen();
        let now = self.config.clock.now();
        let mut signal_send = false;

        let (messages, status) = {
            let mut st = self.state.lock();
            st.ring.push(ScreenSnapshot { timestamp: now, screen: screen.clone() });

            self.update_last_agent_message(&mut st, &screen);

            if !st.ready_latched && formatter::is_ready_for_initial_prompt(&screen, self.agent_type()) {
                st.ready_latched = true;
                if self.config.state_persistence.load_on_start && !st.load_attempted {
                    st.load_attempted = true;
                    self.try_load_state(&mut st, &screen);
                }
            }

            if st.ready_latched {
                let queue_non_empty = st.pending_outbound.is_some();
                let screen_stable_now = st.ring.is_full() && st.ring.all_equal();
                if queue_non_empty && screen_stable_now && !st.send_in_flight {
                    st.send_in_flight = true;
                    signal_send = true;
                }
            }

            let last_is_user = matches!(st.messages.last(), Some(m) if m.role == Role::User);
            let queue_or_inflight = st.pending_outbound.is_some() || st.send_in_flight;
            let status = classify(last_is_user, &st.ring, queue_or_inflight);

            (st.messages.clone(), status)
        };

        if signal_send {
            self.stability_signal.notify_one();
        }

        self.emitter.emit_messages(&messages);
        self.emitter.emit_status(status);
        self.emitter.emit_screen(&screen);
    }

    /// Recompute the last agent message from a fresh screen diff. A no-op
    /// while `suppress_diff_until_user_message` holds (immediately after a
    /// state load, until the user's next message re-anchors the diff base).
    fn update_last_agent_message(&self, st: &mut Inner, screen: &str) {
        if st.suppress_diff_until_user_message {
            return;
        }

        let last_user_text =
            st.messages.iter().rev().find(|m| m.role == Role::User).map(|m| m.message.clone()).unwrap_or_default();

        let diffed = diff::diff(&st.screen_before_last_user_message, screen, self.agent_type());
        let formatted = formatter::format_message(&diffed, &last_user_text, self.agent_type());
        let (formatted, removed) = formatter::remove_tool_calls(&formatted, self.agent_type());

        for call in removed {
            if st.seen_tool_calls.insert(call.clone()) {
                debug!(tool_call = %call, "observed tool call");
            }
        }

        match st.messages.last_mut() {
            Some(last) if last.role == Role::Agent => {
                if last.message != formatted {
                    last.message = formatted;
                    st.dirty = true;
                }
            }
            _ => {
                let id = st.messages.len() as u64;
                st.messages.push(ConversationMessage::new(id, Role::Agent, formatted, self.config.clock.now()));
                st.dirty = true;
            }
        }
    }

    fn try_load_state(&self, st: &mut Inner, screen: &str) {
        let Some(path) = self.config.state_persistence.state_file.clone() else { return };
        match super::persist::load(&path) {
            Ok(Some(state)) => {
                st.messages = state.messages;
                st.dirty = false;
                st.screen_before_last_user_message = screen.to_string();
                st.suppress_diff_until_user_message = true;
                debug!(path = %path.display(), "loaded conversation state");
            }
            Ok(None) => {}
            Err(e) => {
                warn!(error = %e, "failed to load conversation state");
                self.emitter.emit_error(format!("failed to load state: {e}"), ErrorLevel::Warn);
            }
        }
    }

    async fn send_loop(&self) {
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    self.drain_on_cancel();
                    return;
                }
                _ = self.stability_signal.notified() => {
                    self.process_one_send().await;
                }
            }
        }
    }

    fn drain_on_cancel(&self) {
        let item = {
            let mut st = self.state.lock();
            st.send_in_flight = false;
            st.pending_outbound.take()
        };
        if let Some(item) = item {
            let _ = item.respond.send(Err(ApiError::new(ErrorCode::Internal, "conversation shut down")));
        }
        self.slot_freed.notify_waiters();
    }

    async fn process_one_send(&self) {
        let item = {
            let mut st = self.state.lock();
            st.pending_outbound.take()
        };
        self.slot_freed.notify_one();

        let Some(item) = item else {
            self.state.lock().send_in_flight = false;
            return;
        };

        let screen_before_message = self.terminal.read_screen();
        let prior_last_message = {
            let mut st = self.state.lock();
            self.update_last_agent_message(&mut st, &screen_before_message);
            st.messages.last().cloned()
        };

        let raw = raw_parts(&item.parts);
        let outcome = match self.terminal.write(Bytes::from(wrap_bracketed_paste(&raw))).await {
            Ok(()) => self.write_stabilize().await,
            Err(e) => Err(e),
        };

        let result = {
            let mut st = self.state.lock();
            match &outcome {
                Ok(()) => {
                    if let (Some(prior), Some(last)) = (prior_last_message, st.messages.last_mut()) {
                        *last = prior;
                    }
                    st.screen_before_last_user_message = screen_before_message;
                    let id = st.messages.len() as u64;
                    let rendered = render_parts(&item.parts);
                    st.messages.push(ConversationMessage::new(id, Role::User, rendered, self.config.clock.now()));
                    st.suppress_diff_until_user_message = false;
                    st.dirty = true;
                    Ok(())
                }
                Err(e) => Err(ApiError::new(ErrorCode::TerminalIo, e.to_string())),
            }
        };

        {
            let mut st = self.state.lock();
            st.send_in_flight = false;
        }

        let messages = self.messages();
        self.emitter.emit_messages(&messages);
        self.emitter.emit_status(self.status());
        self.emitter.emit_screen(&self.screen());

        let _ = item.respond.send(result);
    }

    /// Wait up to 15s for the screen to change and settle for 1s, then wait
    /// for it to change again after a carriage return, retrying the CR at
    /// most once every 3s. See spec.md §4.4 step 3.
    async fn write_stabilize(&self) -> anyhow::Result<()> {
        let poll_interval = Duration::from_millis(50);
        let initial = self.terminal.read_screen();

        self.wait_for_change(&initial, Duration::from_secs(15), poll_interval).await?;
        self.wait_for_settle(Duration::from_secs(1), poll_interval).await;

        let mut screen_before_cr = self.terminal.read_screen();
        let mut last_cr_at = tokio::time::Instant::now().checked_sub(Duration::from_secs(3));
        loop {
            let due = last_cr_at.map(|t| t.elapsed() >= Duration::from_secs(3)).unwrap_or(true);
            if due {
                self.terminal.write(Bytes::from_static(b"\r")).await?;
                last_cr_at = Some(tokio::time::Instant::now());
            }
            tokio::time::sleep(poll_interval).await;
            let current = self.terminal.read_screen();
            if current != screen_before_cr {
                return Ok(());
            }
            screen_before_cr = current;
        }
    }

    async fn wait_for_change(&self, from: &str, timeout: Duration, poll: Duration) -> anyhow::Result<()> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.terminal.read_screen() != from {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                anyhow::bail!("timed out waiting for screen to change");
            }
            tokio::time::sleep(poll).await;
        }
    }

    async fn wait_for_settle(&self, settle_for: Duration, poll: Duration) {
        let mut last = self.terminal.read_screen();
        let mut stable_since = tokio::time::Instant::now();
        loop {
            tokio::time::sleep(poll).await;
            let current = self.terminal.read_screen();
            if current == last {
                if stable_since.elapsed() >= settle_for {
                    return;
                }
            } else {
                last = current;
                stable_since = tokio::time::Instant::now();
            }
        }
    }
}

/// Pure status classification in the exact order spec.md §4.4 specifies.
fn classify(last_is_user: bool, ring: &SnapshotRing, queue_or_inflight: bool) -> ConversationStatus {
    if last_is_user {
        return ConversationStatus::Changing;
    }
    if !ring.is_full() {
        return ConversationStatus::Initializing;
    }
    if !ring.all_equal() {
        return ConversationStatus::Changing;
    }
    if queue_or_inflight {
        return ConversationStatus::Changing;
    }
    ConversationStatus::Stable
}

impl Conversation for PtyConversation {
    fn send<'a>(
        &'a self,
        parts: Vec<MessagePart>,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<(), ApiError>> + Send + 'a>> {
        Box::pin(self.send_impl(parts))
    }

    fn write_raw<'a>(
        &'a self,
        bytes: Vec<u8>,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<(), ApiError>> + Send + 'a>> {
        Box::pin(async move {
            self.terminal.write(Bytes::from(bytes)).await.map_err(|e| ApiError::new(ErrorCode::TerminalIo, e.to_string()))
        })
    }

    fn messages(&self) -> Vec<ConversationMessage> {
        self.state.lock().messages.clone()
    }

    fn status(&self) -> ConversationStatus {
        let st = self.state.lock();
        let last_is_user = matches!(st.messages.last(), Some(m) if m.role == Role::User);
        let queue_or_inflight = st.pending_outbound.is_some() || st.send_in_flight;
        classify(last_is_user, &st.ring, queue_or_inflight)
    }

    fn screen(&self) -> String {
        self.terminal.read_screen()
    }

    fn start<'a>(&'a self) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            tokio::join!(self.snapshot_loop(), self.send_loop());
        })
    }

    fn save_state<'a>(
        &'a self,
        reason: &'a str,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            if !self.config.state_persistence.save_on_stop {
                return;
            }
            let Some(path) = self.config.state_persistence.state_file.clone() else { return };

            let (messages, dirty) = {
                let st = self.state.lock();
                (st.messages.clone(), st.dirty)
            };
            if !dirty {
                return;
            }

            let initial_prompt = render_parts(&self.config.initial_prompt);
            let state = super::persist::PersistedState::new(messages, initial_prompt);
            match super::persist::save(&path, &state) {
                Ok(()) => {
                    self.state.lock().dirty = false;
                    debug!(reason, path = %path.display(), "saved conversation state");
                }
                Err(e) => {
                    warn!(error = %e, reason, "failed to save conversation state");
                    self.emitter.emit_error(format!("failed to save state: {e}"), ErrorLevel::Warn);
                }
            }
        })
    }
}

#[cfg(test)]
#[path = "pty_tests.rs"]
mod tests;
