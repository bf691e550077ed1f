// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Conversation: owns one agent's message history, screen polling (or
//! JSON-RPC stream), and outbound send serialization. Two implementations
//! share one capability set — [`pty::PtyConversation`] drives a
//! [`TerminalProcess`](crate::pty::TerminalProcess), [`acp::AcpConversation`]
//! drives a streaming ACP connection — with no shared base class; callers
//! dispatch through the [`Conversation`] trait.

pub mod acp;
pub mod clock;
pub mod persist;
pub mod pty;

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::agent_type::AgentType;
use crate::error::ApiError;
use crate::message::{ConversationMessage, MessagePart};
use clock::Clock;

/// Classification of a conversation's current activity. See spec.md §3 and
/// §4.4's classification order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStatus {
    Initializing,
    Stable,
    Changing,
}

/// `{stateFile, loadOnStart, saveOnStop}` from spec.md §4.4.
#[derive(Debug, Clone, Default)]
pub struct StatePersistence {
    pub state_file: Option<PathBuf>,
    pub load_on_start: bool,
    pub save_on_stop: bool,
}

/// Construction-time options shared by both Conversation variants.
pub struct Config {
    pub agent_type: AgentType,
    pub clock: Arc<dyn Clock>,
    pub snapshot_interval: Duration,
    pub screen_stability_length: Duration,
    pub initial_prompt: Vec<MessagePart>,
    pub state_persistence: StatePersistence,
}

/// One capability set, two backends (spec.md §9 "Multiple polymorphic
/// conversation implementations"). Object-safe via manual boxed futures —
/// the same idiom [`TerminalProcess`](crate::pty::TerminalProcess) uses —
/// so HTTP handlers can hold `Arc<dyn Conversation>` regardless of backend.
pub trait Conversation: Send + Sync {
    /// Validate and enqueue a user message; resolves once the send loop has
    /// delivered it and the terminal has stabilized, or with a validation
    /// error if rejected up front.
    fn send<'a>(
        &'a self,
        parts: Vec<MessagePart>,
    ) -> Pin<Box<dyn Future<Output = Result<(), ApiError>> + Send + 'a>>;

    /// Write bytes straight to the underlying terminal, bypassing
    /// validation, history, and send serialization (`POST /message`'s
    /// `"raw"` message type). The ACP variant has no terminal to write to
    /// and rejects this with [`crate::error::ErrorCode::BadRequest`].
    fn write_raw<'a>(&'a self, bytes: Vec<u8>) -> Pin<Box<dyn Future<Output = Result<(), ApiError>> + Send + 'a>>;

    /// A snapshot of the full message history.
    fn messages(&self) -> Vec<ConversationMessage>;

    /// The current classification.
    fn status(&self) -> ConversationStatus;

    /// The current rendered screen (or accumulated stream buffer for ACP).
    fn screen(&self) -> String;

    /// Run the conversation's background loops until cancelled.
    fn start<'a>(&'a self) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

    /// Persist state if dirty and configured to do so.
    fn save_state<'a>(&'a self, reason: &'a str) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>>;
}
