// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Conversation message history and the outbound `MessagePart` wire format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who authored a [`ConversationMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Agent,
}

/// A single turn in the conversation history.
///
/// IDs are dense and monotonically increasing (`messages[i].id == i`); see
/// spec.md §3 and §8 invariant 1. The *last* message in a conversation's
/// history may be mutated in place to reflect the evolving agent turn —
/// every earlier message is append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub id: u64,
    pub role: Role,
    #[serde(rename = "content")]
    pub message: String,
    pub time: DateTime<Utc>,
}

impl ConversationMessage {
    pub fn new(id: u64, role: Role, message: impl Into<String>, time: DateTime<Utc>) -> Self {
        Self { id, role, message: message.into(), time }
    }
}

/// Bracketed paste start marker.
const PASTE_START: &[u8] = b"\x1b[200~";
/// Bracketed paste end marker.
const PASTE_END: &[u8] = b"\x1b[201~";
/// "Type-then-backspace" prefix that stops Claude Code from echoing the
/// paste-start escape sequence into its own input box.
const ECHO_GUARD_PREFIX: &[u8] = b"x\x08";

/// A polymorphic segment of an outbound user message.
///
/// `Text` is written to the terminal verbatim (wrapped in bracketed paste)
/// and rendered back to the user unchanged. `HiddenText` is written to the
/// terminal but renders as empty in history (e.g. an API key typed into a
/// login prompt). `AliasedText` writes one string but renders under a
/// different alias (e.g. a long file path shown to the user as `<file>`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessagePart {
    Text { text: String },
    HiddenText { text: String },
    AliasedText { text: String, alias: String },
}

impl MessagePart {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text { text: s.into() }
    }

    pub fn hidden(s: impl Into<String>) -> Self {
        Self::HiddenText { text: s.into() }
    }

    pub fn aliased(text: impl Into<String>, alias: impl Into<String>) -> Self {
        Self::AliasedText { text: text.into(), alias: alias.into() }
    }

    /// The raw text this part contributes to the terminal.
    fn raw(&self) -> &str {
        match self {
            Self::Text { text } | Self::HiddenText { text } | Self::AliasedText { text, .. } => {
                text
            }
        }
    }

    /// The text this part contributes to conversation history.
    fn rendered(&self) -> &str {
        match self {
            Self::Text { text } => text,
            Self::HiddenText { .. } => "",
            Self::AliasedText { alias, .. } => alias,
        }
    }
}

/// Join a sequence of [`MessagePart`]s into the string stored in history.
pub fn render_parts(parts: &[MessagePart]) -> String {
    parts.iter().map(MessagePart::rendered).collect::<Vec<_>>().concat()
}

/// Join a sequence of [`MessagePart`]s into the raw text sent to the
/// terminal (before bracketed-paste wrapping).
pub fn raw_parts(parts: &[MessagePart]) -> String {
    parts.iter().map(MessagePart::raw).collect::<Vec<_>>().concat()
}

/// Wrap raw user text for bracketed-paste delivery: `x\b` echo guard, then
/// `ESC[200~ ... ESC[201~`. See spec.md §6 `POST /message`.
pub fn wrap_bracketed_paste(raw: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len() + 16);
    out.extend_from_slice(ECHO_GUARD_PREFIX);
    out.extend_from_slice(PASTE_START);
    out.extend_from_slice(raw.as_bytes());
    out.extend_from_slice(PASTE_END);
    out
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
