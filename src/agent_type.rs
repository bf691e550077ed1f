// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};
use std::fmt;

/// Selects which [`crate::formatter`] strategy and ACP wiring a
/// conversation uses. `Custom` is the fallback for any unrecognized binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentType {
    Claude,
    Goose,
    Aider,
    Codex,
    Gemini,
    Amp,
    Cursor,
    Auggie,
    AmazonQ,
    Opencode,
    Custom,
}

impl AgentType {
    /// Parse a `--type` flag value (case-insensitive). Unknown values map to
    /// `Custom` per spec.md §3 rather than failing — the user-supplied
    /// binary path is still launched, just without agent-specific screen
    /// handling.
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "claude" => Self::Claude,
            "goose" => Self::Goose,
            "aider" => Self::Aider,
            "codex" => Self::Codex,
            "gemini" => Self::Gemini,
            "amp" => Self::Amp,
            "cursor" => Self::Cursor,
            "auggie" => Self::Auggie,
            "amazonq" | "amazon-q" | "amazon_q" => Self::AmazonQ,
            "opencode" => Self::Opencode,
            _ => Self::Custom,
        }
    }
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Claude => "claude",
            Self::Goose => "goose",
            Self::Aider => "aider",
            Self::Codex => "codex",
            Self::Gemini => "gemini",
            Self::Amp => "amp",
            Self::Cursor => "cursor",
            Self::Auggie => "auggie",
            Self::AmazonQ => "amazonq",
            Self::Opencode => "opencode",
            Self::Custom => "custom",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
#[path = "agent_type_tests.rs"]
mod tests;
