// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stripping MCP tool-call report blocks from agent messages. See spec.md
//! §4.2 `removeToolCalls`.

use crate::agent_type::AgentType;

const CLAUDE_START_MARKER: &str = "coder - coder_report_task (MCP)";
const CLAUDE_END_MARKER: &str = "\"message\": \"Thanks for reporting!\"";
const CODEX_START_MARKER: &str = "Coder.coder_report_task";

/// Excise known tool-call report blocks from `message`, returning the
/// cleaned message and the raw text of each removed block.
///
/// Blocks that are only partially rendered (no matching end marker yet)
/// are retained silently — we only strip blocks we can prove are complete.
pub fn remove_tool_calls(message: &str, agent_type: AgentType) -> (String, Vec<String>) {
    match agent_type {
        AgentType::Claude => strip_claude_blocks(message),
        AgentType::Codex => strip_codex_blocks(message),
        _ => (message.to_string(), Vec::new()),
    }
}

fn strip_claude_blocks(message: &str) -> (String, Vec<String>) {
    let lines: Vec<&str> = message.lines().collect();
    let mut removed = Vec::new();
    let mut kept: Vec<&str> = Vec::with_capacity(lines.len());
    let mut i = 0;
    while i < lines.len() {
        if lines[i].contains(CLAUDE_START_MARKER) {
            if let Some(end_rel) = lines[i..].iter().position(|l| l.contains(CLAUDE_END_MARKER)) {
                // The block closes one line after the "Thanks for reporting!"
                // line (a standalone `}`), if present.
                let mut end = i + end_rel;
                if lines.get(end + 1).map(|l| l.trim() == "}").unwrap_or(false) {
                    end += 1;
                }
                removed.push(lines[i..=end].join("\n"));
                i = end + 1;
                continue;
            } else {
                // Partially rendered — retain silently and stop scanning,
                // the rest of the message is inside this incomplete block.
                kept.extend_from_slice(&lines[i..]);
                break;
            }
        }
        kept.push(lines[i]);
        i += 1;
    }
    (kept.join("\n"), removed)
}

fn strip_codex_blocks(message: &str) -> (String, Vec<String>) {
    let lines: Vec<&str> = message.lines().collect();
    let mut removed = Vec::new();
    let mut kept: Vec<&str> = Vec::with_capacity(lines.len());
    let mut i = 0;
    while i < lines.len() {
        if lines[i].contains("•") && lines[i].contains("Called") && lines[i].contains(CODEX_START_MARKER) {
            // Codex renders the call as a single bulleted line with no
            // closing marker; the block is just that line.
            removed.push(lines[i].to_string());
            i += 1;
            continue;
        }
        kept.push(lines[i]);
        i += 1;
    }
    (kept.join("\n"), removed)
}

#[cfg(test)]
#[path = "toolcalls_tests.rs"]
mod tests;
