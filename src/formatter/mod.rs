// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent-specific pure functions operating on rendered terminal screens.
//! See spec.md §4.2. Each operation is switched on [`AgentType`]; the
//! generic `>` / `│` input-box heuristics are shared by agents that don't
//! need bespoke handling.

use crate::agent_type::AgentType;

mod echo;
mod toolcalls;

pub use toolcalls::remove_tool_calls;

/// True iff `screen` contains a recognizable input affordance for
/// `agent_type` — a bordered box with a `>` prompt, a bottom-line
/// "Ask Codex to do anything", an Opencode separator, etc.
pub fn is_ready_for_initial_prompt(screen: &str, agent_type: AgentType) -> bool {
    match agent_type {
        AgentType::Custom => true,
        AgentType::Codex => screen.lines().any(|l| l.contains("Ask Codex to do anything")),
        AgentType::Opencode => screen.lines().any(is_opencode_separator),
        AgentType::Amp => screen.lines().any(|l| l.trim_start().starts_with('╭')),
        _ => generic_input_box_present(screen),
    }
}

/// Generic `>` prompt inside a `│ ... │` box, used as the default detector
/// and as the fallback for any agent without a bespoke rule.
fn generic_input_box_present(screen: &str) -> bool {
    let mut saw_border = false;
    for line in screen.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with('│') || trimmed.starts_with('┃') {
            saw_border = true;
            if trimmed.trim_start_matches(['│', '┃']).trim_start().starts_with('>') {
                return true;
            }
        }
    }
    saw_border && screen.contains('>')
}

fn is_opencode_separator(line: &str) -> bool {
    let t = line.trim();
    t.starts_with('╹') && t.contains("▀▀")
}

/// Remove the input-box chrome below the last agent output.
pub fn strip_input_box(screen: &str, agent_type: AgentType) -> String {
    let lines: Vec<&str> = screen.lines().collect();
    match agent_type {
        AgentType::Codex => {
            let keep: Vec<&str> = lines
                .into_iter()
                .filter(|l| !l.contains("Ask Codex to do anything"))
                .collect();
            keep.join("\n")
        }
        AgentType::Opencode => strip_opencode_box(&lines),
        AgentType::Amp => strip_amp_box(&lines),
        _ => strip_generic_box(&lines),
    }
}

/// Opencode renders a four-line box capped by a `╹▀▀…` separator; remove
/// those four lines plus the separator itself.
fn strip_opencode_box(lines: &[&str]) -> String {
    match lines.iter().rposition(|l| is_opencode_separator(l)) {
        Some(idx) => {
            let cut = idx.saturating_sub(3);
            lines[..cut].join("\n")
        }
        None => lines.join("\n"),
    }
}

/// Amp draws the input box between a `╭…╮` / `╰…╯` pair; strip everything
/// from the last `╭` to the matching trailing `╰` line. If that leaves
/// nothing, Amp has shown only its welcome box — return a placeholder so
/// callers never see an empty screen.
fn strip_amp_box(lines: &[&str]) -> String {
    const WELCOME: &str = "Welcome to Amp.";

    let top = lines.iter().rposition(|l| l.trim_start().starts_with('╭'));
    let Some(top) = top else {
        return lines.join("\n");
    };
    let kept = &lines[..top];
    if kept.iter().all(|l| l.trim().is_empty()) {
        WELCOME.to_string()
    } else {
        kept.join("\n")
    }
}

/// Generic agents render a `>` prompt inside a `─ / │` box; strip the
/// contiguous block of border-drawing lines at the tail of the screen.
fn strip_generic_box(lines: &[&str]) -> String {
    let mut end = lines.len();
    while end > 0 {
        let t = lines[end - 1].trim();
        let is_box_line = t.is_empty()
            || t.chars().all(|c| "─│┃┌┐└┘╭╮╰╯>".contains(c))
            || t.starts_with('>')
            || t.starts_with('│')
            || t.starts_with('┃');
        if is_box_line {
            end -= 1;
        } else {
            break;
        }
    }
    lines[..end].join("\n")
}

/// Remove echoed user input from `screen`. See spec.md §4.2 and
/// [`echo::remove_echoed_user_input`] for the matching algorithm.
pub fn remove_echoed_user_input(screen: &str, last_user_text: &str, agent_type: AgentType) -> String {
    echo::remove_echoed_user_input(screen, last_user_text, agent_type)
}

/// Composition of echo removal, box stripping, and whitespace trimming —
/// the `formatMessage` hook referenced by `conversation::pty::Config`.
pub fn format_message(agent_msg: &str, last_user_msg: &str, agent_type: AgentType) -> String {
    let without_echo = remove_echoed_user_input(agent_msg, last_user_msg, agent_type);
    let without_box = strip_input_box(&without_echo, agent_type);
    without_box.trim().to_string()
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
