// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Echo-removal: locating and discarding the terminal's echo of the user's
//! own input from a screen, tolerant of interstitial cursor/color chrome.
//! See spec.md §4.2.

use crate::agent_type::AgentType;

/// Up to how many runes of the first input line anchor the initial search.
const NEEDLE_LEN: usize = 6;
/// Search window floor, in runes, when the screen has fewer than 5 lines.
const MIN_WINDOW_RUNES: usize = 25;
/// Number of leading screen lines considered for the initial anchor search.
const WINDOW_LINES: usize = 5;
/// Width of the forward-walk tolerance window on both sides.
const WALK_WINDOW: usize = 5;

/// One non-whitespace rune of the screen, tagged with its source line.
struct Rune {
    ch: char,
    line: usize,
}

fn strip_whitespace_tagged(text: &str) -> Vec<Rune> {
    text.lines()
        .enumerate()
        .flat_map(|(line, l)| {
            l.chars().filter(|c| !c.is_whitespace()).map(move |ch| Rune { ch, line })
        })
        .collect()
}

pub fn remove_echoed_user_input(screen: &str, last_user_text: &str, agent_type: AgentType) -> String {
    if last_user_text.is_empty() {
        return screen.to_string();
    }

    let screen_lines: Vec<&str> = screen.lines().collect();
    let screen_runes = strip_whitespace_tagged(screen);

    let first_input_line = last_user_text.lines().next().unwrap_or("");
    let needle: Vec<char> =
        first_input_line.chars().filter(|c| !c.is_whitespace()).take(NEEDLE_LEN).collect();
    if needle.is_empty() {
        return screen.to_string();
    }

    let full_input: Vec<char> = last_user_text.chars().filter(|c| !c.is_whitespace()).collect();

    // (a) search the first 5 lines or 25 runes, whichever is longer.
    let window_end_by_lines =
        screen_runes.iter().take_while(|r| r.line < WINDOW_LINES).count();
    let window_end = window_end_by_lines.max(MIN_WINDOW_RUNES).min(screen_runes.len());

    let anchor = (0..window_end)
        .find(|&i| i + needle.len() <= window_end && matches_at(&screen_runes, i, &needle));

    let Some(anchor) = anchor else {
        return screen.to_string();
    };

    let mut si = anchor + needle.len();
    let mut ii = needle.len();
    let mut last_matched_line = screen_runes[si - 1].line;

    // (b) tolerant forward walk: look at the next WALK_WINDOW runes on each
    // side and advance on the first matching pair.
    while ii < full_input.len() && si < screen_runes.len() {
        let screen_window = &screen_runes[si..(si + WALK_WINDOW).min(screen_runes.len())];
        let input_window = &full_input[ii..(ii + WALK_WINDOW).min(full_input.len())];

        let found = screen_window.iter().enumerate().find_map(|(i, r)| {
            input_window.iter().position(|&c| c == r.ch).map(|j| (i, j))
        });

        match found {
            Some((i, j)) => {
                si += i + 1;
                ii += j + 1;
                last_matched_line = screen_runes[si - 1].line;
            }
            None => break,
        }
    }

    // (c) drop everything through and including the last matched line.
    let mut cut = last_matched_line + 1;

    // (d) agent-specific trailing skip.
    let extra = match agent_type {
        crate::agent_type::AgentType::Gemini | crate::agent_type::AgentType::Cursor => 1,
        crate::agent_type::AgentType::Opencode => 2,
        _ => 0,
    };
    cut = (cut + extra).min(screen_lines.len());

    screen_lines[cut.min(screen_lines.len())..].join("\n")
}

fn matches_at(runes: &[Rune], start: usize, needle: &[char]) -> bool {
    needle.iter().enumerate().all(|(j, &c)| runes.get(start + j).is_some_and(|r| r.ch == c))
}

#[cfg(test)]
#[path = "echo_tests.rs"]
mod tests;
