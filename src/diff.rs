// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Screen diffing: recovering newly appended agent output between two
//! screen snapshots. See spec.md §4.3.

use std::collections::HashSet;

use crate::agent_type::AgentType;

/// Number of leading lines Opencode reserves for its dynamic token/cost
/// header; these are never considered part of the appended section.
const OPENCODE_HEADER_LINES: usize = 2;

/// Return the text newly appended to `new_screen` relative to `old_screen`.
///
/// Builds the set of lines present in `old_screen`, then walks
/// `new_screen` from its first non-skipped line looking for the first line
/// not in that set — everything from there to the end is the new section.
/// Leading/trailing blank lines are trimmed from the result.
pub fn diff(old_screen: &str, new_screen: &str, agent_type: AgentType) -> String {
    let old_lines: HashSet<&str> = old_screen.lines().collect();
    let new_lines: Vec<&str> = new_screen.lines().collect();

    let skip = if agent_type == AgentType::Opencode { OPENCODE_HEADER_LINES } else { 0 };
    let skip = skip.min(new_lines.len());

    let start = new_lines[skip..]
        .iter()
        .position(|line| !old_lines.contains(line))
        .map(|i| i + skip);

    let Some(start) = start else {
        return String::new();
    };

    let section = &new_lines[start..];
    trim_blank_lines(section).join("\n")
}

/// Trim leading and trailing whitespace-only lines from a slice of lines.
fn trim_blank_lines<'a>(lines: &'a [&'a str]) -> &'a [&'a str] {
    let start = lines.iter().position(|l| !l.trim().is_empty()).unwrap_or(lines.len());
    let end = lines.iter().rposition(|l| !l.trim().is_empty()).map(|i| i + 1).unwrap_or(0);
    if start >= end {
        &[]
    } else {
        &lines[start..end]
    }
}

#[cfg(test)]
#[path = "diff_tests.rs"]
mod tests;
