use super::*;
use crate::agent_type::AgentType;

#[test]
fn no_user_text_leaves_screen_unchanged() {
    let screen = "foo\nbar";
    assert_eq!(remove_echoed_user_input(screen, "", AgentType::Custom), screen);
}

#[test]
fn simple_echo_is_dropped_through_its_line() {
    let screen = "A\n> hello\nreply";
    let out = remove_echoed_user_input(screen, "hello", AgentType::Custom);
    assert_eq!(out, "reply");
}

#[test]
fn multiline_input_is_matched_across_lines() {
    let screen = "A\n> first\n> second\nreply";
    let out = remove_echoed_user_input(screen, "first\nsecond", AgentType::Custom);
    assert_eq!(out, "reply");
}

#[test]
fn unmatched_input_leaves_screen_unchanged() {
    let screen = "A\nB\nC";
    let out = remove_echoed_user_input(screen, "nomatch", AgentType::Custom);
    assert_eq!(out, screen);
}

#[test]
fn gemini_skips_one_trailing_box_line() {
    let screen = "A\n> hello\n╰──╯\nreply";
    let out = remove_echoed_user_input(screen, "hello", AgentType::Gemini);
    assert_eq!(out, "reply");
}

#[test]
fn opencode_skips_two_trailing_lines() {
    let screen = "A\n> hello\nfiller\n╰──╯\nreply";
    let out = remove_echoed_user_input(screen, "hello", AgentType::Opencode);
    assert_eq!(out, "reply");
}
