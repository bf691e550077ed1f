use super::*;

#[test]
fn parse_is_case_insensitive() {
    assert_eq!(AgentType::parse("CLAUDE"), AgentType::Claude);
    assert_eq!(AgentType::parse("Opencode"), AgentType::Opencode);
}

#[test]
fn unrecognized_binary_maps_to_custom() {
    assert_eq!(AgentType::parse("my-agent"), AgentType::Custom);
}

#[test]
fn display_round_trips_through_parse() {
    for t in [
        AgentType::Claude,
        AgentType::Goose,
        AgentType::Aider,
        AgentType::Codex,
        AgentType::Gemini,
        AgentType::Amp,
        AgentType::Cursor,
        AgentType::Auggie,
        AgentType::AmazonQ,
        AgentType::Opencode,
        AgentType::Custom,
    ] {
        assert_eq!(AgentType::parse(&t.to_string()), t);
    }
}
