use super::*;

fn base() -> ServerConfig {
    ServerConfig {
        agent_type: "custom".into(),
        port: 3284,
        term_width: DEFAULT_COLS,
        term_height: DEFAULT_ROWS,
        chat_base_path: "/chat".into(),
        allowed_hosts: vec!["localhost".into()],
        allowed_origins: vec!["*".into()],
        initial_prompt: None,
        state_file: None,
        load_state: false,
        save_state: false,
        pid_file: None,
        print_openapi: false,
        log_format: "json".into(),
        log_level: "info".into(),
        acp: false,
        agent_command: vec!["claude".into()],
    }
}

#[test]
fn valid_config_passes() {
    base().validate().unwrap();
}

#[test]
fn unknown_type_falls_back_to_custom_rather_than_failing_validation() {
    let mut cfg = base();
    cfg.agent_type = "some-unheard-of-binary".into();
    cfg.validate().unwrap();
    assert_eq!(cfg.agent_type_enum(), AgentType::Custom);
}

#[test]
fn missing_agent_command_is_rejected() {
    let mut cfg = base();
    cfg.agent_command = vec![];
    assert!(cfg.validate().is_err());
}

#[test]
fn print_openapi_skips_the_agent_command_check() {
    let mut cfg = base();
    cfg.agent_command = vec![];
    cfg.print_openapi = true;
    cfg.validate().unwrap();
}

#[test]
fn host_with_scheme_is_rejected() {
    let mut cfg = base();
    cfg.allowed_hosts = vec!["https://localhost".into()];
    assert!(cfg.validate().is_err());
}

#[test]
fn host_with_port_is_rejected() {
    let mut cfg = base();
    cfg.allowed_hosts = vec!["localhost:3284".into()];
    assert!(cfg.validate().is_err());
}

#[test]
fn wildcard_host_is_accepted() {
    let mut cfg = base();
    cfg.allowed_hosts = vec!["*".into()];
    cfg.validate().unwrap();
}

#[test]
fn origin_without_scheme_is_rejected() {
    let mut cfg = base();
    cfg.allowed_origins = vec!["localhost:3284".into()];
    assert!(cfg.validate().is_err());
}

#[test]
fn origin_with_scheme_and_port_is_accepted() {
    let mut cfg = base();
    cfg.allowed_origins = vec!["https://example.com:8443".into()];
    cfg.validate().unwrap();
}

#[test]
fn terminal_smaller_than_minimum_is_rejected() {
    let mut cfg = base();
    cfg.term_width = 5;
    assert!(cfg.validate().is_err());
}

#[test]
fn load_state_without_state_file_is_rejected() {
    let mut cfg = base();
    cfg.load_state = true;
    assert!(cfg.validate().is_err());
}

#[test]
fn save_state_without_state_file_is_rejected() {
    let mut cfg = base();
    cfg.save_state = true;
    assert!(cfg.validate().is_err());
}

#[test]
fn state_file_with_load_and_save_is_accepted() {
    let mut cfg = base();
    cfg.state_file = Some("/tmp/agentapi-state.json".into());
    cfg.load_state = true;
    cfg.save_state = true;
    cfg.validate().unwrap();
}
