use super::*;
use crate::pty::ExitStatus;

#[test]
fn resolve_initial_prompt_uses_the_flag_when_present() {
    let parts = resolve_initial_prompt(Some("hello".into())).unwrap();
    assert_eq!(parts, vec![MessagePart::text("hello")]);
}

#[test]
fn report_child_exit_success_is_zero() {
    let status = ExitStatus { code: Some(0), signal: None };
    assert_eq!(report_child_exit(Ok(status)), 0);
}

#[test]
fn report_child_exit_nonzero_code_is_one() {
    let status = ExitStatus { code: Some(1), signal: None };
    assert_eq!(report_child_exit(Ok(status)), 1);
}

#[test]
fn report_child_exit_surfaces_wait_error_as_one() {
    let status = ExitStatus { code: Some(2), signal: None };
    let err = WaitError::NonZeroExit { status, trailing_screen: "boom".into() };
    assert_eq!(report_child_exit(Err(err)), 1);
}

#[test]
fn report_child_exit_io_failure_is_one() {
    let err = WaitError::Io(anyhow::anyhow!("pty gone"));
    assert_eq!(report_child_exit(Err(err)), 1);
}

#[test]
fn write_pid_file_contains_the_current_process_id() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("agentapi.pid");
    write_pid_file(&path).unwrap();
    let contents = std::fs::read_to_string(&path).unwrap();
    assert_eq!(contents, std::process::id().to_string());
}
