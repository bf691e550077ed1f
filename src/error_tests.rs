use super::*;

#[test]
fn http_status_matches_error_kind() {
    assert_eq!(ErrorCode::Whitespace.http_status(), 400);
    assert_eq!(ErrorCode::Empty.http_status(), 400);
    assert_eq!(ErrorCode::Changing.http_status(), 409);
    assert_eq!(ErrorCode::Exited.http_status(), 410);
    assert_eq!(ErrorCode::Unauthorized.http_status(), 401);
    assert_eq!(ErrorCode::ForbiddenHost.http_status(), 400);
    assert_eq!(ErrorCode::Internal.http_status(), 500);
}

#[test]
fn display_matches_as_str() {
    for code in [
        ErrorCode::Whitespace,
        ErrorCode::Empty,
        ErrorCode::Changing,
        ErrorCode::Exited,
        ErrorCode::TerminalIo,
        ErrorCode::Unauthorized,
        ErrorCode::BadRequest,
        ErrorCode::ForbiddenHost,
        ErrorCode::Internal,
    ] {
        assert_eq!(code.to_string(), code.as_str());
    }
}

#[test]
fn api_error_display_includes_code_and_message() {
    let err = ApiError::new(ErrorCode::Changing, "conversation is changing");
    assert_eq!(err.to_string(), "changing: conversation is changing");
}
