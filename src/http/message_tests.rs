use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;

use super::*;
use crate::error::{ApiError, ErrorCode};
use crate::http::mock::{state_with, MockConversation};

fn server(conv: MockConversation) -> axum_test::TestServer {
    let router = Router::new().route("/message", post(post_message)).with_state(state_with(conv));
    axum_test::TestServer::new(router).unwrap()
}

#[tokio::test]
async fn user_message_is_forwarded_to_conversation_send() {
    let conv = MockConversation::default();
    let resp = server(conv).post("/message").json(&serde_json::json!({"type": "user", "content": "hello"})).await;
    resp.assert_status(StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn user_message_send_rejection_becomes_error_response() {
    let conv = MockConversation::default();
    *conv.send_result.lock() = Some(ApiError::new(ErrorCode::Changing, "conversation is not stable"));
    let resp = server(conv).post("/message").json(&serde_json::json!({"type": "user", "content": "hi"})).await;
    resp.assert_status(StatusCode::CONFLICT);
    let body: serde_json::Value = serde_json::from_str(&resp.text()).unwrap();
    assert_eq!(body["error"], "changing");
}

#[tokio::test]
async fn raw_message_is_forwarded_to_write_raw_unchanged() {
    let conv = MockConversation::default();
    let resp = server(conv).post("/message").json(&serde_json::json!({"type": "raw", "content": "\u{1b}x"})).await;
    resp.assert_status(StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn malformed_body_is_rejected() {
    let conv = MockConversation::default();
    let resp = server(conv).post("/message").json(&serde_json::json!({"type": "bogus", "content": "x"})).await;
    assert!(resp.status_code().is_client_error());
}
