use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;

use super::*;
use crate::conversation::ConversationStatus;
use crate::http::mock::{state_with, MockConversation};

fn server_with_status(status: ConversationStatus) -> axum_test::TestServer {
    let conv = MockConversation::default();
    *conv.status.lock() = status;
    let router = Router::new().route("/status", get(status)).with_state(state_with(conv));
    axum_test::TestServer::new(router).unwrap()
}

#[tokio::test]
async fn stable_status_is_reported_as_stable() {
    let resp = server_with_status(ConversationStatus::Stable).get("/status").await;
    resp.assert_status(StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&resp.text()).unwrap();
    assert_eq!(body["status"], "stable");
}

#[tokio::test]
async fn changing_status_is_reported_as_running() {
    let resp = server_with_status(ConversationStatus::Changing).get("/status").await;
    let body: serde_json::Value = serde_json::from_str(&resp.text()).unwrap();
    assert_eq!(body["status"], "running");
}

#[tokio::test]
async fn initializing_status_is_reported_as_running() {
    let resp = server_with_status(ConversationStatus::Initializing).get("/status").await;
    let body: serde_json::Value = serde_json::from_str(&resp.text()).unwrap();
    assert_eq!(body["status"], "running");
}

#[tokio::test]
async fn response_carries_agent_type_and_transport() {
    let resp = server_with_status(ConversationStatus::Stable).get("/status").await;
    let body: serde_json::Value = serde_json::from_str(&resp.text()).unwrap();
    assert_eq!(body["agent_type"], "custom");
    assert_eq!(body["transport"], "pty");
}
