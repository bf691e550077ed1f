use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use chrono::Utc;

use super::*;
use crate::http::mock::{state_with, MockConversation};
use crate::message::{ConversationMessage, Role};

#[tokio::test]
async fn empty_history_returns_empty_array() {
    let state = state_with(MockConversation::default());
    let router = Router::new().route("/messages", get(messages)).with_state(state);
    let server = axum_test::TestServer::new(router).unwrap();

    let resp = server.get("/messages").await;
    resp.assert_status(StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&resp.text()).unwrap();
    assert_eq!(body["messages"], serde_json::json!([]));
}

#[tokio::test]
async fn history_is_returned_with_content_field() {
    let conv = MockConversation::default();
    *conv.messages.lock() = vec![
        ConversationMessage::new(0, Role::Agent, "", Utc::now()),
        ConversationMessage::new(1, Role::User, "hi", Utc::now()),
    ];
    let state = state_with(conv);
    let router = Router::new().route("/messages", get(messages)).with_state(state);
    let server = axum_test::TestServer::new(router).unwrap();

    let resp = server.get("/messages").await;
    let body: serde_json::Value = serde_json::from_str(&resp.text()).unwrap();
    let msgs = body["messages"].as_array().unwrap();
    assert_eq!(msgs.len(), 2);
    assert_eq!(msgs[0]["id"], 0);
    assert_eq!(msgs[0]["role"], "agent");
    assert_eq!(msgs[1]["content"], "hi");
}
