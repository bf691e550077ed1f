// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::{http::StatusCode, Json};
use serde::Deserialize;

use super::{error_response, AppState};
use crate::message::MessagePart;

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum MessageRequest {
    User { content: String },
    Raw { content: String },
}

/// `POST /message`: deliver a user-authored message (validated, wrapped in
/// bracketed paste) or raw bytes (written through unchanged).
pub async fn post_message(State(state): State<Arc<AppState>>, Json(req): Json<MessageRequest>) -> Response {
    let result = match req {
        MessageRequest::User { content } => state.conversation.send(vec![MessagePart::text(content)]).await,
        MessageRequest::Raw { content } => state.conversation.write_raw(content.into_bytes()).await,
    };

    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
