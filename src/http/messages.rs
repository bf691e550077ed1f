// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use super::AppState;
use crate::message::ConversationMessage;

#[derive(Serialize)]
pub struct MessagesBody {
    messages: Vec<ConversationMessage>,
}

/// `GET /messages`: the full message history snapshot.
pub async fn messages(State(state): State<Arc<AppState>>) -> Json<MessagesBody> {
    Json(MessagesBody { messages: state.conversation.messages() })
}

#[cfg(test)]
#[path = "messages_tests.rs"]
mod tests;
