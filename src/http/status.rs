// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use super::AppState;
use crate::conversation::ConversationStatus;

#[derive(Serialize)]
pub struct StatusBody {
    status: &'static str,
    agent_type: &'static str,
    transport: &'static str,
}

/// `GET /status`. `changing` and `initializing` both surface as `"running"`
/// (spec.md §6, §9 field-spelling note).
pub async fn status(State(state): State<Arc<AppState>>) -> Json<StatusBody> {
    let status = match state.conversation.status() {
        ConversationStatus::Stable => "stable",
        ConversationStatus::Changing | ConversationStatus::Initializing => "running",
    };
    Json(StatusBody { status, agent_type: state.agent_type.as_str(), transport: state.transport })
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
