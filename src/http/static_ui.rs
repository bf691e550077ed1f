// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use axum::Router;
use tower_http::services::{ServeDir, ServeFile};

use super::AppState;

/// Directory the bundled chat UI's static assets are read from at runtime.
/// Plumbing per spec.md's overview — the UI itself is out of scope here.
const CHAT_UI_DIR: &str = "chat-ui/dist";

/// `/chat/*`: serves the bundled single-page chat UI, falling back to its
/// `index.html` for client-side routes.
pub fn router() -> Router<Arc<AppState>> {
    let index = format!("{CHAT_UI_DIR}/index.html");
    let serve = ServeDir::new(CHAT_UI_DIR).fallback(ServeFile::new(index));
    Router::new().nest_service("/chat", serve)
}

#[cfg(test)]
#[path = "static_ui_tests.rs"]
mod tests;
