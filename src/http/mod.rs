// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Axum router assembly: CORS, host allow-listing, optional bearer auth,
//! and the conversation/status/messages/events/screen/OpenAPI/static-UI
//! surface from spec.md §6.

mod auth;
mod events;
mod message;
mod messages;
mod openapi;
mod screen;
mod static_ui;
mod status;

pub use openapi::schema as openapi_schema;

use std::sync::Arc;

use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::agent_type::AgentType;
use crate::conversation::Conversation;
use crate::emitter::EventEmitter;
use crate::error::ApiError;

/// Shared application state handed to every handler via axum's `State`
/// extractor.
pub struct AppState {
    pub conversation: Arc<dyn Conversation>,
    pub emitter: Arc<EventEmitter>,
    pub agent_type: AgentType,
    pub transport: &'static str,
    pub chat_base_path: String,
    pub allowed_hosts: Vec<String>,
    pub auth_token: Option<String>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    message: String,
}

/// Convert a conversation/validation error into its spec.md §7 HTTP
/// representation: JSON `{error, message}` with the code's status.
fn error_response(err: ApiError) -> Response {
    let status =
        StatusCode::from_u16(err.code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ErrorBody { error: err.code.as_str().to_string(), message: err.message })).into_response()
}

/// Build the full axum `Router`, including middleware.
pub fn build_router(state: Arc<AppState>, allowed_origins: &[String]) -> Router {
    let cors = if allowed_origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(AllowOrigin::any()).allow_methods(tower_http::cors::Any)
    } else {
        let origins: Vec<HeaderValue> =
            allowed_origins.iter().filter_map(|o| o.parse::<HeaderValue>().ok()).collect();
        CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(tower_http::cors::Any)
    };

    Router::new()
        .route("/status", get(status::status))
        .route("/messages", get(messages::messages))
        .route("/message", axum::routing::post(message::post_message))
        .route("/events", get(events::events))
        .route("/internal/screen", get(screen::screen))
        .route("/openapi.json", get(openapi::openapi_json))
        .route("/", get(root_redirect))
        .merge(static_ui::router())
        .layer(axum::middleware::from_fn_with_state(state.clone(), auth::host_guard))
        .layer(axum::middleware::from_fn_with_state(state.clone(), auth::auth_guard))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

async fn root_redirect(axum::extract::State(state): axum::extract::State<Arc<AppState>>) -> Redirect {
    Redirect::temporary(&format!("{}/embed", state.chat_base_path.trim_end_matches('/')))
}

/// Shared by the `http` submodules' test files: a [`Conversation`] double
/// with externally-settable status/messages/screen and a record of what was
/// sent through it.
#[cfg(test)]
pub(crate) mod mock {
    use std::future::Future;
    use std::pin::Pin;

    use parking_lot::Mutex;

    use super::*;
    use crate::conversation::ConversationStatus;
    use crate::message::{ConversationMessage, MessagePart};

    pub struct MockConversation {
        pub status: Mutex<ConversationStatus>,
        pub messages: Mutex<Vec<ConversationMessage>>,
        pub screen: Mutex<String>,
        pub sent: Mutex<Vec<Vec<MessagePart>>>,
        pub send_result: Mutex<Option<ApiError>>,
        pub raw_written: Mutex<Vec<Vec<u8>>>,
        pub write_raw_result: Mutex<Option<ApiError>>,
    }

    impl Default for MockConversation {
        fn default() -> Self {
            Self {
                status: Mutex::new(ConversationStatus::Stable),
                messages: Mutex::new(Vec::new()),
                screen: Mutex::new(String::new()),
                sent: Mutex::new(Vec::new()),
                send_result: Mutex::new(None),
                raw_written: Mutex::new(Vec::new()),
                write_raw_result: Mutex::new(None),
            }
        }
    }

    impl Conversation for MockConversation {
        fn send<'a>(
            &'a self,
            parts: Vec<MessagePart>,
        ) -> Pin<Box<dyn Future<Output = Result<(), ApiError>> + Send + 'a>> {
            self.sent.lock().push(parts);
            let result = self.send_result.lock().clone();
            Box::pin(async move { result.map_or(Ok(()), Err) })
        }
        fn write_raw<'a>(&'a self, bytes: Vec<u8>) -> Pin<Box<dyn Future<Output = Result<(), ApiError>> + Send + 'a>> {
            self.raw_written.lock().push(bytes);
            let result = self.write_raw_result.lock().clone();
            Box::pin(async move { result.map_or(Ok(()), Err) })
        }
        fn messages(&self) -> Vec<ConversationMessage> {
            self.messages.lock().clone()
        }
        fn status(&self) -> ConversationStatus {
            *self.status.lock()
        }
        fn screen(&self) -> String {
            self.screen.lock().clone()
        }
        fn start<'a>(&'a self) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
            Box::pin(async {})
        }
        fn save_state<'a>(&'a self, _reason: &'a str) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
            Box::pin(async {})
        }
    }

    pub fn state_with(conversation: MockConversation) -> Arc<AppState> {
        Arc::new(AppState {
            conversation: Arc::new(conversation),
            emitter: Arc::new(EventEmitter::new(Box::new(crate::conversation::clock::RealClock))),
            agent_type: AgentType::Custom,
            transport: "pty",
            chat_base_path: "/chat".into(),
            allowed_hosts: vec!["*".into()],
            auth_token: None,
        })
    }
}
