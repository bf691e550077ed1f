// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use axum::extract::State;
use axum::response::sse::Event as SseEvent;
use axum::response::Response;
use futures_util::stream::{self, StreamExt};
use tokio_stream::wrappers::ReceiverStream;

use super::events::{sse_response, UnsubscribeOnDrop};
use super::AppState;
use crate::emitter::Event;

/// `GET /internal/screen`: SSE stream of `screen_update` only. Not part of
/// the public OpenAPI surface — used by the bundled chat UI's live preview.
pub async fn screen(State(state): State<Arc<AppState>>) -> Response {
    let (id, rx, replay) = state.emitter.subscribe();

    let replay_stream = stream::iter(replay);
    let live_stream = ReceiverStream::new(rx);
    let stream = replay_stream.chain(live_stream).filter_map(render_screen_event);

    sse_response(UnsubscribeOnDrop::new(stream, state.emitter.clone(), id))
}

fn render_screen_event(event: Event) -> impl std::future::Future<Output = Option<Result<SseEvent, std::convert::Infallible>>> {
    std::future::ready(match event {
        Event::ScreenUpdate(screen) => Some(Ok(SseEvent::default().event("screen_update").data(screen))),
        _ => None,
    })
}

#[cfg(test)]
#[path = "screen_tests.rs"]
mod tests;
