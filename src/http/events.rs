// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use axum::response::Response;
use futures_util::stream::{self, Stream, StreamExt};
use tokio_stream::wrappers::ReceiverStream;

use super::AppState;
use crate::emitter::{Event, EventEmitter, SubscriberId};

/// Largest single SSE payload this endpoint will emit (spec.md §6).
const MAX_EVENT_BYTES: usize = 256 * 1024;

/// `GET /events`: replay then streamed `message_update` / `status_change` /
/// `error`. `screen_update` is deliberately excluded — see [`super::screen`].
pub async fn events(State(state): State<Arc<AppState>>) -> Response {
    let (id, rx, replay) = state.emitter.subscribe();

    let replay_stream = stream::iter(replay);
    let live_stream = ReceiverStream::new(rx);
    let stream = replay_stream.chain(live_stream).filter_map(render_event_async);

    sse_response(UnsubscribeOnDrop::new(stream, state.emitter.clone(), id))
}

fn render_event_async(event: Event) -> impl std::future::Future<Output = Option<Result<SseEvent, Infallible>>> {
    std::future::ready(render_event(&event).map(Ok))
}

/// Render one emitter [`Event`] into an SSE frame. `ScreenUpdate` is not
/// part of this endpoint's contract; drop it rather than emit it. Drops
/// (with a log, not an error) any payload over [`MAX_EVENT_BYTES`].
fn render_event(event: &Event) -> Option<SseEvent> {
    let (name, data) = match event {
        Event::MessageUpdate(msg) => ("message_update", serde_json::to_string(msg).ok()?),
        Event::StatusChange(status) => ("status_change", serde_json::to_string(status).ok()?),
        Event::Error(err) => ("error", serde_json::to_string(err).ok()?),
        Event::ScreenUpdate(_) => return None,
    };
    if data.len() > MAX_EVENT_BYTES {
        tracing::warn!(event = name, bytes = data.len(), "dropping oversized SSE payload");
        return None;
    }
    Some(SseEvent::default().event(name).data(data))
}

/// Wraps the replay+live stream so `emitter.unsubscribe` runs when the
/// stream is dropped, whether by exhaustion or client disconnect.
pub(super) struct UnsubscribeOnDrop<S> {
    inner: S,
    emitter: Arc<EventEmitter>,
    id: SubscriberId,
}

impl<S> UnsubscribeOnDrop<S> {
    pub(super) fn new(inner: S, emitter: Arc<EventEmitter>, id: SubscriberId) -> Self {
        Self { inner, emitter, id }
    }
}

impl<S: Stream + Unpin> Stream for UnsubscribeOnDrop<S> {
    type Item = S::Item;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

impl<S> Drop for UnsubscribeOnDrop<S> {
    fn drop(&mut self) {
        self.emitter.unsubscribe(self.id);
    }
}

pub(super) fn sse_response(stream: impl Stream<Item = Result<SseEvent, Infallible>> + Send + 'static) -> Response {
    use axum::http::header::{CACHE_CONTROL, CONNECTION, PRAGMA};
    use axum::http::HeaderValue;
    use axum::response::IntoResponse;

    let sse = Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)));
    let mut response = sse.into_response();
    let headers = response.headers_mut();
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache, no-store, must-revalidate"));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert("Expires", HeaderValue::from_static("0"));
    headers.insert("X-Accel-Buffering", HeaderValue::from_static("no"));
    headers.insert("X-Proxy-Buffering", HeaderValue::from_static("no"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    response
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
