use chrono::Utc;

use super::*;
use crate::conversation::ConversationStatus;
use crate::emitter::{ErrorLevel, EventEmitter};
use crate::message::{ConversationMessage, Role};

#[test]
fn message_update_is_rendered_as_named_sse_event() {
    let msg = ConversationMessage::new(0, Role::Agent, "hi", Utc::now());
    let sse = render_event(&Event::MessageUpdate(msg)).unwrap();
    assert!(format!("{sse:?}").contains("message_update"));
}

#[test]
fn screen_update_is_never_rendered_on_this_endpoint() {
    assert!(render_event(&Event::ScreenUpdate("x".into())).is_none());
}

#[test]
fn status_change_is_rendered_as_named_sse_event() {
    let sse = render_event(&Event::StatusChange(ConversationStatus::Stable)).unwrap();
    assert!(format!("{sse:?}").contains("status_change"));
}

#[test]
fn error_event_is_rendered_as_named_sse_event() {
    let event = Event::Error(crate::emitter::ErrorEvent { time: Utc::now(), level: ErrorLevel::Warn, message: "oops".into() });
    let sse = render_event(&event).unwrap();
    assert!(format!("{sse:?}").contains("error"));
    assert!(format!("{sse:?}").contains("oops"));
}

#[test]
fn oversized_payload_is_dropped_not_truncated() {
    let huge = "x".repeat(MAX_EVENT_BYTES + 1);
    let event = Event::Error(crate::emitter::ErrorEvent { time: Utc::now(), level: ErrorLevel::Error, message: huge });
    assert!(render_event(&event).is_none());
}

#[test]
fn replay_excludes_screen_update_once_rendered() {
    let emitter = EventEmitter::new(Box::new(crate::conversation::clock::RealClock));
    emitter.emit_messages(&[ConversationMessage::new(0, Role::Agent, "", Utc::now())]);
    emitter.emit_status(ConversationStatus::Stable);
    emitter.emit_screen("hi");

    let (_id, _rx, replay) = emitter.subscribe();
    let rendered: Vec<_> = replay.iter().filter_map(render_event).collect();
    assert!(rendered.iter().any(|e| format!("{e:?}").contains("message_update")));
    assert!(rendered.iter().any(|e| format!("{e:?}").contains("status_change")));
    assert!(!rendered.iter().any(|e| format!("{e:?}").contains("screen_update")));
}

#[tokio::test]
async fn sse_response_carries_spec_headers() {
    use axum::response::sse::Event as SseEvent;
    use futures_util::stream;

    let stream = stream::iter(vec![Ok::<_, std::convert::Infallible>(SseEvent::default().data("x"))]);
    let response = sse_response(stream);
    let headers = response.headers();
    assert_eq!(headers.get("cache-control").unwrap(), "no-cache, no-store, must-revalidate");
    assert_eq!(headers.get("x-accel-buffering").unwrap(), "no");
    assert_eq!(headers.get("x-proxy-buffering").unwrap(), "no");
    assert_eq!(headers.get("connection").unwrap(), "keep-alive");
}

#[test]
fn unsubscribe_on_drop_does_not_panic_and_emitter_stays_usable() {
    let emitter = std::sync::Arc::new(EventEmitter::new(Box::new(crate::conversation::clock::RealClock)));
    let (id, rx, _replay) = emitter.subscribe();
    let wrapped = UnsubscribeOnDrop { inner: tokio_stream::wrappers::ReceiverStream::new(rx), emitter: emitter.clone(), id };
    drop(wrapped);

    emitter.emit_status(ConversationStatus::Stable);
    let (_id2, _rx2, replay2) = emitter.subscribe();
    assert!(replay2.iter().any(|e| matches!(e, Event::StatusChange(_))));
}
