use super::*;
use crate::emitter::EventEmitter;

#[tokio::test]
async fn screen_update_event_is_rendered_with_its_name() {
    let got = render_screen_event(Event::ScreenUpdate("hello".into())).await;
    let sse = got.unwrap().unwrap();
    assert!(format!("{sse:?}").contains("screen_update"));
    assert!(format!("{sse:?}").contains("hello"));
}

#[tokio::test]
async fn non_screen_events_are_dropped() {
    use crate::conversation::ConversationStatus;
    assert!(render_screen_event(Event::StatusChange(ConversationStatus::Stable)).await.is_none());
}

#[test]
fn replay_for_screen_endpoint_keeps_only_screen_updates() {
    let emitter = EventEmitter::new(Box::new(crate::conversation::clock::RealClock));
    emitter.emit_status(crate::conversation::ConversationStatus::Stable);
    emitter.emit_screen("hi");

    let (_id, _rx, replay) = emitter.subscribe();
    assert!(replay.iter().any(|e| matches!(e, Event::ScreenUpdate(s) if s == "hi")));
    assert!(replay.iter().any(|e| matches!(e, Event::StatusChange(_))));
}
