use axum::body::Body;
use axum::http::Request;
use tower::ServiceExt;

use super::*;
use crate::http::mock::{state_with, MockConversation};

#[tokio::test]
async fn chat_route_is_mounted_and_does_not_panic_without_a_built_ui() {
    let router = router().with_state(state_with(MockConversation::default()));
    let resp = router.oneshot(Request::builder().uri("/chat/").body(Body::empty()).unwrap()).await.unwrap();
    // No bundled UI exists in this tree; the service must still answer
    // rather than panic when its directory is missing.
    assert!(resp.status().is_client_error() || resp.status().is_server_error());
}
