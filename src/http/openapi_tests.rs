use super::*;

#[test]
fn schema_lists_the_public_conversation_endpoints() {
    let s = spec();
    let paths = s["paths"].as_object().unwrap();
    assert!(paths.contains_key("/status"));
    assert!(paths.contains_key("/messages"));
    assert!(paths.contains_key("/message"));
    assert!(paths.contains_key("/events"));
}

#[test]
fn schema_omits_the_internal_screen_endpoint() {
    let s = spec();
    assert!(!s["paths"].as_object().unwrap().contains_key("/internal/screen"));
}

#[tokio::test]
async fn handler_returns_the_same_schema() {
    let Json(body) = openapi_json().await;
    assert_eq!(body, spec());
}

#[test]
fn public_schema_accessor_matches_the_handler() {
    assert_eq!(schema(), spec());
}
