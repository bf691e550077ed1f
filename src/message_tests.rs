use super::*;

#[test]
fn hidden_text_renders_empty_but_writes_raw() {
    let part = MessagePart::hidden("sk-secret");
    assert_eq!(render_parts(&[part.clone()]), "");
    assert_eq!(raw_parts(&[part]), "sk-secret");
}

#[test]
fn aliased_text_renders_under_alias() {
    let part = MessagePart::aliased("/very/long/path.rs", "<file>");
    assert_eq!(render_parts(&[part.clone()]), "<file>");
    assert_eq!(raw_parts(&[part]), "/very/long/path.rs");
}

#[test]
fn plain_text_round_trips() {
    let part = MessagePart::text("hello");
    assert_eq!(render_parts(&[part.clone()]), "hello");
    assert_eq!(raw_parts(&[part]), "hello");
}

#[test]
fn parts_concatenate_in_order() {
    let parts = vec![MessagePart::text("a"), MessagePart::hidden("b"), MessagePart::text("c")];
    assert_eq!(render_parts(&parts), "ac");
    assert_eq!(raw_parts(&parts), "abc");
}

#[test]
fn bracketed_paste_has_echo_guard_and_markers() {
    let wrapped = wrap_bracketed_paste("hello");
    assert!(wrapped.starts_with(b"x\x08\x1b[200~"));
    assert!(wrapped.ends_with(b"\x1b[201~"));
    assert!(wrapped.windows(b"hello".len()).any(|w| w == b"hello"));
}
