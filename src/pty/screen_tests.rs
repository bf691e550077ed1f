use super::*;

#[test]
fn renders_fed_text() {
    let mut s = TerminalScreen::new(20, 3);
    s.feed(b"hello\r\n> ");
    let rendered = s.render();
    assert!(rendered.contains("hello"));
    assert!(rendered.contains('>'));
}

#[test]
fn split_utf8_sequence_across_feeds_is_handled() {
    let bytes = "héllo".as_bytes().to_vec();
    let mut s = TerminalScreen::new(20, 3);
    // Split in the middle of the 2-byte 'é' sequence.
    let mid = bytes.iter().position(|&b| b >= 0xC0).unwrap() + 1;
    s.feed(&bytes[..mid]);
    s.feed(&bytes[mid..]);
    assert!(s.render().contains("héllo"));
}

#[test]
fn resize_does_not_panic() {
    let mut s = TerminalScreen::new(10, 5);
    s.feed(b"hi");
    s.resize(20, 10);
    let _ = s.render();
}
