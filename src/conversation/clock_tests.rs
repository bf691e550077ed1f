use super::*;

#[test]
fn real_clock_advances() {
    let clock = RealClock;
    let a = clock.now();
    std::thread::sleep(std::time::Duration::from_millis(1));
    let b = clock.now();
    assert!(b >= a);
}

#[test]
fn fake_clock_only_moves_on_advance() {
    let start = DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap().with_timezone(&Utc);
    let clock = FakeClock::new(start);
    assert_eq!(clock.now(), start);
    clock.advance(chrono::Duration::seconds(5));
    assert_eq!(clock.now(), start + chrono::Duration::seconds(5));
}
