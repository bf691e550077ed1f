use super::*;
use std::time::Duration;

fn snap(s: &str) -> ScreenSnapshot {
    ScreenSnapshot { timestamp: Utc::now(), screen: s.to_string() }
}

#[test]
fn stability_threshold_matches_formula() {
    assert_eq!(
        stability_threshold(Duration::from_millis(2000), Duration::from_millis(25)),
        2000 / 25 + 1
    );
}

#[test]
fn stability_threshold_rounds_up() {
    // ceil(100 / 30) == 4, plus 1 == 5
    assert_eq!(stability_threshold(Duration::from_millis(100), Duration::from_millis(30)), 5);
}

#[test]
fn not_stable_until_full() {
    let mut ring = SnapshotRing::new(3);
    ring.push(snap("a"));
    ring.push(snap("a"));
    assert!(!ring.is_full());
    assert!(!ring.all_equal() || !ring.is_full());
}

#[test]
fn stable_when_full_and_identical() {
    let mut ring = SnapshotRing::new(3);
    ring.push(snap("a"));
    ring.push(snap("a"));
    ring.push(snap("a"));
    assert!(ring.is_full());
    assert!(ring.all_equal());
}

#[test]
fn changing_when_full_but_different() {
    let mut ring = SnapshotRing::new(3);
    ring.push(snap("a"));
    ring.push(snap("b"));
    ring.push(snap("b"));
    assert!(ring.is_full());
    assert!(!ring.all_equal());
}

#[test]
fn oldest_evicted_on_overflow() {
    let mut ring = SnapshotRing::new(2);
    ring.push(snap("a"));
    ring.push(snap("b"));
    ring.push(snap("c"));
    assert_eq!(ring.len(), 2);
    assert_eq!(ring.latest().unwrap().screen, "c");
}
