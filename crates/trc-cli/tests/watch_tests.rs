use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::watch::{Debouncer, GenerationTracker};

const WINDOW: Duration = Duration::from_millis(100);

#[test]
fn debouncer_waits_for_a_quiet_window() {
    let start = Instant::now();
    let mut debouncer = Debouncer::new(WINDOW);
    debouncer.record(PathBuf::from("a.trb"), start);

    assert!(debouncer.take_ready(start + Duration::from_millis(50)).is_empty());
    assert_eq!(debouncer.next_deadline(), Some(start + WINDOW));
    assert_eq!(debouncer.take_ready(start + WINDOW), vec![PathBuf::from("a.trb")]);
    assert!(debouncer.is_empty());
}

#[test]
fn repeated_events_restart_the_window() {
    let start = Instant::now();
    let mut debouncer = Debouncer::new(WINDOW);
    debouncer.record(PathBuf::from("a.trb"), start);
    debouncer.record(PathBuf::from("a.trb"), start + Duration::from_millis(80));

    assert_eq!(debouncer.pending(), 1);
    assert!(debouncer.take_ready(start + Duration::from_millis(120)).is_empty());
    assert_eq!(debouncer.take_ready(start + Duration::from_millis(180)).len(), 1);
}

#[test]
fn paths_settle_independently() {
    let start = Instant::now();
    let mut debouncer = Debouncer::new(WINDOW);
    debouncer.record(PathBuf::from("b.trb"), start);
    debouncer.record(PathBuf::from("a.trb"), start);
    debouncer.record(PathBuf::from("c.trb"), start + Duration::from_millis(60));

    let ready = debouncer.take_ready(start + Duration::from_millis(110));
    assert_eq!(ready, vec![PathBuf::from("a.trb"), PathBuf::from("b.trb")]);
    assert_eq!(debouncer.next_deadline(), Some(start + Duration::from_millis(160)));
}

#[test]
fn empty_debouncer_has_no_deadline() {
    let debouncer = Debouncer::new(WINDOW);
    assert!(debouncer.next_deadline().is_none());
}

#[test]
fn generations_count_changes_per_path() {
    let mut tracker = GenerationTracker::new();
    let a = PathBuf::from("a.trb");
    assert_eq!(tracker.current(&a), 0);
    assert_eq!(tracker.bump(&a), 1);
    assert_eq!(tracker.bump(&a), 2);
    assert_eq!(tracker.current(&PathBuf::from("b.trb")), 0);
}

#[test]
fn later_write_supersedes_a_running_build() {
    let mut tracker = GenerationTracker::new();
    let a = PathBuf::from("a.trb");
    let b = PathBuf::from("b.trb");
    tracker.bump(&a);

    let snapshot = tracker.snapshot([&a, &b]);
    assert!(tracker.is_current(&snapshot));

    tracker.bump(&b);
    assert!(!tracker.is_current(&snapshot));
    assert_eq!(tracker.superseded(&snapshot), vec![b.clone()]);

    let fresh = tracker.snapshot([&a, &b]);
    assert!(tracker.is_current(&fresh));
}
