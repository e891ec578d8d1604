use chrono::{Local, TimeZone};
use evtools::clock::{self, ClockSync, SyncState, WrapState, WrapTracker};
use evtools::{Channel, EventKind, Record, Timestamp, Value, T_WRAP_S};

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

#[test]
fn wraparound_adds_one_period() {
    let mut w = WrapTracker::default();
    assert!(close(w.correct(4294.9), 4294.9));
    assert!(close(w.correct(0.1), 4295.067296));
    assert_eq!(w.wraps(), 1);
    // Later samples keep the correction without wrapping again
    assert!(close(w.correct(0.2), 0.2 + T_WRAP_S));
    assert_eq!(w.wraps(), 1);
}

#[test]
fn small_backwards_steps_are_not_wraps() {
    let mut w = WrapTracker::default();
    w.correct(500.0);
    assert!(close(w.correct(450.0), 450.0));
    assert_eq!(w.wraps(), 0);
}

#[test]
fn first_sample_is_the_baseline() {
    let mut w = WrapTracker::default();
    assert_eq!(w.last(), None);
    assert!(close(w.correct(3000.0), 3000.0));
    assert_eq!(w.wraps(), 0);
}

#[test]
fn repeated_wraps() {
    let mut w = WrapTracker::new(10.0, 1.0);
    let raw = [8.0, 9.5, 0.5, 5.0, 9.9, 0.1, 2.0];
    let expected = [8.0, 9.5, 10.5, 15.0, 19.9, 20.1, 22.0];
    for (&t, &e) in raw.iter().zip(expected.iter()) {
        assert!(close(w.correct(t), e), "{} should correct to {}", t, e);
    }
    assert_eq!(w.wraps(), 2);
}

#[test]
fn channels_wrap_independently() {
    let mut ws = WrapState::default();
    let m1 = Channel::Event(EventKind::M1);
    let pd = Channel::Event(EventKind::PD);
    ws.correct(m1, 4294.9);
    ws.correct(pd, 4200.0);
    ws.correct(Channel::Analog, 4294.96);

    assert!(close(ws.correct(m1, 0.1), 0.1 + T_WRAP_S));
    assert_eq!(ws.wraps(m1), 1);
    assert_eq!(ws.wraps(pd), 0);
    assert_eq!(ws.wraps(Channel::Analog), 0);

    assert!(close(ws.correct(Channel::Analog, 0.01), 0.01 + T_WRAP_S));
    assert_eq!(ws.wraps(Channel::Analog), 1);
    assert_eq!(ws.wraps(pd), 0);
}

#[test]
fn hard_sync_maps_offsets() {
    let t0 = Local.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    let mut c = ClockSync::new();
    assert_eq!(c.map(1.0), Timestamp::Hardware(1.0));

    c.arm(t0);
    assert_eq!(c.state(), SyncState::Armed { wall: t0 });
    assert!(!c.is_synced());
    assert_eq!(c.map(5.0), Timestamp::Hardware(5.0));

    assert!(c.observe_sw(10.0));
    assert!(c.is_synced());
    assert_eq!(c.map(12.5), Timestamp::Wall(t0 + clock::seconds(2.5)));
    assert_eq!(c.map(10.0), Timestamp::Wall(t0));

    // Another SW without a new pulse does not move the anchor
    assert!(!c.observe_sw(20.0));
    assert_eq!(c.map(12.5), Timestamp::Wall(t0 + clock::seconds(2.5)));
}

#[test]
fn resync_replaces_anchor() {
    let t0 = Local.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    let t1 = Local.with_ymd_and_hms(2024, 3, 1, 12, 10, 0).unwrap();
    let mut c = ClockSync::new();
    c.arm(t0);
    c.observe_sw(10.0);
    c.arm(t1);
    assert!(!c.is_synced());
    c.observe_sw(610.5);
    assert_eq!(c.map(611.0), Timestamp::Wall(t1 + clock::seconds(0.5)));
}

#[test]
fn soft_sync_only_when_unsynced() {
    let t0 = Local.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    let t1 = Local.with_ymd_and_hms(2024, 3, 1, 13, 0, 0).unwrap();
    let mut c = ClockSync::new();
    assert!(c.anchor(t0, 3.0));
    assert!(!c.anchor(t1, 4.0));
    assert_eq!(c.map(4.0), Timestamp::Wall(t0 + clock::seconds(1.0)));

    let mut armed = ClockSync::new();
    armed.arm(t0);
    assert!(!armed.anchor(t1, 4.0));
}

#[test]
fn log_sync_follows_anchors() {
    let t0 = Local.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    let log = vec![
        Record { time: Timestamp::Hardware(1.0), value: Value::Event(EventKind::M1) },
        Record { time: Timestamp::Wall(t0), value: Value::Sync },
        Record { time: Timestamp::Hardware(2.0), value: Value::Event(EventKind::PD) },
        Record { time: Timestamp::Hardware(3.0), value: Value::Event(EventKind::SW) },
        Record { time: Timestamp::Hardware(3.25), value: Value::Event(EventKind::M1) },
        Record { time: Timestamp::Hardware(4.0), value: Value::Analog(100) },
    ];
    let synced = clock::sync_to_wallclock(&log);
    assert_eq!(synced.len(), log.len());
    assert_eq!(synced[0], log[0]);
    assert_eq!(synced[1], log[1]);
    assert_eq!(synced[2], log[2]);
    assert_eq!(synced[3].time, Timestamp::Wall(t0));
    assert_eq!(synced[4].time, Timestamp::Wall(t0 + clock::seconds(0.25)));
    assert_eq!(synced[5], Record { time: Timestamp::Wall(t0 + clock::seconds(1.0)), value: Value::Analog(100) });
}
