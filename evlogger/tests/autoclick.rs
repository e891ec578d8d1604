use evlogger::autoclick::Autoclicker;
use evtools::cfg::Autoclick;
use std::time::{Duration, Instant};

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn every(period: u64, jitter: u64, count: u64, click_to_start: bool) -> Autoclick {
    Autoclick {
        period: ms(period),
        jitter: ms(jitter),
        duration: ms(1),
        count,
        click_to_start,
    }
}

#[test]
fn clicks_once_per_period() {
    let t0 = Instant::now();
    let mut a = Autoclicker::new(&every(10, 0, 2, false), t0);
    assert!(!a.due(t0));
    assert!(!a.due(t0 + ms(5)));
    assert!(a.due(t0 + ms(11)));
    assert_eq!(a.remaining(), 1);
    assert!(!a.due(t0 + ms(15)));
    assert!(a.due(t0 + ms(22)));
    assert_eq!(a.remaining(), 0);
    assert!(!a.due(t0 + ms(100)));
}

#[test]
fn jitter_stays_within_half_width() {
    let t0 = Instant::now();
    for _ in 0..20 {
        let mut a = Autoclicker::new(&every(10, 4, 1, false), t0);
        assert!(!a.due(t0 + ms(7)));
        assert!(a.due(t0 + ms(13)));
    }
}

#[test]
fn waits_for_the_first_click() {
    let t0 = Instant::now();
    let mut a = Autoclicker::new(&every(10, 0, 3, true), t0);
    assert!(!a.is_started());
    assert!(!a.due(t0 + ms(1000)));
    a.start(t0 + ms(1000));
    assert!(a.is_started());
    assert!(!a.due(t0 + ms(1005)));
    assert!(a.due(t0 + ms(1011)));
    assert_eq!(a.click_duration(), ms(1));
}
