use evtools::cfg::Autoclick;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::{Duration, Instant};

/// Decides when the next automatic click is due.
///
/// Clicks are spaced by `period` plus a uniform jitter of `±jitter/2`,
/// redrawn after every click, until `count` clicks have been made.
pub struct Autoclicker {
    period: Duration,
    jitter: Duration,
    duration: Duration,
    remaining: u64,
    started: bool,
    last: Instant,
    next: Duration,
    rng: StdRng,
}

impl Autoclicker {
    pub fn new(cfg: &Autoclick, now: Instant) -> Self {
        let mut a = Autoclicker {
            period: cfg.period,
            jitter: cfg.jitter,
            duration: cfg.duration,
            remaining: cfg.count,
            started: !cfg.click_to_start,
            last: now,
            next: cfg.period,
            rng: StdRng::from_entropy(),
        };
        a.next = a.draw();
        a
    }

    /// Start clicking, counting the first period from `now`
    pub fn start(&mut self, now: Instant) {
        if !self.started {
            self.started = true;
            self.last = now;
        }
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// How long each click holds the button down
    pub fn click_duration(&self) -> Duration {
        self.duration
    }

    /// Whether a click is due at `now`. A due click is counted as made.
    pub fn due(&mut self, now: Instant) -> bool {
        if !self.started || self.remaining == 0 {
            return false;
        }
        if now.saturating_duration_since(self.last) <= self.next {
            return false;
        }
        self.last = now;
        self.remaining -= 1;
        self.next = self.draw();
        true
    }

    fn draw(&mut self) -> Duration {
        let offset = self.jitter.as_secs_f64() * (self.rng.gen::<f64>() - 0.5);
        Duration::from_secs_f64((self.period.as_secs_f64() + offset).max(0.0))
    }
}
