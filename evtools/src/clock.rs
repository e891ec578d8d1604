//! Hardware clock handling: counter wraparound and mapping to wall-clock time
//!
//! The logger timestamps samples with a free-running microsecond counter that
//! overflows every [`T_WRAP_S`](crate::T_WRAP_S) seconds. Each channel is
//! unwrapped on its own, since channels report at different rates and see the
//! overflow at different raw values.
//!
//! Mapping to wall-clock time needs one pairing of a wall-clock instant with a
//! hardware timestamp. A hard sync arms the clock with the instant a sync
//! pulse was sent; the next `SW` event carries the hardware time of the same
//! pulse. A soft sync anchors on the first sample of the session instead.

use crate::{Channel, EventKind, Record, Timestamp, Value, T_WRAP_S, WRAP_MARGIN_S};
use chrono::{DateTime, Duration, Local};
use std::collections::HashMap;

/// Wraparound state of a single channel
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct WrapTracker {
    period: f64,
    margin: f64,
    last: Option<f64>,
    wraps: u32,
}

impl WrapTracker {
    pub fn new(period: f64, margin: f64) -> Self {
        WrapTracker {
            period,
            margin,
            last: None,
            wraps: 0,
        }
    }

    /// Correct a raw hardware timestamp for the wraps seen so far.
    ///
    /// The first timestamp is the baseline with no wraps. After that, a
    /// corrected timestamp that falls more than `margin` behind the last one
    /// means the counter overflowed again.
    pub fn correct(&mut self, raw: f64) -> f64 {
        let mut time = raw + self.wraps as f64 * self.period;
        if let Some(last) = self.last {
            if time < last - self.margin {
                self.wraps += 1;
                time += self.period;
            }
        }
        self.last = Some(time);
        time
    }

    pub fn wraps(&self) -> u32 {
        self.wraps
    }

    /// Last corrected timestamp
    pub fn last(&self) -> Option<f64> {
        self.last
    }
}

impl Default for WrapTracker {
    fn default() -> Self {
        WrapTracker::new(T_WRAP_S, WRAP_MARGIN_S)
    }
}

/// Wraparound trackers for every channel seen so far
#[derive(Clone, Debug)]
pub struct WrapState {
    period: f64,
    margin: f64,
    channels: HashMap<Channel, WrapTracker>,
}

impl WrapState {
    pub fn new(period: f64, margin: f64) -> Self {
        WrapState {
            period,
            margin,
            channels: HashMap::new(),
        }
    }

    pub fn correct(&mut self, channel: Channel, raw: f64) -> f64 {
        let (period, margin) = (self.period, self.margin);
        self.channels
            .entry(channel)
            .or_insert_with(|| WrapTracker::new(period, margin))
            .correct(raw)
    }

    pub fn wraps(&self, channel: Channel) -> u32 {
        self.channels.get(&channel).map_or(0, |t| t.wraps())
    }
}

impl Default for WrapState {
    fn default() -> Self {
        WrapState::new(T_WRAP_S, WRAP_MARGIN_S)
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum SyncState {
    Unsynced,
    /// A sync pulse went out at `wall`; waiting for its `SW` event
    Armed { wall: DateTime<Local> },
    /// Hardware time `hw` happened at `wall`
    Synced { wall: DateTime<Local>, hw: f64 },
}

/// Pairing of hardware time with wall-clock time
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct ClockSync {
    state: SyncState,
}

impl ClockSync {
    pub fn new() -> Self {
        ClockSync {
            state: SyncState::Unsynced,
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn is_synced(&self) -> bool {
        matches!(self.state, SyncState::Synced { .. })
    }

    /// Record that a sync pulse was sent at `wall`.
    ///
    /// Any previous pairing is dropped; the clock stays unsynced until the
    /// matching `SW` event is observed.
    pub fn arm(&mut self, wall: DateTime<Local>) {
        self.state = SyncState::Armed { wall };
    }

    /// Feed the hardware time of an `SW` event. Returns true if it completed
    /// a pairing. `SW` events that arrive while not armed are ordinary events.
    pub fn observe_sw(&mut self, hw: f64) -> bool {
        match self.state {
            SyncState::Armed { wall } => {
                self.state = SyncState::Synced { wall, hw };
                true
            }
            _ => false,
        }
    }

    /// Soft sync: pair `wall` with `hw` directly, only if nothing is paired
    /// or pending yet. Returns true if the anchor was taken.
    pub fn anchor(&mut self, wall: DateTime<Local>, hw: f64) -> bool {
        match self.state {
            SyncState::Unsynced => {
                self.state = SyncState::Synced { wall, hw };
                true
            }
            _ => false,
        }
    }

    /// Map a (wrap-corrected) hardware time; unsynced times pass through
    pub fn map(&self, hw: f64) -> Timestamp {
        match self.state {
            SyncState::Synced { wall, hw: offset } => Timestamp::Wall(wall + seconds(hw - offset)),
            _ => Timestamp::Hardware(hw),
        }
    }
}

impl Default for ClockSync {
    fn default() -> Self {
        ClockSync::new()
    }
}

/// Convert fractional seconds to a chrono duration at microsecond resolution
pub fn seconds(s: f64) -> Duration {
    Duration::microseconds((s * 1e6).round() as i64)
}

/// Re-time a log recorded in hardware time using the sync anchors it contains.
///
/// Every `SW sync` row arms the clock with its wall-clock time and the next
/// `SW` row completes the pairing; hardware times are mapped from then on.
/// Rows before the first pairing, and rows already in wall-clock time, are
/// passed through unchanged.
pub fn sync_to_wallclock(records: &[Record]) -> Vec<Record> {
    let mut clock = ClockSync::new();
    records
        .iter()
        .map(|&record| match record.time {
            Timestamp::Wall(wall) => {
                if record.value == Value::Sync {
                    clock.arm(wall);
                }
                record
            }
            Timestamp::Hardware(hw) => {
                if record.value == Value::Event(EventKind::SW) {
                    clock.observe_sw(hw);
                }
                Record {
                    time: clock.map(hw),
                    value: record.value,
                }
            }
        })
        .collect()
}
