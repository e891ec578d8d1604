pub mod cfg;
pub mod clock;
pub mod db;
pub mod de;
pub mod debounce;
pub mod latency;
pub mod parse;
pub mod ser;

use anyhow::{anyhow, Error};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Events reported by the hardware event logger
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
pub enum EventKind {
    /// Left mouse button
    M1,
    /// Right mouse button
    M2,
    /// Photodetector trigger
    PD,
    /// Software sync pulse
    SW,
}

impl EventKind {
    pub const ALL: [EventKind; 4] = [EventKind::M1, EventKind::M2, EventKind::PD, EventKind::SW];

    /// Wire token for the event
    pub fn token(self) -> &'static str {
        match self {
            EventKind::M1 => "M1",
            EventKind::M2 => "M2",
            EventKind::PD => "PD",
            EventKind::SW => "SW",
        }
    }

    /// Exact match against the wire tokens
    pub fn from_token(s: &str) -> Option<EventKind> {
        EventKind::ALL.into_iter().find(|k| k.token() == s)
    }

    /// Human-readable name
    pub fn name(self) -> &'static str {
        match self {
            EventKind::M1 => "Left mouse button",
            EventKind::M2 => "Right mouse button",
            EventKind::PD => "Photodetector",
            EventKind::SW => "Software interrupt",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// A single decoded line from the logger, timestamped in hardware-relative seconds
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Sample {
    Event { time: f64, kind: EventKind },
    Analog { time: f64, value: i64 },
}

impl Sample {
    pub fn time(&self) -> f64 {
        match *self {
            Sample::Event { time, .. } => time,
            Sample::Analog { time, .. } => time,
        }
    }

    pub fn channel(&self) -> Channel {
        match *self {
            Sample::Event { kind, .. } => Channel::Event(kind),
            Sample::Analog { .. } => Channel::Analog,
        }
    }
}

/// Independent stream of samples, each tracked separately for counter wraparound
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub enum Channel {
    Event(EventKind),
    Analog,
}

/// Output time: hardware-relative seconds until a sync anchor is known, wall clock after
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Timestamp {
    Hardware(f64),
    Wall(DateTime<Local>),
}

impl Timestamp {
    /// Seconds on the timestamp's own scale (Unix seconds for wall-clock times)
    pub fn seconds(&self) -> f64 {
        match self {
            Timestamp::Hardware(t) => *t,
            Timestamp::Wall(dt) => {
                dt.timestamp() as f64 + dt.timestamp_subsec_micros() as f64 * 1e-6
            }
        }
    }

    pub fn is_wall(&self) -> bool {
        matches!(self, Timestamp::Wall(_))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timestamp::Hardware(t) => write!(f, "{:.6}", t),
            Timestamp::Wall(dt) => write!(f, "{}", dt.format(WALL_TIME_FORMAT)),
        }
    }
}

impl FromStr for Timestamp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, WALL_TIME_FORMAT) {
            return Local
                .from_local_datetime(&naive)
                .earliest()
                .map(Timestamp::Wall)
                .ok_or_else(|| anyhow!("{} does not exist in local time", s));
        }
        s.parse::<f64>()
            .map(Timestamp::Hardware)
            .map_err(|_| anyhow!("invalid timestamp: {}", s))
    }
}

/// What happened at a given time
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum Value {
    Event(EventKind),
    Analog(i64),
    /// Wall-clock anchor written when a sync is established
    Sync,
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Event(kind) => f.write_str(kind.token()),
            Value::Analog(v) => write!(f, "{}", v),
            Value::Sync => f.write_str(SYNC_TOKEN),
        }
    }
}

impl FromStr for Value {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == SYNC_TOKEN {
            Ok(Value::Sync)
        } else if let Some(kind) = EventKind::from_token(s) {
            Ok(Value::Event(kind))
        } else {
            s.parse::<i64>()
                .map(Value::Analog)
                .map_err(|_| anyhow!("invalid event: {}", s))
        }
    }
}

/// The unit of output of the logger: one accepted sample or sync anchor
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Record {
    pub time: Timestamp,
    pub value: Value,
}

pub const ADC_BIT_WIDTH: u32 = 10;
pub const MAX_ADC_VALUE: i64 = 1 << ADC_BIT_WIDTH;

/// The logger's `micros()` counter wraps after 2^32 us
pub const T_WRAP_S: f64 = 4294.967296;
/// A timestamp must go this far backwards to count as a wrap
pub const WRAP_MARGIN_S: f64 = 100.0;

pub const MIN_EVENT_SPACING_S: f64 = 0.1;
pub const CLICK_TO_PHOTON_MAX_S: f64 = 0.3;

pub const SYNC_TOKEN: &str = "SW sync";
pub const WALL_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";
