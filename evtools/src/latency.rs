//! Click-to-photon latency: time from a left click to the next photodetector trigger

use crate::{EventKind, Record, Timestamp, Value};
use anyhow::{anyhow, Error};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Latency {
    /// Time of the click
    pub time: Timestamp,
    pub latency_ms: f64,
}

/// What a latency measurement includes, stored with it so that results from
/// different setups can share a database
#[derive(Clone, Copy, Eq, PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LatencyMode {
    /// Hardware click straight to the photodetector
    #[default]
    Minimum,
    /// Whole chain including the application under test
    Total,
    /// Operating system and display path only
    System,
}

impl LatencyMode {
    pub fn name(self) -> &'static str {
        match self {
            LatencyMode::Minimum => "minimum",
            LatencyMode::Total => "total",
            LatencyMode::System => "system",
        }
    }
}

impl fmt::Display for LatencyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LatencyMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "minimum" => Ok(LatencyMode::Minimum),
            "total" => Ok(LatencyMode::Total),
            "system" => Ok(LatencyMode::System),
            other => Err(anyhow!("unknown latency mode: {}", other)),
        }
    }
}

/// Streaming click-to-photon pairing.
///
/// A `PD` event is paired with the most recent unpaired `M1` when it follows
/// it by less than `max_s`. Each click is used at most once.
#[derive(Clone, Debug)]
pub struct LatencyMeter {
    max_s: f64,
    click: Option<Timestamp>,
}

impl LatencyMeter {
    pub fn new(max_s: f64) -> Self {
        LatencyMeter { max_s, click: None }
    }

    pub fn observe(&mut self, record: &Record) -> Option<Latency> {
        match record.value {
            Value::Event(EventKind::M1) => {
                self.click = Some(record.time);
                None
            }
            Value::Event(EventKind::PD) => {
                let click = self.click?;
                let dt = record.time.seconds() - click.seconds();
                if (0.0..self.max_s).contains(&dt) {
                    self.click = None;
                    Some(Latency {
                        time: click,
                        latency_ms: 1000.0 * dt,
                    })
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}

/// All click-to-photon latencies in a finished log
pub fn click_to_photon(records: &[Record], max_s: f64) -> Vec<Latency> {
    let mut meter = LatencyMeter::new(max_s);
    records.iter().filter_map(|r| meter.observe(r)).collect()
}
