//! The logger's read loop: raw text in, ordered records out
//!
//! Each complete line goes through parse, per-channel wraparound correction,
//! debouncing (events only) and wall-clock mapping, in that order. All state
//! lives in the [`Merger`] and is only touched from the thread polling it.

use anyhow::Result;
use chrono::{DateTime, Local};
use evtools::clock::{ClockSync, WrapState};
use evtools::debounce::Debouncer;
use evtools::parse::{self, LineBuffer};
use evtools::{EventKind, Record, Sample, Timestamp, Value};
use evtools::{MIN_EVENT_SPACING_S, T_WRAP_S, WRAP_MARGIN_S};
use tracing::{debug, info};

use crate::source::SampleSource;
use crate::sync::SyncPulse;

#[derive(Clone, Copy, Debug)]
pub struct Settings {
    pub min_event_spacing: f64,
    /// Map synced records to wall-clock time; otherwise keep hardware time
    /// and leave the sync anchors in the output for later alignment
    pub wallclock: bool,
    pub wrap_period: f64,
    pub wrap_margin: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            min_event_spacing: MIN_EVENT_SPACING_S,
            wallclock: true,
            wrap_period: T_WRAP_S,
            wrap_margin: WRAP_MARGIN_S,
        }
    }
}

pub struct Merger<S: SampleSource> {
    source: S,
    settings: Settings,
    lines: LineBuffer,
    wraps: WrapState,
    debounce: Debouncer,
    clock: ClockSync,
    /// Anchor on the first sample unless a hard sync was requested
    soft_sync: bool,
    dropped: u64,
}

impl<S: SampleSource> Merger<S> {
    pub fn new(source: S, settings: Settings) -> Self {
        Merger {
            source,
            settings,
            lines: LineBuffer::new(),
            wraps: WrapState::new(settings.wrap_period, settings.wrap_margin),
            debounce: Debouncer::new(settings.min_event_spacing),
            clock: ClockSync::new(),
            soft_sync: true,
            dropped: 0,
        }
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn clock(&self) -> &ClockSync {
        &self.clock
    }

    pub fn wraps(&self) -> &WrapState {
        &self.wraps
    }

    /// Number of non-empty lines that could not be parsed
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Discard buffered input, both in the source and in the carry-over buffer
    pub fn flush(&mut self) -> Result<()> {
        self.lines.clear();
        self.source.flush()
    }

    /// Send a sync pulse and wait for its `SW` event to pair with.
    ///
    /// Can be repeated to resync; each call replaces the previous anchor once
    /// its `SW` event arrives, even if that follows the previous `SW` by less
    /// than the minimum event spacing. Returns the anchor record.
    pub fn hard_sync(&mut self, pulse: &mut impl SyncPulse) -> Result<Record> {
        let wall = pulse.pulse()?;
        Ok(self.arm(wall))
    }

    /// Arm the clock with the wall-clock instant of a sync pulse
    pub fn arm(&mut self, wall: DateTime<Local>) -> Record {
        self.soft_sync = false;
        self.clock.arm(wall);
        info!("sync pulse sent at {}", Timestamp::Wall(wall));
        Record {
            time: Timestamp::Wall(wall),
            value: Value::Sync,
        }
    }

    /// Read what the source has and process every complete line
    pub fn poll(&mut self) -> Result<Vec<Record>> {
        match self.source.next_chunk()? {
            Some(chunk) => Ok(self.process_chunk(&chunk, Local::now())),
            None => Ok(Vec::new()),
        }
    }

    /// Process a chunk received at wall-clock time `now`
    pub fn process_chunk(&mut self, chunk: &str, now: DateTime<Local>) -> Vec<Record> {
        let mut out = Vec::new();
        for line in self.lines.push(chunk) {
            self.process_line(&line, now, &mut out);
        }
        out
    }

    fn process_line(&mut self, line: &str, now: DateTime<Local>, out: &mut Vec<Record>) {
        let sample = match parse::parse_line(line) {
            Some(s) => s,
            None => {
                if !line.trim().is_empty() {
                    self.dropped += 1;
                    debug!("dropping malformed line {:?}", line);
                }
                return;
            }
        };
        let time = self.wraps.correct(sample.channel(), sample.time());

        if self.soft_sync {
            self.soft_sync = false;
            if self.clock.anchor(now, time) {
                info!("soft sync at {:.6}s", time);
                out.push(Record {
                    time: Timestamp::Wall(now),
                    value: Value::Sync,
                });
                if !self.settings.wallclock {
                    self.debounce.accept(EventKind::SW, time);
                    out.push(Record {
                        time: Timestamp::Hardware(time),
                        value: Value::Event(EventKind::SW),
                    });
                }
            }
        }

        match sample {
            Sample::Analog { value, .. } => {
                out.push(Record {
                    time: self.stamp(time),
                    value: Value::Analog(value),
                });
            }
            Sample::Event { kind, .. } => {
                // The SW answering a sync pulse is taken even inside the spacing window
                if kind == EventKind::SW && self.clock.observe_sw(time) {
                    self.debounce.record(kind, time);
                    info!("hard sync paired with SW at {:.6}s", time);
                } else if !self.debounce.accept(kind, time) {
                    debug!("debounced {} at {:.6}s", kind, time);
                    return;
                }
                info!("{} at {:.3}s", kind.name(), time);
                out.push(Record {
                    time: self.stamp(time),
                    value: Value::Event(kind),
                });
            }
        }
    }

    fn stamp(&self, time: f64) -> Timestamp {
        if self.settings.wallclock {
            self.clock.map(time)
        } else {
            Timestamp::Hardware(time)
        }
    }
}
