use anyhow::Result;
use evtools::cfg::{EventCount, Run, RunLimit};
use evtools::latency::{Latency, LatencyMeter};
use evtools::{EventKind, Record, Value};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::info;

use crate::autoclick::Autoclicker;
use crate::device;
use crate::merger::Merger;
use crate::source::SampleSource;

/// Running totals of what a run produced
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Tally {
    pub events: BTreeMap<EventKind, u64>,
    pub analog: u64,
    pub latencies: u64,
}

impl Tally {
    /// Records emitted, not counting sync anchors
    pub fn records(&self) -> u64 {
        self.events.values().sum::<u64>() + self.analog
    }

    pub fn counts(&self) -> Vec<EventCount> {
        self.events
            .iter()
            .map(|(&event, &count)| EventCount { event, count })
            .collect()
    }
}

/// Output of one pass of the loop
#[derive(Debug, Default)]
pub struct Step {
    pub records: Vec<Record>,
    pub latencies: Vec<Latency>,
}

/// One logging run: the merger plus the housekeeping around it
pub struct Logger<S: SampleSource> {
    merger: Merger<S>,
    limit: Option<RunLimit>,
    started: Instant,
    autoclick: Option<Autoclicker>,
    meter: LatencyMeter,
    tally: Tally,
}

impl<S: SampleSource> Logger<S> {
    pub fn new(merger: Merger<S>, run: &Run, now: Instant) -> Self {
        Logger {
            merger,
            limit: run.limit,
            started: now,
            autoclick: run.autoclick.as_ref().map(|a| Autoclicker::new(a, now)),
            meter: LatencyMeter::new(run.click_to_photon_max_s()),
            tally: Tally::default(),
        }
    }

    pub fn merger(&self) -> &Merger<S> {
        &self.merger
    }

    pub fn merger_mut(&mut self) -> &mut Merger<S> {
        &mut self.merger
    }

    pub fn tally(&self) -> &Tally {
        &self.tally
    }

    /// Whether the run limit has been reached
    pub fn done(&self, now: Instant) -> bool {
        match self.limit {
            Some(RunLimit::Duration(d)) => now.saturating_duration_since(self.started) >= d,
            Some(RunLimit::Samples(n)) => self.tally.records() >= n,
            Some(RunLimit::Latencies(n)) => self.tally.latencies >= n,
            None => false,
        }
    }

    /// Click if one is due, then read and process whatever is available
    pub fn step(&mut self, now: Instant) -> Result<Step> {
        if let Some(a) = self.autoclick.as_mut() {
            if a.due(now) {
                info!("autoclick, {} remaining", a.remaining());
                device::click(self.merger.source_mut(), a.click_duration())?;
            }
        }

        let records = self.merger.poll()?;
        let mut latencies = Vec::new();
        for r in records.iter() {
            match r.value {
                Value::Event(kind) => *self.tally.events.entry(kind).or_insert(0) += 1,
                Value::Analog(_) => self.tally.analog += 1,
                Value::Sync => continue,
            }
            if r.value == Value::Event(EventKind::M1) {
                if let Some(a) = self.autoclick.as_mut() {
                    if !a.is_started() {
                        a.start(now);
                        info!("Starting autoclicking...");
                        continue;
                    }
                }
            }
            if let Some(l) = self.meter.observe(r) {
                self.tally.latencies += 1;
                info!("Mouse-to-photon #{} = {:.3}ms", self.tally.latencies, l.latency_ms);
                latencies.push(l);
            }
        }
        Ok(Step { records, latencies })
    }
}
