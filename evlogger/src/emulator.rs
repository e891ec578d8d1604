//! Synthetic logger output for running without hardware

use anyhow::Result;
use evtools::cfg::Emulated;
use evtools::parse;
use evtools::EventKind;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use tracing::debug;

use crate::device::{Command, FIRMWARE_TAG};
use crate::source::SampleSource;

/// Largest step of the virtual clock between emitted events, in us
pub const MAX_STEP_US: u64 = 1_000_000;

/// Generates wire lines for randomly firing events.
///
/// Every call draws once per configured event. Of the events that fire, the
/// one with the highest configured probability is emitted (the first one
/// configured on a tie) after advancing a virtual microsecond clock by a
/// random positive step.
pub struct Emulator {
    events: Vec<Emulated>,
    rng: StdRng,
    clock_us: u64,
}

impl Emulator {
    pub fn new(events: Vec<Emulated>) -> Self {
        Emulator {
            events,
            rng: StdRng::from_entropy(),
            clock_us: 0,
        }
    }

    pub fn with_seed(events: Vec<Emulated>, seed: u64) -> Self {
        Emulator {
            events,
            rng: StdRng::seed_from_u64(seed),
            clock_us: 0,
        }
    }

    /// Next line, or None if nothing fired this call
    pub fn next_sample(&mut self) -> Option<String> {
        let mut fired: Option<Emulated> = None;
        for e in self.events.iter() {
            let draw: f64 = self.rng.gen();
            if draw < e.probability && fired.map_or(true, |f| e.probability > f.probability) {
                fired = Some(*e);
            }
        }
        fired.map(|e| self.emit(e.event))
    }

    /// Advance the virtual clock and produce a line for `kind`
    pub fn emit(&mut self, kind: EventKind) -> String {
        self.clock_us += self.rng.gen_range(1..=MAX_STEP_US);
        parse::format_line(self.clock_us, kind)
    }

    /// Virtual clock, in us
    pub fn time_us(&self) -> u64 {
        self.clock_us
    }
}

/// [`SampleSource`] backed by an [`Emulator`].
///
/// A mouse-down command queues a synthetic left click, which is reported
/// before any new random events.
pub struct EmulatedSource {
    emulator: Emulator,
    queue: VecDeque<String>,
}

impl EmulatedSource {
    pub fn new(emulator: Emulator) -> Self {
        EmulatedSource {
            emulator,
            queue: VecDeque::new(),
        }
    }

    pub fn emulator(&self) -> &Emulator {
        &self.emulator
    }
}

impl SampleSource for EmulatedSource {
    fn flush(&mut self) -> Result<()> {
        self.queue.clear();
        Ok(())
    }

    fn next_chunk(&mut self) -> Result<Option<String>> {
        if !self.queue.is_empty() {
            let mut chunk = String::new();
            for line in self.queue.drain(..) {
                chunk.push_str(&line);
                chunk.push('\n');
            }
            return Ok(Some(chunk));
        }
        Ok(self.emulator.next_sample().map(|mut line| {
            line.push('\n');
            line
        }))
    }

    fn write(&mut self, cmd: Command) -> Result<()> {
        debug!("emulated {}", cmd);
        if cmd == Command::AutoclickOn {
            let line = self.emulator.emit(EventKind::M1);
            self.queue.push_back(line);
        }
        Ok(())
    }

    fn firmware(&mut self) -> Result<Option<String>> {
        Ok(Some(format!("{} Emulator", FIRMWARE_TAG)))
    }
}
