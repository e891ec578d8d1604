//! Host-to-device command protocol of the hardware event logger
//!
//! Commands are newline-terminated ASCII tokens. This module is the only
//! place that knows their spelling.

use anyhow::{anyhow, bail, Error, Result};
use evtools::parse;
use evtools::{Sample, MAX_ADC_VALUE};
use std::fmt;
use std::str::FromStr;
use std::thread;
use std::time::{Duration, Instant};

use crate::source::SampleSource;

/// Text the firmware includes in its reply to [`Command::Info`]
pub const FIRMWARE_TAG: &str = "Hardware Event Logger";

/// Longest click the logger's mouse-down line supports
pub const MAX_CLICK: Duration = Duration::from_millis(100);

#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum Command {
    /// Report analog samples over USB
    AdcOn,
    /// Stop reporting analog samples (reduces USB traffic)
    AdcOff,
    /// Hold the simulated mouse button down
    AutoclickOn,
    /// Release the simulated mouse button
    AutoclickOff,
    /// Request the firmware identification string
    Info,
}

impl Command {
    pub fn token(self) -> &'static str {
        match self {
            Command::AdcOn => "aon",
            Command::AdcOff => "aoff",
            Command::AutoclickOn => "con",
            Command::AutoclickOff => "coff",
            Command::Info => "i",
        }
    }

    pub fn adc(on: bool) -> Command {
        if on { Command::AdcOn } else { Command::AdcOff }
    }

    pub fn mouse_down(down: bool) -> Command {
        if down { Command::AutoclickOn } else { Command::AutoclickOff }
    }

    /// Bytes sent over the wire
    pub fn encode(self) -> Vec<u8> {
        let mut b = self.token().as_bytes().to_vec();
        b.push(b'\n');
        b
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Command {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "aon" => Ok(Command::AdcOn),
            "aoff" => Ok(Command::AdcOff),
            "con" => Ok(Command::AutoclickOn),
            "coff" => Ok(Command::AutoclickOff),
            "i" => Ok(Command::Info),
            other => Err(anyhow!("unknown command: {}", other)),
        }
    }
}

/// Separate the firmware identification line from a reply.
///
/// Returns the first line containing [`FIRMWARE_TAG`] (trimmed) and the rest
/// of the text, with line terminators intact, so that samples that arrived
/// alongside the reply are not lost.
pub fn split_firmware(text: &str) -> (Option<String>, String) {
    let mut firmware = None;
    let mut rest = String::with_capacity(text.len());
    for line in text.split_inclusive('\n') {
        if firmware.is_none() && line.contains(FIRMWARE_TAG) {
            firmware = Some(line.trim().to_string());
        } else {
            rest.push_str(line);
        }
    }
    (firmware, rest)
}

/// Press and release the simulated mouse button
pub fn click(source: &mut impl SampleSource, duration: Duration) -> Result<()> {
    if duration > MAX_CLICK {
        bail!(
            "cannot produce click duration {}ms > {}ms",
            duration.as_millis(),
            MAX_CLICK.as_millis(),
        );
    }
    source.write(Command::mouse_down(true))?;
    thread::sleep(duration);
    source.write(Command::mouse_down(false))?;
    Ok(())
}

/// Collect analog samples for `window` of wall-clock time.
///
/// Events and out-of-range values are skipped. Times are hardware seconds.
pub fn analog_window(
    source: &mut impl SampleSource,
    window: Duration,
    flush: bool,
) -> Result<Vec<(f64, i64)>> {
    if flush {
        source.flush()?;
    }
    let mut lines = parse::LineBuffer::new();
    let mut values = Vec::new();
    let start = Instant::now();
    while start.elapsed() < window {
        let chunk = match source.next_chunk()? {
            Some(c) => c,
            None => {
                thread::sleep(Duration::from_millis(1));
                continue;
            }
        };
        for line in lines.push(&chunk) {
            if let Some(Sample::Analog { time, value }) = parse::parse_line(&line) {
                if (0..MAX_ADC_VALUE).contains(&value) {
                    values.push((time, value));
                }
            }
        }
    }
    Ok(values)
}

/// Mean analog value over `window`, or None if no samples arrived
pub fn average_analog(source: &mut impl SampleSource, window: Duration) -> Result<Option<f64>> {
    let values = analog_window(source, window, true)?;
    if values.is_empty() {
        return Ok(None);
    }
    let sum: i64 = values.iter().map(|&(_, v)| v).sum();
    Ok(Some(sum as f64 / values.len() as f64))
}
