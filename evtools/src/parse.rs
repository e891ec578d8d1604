//! Decoding of the logger's line protocol, `<timestamp_us>:<payload>`

use crate::{EventKind, Sample};
use std::mem;

pub const SEPARATOR: char = ':';

/// Parse one line into a sample.
///
/// Returns `None` for anything malformed: a missing separator, a timestamp
/// that is not an integer number of microseconds, or a payload that is
/// neither a known event token nor an integer. Partial lines at buffer
/// boundaries end up here too, so this is never an error.
pub fn parse_line(raw: &str) -> Option<Sample> {
    let (stamp, payload) = raw.split_once(SEPARATOR)?;
    let micros = stamp.trim().parse::<u64>().ok()?;
    let time = micros as f64 / 1_000_000.0;
    let payload = payload.trim();
    match EventKind::from_token(payload) {
        Some(kind) => Some(Sample::Event { time, kind }),
        None => payload
            .parse::<i64>()
            .ok()
            .map(|value| Sample::Analog { time, value }),
    }
}

/// Format a sample back into a wire line (without terminator)
pub fn format_line(micros: u64, payload: impl std::fmt::Display) -> String {
    format!("{}{}{}", micros, SEPARATOR, payload)
}

/// Carry-over buffer for reads that are not aligned to lines.
///
/// Chunks are appended as they arrive; every complete line is handed back
/// and the trailing fragment is kept to prefix the next chunk.
#[derive(Default, Debug)]
pub struct LineBuffer {
    carry: String,
}

impl LineBuffer {
    pub fn new() -> Self {
        LineBuffer::default()
    }

    /// Append a chunk and return the lines it completes, terminators stripped
    pub fn push(&mut self, chunk: &str) -> Vec<String> {
        self.carry.push_str(chunk);
        match self.carry.rfind('\n') {
            Some(end) => {
                let rest = self.carry.split_off(end + 1);
                let done = mem::replace(&mut self.carry, rest);
                done.lines().map(str::to_owned).collect()
            }
            None => Vec::new(),
        }
    }

    /// The incomplete trailing fragment
    pub fn pending(&self) -> &str {
        &self.carry
    }

    pub fn clear(&mut self) {
        self.carry.clear();
    }
}
