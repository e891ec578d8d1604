//! Serialization of event logs to comma-separated values

use crate::latency::Latency;
use crate::Record;
use anyhow::Result;
use std::io::Write;

pub const EVENT_HEADER: [&str; 2] = ["Time", "Event"];
pub const LATENCY_HEADER: [&str; 2] = ["Time", "Latency [ms]"];

/// CSV writer for log files. Headers are written explicitly with [`header`].
pub fn writer<W: Write>(wtr: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .has_headers(false)
        .delimiter(b',')
        .from_writer(wtr)
}

pub fn header(wtr: &mut csv::Writer<impl Write>, header: &[&str]) -> Result<()> {
    wtr.write_record(header)?;
    Ok(())
}

/// Write one (time, event) row
pub fn record(wtr: &mut csv::Writer<impl Write>, record: &Record) -> Result<()> {
    wtr.write_record(&[record.time.to_string(), record.value.to_string()])?;
    Ok(())
}

/// Write (time, event) rows
pub fn records(wtr: &mut csv::Writer<impl Write>, records: &[Record]) -> Result<()> {
    for r in records.iter() {
        record(wtr, r)?;
    }
    Ok(())
}

/// Write one (click time, latency in ms) row
pub fn latency(wtr: &mut csv::Writer<impl Write>, latency: &Latency) -> Result<()> {
    wtr.write_record(&[
        latency.time.to_string(),
        format!("{:.3}", latency.latency_ms),
    ])?;
    Ok(())
}
