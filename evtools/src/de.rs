//! Deserialization of comma-separated event logs

use crate::{Record, Timestamp, Value};
use anyhow::{Context, Result};
use std::io::Read;

/// CSV reader for log files; the first row is taken as the header
pub fn reader<R: Read>(rdr: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(b',')
        .from_reader(rdr)
}

/// Deserialize (time, event) rows
pub fn records(rdr: &mut csv::Reader<impl Read>) -> Result<Vec<Record>> {
    let mut records: Vec<Record> = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let row = result?;
        // Header is row 1
        let line = i + 2;
        let time = row
            .get(0)
            .with_context(|| format!("row {}: missing time", line))?
            .parse::<Timestamp>()
            .with_context(|| format!("row {}", line))?;
        let value = row
            .get(1)
            .with_context(|| format!("row {}: missing event", line))?
            .parse::<Value>()
            .with_context(|| format!("row {}", line))?;
        records.push(Record { time, value });
    }
    Ok(records)
}
