//! `evinsert LOG DATABASE [--mode minimum|total|system]`
//!
//! Sync an event log to wall-clock time, measure click-to-photon latencies
//! and insert both into a SQLite database. Rows already present are skipped,
//! so importing a log twice is harmless. Latencies are tagged with the mode
//! they were measured in.

use argh::FromArgs;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{stdout, BufReader, Write};

use evtools::db::EventDb;
use evtools::latency::LatencyMode;
use evtools::{clock, de, latency, CLICK_TO_PHOTON_MAX_S};

const GIT_VERSION: &str = git_version::git_version!(fallback = "unknown");

#[derive(Debug, FromArgs, Clone)]
/// Import an event log and its click-to-photon latencies into a database
pub struct CliArgs {
    /// print version information
    #[argh(switch, short = 'v')]
    pub version: bool,
    /// maximum click-to-photon delay in seconds
    #[argh(option, default = "CLICK_TO_PHOTON_MAX_S")]
    pub max_delay: f64,
    /// what the latencies include: minimum, total or system
    #[argh(option, default = "LatencyMode::Minimum")]
    pub mode: LatencyMode,
    /// event log (csv)
    #[argh(positional)]
    pub log: Option<String>,
    /// database file, created if missing
    #[argh(positional)]
    pub database: Option<String>,
}

fn main() -> Result<()> {
    let args: CliArgs = argh::from_env();
    let stdout = stdout();
    let mut stdout = stdout.lock();
    if args.version {
        writeln!(
            stdout,
            concat!(
                env!("CARGO_BIN_NAME"),
                " ",
                "{}",
            ),
            GIT_VERSION,
        )?;
        return Ok(())
    }

    let (log, database) = match (args.log.clone(), args.database.clone()) {
        (Some(l), Some(d)) => (l, d),
        _ => anyhow::bail!("provide an input event log and an output database"),
    };

    writeln!(stdout, "Reading events from {} and time synchronizing...", log)?;
    let f = File::open(&log).with_context(|| format!("cannot open {}", log))?;
    let mut rdr = de::reader(BufReader::new(f));
    let events = clock::sync_to_wallclock(&de::records(&mut rdr)?);

    writeln!(stdout, "Measuring click-to-photon latencies...")?;
    let latencies = latency::click_to_photon(&events, args.max_delay);
    writeln!(stdout, "Found {} click to photon events...", latencies.len())?;

    writeln!(stdout, "Writing tables to {} ({} latencies)...", database, args.mode)?;
    let mut db = EventDb::open(&database)?;
    let n_events = db.insert_records(&events)?;
    let n_latencies = db.insert_latencies(&latencies, args.mode)?;
    writeln!(stdout, "Inserted {} events and {} latencies.", n_events, n_latencies)?;
    Ok(())
}
