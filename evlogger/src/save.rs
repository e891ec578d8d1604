use anyhow::{anyhow, bail, Context, Result};
use evtools::db::EventDb;
use evtools::latency::{Latency, LatencyMode};
use evtools::{ser, EventKind, Record, Value};
use std::fs::{File, OpenOptions};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};

pub enum SaveMessage {
    Record(Record),
    Latency(Latency),
    Shutdown,
}

type CsvFile = csv::Writer<BufWriter<File>>;

/// Output files of a run. Each is optional; missing ones are skipped.
#[derive(Default)]
pub struct Sinks {
    events: Option<CsvFile>,
    adc: Option<CsvFile>,
    latencies: Option<CsvFile>,
    db: Option<(EventDb, LatencyMode)>,
}

impl Sinks {
    pub fn new() -> Self {
        Sinks::default()
    }

    /// Event log, `<base>_event.csv`
    pub fn with_events(mut self, base: &Path) -> Result<Self> {
        self.events = Some(create_log(&suffixed(base, "_event.csv"), &ser::EVENT_HEADER)?);
        Ok(self)
    }

    /// Analog log, `<base>_adc.csv`
    pub fn with_adc(mut self, base: &Path) -> Result<Self> {
        self.adc = Some(create_log(&suffixed(base, "_adc.csv"), &ser::EVENT_HEADER)?);
        Ok(self)
    }

    /// Click-to-photon log, `<base>_c2p.csv`
    pub fn with_latencies(mut self, base: &Path) -> Result<Self> {
        self.latencies = Some(create_log(&suffixed(base, "_c2p.csv"), &ser::LATENCY_HEADER)?);
        Ok(self)
    }

    /// Database sink; latencies are stored tagged with `mode`
    pub fn with_database(mut self, path: &Path, mode: LatencyMode) -> Result<Self> {
        self.db = Some((EventDb::open(path)?, mode));
        Ok(self)
    }

    /// Route a message to the files that take it. Rows are flushed right
    /// away so the logs can be followed while the run is going.
    pub fn write(&mut self, msg: &SaveMessage) -> Result<()> {
        match msg {
            SaveMessage::Record(r) => {
                let is_analog = matches!(r.value, Value::Analog(_));
                // Sync rows go to both logs so each can be aligned on its own
                let is_sync = matches!(r.value, Value::Sync | Value::Event(EventKind::SW));
                if let Some(w) = self.events.as_mut() {
                    if !is_analog {
                        ser::record(w, r)?;
                        w.flush()?;
                    }
                }
                if let Some(w) = self.adc.as_mut() {
                    if is_analog || is_sync {
                        ser::record(w, r)?;
                        w.flush()?;
                    }
                }
                if let Some((db, _)) = self.db.as_ref() {
                    db.insert_record(r)?;
                }
            }
            SaveMessage::Latency(l) => {
                if let Some(w) = self.latencies.as_mut() {
                    ser::latency(w, l)?;
                    w.flush()?;
                }
                if let Some((db, mode)) = self.db.as_ref() {
                    db.insert_latency(l, *mode)?;
                }
            }
            SaveMessage::Shutdown => {}
        }
        Ok(())
    }
}

/// File IO in a dedicated thread that owns the output files
pub struct SaveHandle {
    pub sender: flume::Sender<SaveMessage>,
    join_handle: JoinHandle<Result<()>>,
}

impl SaveHandle {
    pub fn new(mut sinks: Sinks) -> Self {
        let (sender, receiver) = flume::unbounded();

        let join_handle = thread::spawn(move || -> Result<()> {
            while let Ok(msg) = receiver.recv() {
                if let SaveMessage::Shutdown = msg {
                    break;
                }
                sinks.write(&msg).context("file io error")?;
            }
            Ok(())
        });
        SaveHandle { sender, join_handle }
    }

    pub fn save(&self, msg: SaveMessage) -> Result<()> {
        self.sender
            .send(msg)
            .map_err(|_| anyhow!("save thread has stopped"))
    }

    /// Stop the save thread once everything queued has been written
    pub fn finish(self) -> Result<()> {
        // The thread may already have exited on an error, reported by join
        let _ = self.sender.send(SaveMessage::Shutdown);
        match self.join_handle.join() {
            Ok(r) => r,
            Err(_) => bail!("save thread panicked"),
        }
    }
}

fn suffixed(base: &Path, suffix: &str) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

fn create_log(path: &Path, header: &[&str]) -> Result<CsvFile> {
    let f = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .with_context(|| format!("cannot create {}", path.display()))?;
    let mut wtr = ser::writer(BufWriter::new(f));
    ser::header(&mut wtr, header)?;
    wtr.flush()?;
    Ok(wtr)
}
