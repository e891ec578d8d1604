use anyhow::{bail, Context, Result};
use chrono::Local;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use evlogger::device::{Command, MAX_CLICK};
use evlogger::emulator::{EmulatedSource, Emulator};
use evlogger::merger::{Merger, Settings};
use evlogger::run::Logger;
use evlogger::save::{SaveHandle, SaveMessage, Sinks};
use evlogger::source::{SampleSource, SerialSource};
use evlogger::sync::SerialSynchronizer;
use evlogger::{CliArgs, Device};
use evtools::cfg;

const GIT_VERSION: &str = git_version::git_version!(fallback = "unknown");

fn main() -> Result<()> {
    let args: CliArgs = argh::from_env();

    if args.version {
        println!(
            concat!(
                env!("CARGO_BIN_NAME"),
                " ",
                "{}",
            ),
            GIT_VERSION,
        );
        return Ok(())
    }

    tracing_subscriber::fmt::init();

    // Check everything we can before touching any device or file
    let device = args.device()?;
    let run: cfg::Run = match &args.config {
        Some(c) => {
            let f = File::open(c).with_context(|| format!("cannot open run file {}", c))?;
            serde_json::from_reader(BufReader::new(f))?
        }
        None => cfg::Run::default(),
    };
    if let Some(a) = &run.autoclick {
        if a.duration > MAX_CLICK {
            bail!("cannot produce click duration {:?} > {:?}", a.duration, MAX_CLICK);
        }
    }
    let base = PathBuf::from(
        args.out
            .clone()
            .unwrap_or_else(|| format!("log_{}", Local::now().format("%y-%m-%d_%H%M%S"))),
    );
    let log_adc = run.log_adc.unwrap_or(false);

    let mut source: Box<dyn SampleSource> = match device {
        Device::Serial(port) => {
            info!("Opening logger on {}...", port);
            Box::new(SerialSource::open(
                &port,
                args.baud,
                Duration::from_millis(args.timeout_ms),
            )?)
        }
        Device::Emulated => {
            info!("Running in emulation mode.");
            Box::new(EmulatedSource::new(Emulator::new(run.emulation_or_default())))
        }
    };
    let firmware = source.firmware()?;
    match &firmware {
        Some(f) => info!("firmware: {}", f),
        None => warn!("logger did not identify itself"),
    }

    let mut sinks = Sinks::new();
    if run.log_events.unwrap_or(true) {
        sinks = sinks.with_events(&base)?;
    }
    if log_adc {
        sinks = sinks.with_adc(&base)?;
    }
    if run.log_latencies.unwrap_or(false) {
        sinks = sinks.with_latencies(&base)?;
    }
    if let Some(db) = &run.database {
        sinks = sinks.with_database(db, run.latency_mode.unwrap_or_default())?;
    }
    let save = SaveHandle::new(sinks);

    let settings = Settings {
        min_event_spacing: run.min_event_spacing_s(),
        wallclock: run.wallclock.unwrap_or(true),
        ..Default::default()
    };
    let mut merger = Merger::new(source, settings);
    merger.flush()?;
    merger
        .source_mut()
        .write(Command::adc(run.adc_report.unwrap_or(log_adc)))?;

    if let Some(p) = &args.sync_port {
        let mut syncer = SerialSynchronizer::open(p)?;
        let anchor = merger.hard_sync(&mut syncer)?;
        save.save(SaveMessage::Record(anchor))?;
    }

    let timestamp = Local::now();
    let start = Instant::now();
    let tick = Duration::from_millis(args.tick_ms);
    let mut logger = Logger::new(merger, &run, start);

    while !logger.done(Instant::now()) {
        let step = logger.step(Instant::now())?;
        let idle = step.records.is_empty();
        for r in step.records {
            save.save(SaveMessage::Record(r))?;
        }
        for l in step.latencies {
            save.save(SaveMessage::Latency(l))?;
        }
        if idle {
            thread::sleep(tick);
        }
    }

    save.finish()?;

    let synced = logger.merger().clock().is_synced();
    if !synced {
        warn!("no sync was established; times are hardware-relative");
    }
    if logger.merger().dropped() > 0 {
        info!("dropped {} malformed lines", logger.merger().dropped());
    }

    // Now record the run record to disk
    let tally = logger.tally();
    let record = cfg::Run {
        timestamp:      Some(timestamp),
        duration_s:     Some(start.elapsed().as_secs_f64()),
        firmware,
        synced:         Some(synced),
        latencies:      Some(tally.latencies),
        analog_samples: Some(tally.analog),
        counts:         tally.counts(),
        ..run
    };
    let json_record = serde_json::to_string_pretty(&record)?;

    let mut rcd_path = base.as_os_str().to_owned();
    rcd_path.push("_run.json");
    let f = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&rcd_path)
        .with_context(|| format!("cannot create run record {:?}", rcd_path))?;
    let mut wtr = BufWriter::new(f);
    wtr.write_all(json_record.as_bytes())?;
    info!("wrote run record {:?}", rcd_path);

    Ok(())
}
