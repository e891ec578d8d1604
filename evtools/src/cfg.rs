//! Configuration tools: formats for declaring and recording logger runs

use crate::latency::LatencyMode;
use crate::{EventKind, CLICK_TO_PHOTON_MAX_S, MIN_EVENT_SPACING_S};
use chrono::{DateTime, offset::Local};
use serde::{Serialize, Deserialize};
use std::path::PathBuf;
use std::time::Duration;

/// Logger run description for both declaring and recording runs in text files.
/// We use JSON as the text file format.
///
/// ## Declaring a run
///
/// All fields in `Run` are optional: specify only what makes sense. The `name`
/// field is free; set it to a useful value to help keep track of what was done.
/// Durations are parsed as in [humantime](https://docs.rs/humantime/), e.g.
/// `100ms` or `2min 30s`.
///
/// ## Recording a run
///
/// The record is the declaration with the recorded fields filled in: the
/// start timestamp, the run duration in seconds, the firmware string, whether
/// the log reached wall-clock sync, and per-event counts.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(default)]
pub struct Run {
    pub name:                String,
    pub timestamp:           Option<DateTime<Local>>,
    pub limit:               Option<RunLimit>,
    #[serde(with = "humantime_serde")]
    pub min_event_spacing:   Option<Duration>,
    #[serde(with = "humantime_serde")]
    pub click_to_photon_max: Option<Duration>,
    pub wallclock:           Option<bool>,
    pub log_events:          Option<bool>,
    pub log_adc:             Option<bool>,
    pub log_latencies:       Option<bool>,
    pub database:            Option<PathBuf>,
    pub latency_mode:        Option<LatencyMode>,
    pub adc_report:          Option<bool>,
    pub autoclick:           Option<Autoclick>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub emulation:           Vec<Emulated>,
    pub duration_s:          Option<f64>,
    pub firmware:            Option<String>,
    pub synced:              Option<bool>,
    pub latencies:           Option<u64>,
    pub analog_samples:      Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub counts:              Vec<EventCount>,
}

/// When to stop logging
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum RunLimit {
    #[serde(with = "humantime_serde")]
    Duration(Duration),
    /// Number of emitted records
    Samples(u64),
    /// Number of click-to-photon measurements
    Latencies(u64),
}

/// Periodic clicking through the logger's mouse-down line
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Copy)]
pub struct Autoclick {
    #[serde(with = "humantime_serde")]
    pub period:         Duration,
    #[serde(default, with = "humantime_serde")]
    pub jitter:         Duration,
    #[serde(default = "default_click", with = "humantime_serde")]
    pub duration:       Duration,
    pub count:          u64,
    #[serde(default)]
    pub click_to_start: bool,
}

/// Per-call firing probability of an emulated event
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Copy)]
pub struct Emulated {
    pub event:       EventKind,
    pub probability: f64,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Copy)]
pub struct EventCount {
    pub event: EventKind,
    pub count: u64,
}

fn default_click() -> Duration {
    Duration::from_millis(100)
}

impl Run {
    pub fn min_event_spacing_s(&self) -> f64 {
        self.min_event_spacing
            .map_or(MIN_EVENT_SPACING_S, |d| d.as_secs_f64())
    }

    pub fn click_to_photon_max_s(&self) -> f64 {
        self.click_to_photon_max
            .map_or(CLICK_TO_PHOTON_MAX_S, |d| d.as_secs_f64())
    }

    /// Emulated event probabilities, falling back to a typical click/photon mix
    pub fn emulation_or_default(&self) -> Vec<Emulated> {
        if self.emulation.is_empty() {
            vec![
                Emulated { event: EventKind::M1, probability: 0.1 },
                Emulated { event: EventKind::M2, probability: 0.001 },
                Emulated { event: EventKind::PD, probability: 0.1 },
            ]
        } else {
            self.emulation.clone()
        }
    }
}

/// Creates an empty Run. Specific defaults are applied by the accessors.
impl Default for Run {
    fn default() -> Self {
        Run {
            name:                String::new(),
            timestamp:           None,
            limit:               None,
            min_event_spacing:   None,
            click_to_photon_max: None,
            wallclock:           None,
            log_events:          None,
            log_adc:             None,
            log_latencies:       None,
            database:            None,
            latency_mode:        None,
            adc_report:          None,
            autoclick:           None,
            emulation:           Vec::new(),
            duration_s:          None,
            firmware:            None,
            synced:              None,
            latencies:           None,
            analog_samples:      None,
            counts:              Vec::new(),
        }
    }
}
