//! Suppression of bounced and repeated events

use crate::{EventKind, MIN_EVENT_SPACING_S};
use std::collections::HashMap;

/// Tracks the last accepted time of each event kind.
///
/// Contact bounce and repeated serial reports of one physical event are
/// collapsed by rejecting any event that follows the previous accepted event
/// of the same kind by less than `min_spacing` seconds.
#[derive(Clone, Debug)]
pub struct Debouncer {
    min_spacing: f64,
    last: HashMap<EventKind, f64>,
}

impl Debouncer {
    pub fn new(min_spacing: f64) -> Self {
        Debouncer {
            min_spacing,
            last: HashMap::new(),
        }
    }

    /// Returns whether the event is accepted, recording it if so
    pub fn accept(&mut self, kind: EventKind, time: f64) -> bool {
        if let Some(&prior) = self.last.get(&kind) {
            if time - prior < self.min_spacing {
                return false;
            }
        }
        self.last.insert(kind, time);
        true
    }

    /// Take an event without checking its spacing
    pub fn record(&mut self, kind: EventKind, time: f64) {
        self.last.insert(kind, time);
    }

    /// Last accepted time for an event kind
    pub fn last(&self, kind: EventKind) -> Option<f64> {
        self.last.get(&kind).copied()
    }

    pub fn min_spacing(&self) -> f64 {
        self.min_spacing
    }

    pub fn reset(&mut self) {
        self.last.clear();
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Debouncer::new(MIN_EVENT_SPACING_S)
    }
}
