//! Ingestion statistics tracking.
//!
//! Thread-safe counters for the events of an ingestion cycle.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use strum::IntoEnumIterator;

use super::types::IngestEvent;

/// Thread-safe per-cycle event counter.
///
/// Every [`IngestEvent`] is initialized to zero on creation, so lookups never miss.
pub struct IngestStats {
    events: HashMap<IngestEvent, AtomicUsize>,
}

impl IngestStats {
    /// Creates a tracker with every counter at zero.
    pub fn new() -> Self {
        let mut events = HashMap::new();
        for event in IngestEvent::iter() {
            events.insert(event, AtomicUsize::new(0));
        }
        IngestStats { events }
    }

    /// Increment an event counter.
    pub fn increment(&self, event: IngestEvent) {
        if let Some(counter) = self.events.get(&event) {
            counter.fetch_add(1, Ordering::Relaxed);
        } else {
            log::error!(
                "Attempted to increment counter for {:?} which is not in the map. \
                 This indicates a bug in IngestStats initialization.",
                event
            );
        }
    }

    /// Get the count for an event.
    pub fn get(&self, event: IngestEvent) -> usize {
        self.events
            .get(&event)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    /// Total number of failure events.
    pub fn total_failures(&self) -> usize {
        self.get(IngestEvent::FetchFailed) + self.get(IngestEvent::ParseFailed)
    }

    /// One-line summary used at the end of a cycle.
    pub fn summary(&self) -> String {
        format!(
            "{} listed, {} fetched, {} parsed, {} failed",
            self.get(IngestEvent::ReportListed),
            self.get(IngestEvent::PayloadFetched),
            self.get(IngestEvent::ReportParsed),
            self.total_failures()
        )
    }
}

impl Default for IngestStats {
    fn default() -> Self {
        Self::new()
    }
}
