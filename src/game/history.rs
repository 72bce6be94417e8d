use crate::game::types::HistoryEntry;
use chrono::{DateTime, Duration, Utc};

/// Newest-first log of recent crash points, bounded by age and count
#[derive(Debug, Clone)]
pub struct HistoryLedger {
    entries: Vec<HistoryEntry>,
    window: Duration,
    capacity: usize,
}

impl HistoryLedger {
    pub fn new(window: Duration, capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            window,
            capacity,
        }
    }

    /// Restore previously persisted entries, dropping any that are too old as
    /// of `now` or beyond capacity
    pub fn with_entries(
        entries: Vec<HistoryEntry>,
        window: Duration,
        capacity: usize,
        now: DateTime<Utc>,
    ) -> Self {
        let mut ledger = Self {
            entries,
            window,
            capacity,
        };
        ledger.prune(now);
        ledger
    }

    pub fn record(&mut self, crash_point: f64, now: DateTime<Utc>) {
        self.entries.insert(
            0,
            HistoryEntry {
                crash_point,
                timestamp: now,
            },
        );
        self.prune(now);
    }

    fn prune(&mut self, now: DateTime<Utc>) {
        let window = self.window;
        self.entries.retain(|entry| now - entry.timestamp < window);
        self.entries.truncate(self.capacity);
    }

    pub fn snapshot(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
