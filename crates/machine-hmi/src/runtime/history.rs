use machine_core::Snapshot;
use serde::Serialize;
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct HistoryEntry {
    pub unix_ms: u64,
    #[serde(flatten)]
    pub snapshot: Snapshot,
}

/// Rolling window of recent snapshots feeding the trend display.
#[derive(Debug, Clone)]
pub struct SnapshotHistory {
    capacity: usize,
    entries: VecDeque<HistoryEntry>,
}

impl SnapshotHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, unix_ms: u64, snapshot: Snapshot) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(HistoryEntry { unix_ms, snapshot });
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn temperatures(&self) -> impl Iterator<Item = f64> + '_ {
        self.iter().map(|e| e.snapshot.sensors.temperature)
    }

    /// `(min, max)` temperature over the window.
    pub fn temperature_range(&self) -> Option<(f64, f64)> {
        self.temperatures().fold(None, |acc, t| match acc {
            None => Some((t, t)),
            Some((lo, hi)) => Some((lo.min(t), hi.max(t))),
        })
    }
}
