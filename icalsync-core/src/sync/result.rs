use std::fmt;

/// Counters for one reconciliation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncResult {
    pub idempotent: usize,
    pub created: usize,
    pub updated: usize,
    pub restored: usize,
    pub removed: usize,
    /// Feed events marked cancelled. They are still reconciled.
    pub cancelled_in_source: usize,
}

impl SyncResult {
    /// Feed events accounted for by the run.
    pub fn processed(&self) -> usize {
        self.idempotent + self.created + self.updated + self.restored
    }

    pub fn has_changes(&self) -> bool {
        self.created + self.updated + self.restored + self.removed > 0
    }
}

impl fmt::Display for SyncResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} processed: {} unchanged, {} created, {} updated, {} restored, {} removed ({} cancelled in feed)",
            self.processed(),
            self.idempotent,
            self.created,
            self.updated,
            self.restored,
            self.removed,
            self.cancelled_in_source
        )
    }
}
