//! Reconciliation of extracted jobs against the persisted ledger.

use std::collections::HashSet;

use crate::models::Job;

/// Run-scoped view of the ids already present in the ledger.
///
/// Fetched once before any scraping begins, then append-only in memory
/// under a single-writer discipline: ids classified as new are folded in
/// immediately so a second occurrence within the same run is a refresh.
#[derive(Debug, Default)]
pub struct LedgerSnapshot {
    ids: HashSet<String>,
}

/// Batch classification result.
#[derive(Debug, Default)]
pub struct Reconciled {
    /// Jobs whose id was unknown at the time they were seen. Each id
    /// appears here at most once per run.
    pub new: Vec<Job>,
    /// Jobs already present in the ledger (or added earlier this run);
    /// only their last-seen marker needs refreshing.
    pub refresh: Vec<Job>,
}

impl Reconciled {
    pub fn refresh_ids(&self) -> Vec<String> {
        self.refresh.iter().map(|job| job.id.clone()).collect()
    }
}

impl LedgerSnapshot {
    pub fn new(ids: HashSet<String>) -> Self {
        Self { ids }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Classify a batch into new vs refresh. New ids are inserted into the
    /// snapshot as they are seen, which guarantees at-most-once-per-run
    /// insertion even when the same job surfaces via two strategies.
    pub fn reconcile(&mut self, batch: Vec<Job>) -> Reconciled {
        let mut out = Reconciled::default();
        for job in batch {
            if self.ids.contains(&job.id) {
                out.refresh.push(job);
            } else {
                self.ids.insert(job.id.clone());
                out.new.push(job);
            }
        }
        out
    }
}
