//! Batch bookkeeping: monotonic batch ids and a holder that discards stale completions.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::entities::medication::MedicationRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchId(u64);

impl BatchId {
    pub fn value(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchMode {
    WatchList,
    Search,
    Similar,
    Comparison,
}

/// How a batch ended. A batch never fails outright; lookup faults are reported here
/// and kept distinct from a successful lookup that matched nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchStatus {
    Complete,
    NoResults,
    SourceUnavailable { reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    pub id: BatchId,
    pub mode: BatchMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(flatten)]
    pub status: BatchStatus,
    pub records: Vec<MedicationRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<u64>,
}

impl Batch {
    pub(crate) fn new(id: BatchId, mode: BatchMode, query: Option<String>) -> Self {
        Self {
            id,
            mode,
            query,
            status: BatchStatus::Complete,
            records: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub(crate) fn with_status(mut self, status: BatchStatus) -> Self {
        self.status = status;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct BatchSequencer {
    last: AtomicU64,
}

impl BatchSequencer {
    pub fn next_id(&self) -> BatchId {
        BatchId(self.last.fetch_add(1, Ordering::SeqCst).saturating_add(1))
    }
}

/// The presentation layer's view of the most recent batch.
#[derive(Debug, Default)]
pub struct LatestBatch {
    current: Option<Batch>,
}

impl LatestBatch {
    /// Accepts `batch` unless a newer batch has already been applied.
    pub fn offer(&mut self, batch: Batch) -> bool {
        if let Some(current) = self.current.as_ref()
            && batch.id < current.id
        {
            return false;
        }
        self.current = Some(batch);
        true
    }

    pub fn current(&self) -> Option<&Batch> {
        self.current.as_ref()
    }
}
