use crate::models::Summary;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// A published summary together with its provenance.
#[derive(Debug, Clone)]
pub struct StoredSummary {
    /// Monotonic publish counter, starting at 1.
    pub version: u64,
    /// Identifier of the analysis run that produced the summary.
    pub run_id: Uuid,
    pub computed_at: DateTime<Utc>,
    pub summary: Arc<Summary>,
}

/// Single-slot holder of the most recently computed summary.
///
/// Each `publish` replaces the previous entry; concurrent publishers race and
/// the last write wins. Readers always see one complete summary.
#[derive(Debug, Default)]
pub struct SummaryStore {
    slot: RwLock<Option<StoredSummary>>,
    version: AtomicU64,
}

impl SummaryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a new summary, overwriting any previous one.
    pub async fn publish(&self, summary: Summary) -> StoredSummary {
        // Versions are assigned under the write lock so the slot never holds
        // an older version than the counter reports.
        let mut slot = self.slot.write().await;
        let entry = StoredSummary {
            version: self.version.fetch_add(1, Ordering::SeqCst) + 1,
            run_id: Uuid::new_v4(),
            computed_at: Utc::now(),
            summary: Arc::new(summary),
        };
        *slot = Some(entry.clone());
        drop(slot);

        tracing::debug!(
            "Published summary v{} (run {})",
            entry.version,
            entry.run_id
        );
        entry
    }

    pub async fn latest(&self) -> Option<StoredSummary> {
        self.slot.read().await.clone()
    }

    /// Last assigned version; 0 when nothing has been published.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }
}
