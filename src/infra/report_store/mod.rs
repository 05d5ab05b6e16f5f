//! Usage: Keeps generated reports for later retrieval (in-memory or sqlite backed).

mod memory;
mod sqlite;

pub(crate) use memory::InMemoryReportStore;
pub(crate) use sqlite::SqliteReportStore;

use crate::reports::{Report, ReportListItem};

#[derive(Debug, thiserror::Error)]
pub(crate) enum StoreError {
    #[error("report id already exists: {id}")]
    DuplicateId { id: String },
    #[error("report store failure: {0}")]
    Backend(String),
}

impl From<String> for StoreError {
    fn from(message: String) -> Self {
        Self::Backend(message)
    }
}

/// Safe for concurrent use; `list` returns reports in insertion order.
pub(crate) trait ReportStore: Send + Sync {
    /// Refuses a report whose id is already stored.
    fn put(&self, report: Report) -> Result<(), StoreError>;

    fn get(&self, id: &str) -> Result<Option<Report>, StoreError>;

    fn list(&self) -> Result<Vec<ReportListItem>, StoreError>;
}
