//! Usage: Bounded, cancellable execution of read queries on pooled connections.

use rusqlite::{Connection, ErrorCode, InterruptHandle};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::Db;
use crate::shared::mutex_ext::MutexExt;

#[derive(Debug, thiserror::Error)]
pub(crate) enum QueryError {
    #[error("query `{label}` timed out after {timeout_ms}ms")]
    Timeout { label: &'static str, timeout_ms: u64 },
    #[error("query `{label}` failed: {message}")]
    Failed { label: &'static str, message: String },
    #[error("query `{label}` was cancelled")]
    Cancelled { label: &'static str },
}

impl QueryError {
    /// Timeouts are transient; the caller may retry the whole request.
    pub(crate) fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    fn from_rusqlite(label: &'static str, err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(e, _) = &err {
            if e.code == ErrorCode::OperationInterrupted {
                return Self::Cancelled { label };
            }
        }
        Self::Failed {
            label,
            message: format!("DB_ERROR: {err}"),
        }
    }
}

/// Interrupt handle of the connection currently running a statement for one call.
#[derive(Default)]
struct InterruptSlot {
    cancelled: AtomicBool,
    handle: Mutex<Option<InterruptHandle>>,
}

impl InterruptSlot {
    fn arm(&self, handle: InterruptHandle) -> bool {
        let mut slot = self.handle.lock_or_recover();
        if self.cancelled.load(Ordering::Acquire) {
            return false;
        }
        *slot = Some(handle);
        true
    }

    fn disarm(&self) {
        self.handle.lock_or_recover().take();
    }

    fn interrupt(&self) {
        let slot = self.handle.lock_or_recover();
        self.cancelled.store(true, Ordering::Release);
        if let Some(handle) = slot.as_ref() {
            handle.interrupt();
        }
    }
}

/// Interrupts the in-flight statement unless the query finished first.
/// Fires on timeout and when the awaiting future is dropped.
struct InterruptOnDrop {
    slot: Arc<InterruptSlot>,
    armed: bool,
}

impl InterruptOnDrop {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for InterruptOnDrop {
    fn drop(&mut self) {
        if self.armed {
            self.slot.interrupt();
        }
    }
}

/// Runs one read round-trip on the blocking pool with a hard deadline.
pub(crate) async fn run_read<T, F>(
    db: &Db,
    label: &'static str,
    timeout: Duration,
    f: F,
) -> Result<T, QueryError>
where
    T: Send + 'static,
    F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
{
    let slot = Arc::new(InterruptSlot::default());
    let mut guard = InterruptOnDrop {
        slot: slot.clone(),
        armed: true,
    };

    let db = db.clone();
    let task = tokio::task::spawn_blocking(move || {
        let conn = db
            .open_connection()
            .map_err(|message| QueryError::Failed { label, message })?;
        if !slot.arm(conn.get_interrupt_handle()) {
            return Err(QueryError::Cancelled { label });
        }
        let out = f(&conn);
        // Never let a late interrupt reach the next borrower of this connection.
        slot.disarm();
        out.map_err(|e| QueryError::from_rusqlite(label, e))
    });

    match tokio::time::timeout(timeout, task).await {
        Ok(joined) => {
            guard.disarm();
            match joined {
                Ok(result) => result,
                Err(err) => Err(QueryError::Failed {
                    label,
                    message: format!("TASK_JOIN_ERROR: {err}"),
                }),
            }
        }
        Err(_) => {
            let timeout_ms = timeout.as_millis() as u64;
            tracing::warn!(query = label, timeout_ms, "查询超时，已中断");
            Err(QueryError::Timeout { label, timeout_ms })
        }
    }
}
