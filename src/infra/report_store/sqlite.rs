use rusqlite::{params, ErrorCode, OptionalExtension};

use super::{ReportStore, StoreError};
use crate::db::Db;
use crate::reports::{Report, ReportListItem};

/// Durable store over the `reports` table; full reports are kept as JSON.
#[derive(Clone)]
pub(crate) struct SqliteReportStore {
    db: Db,
}

impl SqliteReportStore {
    pub(crate) fn new(db: Db) -> Self {
        Self { db }
    }
}

fn db_error(err: rusqlite::Error) -> StoreError {
    StoreError::Backend(format!("DB_ERROR: {err}"))
}

impl ReportStore for SqliteReportStore {
    fn put(&self, report: Report) -> Result<(), StoreError> {
        let json = serde_json::to_string(&report)
            .map_err(|e| StoreError::Backend(format!("SYSTEM_ERROR: failed to serialize report: {e}")))?;
        let conn = self.db.open_connection()?;

        let inserted = conn.execute(
            "INSERT INTO reports (id, name, created_at, report_json) VALUES (?1, ?2, ?3, ?4)",
            params![report.id, report.name, report.created_at, json],
        );
        match inserted {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                Err(StoreError::DuplicateId { id: report.id })
            }
            Err(err) => Err(db_error(err)),
        }
    }

    fn get(&self, id: &str) -> Result<Option<Report>, StoreError> {
        let conn = self.db.open_connection()?;
        let json: Option<String> = conn
            .query_row(
                "SELECT report_json FROM reports WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()
            .map_err(db_error)?;

        json.map(|json| {
            serde_json::from_str(&json)
                .map_err(|e| StoreError::Backend(format!("DB_ERROR: corrupt report {id}: {e}")))
        })
        .transpose()
    }

    fn list(&self) -> Result<Vec<ReportListItem>, StoreError> {
        let conn = self.db.open_connection()?;
        let mut stmt = conn
            .prepare("SELECT id, name, created_at FROM reports ORDER BY seq ASC")
            .map_err(db_error)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(ReportListItem {
                    id: row.get("id")?,
                    name: row.get("name")?,
                    created_at: row.get("created_at")?,
                })
            })
            .map_err(db_error)?;

        rows.collect::<Result<Vec<_>, _>>().map_err(db_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::test_db;
    use crate::report_store::test_support::report;

    #[test]
    fn put_get_and_list_round_trip_through_sqlite() {
        let t = test_db();
        let store = SqliteReportStore::new(t.db.clone());

        let mut first = report("r-1", "daily", 100);
        first.overview.total_requests = 42;
        store.put(first.clone()).expect("put first");
        store.put(report("r-0", "weekly", 50)).expect("put second");

        let listed = store.list().expect("list");
        let ids: Vec<&str> = listed.iter().map(|item| item.id.as_str()).collect();
        assert_eq!(ids, vec!["r-1", "r-0"]);

        assert_eq!(store.get("r-1").expect("get"), Some(first));
        assert!(store.get("missing").expect("get").is_none());
    }

    #[test]
    fn put_refuses_duplicate_id() {
        let t = test_db();
        let store = SqliteReportStore::new(t.db.clone());
        store.put(report("dup", "a", 1)).expect("put");

        let err = store.put(report("dup", "b", 2)).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateId { .. }), "{err}");
        assert_eq!(store.list().expect("list").len(), 1);
    }

    #[test]
    fn reports_survive_reopening_the_database() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("reports.db");
        {
            let db = crate::db::init(&path).expect("init");
            SqliteReportStore::new(db)
                .put(report("keep", "kept", 7))
                .expect("put");
        }

        let db = crate::db::init(&path).expect("reopen");
        let store = SqliteReportStore::new(db);
        assert_eq!(store.get("keep").expect("get").map(|r| r.name), Some("kept".to_string()));
    }
}
