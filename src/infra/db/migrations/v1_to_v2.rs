//! Usage: SQLite migration v1->v2 (durable report store).

use rusqlite::Connection;

pub(super) fn migrate_v1_to_v2(conn: &mut Connection) -> Result<(), String> {
    const VERSION: i64 = 2;
    let tx = conn
        .transaction()
        .map_err(|e| format!("failed to start sqlite transaction: {e}"))?;

    // `seq` keeps insertion order for listing; `id` is the public report id.
    tx.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS reports (
  seq INTEGER PRIMARY KEY AUTOINCREMENT,
  id TEXT NOT NULL UNIQUE,
  name TEXT NOT NULL,
  created_at INTEGER NOT NULL,
  report_json TEXT NOT NULL
);
"#,
    )
    .map_err(|e| format!("failed to migrate v1->v2: {e}"))?;

    super::record_migration(&tx, VERSION)?;
    super::set_user_version(&tx, VERSION)?;

    tx.commit()
        .map_err(|e| format!("failed to commit migration: {e}"))?;

    Ok(())
}
