//! Usage: SQLite connection setup, schema migrations, and common DB helpers.

mod exec;
mod migrations;

pub(crate) use exec::{run_read, QueryError};

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

const BUSY_TIMEOUT: Duration = Duration::from_millis(2000);

#[derive(Clone)]
pub(crate) struct Db {
    pool: Pool<SqliteConnectionManager>,
}

impl Db {
    pub(crate) fn open_connection(
        &self,
    ) -> Result<r2d2::PooledConnection<SqliteConnectionManager>, String> {
        self.pool
            .get()
            .map_err(|e| format!("DB_ERROR: failed to get connection from pool: {e}"))
    }
}

pub(crate) fn init(path: &Path) -> Result<Db, String> {
    let path_hint = path.to_string_lossy();

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("failed to create db dir {}: {e}", parent.display()))?;
    }

    let manager = SqliteConnectionManager::file(path).with_init(|conn| {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        configure_connection(conn)
    });

    let pool = Pool::new(manager).map_err(|e| format!("failed to create db pool: {e}"))?;
    let mut conn = pool
        .get()
        .map_err(|e| format!("failed to get startup connection: {e}"))?;

    migrations::apply_migrations(&mut conn)
        .map_err(|e| format!("sqlite migration failed at {path_hint}: {e}"))?;

    tracing::info!(path = %path_hint, "数据库初始化完成");
    Ok(Db { pool })
}

fn configure_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
"#,
    )?;

    Ok(())
}


#[cfg(test)]
mod tests {
    use super::test_support::test_db;

    #[test]
    fn init_creates_nested_db_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("logs.db");
        let db = super::init(&path).expect("init");
        assert!(path.exists());

        let conn = db.open_connection().expect("connection");
        let mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .expect("journal_mode");
        assert_eq!(mode.to_ascii_lowercase(), "wal");
    }

    #[test]
    fn pooled_connections_share_one_database() {
        let t = test_db();
        {
            let conn = t.db.open_connection().expect("connection a");
            conn.execute("INSERT INTO channels (id, name) VALUES (1, 'a')", [])
                .expect("insert channel");
        }
        let conn = t.db.open_connection().expect("connection b");
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM channels", [], |row| row.get(0))
            .expect("count channels");
        assert_eq!(count, 1);
    }
}
