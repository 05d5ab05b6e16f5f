//! Usage: Record-level access to the `logs` table for fixtures and cross-checks against
//! the aggregate SQL. Production reads go through `reports::query` only.

use rusqlite::{params, Connection, Row};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct LogRecord {
    pub(crate) id: i64,
    pub(crate) created_at: i64,
    pub(crate) log_type: i64,
    pub(crate) prompt_tokens: i64,
    pub(crate) completion_tokens: i64,
    pub(crate) channel_id: i64,
    pub(crate) user_id: i64,
    pub(crate) username: String,
    pub(crate) token_id: i64,
    pub(crate) token_name: String,
    pub(crate) model_name: String,
    pub(crate) ip: Option<String>,
    pub(crate) content: String,
}

impl LogRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            created_at: row.get("created_at")?,
            log_type: row.get("type")?,
            prompt_tokens: row.get::<_, Option<i64>>("prompt_tokens")?.unwrap_or(0),
            completion_tokens: row.get::<_, Option<i64>>("completion_tokens")?.unwrap_or(0),
            channel_id: row.get("channel_id")?,
            user_id: row.get("user_id")?,
            username: row.get::<_, Option<String>>("username")?.unwrap_or_default(),
            token_id: row.get("token_id")?,
            token_name: row.get::<_, Option<String>>("token_name")?.unwrap_or_default(),
            model_name: row.get::<_, Option<String>>("model_name")?.unwrap_or_default(),
            ip: row.get("ip")?,
            content: row.get::<_, Option<String>>("content")?.unwrap_or_default(),
        })
    }

    pub(crate) fn total_tokens(&self) -> i64 {
        self.prompt_tokens.saturating_add(self.completion_tokens)
    }
}

/// All records with `start <= created_at <= end`, oldest first.
pub(crate) fn list_in_window(
    conn: &Connection,
    start: i64,
    end: i64,
) -> rusqlite::Result<Vec<LogRecord>> {
    let mut stmt = conn.prepare(
        r#"
SELECT
  id,
  created_at,
  type,
  prompt_tokens,
  completion_tokens,
  channel_id,
  user_id,
  username,
  token_id,
  token_name,
  model_name,
  ip,
  content
FROM logs
WHERE created_at >= ?1 AND created_at <= ?2
ORDER BY created_at ASC, id ASC
"#,
    )?;

    let rows = stmt.query_map(params![start, end], LogRecord::from_row)?;
    rows.collect()
}

pub(crate) mod test_support {
    use super::LogRecord;
    use rusqlite::{params, Connection};

    pub(crate) fn insert(conn: &Connection, record: &LogRecord) -> i64 {
        conn.execute(
            r#"
INSERT INTO logs (
  created_at,
  type,
  prompt_tokens,
  completion_tokens,
  channel_id,
  user_id,
  username,
  token_id,
  token_name,
  model_name,
  ip,
  content
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12);
"#,
            params![
                record.created_at,
                record.log_type,
                record.prompt_tokens,
                record.completion_tokens,
                record.channel_id,
                record.user_id,
                record.username,
                record.token_id,
                record.token_name,
                record.model_name,
                record.ip,
                record.content,
            ],
        )
        .expect("insert log");
        conn.last_insert_rowid()
    }

    pub(crate) fn insert_channel(conn: &Connection, id: i64, name: Option<&str>) {
        conn.execute(
            "INSERT INTO channels (id, name) VALUES (?1, ?2)",
            params![id, name],
        )
        .expect("insert channel");
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::insert;
    use super::*;
    use crate::db::test_support::test_db;

    #[test]
    fn list_in_window_is_inclusive_on_both_bounds() {
        let t = test_db();
        let conn = t.db.open_connection().expect("connection");
        for created_at in [99, 100, 150, 200, 201] {
            insert(
                &conn,
                &LogRecord {
                    created_at,
                    log_type: 2,
                    prompt_tokens: 1,
                    ..Default::default()
                },
            );
        }

        let rows = list_in_window(&conn, 100, 200).expect("list_in_window");
        let stamps: Vec<i64> = rows.iter().map(|r| r.created_at).collect();
        assert_eq!(stamps, vec![100, 150, 200]);
    }

    #[test]
    fn list_in_window_reads_nullable_columns() {
        let t = test_db();
        let conn = t.db.open_connection().expect("connection");
        conn.execute(
            "INSERT INTO logs (created_at, type, ip) VALUES (10, 5, NULL)",
            [],
        )
        .expect("insert sparse row");

        let rows = list_in_window(&conn, 0, 20).expect("list_in_window");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].ip, None);
        assert_eq!(rows[0].content, "");
        assert_eq!(rows[0].total_tokens(), 0);
    }
}
