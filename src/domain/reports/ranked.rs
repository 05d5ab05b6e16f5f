//! Usage: Top-N breakdowns (user, token, model, ip) ordered by request count.

use rusqlite::{params_from_iter, Connection, Row};

use super::query::AggregateQuery;
use super::types::{IpStat, ModelStat, TokenStat, UserStat};

fn collect_rows<T, F>(conn: &Connection, query: &AggregateQuery, map: F) -> rusqlite::Result<Vec<T>>
where
    F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
    let mut stmt = conn.prepare(query.sql())?;
    let rows = stmt.query_map(params_from_iter(query.params()), map)?;
    rows.collect()
}

fn counts(row: &Row<'_>) -> rusqlite::Result<(i64, i64)> {
    Ok((
        row.get::<_, Option<i64>>("request_count")?.unwrap_or(0),
        row.get::<_, Option<i64>>("total_tokens")?.unwrap_or(0),
    ))
}

pub(super) fn user_stats_query(
    conn: &Connection,
    query: &AggregateQuery,
) -> rusqlite::Result<Vec<UserStat>> {
    collect_rows(conn, query, |row| {
        let (request_count, total_tokens) = counts(row)?;
        Ok(UserStat {
            user_id: row.get("user_id")?,
            username: row.get::<_, Option<String>>("username")?.unwrap_or_default(),
            request_count,
            total_tokens,
        })
    })
}

pub(super) fn token_stats_query(
    conn: &Connection,
    query: &AggregateQuery,
) -> rusqlite::Result<Vec<TokenStat>> {
    collect_rows(conn, query, |row| {
        let (request_count, total_tokens) = counts(row)?;
        Ok(TokenStat {
            token_id: row.get("token_id")?,
            token_name: row.get::<_, Option<String>>("token_name")?.unwrap_or_default(),
            request_count,
            total_tokens,
        })
    })
}

pub(super) fn model_stats_query(
    conn: &Connection,
    query: &AggregateQuery,
) -> rusqlite::Result<Vec<ModelStat>> {
    collect_rows(conn, query, |row| {
        let (request_count, total_tokens) = counts(row)?;
        Ok(ModelStat {
            model_name: row.get("model_name")?,
            request_count,
            total_tokens,
        })
    })
}

pub(super) fn ip_stats_query(
    conn: &Connection,
    query: &AggregateQuery,
) -> rusqlite::Result<Vec<IpStat>> {
    collect_rows(conn, query, |row| {
        let (request_count, total_tokens) = counts(row)?;
        Ok(IpStat {
            ip: row.get("ip")?,
            request_count,
            total_tokens,
        })
    })
}
