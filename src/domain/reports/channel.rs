use rusqlite::{params_from_iter, Connection};

use super::overview::read_tally;
use super::query::AggregateQuery;
use super::types::ChannelStat;

/// Channels at or above the request threshold, busiest first. Channels without a
/// name (missing row, NULL or empty) are reported under `unknown_label`.
pub(super) fn channel_stats_query(
    conn: &Connection,
    query: &AggregateQuery,
    unknown_label: &str,
) -> rusqlite::Result<Vec<ChannelStat>> {
    let mut stmt = conn.prepare(query.sql())?;
    let rows = stmt.query_map(params_from_iter(query.params()), |row| {
        let channel_id: i64 = row.get("channel_id")?;
        let channel_name = row
            .get::<_, Option<String>>("channel_name")?
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| unknown_label.to_string());
        let tally = read_tally(row)?;
        Ok(ChannelStat {
            channel_id,
            channel_name,
            total_requests: tally.total_requests,
            error_429_count: tally.error_429_count,
            error_429_percent: tally.error_429_percent(),
            normal_error_count: tally.normal_error_count,
            normal_error_percent: tally.normal_error_percent(),
            total_tokens: tally.total_tokens,
        })
    })?;

    rows.collect()
}
