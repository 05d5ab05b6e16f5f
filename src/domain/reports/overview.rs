use rusqlite::{params_from_iter, Connection, Row};

use super::query::AggregateQuery;
use super::types::{ErrorTally, ReportOverview};

/// Reads the shared counter columns of the overview and channel statements.
pub(super) fn read_tally(row: &Row<'_>) -> rusqlite::Result<ErrorTally> {
    Ok(ErrorTally {
        total_requests: row.get::<_, Option<i64>>("total_requests")?.unwrap_or(0),
        total_tokens: row.get::<_, Option<i64>>("total_tokens")?.unwrap_or(0),
        error_429_count: row.get::<_, Option<i64>>("error_429_count")?.unwrap_or(0),
        normal_error_count: row
            .get::<_, Option<i64>>("normal_error_count")?
            .unwrap_or(0),
    })
}

pub(super) fn overview_query(
    conn: &Connection,
    query: &AggregateQuery,
) -> rusqlite::Result<ReportOverview> {
    let tally = conn.query_row(query.sql(), params_from_iter(query.params()), read_tally)?;
    Ok(ReportOverview {
        total_tokens: tally.total_tokens,
        total_requests: tally.total_requests,
        error_429_count: tally.error_429_count,
        error_429_percent: tally.error_429_percent(),
        normal_error_count: tally.normal_error_count,
        normal_error_percent: tally.normal_error_percent(),
    })
}
