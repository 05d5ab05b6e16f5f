//! Usage: Parameterized aggregate SQL for every report dimension.
//!
//! Text and bound values only ever enter through `SqlFragment`, which appends a `?`
//! and its value in the same call. Placeholder order therefore always matches
//! parameter order, even when a clause (the suppressed-pattern filter) is repeated.

use rusqlite::types::ToSqlOutput;
use rusqlite::ToSql;

use super::{AggregationOptions, Dimension, TimeWindow};
use crate::error_policy::ErrorClassificationPolicy;

const CONTENT_EXPR: &str = "COALESCE(l.content, '')";
const TOKENS_EXPR: &str = "COALESCE(l.prompt_tokens, 0) + COALESCE(l.completion_tokens, 0)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SqlParam {
    Int(i64),
    Text(String),
}

impl From<i64> for SqlParam {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for SqlParam {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SqlParam {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl ToSql for SqlParam {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            Self::Int(v) => v.to_sql(),
            Self::Text(v) => v.to_sql(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SqlFragment {
    sql: String,
    params: Vec<SqlParam>,
}

impl SqlFragment {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Appends literal SQL. Must not contain placeholders; values go through `push_bind`.
    pub(crate) fn push_sql(&mut self, sql: &str) -> &mut Self {
        debug_assert!(!sql.contains('?'), "raw sql must not carry placeholders: {sql}");
        self.sql.push_str(sql);
        self
    }

    pub(crate) fn push_bind(&mut self, value: impl Into<SqlParam>) -> &mut Self {
        self.sql.push('?');
        self.params.push(value.into());
        self
    }

    pub(crate) fn push_fragment(&mut self, other: &SqlFragment) -> &mut Self {
        self.sql.push_str(&other.sql);
        self.params.extend(other.params.iter().cloned());
        self
    }

    pub(crate) fn sql(&self) -> &str {
        &self.sql
    }

    pub(crate) fn params(&self) -> &[SqlParam] {
        &self.params
    }
}

/// A finished statement for one dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AggregateQuery {
    dimension: Dimension,
    fragment: SqlFragment,
}

impl AggregateQuery {
    pub(crate) fn dimension(&self) -> Dimension {
        self.dimension
    }

    pub(crate) fn sql(&self) -> &str {
        self.fragment.sql()
    }

    pub(crate) fn params(&self) -> &[SqlParam] {
        self.fragment.params()
    }

    pub(crate) fn placeholder_count(&self) -> usize {
        self.fragment.sql().matches('?').count()
    }
}

pub(crate) fn build_aggregate_query(
    dimension: Dimension,
    window: TimeWindow,
    policy: &ErrorClassificationPolicy,
    options: &AggregationOptions,
) -> AggregateQuery {
    let fragment = match dimension {
        Dimension::Overview => overview_sql(window, policy),
        Dimension::Channel => channel_sql(window, policy, options.channel_min_requests),
        Dimension::User | Dimension::Token | Dimension::Model | Dimension::Ip => {
            ranked_sql(ranked_shape(dimension), window, options.top_n)
        }
    };
    let query = AggregateQuery {
        dimension,
        fragment,
    };
    debug_assert_eq!(query.placeholder_count(), query.params().len());
    query
}

fn content_match(needle: &str, present: bool) -> SqlFragment {
    let mut f = SqlFragment::new();
    f.push_sql("instr(")
        .push_sql(CONTENT_EXPR)
        .push_sql(", ")
        .push_bind(needle)
        .push_sql(if present { ") > 0" } else { ") = 0" });
    f
}

pub(crate) fn error_event_condition(policy: &ErrorClassificationPolicy) -> SqlFragment {
    let mut f = SqlFragment::new();
    f.push_sql("(l.type = ")
        .push_bind(policy.error_log_type())
        .push_sql(" OR (l.type = ")
        .push_bind(policy.completion_log_type())
        .push_sql(" AND l.completion_tokens = 0 AND ")
        .push_fragment(&content_match(policy.timeout_marker(), true))
        .push_sql("))");
    f
}

/// Each call renders the full suppressed-pattern list with fresh bindings.
fn not_suppressed_conditions(policy: &ErrorClassificationPolicy) -> SqlFragment {
    let mut f = SqlFragment::new();
    for pattern in policy.suppressed_patterns() {
        f.push_sql(" AND ")
            .push_fragment(&content_match(pattern, false));
    }
    f
}

pub(crate) fn rate_limit_condition(policy: &ErrorClassificationPolicy) -> SqlFragment {
    let mut f = SqlFragment::new();
    f.push_fragment(&error_event_condition(policy))
        .push_sql(" AND ")
        .push_fragment(&content_match(policy.rate_limit_marker(), true))
        .push_fragment(&not_suppressed_conditions(policy));
    f
}

pub(crate) fn normal_error_condition(policy: &ErrorClassificationPolicy) -> SqlFragment {
    let mut f = SqlFragment::new();
    f.push_fragment(&error_event_condition(policy))
        .push_sql(" AND ")
        .push_fragment(&content_match(policy.rate_limit_marker(), false))
        .push_fragment(&not_suppressed_conditions(policy));
    f
}

fn error_count_columns(policy: &ErrorClassificationPolicy) -> SqlFragment {
    let mut f = SqlFragment::new();
    f.push_sql("  COALESCE(SUM(CASE WHEN ")
        .push_fragment(&rate_limit_condition(policy))
        .push_sql(" THEN 1 ELSE 0 END), 0) AS error_429_count,\n")
        .push_sql("  COALESCE(SUM(CASE WHEN ")
        .push_fragment(&normal_error_condition(policy))
        .push_sql(" THEN 1 ELSE 0 END), 0) AS normal_error_count,\n");
    f
}

fn window_condition(window: TimeWindow) -> SqlFragment {
    let mut f = SqlFragment::new();
    f.push_sql("l.created_at >= ")
        .push_bind(window.start())
        .push_sql(" AND l.created_at <= ")
        .push_bind(window.end());
    f
}

fn overview_sql(window: TimeWindow, policy: &ErrorClassificationPolicy) -> SqlFragment {
    let mut f = SqlFragment::new();
    f.push_sql("SELECT\n  COUNT(l.id) AS total_requests,\n")
        .push_fragment(&error_count_columns(policy))
        .push_sql(&format!("  COALESCE(SUM({TOKENS_EXPR}), 0) AS total_tokens\n"))
        .push_sql("FROM logs l\nWHERE ")
        .push_fragment(&window_condition(window));
    f
}

fn channel_sql(
    window: TimeWindow,
    policy: &ErrorClassificationPolicy,
    min_requests: i64,
) -> SqlFragment {
    let mut f = SqlFragment::new();
    f.push_sql("SELECT\n  l.channel_id AS channel_id,\n  c.name AS channel_name,\n")
        .push_sql("  COUNT(l.id) AS total_requests,\n")
        .push_fragment(&error_count_columns(policy))
        .push_sql(&format!("  COALESCE(SUM({TOKENS_EXPR}), 0) AS total_tokens\n"))
        .push_sql("FROM logs l\nLEFT JOIN channels c ON l.channel_id = c.id\nWHERE ")
        .push_fragment(&window_condition(window))
        .push_sql("\nGROUP BY l.channel_id, c.name\nHAVING COUNT(l.id) >= ")
        .push_bind(min_requests)
        .push_sql("\nORDER BY total_requests DESC, l.channel_id ASC");
    f
}

/// Grouping shape of a top-N dimension.
#[derive(Debug, Clone, Copy)]
struct RankedShape {
    select_keys: &'static str,
    group_keys: &'static str,
    filter: &'static str,
}

fn ranked_shape(dimension: Dimension) -> RankedShape {
    match dimension {
        Dimension::Token => RankedShape {
            select_keys: "l.token_id AS token_id, l.token_name AS token_name",
            group_keys: "l.token_id, l.token_name",
            filter: " AND l.token_name != ''",
        },
        Dimension::Model => RankedShape {
            select_keys: "l.model_name AS model_name",
            group_keys: "l.model_name",
            filter: " AND l.model_name != ''",
        },
        Dimension::Ip => RankedShape {
            select_keys: "l.ip AS ip",
            group_keys: "l.ip",
            filter: " AND l.ip IS NOT NULL AND l.ip != ''",
        },
        _ => RankedShape {
            select_keys: "l.user_id AS user_id, l.username AS username",
            group_keys: "l.user_id, l.username",
            filter: "",
        },
    }
}

fn ranked_sql(shape: RankedShape, window: TimeWindow, top_n: i64) -> SqlFragment {
    let mut f = SqlFragment::new();
    f.push_sql("SELECT\n  ")
        .push_sql(shape.select_keys)
        .push_sql(",\n  COUNT(l.id) AS request_count,\n")
        .push_sql(&format!("  COALESCE(SUM({TOKENS_EXPR}), 0) AS total_tokens\n"))
        .push_sql("FROM logs l\nWHERE ")
        .push_fragment(&window_condition(window))
        .push_sql(shape.filter)
        .push_sql("\nGROUP BY ")
        .push_sql(shape.group_keys)
        .push_sql("\nORDER BY request_count DESC, ")
        .push_sql(shape.group_keys)
        .push_sql("\nLIMIT ")
        .push_bind(top_n);
    f
}
