use rusqlite::Connection;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::channel::channel_stats_query;
use super::overview::overview_query;
use super::query::{build_aggregate_query, AggregateQuery};
use super::ranked::{ip_stats_query, model_stats_query, token_stats_query, user_stats_query};
use super::{AggregationOptions, Dimension, Report, ReportError, ReportRequest, TimeWindow};
use crate::db::{run_read, Db};
use crate::error_policy::ErrorClassificationPolicy;
use crate::settings::ReportSettings;

const UNNAMED_REPORT_PREFIX: &str = "未命名报告";

/// Runs the aggregate queries for one report against the log store.
#[derive(Clone)]
pub(crate) struct ReportEngine {
    db: Db,
    policy: Arc<ErrorClassificationPolicy>,
    options: Arc<AggregationOptions>,
    query_timeout: Duration,
    default_window_secs: i64,
}

impl ReportEngine {
    pub(crate) fn new(
        db: Db,
        policy: ErrorClassificationPolicy,
        options: AggregationOptions,
        query_timeout: Duration,
        default_window_secs: i64,
    ) -> Self {
        Self {
            db,
            policy: Arc::new(policy),
            options: Arc::new(options),
            query_timeout,
            default_window_secs,
        }
    }

    pub(crate) fn from_settings(db: Db, settings: &ReportSettings) -> Self {
        Self::new(
            db,
            ErrorClassificationPolicy::from_settings(settings),
            AggregationOptions::from_settings(settings),
            Duration::from_millis(settings.query_timeout_ms),
            settings.default_window_seconds,
        )
    }

    /// Computes the overview plus every requested dimension. Any failing query
    /// abandons the whole report; partial reports are never returned.
    pub(crate) async fn generate(
        &self,
        mut request: ReportRequest,
        now: i64,
    ) -> Result<Report, ReportError> {
        let started = Instant::now();
        let window = TimeWindow::resolve(
            request.start_time,
            request.end_time,
            now,
            self.default_window_secs,
        )?;
        let dimensions = requested_dimensions(&request.statistic_items);
        tracing::info!(
            start = window.start(),
            end = window.end(),
            dimensions = dimensions.len(),
            "开始生成报告"
        );

        let overview = self
            .aggregate(Dimension::Overview, window, overview_query)
            .await?;

        request.name = report_name(&request.name, now);
        let mut report = Report {
            id: uuid::Uuid::new_v4().to_string(),
            name: request.name.clone(),
            created_at: now,
            overview,
            channel_stats: Vec::new(),
            user_stats: Vec::new(),
            token_stats: Vec::new(),
            model_stats: Vec::new(),
            ip_stats: Vec::new(),
            raw_request: request,
        };

        for dimension in &dimensions {
            match dimension {
                Dimension::Overview => {}
                Dimension::Channel => {
                    let unknown_label = self.options.unknown_channel_label.clone();
                    report.channel_stats = self
                        .aggregate(Dimension::Channel, window, move |conn, query| {
                            channel_stats_query(conn, query, &unknown_label)
                        })
                        .await?;
                }
                Dimension::User => {
                    report.user_stats = self
                        .aggregate(Dimension::User, window, user_stats_query)
                        .await?;
                }
                Dimension::Token => {
                    report.token_stats = self
                        .aggregate(Dimension::Token, window, token_stats_query)
                        .await?;
                }
                Dimension::Model => {
                    report.model_stats = self
                        .aggregate(Dimension::Model, window, model_stats_query)
                        .await?;
                }
                Dimension::Ip => {
                    report.ip_stats = self.aggregate(Dimension::Ip, window, ip_stats_query).await?;
                }
            }
        }

        tracing::info!(
            report_id = %report.id,
            start = window.start(),
            end = window.end(),
            dimensions = dimensions.len(),
            total_requests = report.overview.total_requests,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "报告生成成功"
        );
        Ok(report)
    }

    async fn aggregate<T, F>(
        &self,
        dimension: Dimension,
        window: TimeWindow,
        scan: F,
    ) -> Result<T, ReportError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection, &AggregateQuery) -> rusqlite::Result<T> + Send + 'static,
    {
        let query = build_aggregate_query(dimension, window, &self.policy, &self.options);
        let label = query.dimension().query_label();
        tracing::debug!(
            dimension = %dimension,
            placeholders = query.placeholder_count(),
            params = query.params().len(),
            "执行报告聚合查询"
        );

        let started = Instant::now();
        let out = run_read(&self.db, label, self.query_timeout, move |conn| {
            scan(conn, &query)
        })
        .await
        .map_err(|err| {
            tracing::error!(
                dimension = %dimension,
                retryable = err.is_retryable(),
                "报告聚合失败: {}",
                err
            );
            ReportError::aggregation(dimension, err)
        })?;

        tracing::debug!(
            dimension = %dimension,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "报告维度聚合完成"
        );
        Ok(out)
    }
}

/// Requested dimensions, deduplicated and in fixed order. Unknown items are skipped.
pub(crate) fn requested_dimensions(items: &[String]) -> BTreeSet<Dimension> {
    let mut out = BTreeSet::new();
    for item in items {
        match Dimension::from_statistic_item(item) {
            Some(dimension) => {
                out.insert(dimension);
            }
            None => tracing::debug!(item = %item, "忽略未知统计项"),
        }
    }
    out
}

/// A blank name gets the timestamped default; any other name is kept as given.
fn report_name(requested: &str, now: i64) -> String {
    if !requested.trim().is_empty() {
        return requested.to_string();
    }
    format!(
        "{UNNAMED_REPORT_PREFIX} - {}",
        crate::shared::time::local_display_timestamp_at(now)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requested_dimensions_dedupes_and_orders() {
        let items = vec![
            "ip-stats".to_string(),
            "渠道统计".to_string(),
            "channel-stats".to_string(),
            "bogus".to_string(),
            "overview".to_string(),
        ];
        let dims: Vec<Dimension> = requested_dimensions(&items).into_iter().collect();
        assert_eq!(dims, vec![Dimension::Channel, Dimension::Ip]);
    }

    #[test]
    fn report_name_keeps_given_name_and_defaults_blank_one() {
        assert_eq!(report_name("weekly", 0), "weekly");
        assert_eq!(report_name("  weekly  ", 0), "  weekly  ");
        let name = report_name("   ", 1_700_000_000);
        assert!(name.starts_with("未命名报告 - "), "{name}");
        assert_eq!(name.chars().count(), "未命名报告 - ".chars().count() + 19);
    }
}
