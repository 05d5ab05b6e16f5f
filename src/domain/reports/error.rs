use axum::http::StatusCode;

use super::Dimension;
use crate::db::QueryError;
use crate::report_store::StoreError;

#[derive(Debug, thiserror::Error)]
pub(crate) enum ReportError {
    /// Malformed request body or unusable parameters
    #[error("invalid report request: {message}")]
    InvalidRequest { message: String },

    /// Window bounds that do not satisfy `start < end`
    #[error("invalid time range: start={start} end={end}")]
    InvalidTimeRange { start: i64, end: i64 },

    /// One aggregate query failed; the whole report is abandoned
    #[error("{dimension} aggregation failed")]
    AggregationFailed {
        dimension: Dimension,
        #[source]
        source: QueryError,
    },

    #[error("report {id} not found")]
    NotFound { id: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ReportError {
    pub(crate) fn aggregation(dimension: Dimension, source: QueryError) -> Self {
        Self::AggregationFailed { dimension, source }
    }

    pub(crate) fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest { .. } | Self::InvalidTimeRange { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::AggregationFailed { .. } | Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Caller-facing message; query text, parameters and store internals stay in the logs.
    pub(crate) fn user_message(&self) -> String {
        match self {
            Self::InvalidRequest { .. } => "无效的请求参数".to_string(),
            Self::InvalidTimeRange { .. } => "开始时间必须早于结束时间".to_string(),
            Self::AggregationFailed { dimension, .. } => dimension.failure_message().to_string(),
            Self::NotFound { .. } => "报告未找到".to_string(),
            Self::Store(_) => "保存报告失败".to_string(),
        }
    }
}
