//! Usage: JSON response envelope `{success, message, data?}` shared by every route.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::reports::ReportError;

#[derive(Debug, Serialize)]
pub(crate) struct Envelope<T: Serialize> {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
}

pub(crate) fn success<T: Serialize>(status: StatusCode, message: &str, data: T) -> Response {
    let body = Envelope {
        success: true,
        message: message.to_string(),
        data: Some(data),
    };
    (status, Json(body)).into_response()
}

pub(crate) fn failure(status: StatusCode, message: String) -> Response {
    let body: Envelope<()> = Envelope {
        success: false,
        message,
        data: None,
    };
    (status, Json(body)).into_response()
}

impl IntoResponse for ReportError {
    fn into_response(self) -> Response {
        match &self {
            ReportError::AggregationFailed { .. } | ReportError::Store(_) => {
                tracing::error!("报告请求失败: {}", self);
            }
            ReportError::InvalidRequest { .. }
            | ReportError::InvalidTimeRange { .. }
            | ReportError::NotFound { .. } => {
                tracing::debug!("报告请求被拒绝: {}", self);
            }
        }
        failure(self.status_code(), self.user_message())
    }
}
