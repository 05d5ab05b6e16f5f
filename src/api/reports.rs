use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Response,
    Json,
};

use super::response::success;
use crate::app_state::AppState;
use crate::reports::{ReportError, ReportRequest};

pub(super) async fn create_report(
    State(state): State<AppState>,
    payload: Result<Json<ReportRequest>, JsonRejection>,
) -> Result<Response, ReportError> {
    let Json(request) = payload.map_err(|rejection| ReportError::InvalidRequest {
        message: rejection.body_text(),
    })?;
    let report = state.reports.generate_and_store(request).await?;
    Ok(success(StatusCode::CREATED, "报告生成成功", report))
}

pub(super) async fn list_reports(State(state): State<AppState>) -> Result<Response, ReportError> {
    let reports = state.reports.list().await?;
    Ok(success(StatusCode::OK, "获取报告列表成功", reports))
}

pub(super) async fn get_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ReportError> {
    let report = state.reports.get(&id).await?;
    Ok(success(StatusCode::OK, "获取报告成功", report))
}
