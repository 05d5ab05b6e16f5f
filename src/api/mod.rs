//! Usage: HTTP surface (axum) for generating, listing and fetching reports.

mod reports;
mod response;

use axum::{
    routing::{get, post},
    Router,
};

use crate::app_state::AppState;

pub(crate) fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/reports",
            post(reports::create_report).get(reports::list_reports),
        )
        .route("/reports/:id", get(reports::get_report))
        .with_state(state)
}
