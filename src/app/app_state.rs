//! Usage: Shared state handed to every HTTP handler.

use std::sync::Arc;

use crate::reports::ReportService;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) reports: Arc<ReportService>,
}

impl AppState {
    pub(crate) fn new(reports: ReportService) -> Self {
        Self {
            reports: Arc::new(reports),
        }
    }
}
