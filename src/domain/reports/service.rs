use std::sync::Arc;

use super::engine::ReportEngine;
use super::{Report, ReportError, ReportListItem, ReportRequest};
use crate::blocking;
use crate::report_store::ReportStore;
use crate::shared::time::now_unix_seconds;

/// Generates reports and keeps the successful ones.
#[derive(Clone)]
pub(crate) struct ReportService {
    engine: ReportEngine,
    store: Arc<dyn ReportStore>,
}

impl ReportService {
    pub(crate) fn new(engine: ReportEngine, store: Arc<dyn ReportStore>) -> Self {
        Self { engine, store }
    }

    pub(crate) async fn generate_and_store(
        &self,
        request: ReportRequest,
    ) -> Result<Report, ReportError> {
        self.generate_and_store_at(request, now_unix_seconds()).await
    }

    /// A report reaches the store only after every dimension succeeded.
    pub(crate) async fn generate_and_store_at(
        &self,
        request: ReportRequest,
        now: i64,
    ) -> Result<Report, ReportError> {
        let report = match self.engine.generate(request, now).await {
            Ok(report) => report,
            Err(err) => {
                tracing::warn!("报告生成失败: {}", err);
                return Err(err);
            }
        };

        let store = self.store.clone();
        let stored = report.clone();
        blocking::run("report_store.put", move || store.put(stored)).await?;
        Ok(report)
    }

    pub(crate) async fn list(&self) -> Result<Vec<ReportListItem>, ReportError> {
        let store = self.store.clone();
        Ok(blocking::run("report_store.list", move || store.list()).await?)
    }

    pub(crate) async fn get(&self, id: &str) -> Result<Report, ReportError> {
        let store = self.store.clone();
        let key = id.to_string();
        let found = blocking::run("report_store.get", move || store.get(&key)).await?;
        found.ok_or_else(|| ReportError::NotFound { id: id.to_string() })
    }
}
