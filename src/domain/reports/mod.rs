//! Usage: Time-windowed usage reports (overview + per-channel/user/token/model/ip breakdowns).

mod channel;
mod dimension;
mod engine;
mod error;
mod overview;
mod query;
mod ranked;
mod service;
mod types;
mod window;

pub(crate) use dimension::Dimension;
pub(crate) use engine::ReportEngine;
pub(crate) use error::ReportError;
pub(crate) use service::ReportService;
pub(crate) use types::{Report, ReportListItem, ReportRequest};
#[cfg(test)]
pub(crate) use types::ReportOverview;
pub(crate) use window::TimeWindow;

use crate::settings::ReportSettings;

pub(crate) const DEFAULT_CHANNEL_MIN_REQUESTS: i64 = 10;
pub(crate) const DEFAULT_TOP_N: i64 = 5;
pub(crate) const DEFAULT_UNKNOWN_CHANNEL_LABEL: &str = "unknown channel";

/// Thresholds and labels applied while aggregating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AggregationOptions {
    /// Channels below this request count are left out of the channel breakdown.
    pub(crate) channel_min_requests: i64,
    /// Row cap of the user/token/model/ip breakdowns.
    pub(crate) top_n: i64,
    pub(crate) unknown_channel_label: String,
}

impl Default for AggregationOptions {
    fn default() -> Self {
        Self {
            channel_min_requests: DEFAULT_CHANNEL_MIN_REQUESTS,
            top_n: DEFAULT_TOP_N,
            unknown_channel_label: DEFAULT_UNKNOWN_CHANNEL_LABEL.to_string(),
        }
    }
}

impl AggregationOptions {
    pub(crate) fn from_settings(settings: &ReportSettings) -> Self {
        Self {
            channel_min_requests: settings.channel_min_requests,
            top_n: settings.top_n_limit,
            unknown_channel_label: settings.unknown_channel_label.clone(),
        }
    }
}
