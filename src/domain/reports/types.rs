use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub statistic_items: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: String,
    pub name: String,
    pub created_at: i64,
    pub overview: ReportOverview,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub channel_stats: Vec<ChannelStat>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub user_stats: Vec<UserStat>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub token_stats: Vec<TokenStat>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub model_stats: Vec<ModelStat>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ip_stats: Vec<IpStat>,
    pub raw_request: ReportRequest,
}

impl Report {
    pub fn list_item(&self) -> ReportListItem {
        ReportListItem {
            id: self.id.clone(),
            name: self.name.clone(),
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportListItem {
    pub id: String,
    pub name: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportOverview {
    pub total_tokens: i64,
    pub total_requests: i64,
    pub error_429_count: i64,
    pub error_429_percent: f64,
    pub normal_error_count: i64,
    pub normal_error_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelStat {
    pub channel_id: i64,
    pub channel_name: String,
    pub total_requests: i64,
    pub error_429_count: i64,
    pub error_429_percent: f64,
    pub normal_error_count: i64,
    pub normal_error_percent: f64,
    pub total_tokens: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStat {
    pub user_id: i64,
    pub username: String,
    pub request_count: i64,
    pub total_tokens: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenStat {
    pub token_id: i64,
    pub token_name: String,
    pub request_count: i64,
    pub total_tokens: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelStat {
    pub model_name: String,
    pub request_count: i64,
    pub total_tokens: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpStat {
    pub ip: String,
    pub request_count: i64,
    pub total_tokens: i64,
}

/// Raw error counters shared by the overview and channel aggregators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(super) struct ErrorTally {
    pub(super) total_requests: i64,
    pub(super) total_tokens: i64,
    pub(super) error_429_count: i64,
    pub(super) normal_error_count: i64,
}

impl ErrorTally {
    pub(super) fn error_429_percent(&self) -> f64 {
        rate_3dp(self.error_429_count, self.total_requests)
    }

    pub(super) fn normal_error_percent(&self) -> f64 {
        rate_3dp(self.normal_error_count, self.total_requests)
    }
}

/// `count / total` rounded half away from zero to 3 decimals; 0 when `total` is 0.
pub(crate) fn rate_3dp(count: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    let ratio = (count.max(0) as f64 / total as f64).min(1.0);
    (ratio * 1000.0).round() / 1000.0
}
