use serde::Serialize;
use std::fmt;

/// One independent statistical breakdown of the log table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum Dimension {
    Overview,
    Channel,
    User,
    Token,
    Model,
    Ip,
}

impl Dimension {
    #[cfg(test)]
    pub(crate) const ALL: [Dimension; 6] = [
        Dimension::Overview,
        Dimension::Channel,
        Dimension::User,
        Dimension::Token,
        Dimension::Model,
        Dimension::Ip,
    ];

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Overview => "overview",
            Self::Channel => "channel-stats",
            Self::User => "user-stats",
            Self::Token => "token-stats",
            Self::Model => "model-stats",
            Self::Ip => "ip-stats",
        }
    }

    /// Label attached to the aggregate query in logs and query errors.
    pub(crate) fn query_label(self) -> &'static str {
        match self {
            Self::Overview => "report.overview",
            Self::Channel => "report.channel_stats",
            Self::User => "report.user_stats",
            Self::Token => "report.token_stats",
            Self::Model => "report.model_stats",
            Self::Ip => "report.ip_stats",
        }
    }

    /// Maps a `statistic_items` entry to a dimension. Overview is always computed
    /// and cannot be requested; anything unrecognized yields `None`.
    pub(crate) fn from_statistic_item(item: &str) -> Option<Self> {
        match item.trim() {
            "channel-stats" | "渠道统计" => Some(Self::Channel),
            "user-stats" | "用户统计" => Some(Self::User),
            "token-stats" | "Token统计" => Some(Self::Token),
            "model-stats" | "模型统计" => Some(Self::Model),
            "ip-stats" | "IP统计" => Some(Self::Ip),
            _ => None,
        }
    }

    /// Caller-facing message when this dimension fails; never carries query details.
    pub(crate) fn failure_message(self) -> &'static str {
        match self {
            Self::Overview => "生成报告概览失败",
            Self::Channel => "生成渠道统计失败",
            Self::User => "生成用户统计失败",
            Self::Token => "生成Token统计失败",
            Self::Model => "生成模型统计失败",
            Self::Ip => "生成IP统计失败",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
