//! Usage: Error classification policy (which log rows count as rate-limit / normal errors).
//!
//! Loaded once from settings and shared read-only for the lifetime of the process.
//! The SQL rendering of the same rules lives in `reports::query`; both sides use
//! case-sensitive substring matching so they always agree.

#[cfg(test)]
use crate::logs::LogRecord;
use crate::settings::ReportSettings;

pub(crate) const DEFAULT_ERROR_LOG_TYPE: i64 = 5;
pub(crate) const DEFAULT_COMPLETION_LOG_TYPE: i64 = 2;
pub(crate) const DEFAULT_TIMEOUT_MARKER: &str = "超时";
pub(crate) const DEFAULT_RATE_LIMIT_MARKER: &str = "429";
pub(crate) const DEFAULT_SUPPRESSED_PATTERNS: [&str; 2] =
    ["the maximum number of tokens", "user quota is not enough"];

/// Outcome of classifying a single record. Exactly one applies to every record.
#[cfg(test)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorClass {
    RateLimit,
    Normal,
    Suppressed,
    NotError,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ErrorClassificationPolicy {
    error_log_type: i64,
    completion_log_type: i64,
    timeout_marker: String,
    rate_limit_marker: String,
    suppressed_patterns: Vec<String>,
}

impl Default for ErrorClassificationPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_ERROR_LOG_TYPE,
            DEFAULT_COMPLETION_LOG_TYPE,
            DEFAULT_TIMEOUT_MARKER,
            DEFAULT_RATE_LIMIT_MARKER,
            DEFAULT_SUPPRESSED_PATTERNS,
        )
    }
}

impl ErrorClassificationPolicy {
    /// Empty markers fall back to the defaults; empty or repeated patterns are dropped
    /// (first occurrence wins, order is kept).
    pub(crate) fn new<I, S>(
        error_log_type: i64,
        completion_log_type: i64,
        timeout_marker: &str,
        rate_limit_marker: &str,
        suppressed_patterns: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut patterns: Vec<String> = Vec::new();
        for pattern in suppressed_patterns {
            let pattern = pattern.as_ref();
            if pattern.is_empty() || patterns.iter().any(|p| p == pattern) {
                continue;
            }
            patterns.push(pattern.to_string());
        }

        Self {
            error_log_type,
            completion_log_type,
            timeout_marker: non_empty_or(timeout_marker, DEFAULT_TIMEOUT_MARKER),
            rate_limit_marker: non_empty_or(rate_limit_marker, DEFAULT_RATE_LIMIT_MARKER),
            suppressed_patterns: patterns,
        }
    }

    pub(crate) fn from_settings(settings: &ReportSettings) -> Self {
        Self::new(
            settings.error_log_type,
            settings.completion_log_type,
            &settings.timeout_marker,
            &settings.rate_limit_marker,
            &settings.suppressed_error_patterns,
        )
    }

    pub(crate) fn error_log_type(&self) -> i64 {
        self.error_log_type
    }

    pub(crate) fn completion_log_type(&self) -> i64 {
        self.completion_log_type
    }

    pub(crate) fn timeout_marker(&self) -> &str {
        &self.timeout_marker
    }

    pub(crate) fn rate_limit_marker(&self) -> &str {
        &self.rate_limit_marker
    }

    pub(crate) fn suppressed_patterns(&self) -> &[String] {
        &self.suppressed_patterns
    }
}

/// Record-level form of the rules `reports::query` renders into SQL; the scenario
/// tests check both sides against the same rows.
#[cfg(test)]
impl ErrorClassificationPolicy {
    pub(crate) fn suppressed(&self, content: &str) -> bool {
        self.suppressed_patterns
            .iter()
            .any(|pattern| content.contains(pattern.as_str()))
    }

    /// Hard error, or a completion that produced nothing and timed out.
    pub(crate) fn is_error_event(&self, record: &LogRecord) -> bool {
        if record.log_type == self.error_log_type {
            return true;
        }
        record.log_type == self.completion_log_type
            && record.completion_tokens == 0
            && record.content.contains(self.timeout_marker.as_str())
    }

    pub(crate) fn is_rate_limit_error(&self, record: &LogRecord) -> bool {
        self.is_error_event(record) && record.content.contains(self.rate_limit_marker.as_str())
    }

    pub(crate) fn classify(&self, record: &LogRecord) -> ErrorClass {
        if !self.is_error_event(record) {
            return ErrorClass::NotError;
        }
        if self.suppressed(&record.content) {
            return ErrorClass::Suppressed;
        }
        if self.is_rate_limit_error(record) {
            ErrorClass::RateLimit
        } else {
            ErrorClass::Normal
        }
    }
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}
