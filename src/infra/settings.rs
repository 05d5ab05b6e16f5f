//! Usage: Persisted service settings (`usage-report.json`) with defaults and repair on read.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error_policy::{
    DEFAULT_COMPLETION_LOG_TYPE, DEFAULT_ERROR_LOG_TYPE, DEFAULT_RATE_LIMIT_MARKER,
    DEFAULT_SUPPRESSED_PATTERNS, DEFAULT_TIMEOUT_MARKER,
};
use crate::reports::{DEFAULT_CHANNEL_MIN_REQUESTS, DEFAULT_TOP_N, DEFAULT_UNKNOWN_CHANNEL_LABEL};
use crate::shared::fs::{read_optional_file, write_file_atomic};

pub const SCHEMA_VERSION: u32 = 1;
pub const DEFAULT_LISTEN_HOST: &str = "127.0.0.1";
pub const DEFAULT_LISTEN_PORT: u16 = 37180;
const DEFAULT_DB_PATH: &str = "usage-report.db";
const DEFAULT_QUERY_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_WINDOW_SECONDS: i64 = 24 * 60 * 60;
const MAX_QUERY_TIMEOUT_MS: u64 = 10 * 60 * 1000;
const MAX_TOP_N_LIMIT: i64 = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStoreKind {
    #[default]
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    pub schema_version: u32,
    pub listen_host: String,
    pub listen_port: u16,
    pub db_path: String,
    pub report_store: ReportStoreKind,
    pub query_timeout_ms: u64,
    pub default_window_seconds: i64,
    pub channel_min_requests: i64,
    pub top_n_limit: i64,
    pub error_log_type: i64,
    pub completion_log_type: i64,
    pub timeout_marker: String,
    pub rate_limit_marker: String,
    pub suppressed_error_patterns: Vec<String>,
    pub unknown_channel_label: String,
    pub log_dir: Option<String>,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            listen_host: DEFAULT_LISTEN_HOST.to_string(),
            listen_port: DEFAULT_LISTEN_PORT,
            db_path: DEFAULT_DB_PATH.to_string(),
            report_store: ReportStoreKind::default(),
            query_timeout_ms: DEFAULT_QUERY_TIMEOUT_MS,
            default_window_seconds: DEFAULT_WINDOW_SECONDS,
            channel_min_requests: DEFAULT_CHANNEL_MIN_REQUESTS,
            top_n_limit: DEFAULT_TOP_N,
            error_log_type: DEFAULT_ERROR_LOG_TYPE,
            completion_log_type: DEFAULT_COMPLETION_LOG_TYPE,
            timeout_marker: DEFAULT_TIMEOUT_MARKER.to_string(),
            rate_limit_marker: DEFAULT_RATE_LIMIT_MARKER.to_string(),
            suppressed_error_patterns: DEFAULT_SUPPRESSED_PATTERNS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            unknown_channel_label: DEFAULT_UNKNOWN_CHANNEL_LABEL.to_string(),
            log_dir: None,
        }
    }
}

impl ReportSettings {
    pub fn listen_addr(&self) -> String {
        if self.listen_host.contains(':') {
            format!("[{}]:{}", self.listen_host, self.listen_port)
        } else {
            format!("{}:{}", self.listen_host, self.listen_port)
        }
    }
}

fn sanitize_limits(settings: &mut ReportSettings) -> bool {
    let mut changed = false;

    if settings.query_timeout_ms == 0 {
        settings.query_timeout_ms = DEFAULT_QUERY_TIMEOUT_MS;
        changed = true;
    }
    if settings.query_timeout_ms > MAX_QUERY_TIMEOUT_MS {
        settings.query_timeout_ms = MAX_QUERY_TIMEOUT_MS;
        changed = true;
    }
    if settings.default_window_seconds <= 0 {
        settings.default_window_seconds = DEFAULT_WINDOW_SECONDS;
        changed = true;
    }
    if settings.channel_min_requests < 0 {
        settings.channel_min_requests = 0;
        changed = true;
    }
    if settings.top_n_limit <= 0 {
        settings.top_n_limit = DEFAULT_TOP_N;
        changed = true;
    }
    if settings.top_n_limit > MAX_TOP_N_LIMIT {
        settings.top_n_limit = MAX_TOP_N_LIMIT;
        changed = true;
    }

    changed
}

fn sanitize_labels(settings: &mut ReportSettings) -> bool {
    let mut changed = false;

    if settings.listen_host.trim().is_empty() {
        settings.listen_host = DEFAULT_LISTEN_HOST.to_string();
        changed = true;
    }
    if settings.db_path.trim().is_empty() {
        settings.db_path = DEFAULT_DB_PATH.to_string();
        changed = true;
    }
    if settings.timeout_marker.is_empty() {
        settings.timeout_marker = DEFAULT_TIMEOUT_MARKER.to_string();
        changed = true;
    }
    if settings.rate_limit_marker.is_empty() {
        settings.rate_limit_marker = DEFAULT_RATE_LIMIT_MARKER.to_string();
        changed = true;
    }
    if settings.unknown_channel_label.trim().is_empty() {
        settings.unknown_channel_label = DEFAULT_UNKNOWN_CHANNEL_LABEL.to_string();
        changed = true;
    }

    let before = settings.suppressed_error_patterns.len();
    settings
        .suppressed_error_patterns
        .retain(|pattern| !pattern.is_empty());
    changed |= settings.suppressed_error_patterns.len() != before;

    changed
}

fn parse_settings_json(content: &[u8]) -> Result<ReportSettings, String> {
    serde_json::from_slice(content).map_err(|e| format!("failed to parse settings file: {e}"))
}

/// Reads settings from `path`. A missing file yields defaults and is created so the
/// config is discoverable; repaired values are written back best-effort.
pub fn read(path: &Path) -> Result<ReportSettings, String> {
    let Some(content) = read_optional_file(path)? else {
        let settings = ReportSettings::default();
        if let Err(err) = write(path, &settings) {
            tracing::warn!(path = %path.display(), "默认配置写入失败: {}", err);
        }
        return Ok(settings);
    };

    let mut settings = parse_settings_json(&content)?;
    if settings.listen_port == 0 {
        return Err("invalid settings file: listen_port must be between 1 and 65535".to_string());
    }

    let mut repaired = false;
    repaired |= sanitize_limits(&mut settings);
    repaired |= sanitize_labels(&mut settings);
    if settings.schema_version < SCHEMA_VERSION {
        settings.schema_version = SCHEMA_VERSION;
        repaired = true;
    }
    if repaired {
        tracing::info!(path = %path.display(), "配置已修正并回写");
        if let Err(err) = write(path, &settings) {
            tracing::warn!(path = %path.display(), "配置回写失败: {}", err);
        }
    }

    Ok(settings)
}

pub fn write(path: &Path, settings: &ReportSettings) -> Result<ReportSettings, String> {
    if settings.listen_port == 0 {
        return Err("listen_port must be between 1 and 65535".to_string());
    }
    if settings.query_timeout_ms == 0 || settings.query_timeout_ms > MAX_QUERY_TIMEOUT_MS {
        return Err(format!(
            "query_timeout_ms must be between 1 and {MAX_QUERY_TIMEOUT_MS}"
        ));
    }
    if settings.top_n_limit <= 0 || settings.top_n_limit > MAX_TOP_N_LIMIT {
        return Err(format!("top_n_limit must be between 1 and {MAX_TOP_N_LIMIT}"));
    }

    let content = serde_json::to_vec_pretty(settings)
        .map_err(|e| format!("failed to serialize settings: {e}"))?;
    write_file_atomic(path, &content)?;

    Ok(settings.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_missing_file_returns_defaults_and_creates_it() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("usage-report.json");

        let settings = read(&path).expect("read");

        assert_eq!(settings, ReportSettings::default());
        assert!(path.exists());
        assert_eq!(settings.query_timeout_ms, 10_000);
        assert_eq!(settings.channel_min_requests, 10);
        assert_eq!(settings.top_n_limit, 5);
        assert_eq!(
            settings.suppressed_error_patterns,
            vec!["the maximum number of tokens", "user quota is not enough"]
        );
    }

    #[test]
    fn read_fills_missing_fields_with_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"listen_port": 9000, "suppressed_error_patterns": ["x"]}"#)
            .expect("write");

        let settings = read(&path).expect("read");

        assert_eq!(settings.listen_port, 9000);
        assert_eq!(settings.suppressed_error_patterns, vec!["x"]);
        assert_eq!(settings.rate_limit_marker, "429");
        assert_eq!(settings.report_store, ReportStoreKind::Memory);
    }

    #[test]
    fn read_repairs_out_of_range_values_and_persists_them() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"schema_version": 1, "query_timeout_ms": 0, "top_n_limit": 1000, "timeout_marker": "", "suppressed_error_patterns": ["", "quota"]}"#,
        )
        .expect("write");

        let settings = read(&path).expect("read");
        assert_eq!(settings.query_timeout_ms, DEFAULT_QUERY_TIMEOUT_MS);
        assert_eq!(settings.top_n_limit, MAX_TOP_N_LIMIT);
        assert_eq!(settings.timeout_marker, "超时");
        assert_eq!(settings.suppressed_error_patterns, vec!["quota"]);

        let persisted: ReportSettings =
            serde_json::from_slice(&std::fs::read(&path).expect("read back")).expect("parse");
        assert_eq!(persisted, settings);
    }

    #[test]
    fn read_rejects_invalid_json_and_zero_port() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.json");

        std::fs::write(&path, "{not json").expect("write");
        assert!(read(&path).unwrap_err().contains("failed to parse"));

        std::fs::write(&path, r#"{"listen_port": 0}"#).expect("write");
        assert!(read(&path).unwrap_err().contains("listen_port"));
    }

    #[test]
    fn report_store_kind_uses_snake_case() {
        let settings: ReportSettings =
            serde_json::from_str(r#"{"report_store": "sqlite"}"#).expect("parse");
        assert_eq!(settings.report_store, ReportStoreKind::Sqlite);
        assert_eq!(settings.listen_addr(), "127.0.0.1:37180");
    }
}
