//! Usage: Command-line flags layered over the settings file.

use clap::Parser;
use std::path::PathBuf;

use crate::settings::ReportSettings;

#[derive(Debug, Parser)]
#[command(name = "usage-report", version, about = "Usage report service over API call logs")]
pub(crate) struct Cli {
    /// Settings file; created with defaults when missing
    #[arg(long, env = "USAGE_REPORT_CONFIG", default_value = "usage-report.json")]
    pub(crate) config: PathBuf,

    /// SQLite database holding the `logs` and `channels` tables
    #[arg(long, env = "USAGE_REPORT_DB")]
    pub(crate) db: Option<PathBuf>,

    /// Listen address as `host:port`
    #[arg(long, env = "USAGE_REPORT_LISTEN")]
    pub(crate) listen: Option<String>,
}

impl Cli {
    /// Overrides file settings with whatever flags were given.
    pub(crate) fn apply(&self, settings: &mut ReportSettings) -> Result<(), String> {
        if let Some(db) = &self.db {
            settings.db_path = db.to_string_lossy().into_owned();
        }
        if let Some(listen) = &self.listen {
            let (host, port) = parse_listen(listen)?;
            settings.listen_host = host;
            settings.listen_port = port;
        }
        Ok(())
    }
}

fn parse_listen(value: &str) -> Result<(String, u16), String> {
    let invalid = || format!("SEC_INVALID_INPUT: invalid listen address: {value}");
    let (host, port) = value.trim().rsplit_once(':').ok_or_else(invalid)?;
    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.is_empty() {
        return Err(invalid());
    }
    let port: u16 = port.parse().map_err(|_| invalid())?;
    if port == 0 {
        return Err(invalid());
    }
    Ok((host.to_string(), port))
}
