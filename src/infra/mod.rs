//! Usage: Infrastructure adapters (sqlite, settings file, report persistence).

pub(crate) mod db;
#[cfg(test)]
pub(crate) mod logs;
pub(crate) mod report_store;
pub(crate) mod settings;
