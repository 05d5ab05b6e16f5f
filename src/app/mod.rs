//! Usage: Application layer (CLI, logging, shared handler state).

pub(crate) mod app_state;
pub(crate) mod cli;
pub(crate) mod logging;
