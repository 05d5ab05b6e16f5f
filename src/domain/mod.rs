//! Usage: Report domain logic (error classification, aggregation, assembly).

pub(crate) mod error_policy;
pub(crate) mod reports;
