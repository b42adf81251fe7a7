//! RFC-5424 value tables and per-row priority reconciliation.

pub mod reconcile;
pub mod rfc;
