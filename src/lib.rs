#![forbid(unsafe_code)]

//! syslog_query_helper (sqh) — queryable view over rsyslog `SystemEvents`
//! tables plus a capacity-driven retention daemon.
//!
//! Two rsyslog storage-schema generations encode the same fields differently:
//! older deployments store only the 0-7 severity in the `Priority` column,
//! newer ones store the full RFC-5424 PRI (`Facility*8 + Severity`). A table
//! that lived through an in-place upgrade contains both, side by side. This
//! crate reconciles that on every read, compiles validated multi-valued
//! filters into parameterized predicates, and deletes the oldest rows in
//! bounded batches once disk usage crosses a configured threshold.
//!
//! # Library usage
//!
//! Use the [`prelude`] for convenient access to the most common types:
//!
//! ```rust,no_run
//! use syslog_query_helper::prelude::*;
//! ```
//!
//! Individual modules can also be imported directly:
//!
//! ```rust,no_run
//! use syslog_query_helper::query::filter::FilterSet;
//! use syslog_query_helper::store::db::EventStore;
//! ```

pub mod prelude;

pub mod core;
pub mod daemon;
pub mod logger;
pub mod platform;
pub mod query;
pub mod retention;
pub mod store;
pub mod syslog;
