//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use syslog_query_helper::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{Result, SqhError};

// Platform
pub use crate::platform::pal::{FsStats, Platform, detect_platform};

// Syslog model
pub use crate::syslog::reconcile::{Reconciled, reconcile};
pub use crate::syslog::rfc::{facility_label, severity_label};

// Query
pub use crate::query::filter::FilterSet;
pub use crate::query::validate::{
    validate_date_range, validate_facilities, validate_message_terms, validate_pagination,
    validate_severities,
};

// Store
pub use crate::store::db::{EventStore, LogsPage};
pub use crate::store::detect::{PriorityDetection, PriorityMode, detect_priority_mode};
pub use crate::store::entry::LogEntry;

// Retention
pub use crate::retention::monitor::{RetentionControl, RetentionMonitor};
