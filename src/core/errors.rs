//! SQH-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, SqhError>;

/// Top-level error type for syslog_query_helper.
///
/// Validation variants (SQH-2xxx) carry the offending request field so
/// callers can surface "which parameter was wrong" without string parsing.
#[derive(Debug, Error)]
pub enum SqhError {
    #[error("[SQH-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[SQH-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[SQH-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[SQH-1101] unsupported platform: {details}")]
    UnsupportedPlatform { details: String },

    #[error("[SQH-2001] invalid parameter {field}: {message}")]
    InvalidParameter {
        field: String,
        message: String,
        detail: Option<String>,
    },

    #[error("[SQH-2002] invalid severity in {field}: {message}")]
    InvalidSeverity {
        field: String,
        message: String,
        detail: Option<String>,
    },

    #[error("[SQH-2003] invalid facility in {field}: {message}")]
    InvalidFacility {
        field: String,
        message: String,
        detail: Option<String>,
    },

    #[error("[SQH-2004] invalid date range: {message}")]
    InvalidDateRange {
        message: String,
        detail: Option<String>,
    },

    #[error("[SQH-2005] unknown column: {column}")]
    InvalidColumn {
        column: String,
        detail: Option<String>,
    },

    #[error("[SQH-3001] SQL failure in {context}: {details}")]
    Sql {
        context: &'static str,
        details: String,
    },

    #[error("[SQH-3101] filesystem stats failure for {path}: {details}")]
    FsStats { path: PathBuf, details: String },

    #[error("[SQH-3102] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[SQH-3103] channel closed in component {component}")]
    ChannelClosed { component: &'static str },

    #[error("[SQH-3104] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[SQH-3900] runtime failure: {details}")]
    Runtime { details: String },
}

impl SqhError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "SQH-1001",
            Self::MissingConfig { .. } => "SQH-1002",
            Self::ConfigParse { .. } => "SQH-1003",
            Self::UnsupportedPlatform { .. } => "SQH-1101",
            Self::InvalidParameter { .. } => "SQH-2001",
            Self::InvalidSeverity { .. } => "SQH-2002",
            Self::InvalidFacility { .. } => "SQH-2003",
            Self::InvalidDateRange { .. } => "SQH-2004",
            Self::InvalidColumn { .. } => "SQH-2005",
            Self::Sql { .. } => "SQH-3001",
            Self::FsStats { .. } => "SQH-3101",
            Self::Io { .. } => "SQH-3102",
            Self::ChannelClosed { .. } => "SQH-3103",
            Self::Serialization { .. } => "SQH-3104",
            Self::Runtime { .. } => "SQH-3900",
        }
    }

    /// Request field a validation error refers to, when there is one.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::InvalidParameter { field, .. }
            | Self::InvalidSeverity { field, .. }
            | Self::InvalidFacility { field, .. } => Some(field),
            Self::InvalidDateRange { .. } => Some("start_date/end_date"),
            Self::InvalidColumn { .. } => Some("column"),
            _ => None,
        }
    }

    /// Optional extra detail attached to a validation error.
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::InvalidParameter { detail, .. }
            | Self::InvalidSeverity { detail, .. }
            | Self::InvalidFacility { detail, .. }
            | Self::InvalidDateRange { detail, .. }
            | Self::InvalidColumn { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    /// Whether this is a request-validation failure (never reaches the store).
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidParameter { .. }
                | Self::InvalidSeverity { .. }
                | Self::InvalidFacility { .. }
                | Self::InvalidDateRange { .. }
                | Self::InvalidColumn { .. }
        )
    }

    /// Caller-safe message. Validation errors pass through verbatim; store
    /// failures are reduced to a generic line so raw SQL error text never
    /// reaches a response surface.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Sql { context, .. } => {
                format!("[SQH-3001] database operation failed ({context})")
            }
            other => other.to_string(),
        }
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<rusqlite::Error> for SqhError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sql {
            context: "rusqlite",
            details: value.to_string(),
        }
    }
}

impl From<serde_json::Error> for SqhError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for SqhError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_variants() -> Vec<SqhError> {
        vec![
            SqhError::InvalidConfig {
                details: String::new(),
            },
            SqhError::MissingConfig {
                path: PathBuf::new(),
            },
            SqhError::ConfigParse {
                context: "",
                details: String::new(),
            },
            SqhError::UnsupportedPlatform {
                details: String::new(),
            },
            SqhError::InvalidParameter {
                field: "limit".to_string(),
                message: String::new(),
                detail: None,
            },
            SqhError::InvalidSeverity {
                field: "Severity".to_string(),
                message: String::new(),
                detail: None,
            },
            SqhError::InvalidFacility {
                field: "Facility".to_string(),
                message: String::new(),
                detail: None,
            },
            SqhError::InvalidDateRange {
                message: String::new(),
                detail: None,
            },
            SqhError::InvalidColumn {
                column: "Bogus".to_string(),
                detail: None,
            },
            SqhError::Sql {
                context: "",
                details: String::new(),
            },
            SqhError::FsStats {
                path: PathBuf::new(),
                details: String::new(),
            },
            SqhError::Io {
                path: PathBuf::new(),
                source: std::io::Error::other("test"),
            },
            SqhError::ChannelClosed { component: "" },
            SqhError::Serialization {
                context: "",
                details: String::new(),
            },
            SqhError::Runtime {
                details: String::new(),
            },
        ]
    }

    #[test]
    fn error_codes_are_unique() {
        let errors = all_variants();
        let codes: Vec<&str> = errors.iter().map(|e| e.code()).collect();
        let unique: std::collections::HashSet<&&str> = codes.iter().collect();
        assert_eq!(
            codes.len(),
            unique.len(),
            "error codes must be unique: {codes:?}"
        );
    }

    #[test]
    fn error_codes_have_sqh_prefix() {
        for err in &all_variants() {
            assert!(
                err.code().starts_with("SQH-"),
                "code {} must start with SQH-",
                err.code()
            );
        }
    }

    #[test]
    fn error_display_includes_code() {
        let err = SqhError::InvalidConfig {
            details: "bad value".to_string(),
        };
        let msg = err.to_string();
        assert!(
            msg.contains("SQH-1001"),
            "display should contain error code: {msg}"
        );
        assert!(
            msg.contains("bad value"),
            "display should contain details: {msg}"
        );
    }

    #[test]
    fn validation_errors_expose_their_field() {
        let err = SqhError::InvalidSeverity {
            field: "Priority".to_string(),
            message: "out of range".to_string(),
            detail: Some("value 12 exceeds 7".to_string()),
        };
        assert!(err.is_validation());
        assert_eq!(err.field(), Some("Priority"));
        assert_eq!(err.detail(), Some("value 12 exceeds 7"));
    }

    #[test]
    fn store_errors_are_not_validation() {
        let err = SqhError::Sql {
            context: "count_logs",
            details: "no such table".to_string(),
        };
        assert!(!err.is_validation());
        assert_eq!(err.field(), None);
    }

    #[test]
    fn public_message_hides_sql_internals() {
        let err = SqhError::Sql {
            context: "query_logs",
            details: "near \"SELEC\": syntax error".to_string(),
        };
        let public = err.public_message();
        assert!(public.contains("SQH-3001"));
        assert!(public.contains("query_logs"));
        assert!(!public.contains("syntax error"));
    }

    #[test]
    fn public_message_passes_validation_through() {
        let err = SqhError::InvalidFacility {
            field: "Facility".to_string(),
            message: "value 99 is out of range (must be 0-23)".to_string(),
            detail: None,
        };
        assert_eq!(err.public_message(), err.to_string());
    }

    #[test]
    fn from_rusqlite_error() {
        let sql_err =
            rusqlite::Error::SqliteFailure(rusqlite::ffi::Error::new(1), Some("test".to_string()));
        let err: SqhError = sql_err.into();
        assert_eq!(err.code(), "SQH-3001");
    }

    #[test]
    fn from_toml_error() {
        let toml_err = toml::from_str::<toml::Value>("= invalid").unwrap_err();
        let err: SqhError = toml_err.into();
        assert_eq!(err.code(), "SQH-1003");
    }
}
