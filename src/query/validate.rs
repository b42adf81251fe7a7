//! Parameter validators: raw string lists in, typed values or a structured
//! validation error out.
//!
//! Each validator is independent and order-insensitive; callers invoke any
//! subset. Nothing here touches the store — a value that fails validation
//! never reaches SQL.

#![allow(missing_docs)]

use chrono::{DateTime, Duration, SecondsFormat, Utc};

use crate::core::errors::{Result, SqhError};
use crate::syslog::rfc::{is_valid_facility, is_valid_severity};

/// Default page size when `limit` is absent.
pub const DEFAULT_LIMIT: i64 = 10;

/// Largest accepted `limit`.
pub const MAX_LIMIT: i64 = 1_000;

/// Widest accepted date range.
pub const MAX_RANGE_DAYS: i64 = 90;

/// Validated, inclusive receipt-time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// Render a bound the way the store encodes `ReceivedAt`.
    #[must_use]
    pub fn format_bound(bound: DateTime<Utc>) -> String {
        bound.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

/// Validated pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub limit: i64,
    pub offset: i64,
}

/// Validate severity values (0-7).
///
/// `Severity` is the canonical parameter; `Priority` is accepted as a
/// deprecated alias. When both carry values only the canonical set is used —
/// the two are never merged.
pub fn validate_severities(severities: &[String], priorities: &[String]) -> Result<Vec<i64>> {
    let (field, values) = if severities.is_empty() {
        ("Priority", priorities)
    } else {
        ("Severity", severities)
    };

    let mut out = Vec::with_capacity(values.len());
    for raw in values {
        let value = raw
            .trim()
            .parse::<i64>()
            .map_err(|_| SqhError::InvalidSeverity {
                field: field.to_string(),
                message: format!("'{raw}' is not a valid integer"),
                detail: None,
            })?;
        if !is_valid_severity(value) {
            return Err(SqhError::InvalidSeverity {
                field: field.to_string(),
                message: format!("value {value} is out of range (must be 0-7)"),
                detail: Some("See RFC-5424 for valid severity levels".to_string()),
            });
        }
        out.push(value);
    }
    Ok(out)
}

/// Validate facility values (0-23).
pub fn validate_facilities(facilities: &[String]) -> Result<Vec<i64>> {
    let mut out = Vec::with_capacity(facilities.len());
    for raw in facilities {
        let value = raw
            .trim()
            .parse::<i64>()
            .map_err(|_| SqhError::InvalidFacility {
                field: "Facility".to_string(),
                message: format!("'{raw}' is not a valid integer"),
                detail: None,
            })?;
        if !is_valid_facility(value) {
            return Err(SqhError::InvalidFacility {
                field: "Facility".to_string(),
                message: format!("value {value} is out of range (must be 0-23)"),
                detail: Some("See RFC-5424 for valid facility codes".to_string()),
            });
        }
        out.push(value);
    }
    Ok(out)
}

/// Validate free-text search terms: at least 2 characters after trimming.
/// The trimmed term is what gets compiled, so validation and the LIKE
/// pattern always agree.
pub fn validate_message_terms(terms: &[String]) -> Result<Vec<String>> {
    let mut out = Vec::with_capacity(terms.len());
    for raw in terms {
        let trimmed = raw.trim();
        if trimmed.chars().count() < 2 {
            return Err(SqhError::InvalidParameter {
                field: "Message".to_string(),
                message: "search term must be at least 2 characters long".to_string(),
                detail: Some(format!("term '{raw}' is too short")),
            });
        }
        out.push(trimmed.to_string());
    }
    Ok(out)
}

/// Validate and default the date range.
///
/// Missing start defaults to now-24h, missing end to now — both computed
/// here, at validation time, so every request gets a fresh window. Bounds
/// must be strict RFC 3339; start after end and spans over 90 days are
/// rejected.
pub fn validate_date_range(start_raw: Option<&str>, end_raw: Option<&str>) -> Result<DateRange> {
    let now = Utc::now();

    let start = match start_raw {
        Some(raw) => parse_bound("start_date", raw)?,
        None => now - Duration::hours(24),
    };
    let end = match end_raw {
        Some(raw) => parse_bound("end_date", raw)?,
        None => now,
    };

    if start > end {
        return Err(SqhError::InvalidDateRange {
            message: "start_date cannot be after end_date".to_string(),
            detail: None,
        });
    }

    let span = end - start;
    if span > Duration::days(MAX_RANGE_DAYS) {
        return Err(SqhError::InvalidDateRange {
            message: format!("date range cannot exceed {MAX_RANGE_DAYS} days"),
            detail: Some(format!(
                "requested range: {:.1} days",
                span.num_minutes() as f64 / (24.0 * 60.0)
            )),
        });
    }

    Ok(DateRange { start, end })
}

fn parse_bound(field: &str, raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| SqhError::InvalidParameter {
            field: field.to_string(),
            message: "invalid format".to_string(),
            detail: Some("expected RFC 3339 format (e.g. 2025-02-15T10:00:00Z)".to_string()),
        })
}

/// Validate pagination parameters.
///
/// Out-of-range input is rejected, never silently clamped.
pub fn validate_pagination(limit_raw: Option<&str>, offset_raw: Option<&str>) -> Result<Pagination> {
    let offset = match offset_raw {
        None => 0,
        Some(raw) => {
            let value = raw
                .trim()
                .parse::<i64>()
                .map_err(|_| SqhError::InvalidParameter {
                    field: "offset".to_string(),
                    message: format!("'{raw}' is not a valid integer"),
                    detail: None,
                })?;
            if value < 0 {
                return Err(SqhError::InvalidParameter {
                    field: "offset".to_string(),
                    message: "must be non-negative".to_string(),
                    detail: None,
                });
            }
            value
        }
    };

    let limit = match limit_raw {
        None => DEFAULT_LIMIT,
        Some(raw) => {
            let value = raw
                .trim()
                .parse::<i64>()
                .map_err(|_| SqhError::InvalidParameter {
                    field: "limit".to_string(),
                    message: format!("'{raw}' is not a valid integer"),
                    detail: None,
                })?;
            if value <= 0 {
                return Err(SqhError::InvalidParameter {
                    field: "limit".to_string(),
                    message: "must be greater than 0".to_string(),
                    detail: None,
                });
            }
            if value > MAX_LIMIT {
                return Err(SqhError::InvalidParameter {
                    field: "limit".to_string(),
                    message: format!("cannot exceed {MAX_LIMIT}"),
                    detail: Some(format!("requested: {value}")),
                });
            }
            value
        }
    };

    Ok(Pagination { limit, offset })
}
