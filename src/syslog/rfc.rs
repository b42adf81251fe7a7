//! Fixed RFC-5424 severity and facility tables.

/// Highest valid severity value.
pub const MAX_SEVERITY: i64 = 7;

/// Highest valid facility value.
pub const MAX_FACILITY: i64 = 23;

/// RFC-5424 severity labels, indexed 0 (Emergency) through 7 (Debug).
pub const SEVERITY_LABELS: [&str; 8] = [
    "Emergency",
    "Alert",
    "Critical",
    "Error",
    "Warning",
    "Notice",
    "Informational",
    "Debug",
];

/// RFC-5424 facility labels, indexed 0 (kern) through 23 (local7).
pub const FACILITY_LABELS: [&str; 24] = [
    "kern", "user", "mail", "daemon", "auth", "syslog", "lpr", "news", "uucp", "cron", "authpriv",
    "ftp", "ntp", "logaudit", "logalert", "clock", "local0", "local1", "local2", "local3",
    "local4", "local5", "local6", "local7",
];

/// Label for a severity value. Out-of-range values yield `Unknown(N)`.
#[must_use]
pub fn severity_label(severity: i64) -> String {
    usize::try_from(severity)
        .ok()
        .and_then(|idx| SEVERITY_LABELS.get(idx))
        .map_or_else(|| format!("Unknown({severity})"), ToString::to_string)
}

/// Label for a facility value. Out-of-range values yield `Unknown(N)`.
#[must_use]
pub fn facility_label(facility: i64) -> String {
    usize::try_from(facility)
        .ok()
        .and_then(|idx| FACILITY_LABELS.get(idx))
        .map_or_else(|| format!("Unknown({facility})"), ToString::to_string)
}

/// Whether a value is a valid severity (0-7).
#[must_use]
pub const fn is_valid_severity(severity: i64) -> bool {
    severity >= 0 && severity <= MAX_SEVERITY
}

/// Whether a value is a valid facility (0-23).
#[must_use]
pub const fn is_valid_facility(facility: i64) -> bool {
    facility >= 0 && facility <= MAX_FACILITY
}
