//! Per-row priority reconciliation across the two rsyslog storage generations.
//!
//! Older rsyslog (< 8.2204.0) writes the 0-7 severity into the `Priority`
//! column; newer versions write the full RFC PRI (`Facility*8 + Severity`).
//! A table that lived through an in-place upgrade holds both generations, so
//! every row is decoded from its own values alone. The dataset-level
//! classification in [`crate::store::detect`] is diagnostic only and must
//! never feed into this function.

use crate::syslog::rfc::severity_label;

/// Canonical decoding of one stored `(Priority, Facility)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciled {
    /// RFC-5424 severity, 0-7 for well-formed rows.
    pub severity: i64,
    /// RFC-5424 PRI (`Facility*8 + Severity`).
    pub pri: i64,
}

impl Reconciled {
    /// Human label for the severity component.
    #[must_use]
    pub fn severity_label(&self) -> String {
        severity_label(self.severity)
    }
}

/// Decode a stored raw priority against its facility.
///
/// `raw_priority > 7` means the column already holds the PRI, so the
/// severity is the low three bits. Otherwise the column holds the severity
/// itself and the PRI is rebuilt from the facility.
///
/// A raw value of 0 is inherently ambiguous: it is both a valid severity
/// (Emergency) and a valid PRI for facility 0. It resolves through the
/// legacy branch as severity 0. Known ambiguity, kept deliberately.
#[must_use]
pub fn reconcile(raw_priority: i64, facility: i64) -> Reconciled {
    if raw_priority > 7 {
        Reconciled {
            severity: raw_priority % 8,
            pri: raw_priority,
        }
    } else {
        Reconciled {
            severity: raw_priority,
            pri: facility * 8 + raw_priority,
        }
    }
}
