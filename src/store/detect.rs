//! Startup-time classification of the dataset's priority-column format.
//!
//! Informational only: the result is logged and reported, never consulted
//! when decoding rows. [`crate::syslog::reconcile`] alone governs per-row
//! correctness, so a wrong (or absent) classification cannot corrupt reads.

#![allow(missing_docs)]

use std::fmt;

use serde::Serialize;

use crate::store::db::{EventStore, SampleOrder};

/// How the `Priority` column is stored across the dataset.
///
/// Differs between rsyslog versions:
///   - Legacy (< 8.2204.0): `Priority` = Severity (0-7)
///   - Modern (>= 8.2204.0): `Priority` = RFC PRI (`Facility*8 + Severity`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityMode {
    /// Priority column contains Severity (0-7).
    Legacy,
    /// Priority column contains RFC PRI (Facility*8 + Severity).
    Modern,
    /// Dataset contains both legacy and modern entries.
    Mixed,
}

impl fmt::Display for PriorityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Legacy => write!(f, "legacy (Priority = Severity 0-7)"),
            Self::Modern => write!(f, "modern (Priority = Facility*8 + Severity)"),
            Self::Mixed => write!(f, "mixed (legacy + modern entries present)"),
        }
    }
}

/// Detection outcome: the classification plus the samples that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriorityDetection {
    pub mode: PriorityMode,
    /// True when no usable sample existed and the default was assumed.
    pub degraded: bool,
    pub oldest: Option<i64>,
    pub newest: Option<i64>,
}

/// Classify the dataset by sampling the raw priority of the oldest and
/// newest non-kernel rows.
///
/// Kernel rows (facility 0) are skipped: in modern format a low-severity
/// kernel message still has `Priority <= 7`, indistinguishable from a
/// legacy row. Decision table:
///
///   oldest <= 7 AND newest <= 7  → Legacy
///   oldest > 7  AND newest > 7   → Modern
///   anything else                → Mixed (an in-place upgrade happened)
///
/// A failed or empty lookup counts as "sample not found"; with neither
/// sample available the result degrades to Legacy.
pub fn detect_priority_mode(store: &EventStore) -> PriorityDetection {
    let oldest = store
        .extreme_priority(SampleOrder::Oldest)
        .unwrap_or_default();
    let newest = store
        .extreme_priority(SampleOrder::Newest)
        .unwrap_or_default();

    if oldest.is_none() && newest.is_none() {
        return PriorityDetection {
            mode: PriorityMode::Legacy,
            degraded: true,
            oldest,
            newest,
        };
    }

    let oldest_is_modern = oldest.is_some_and(|p| p > 7);
    let newest_is_modern = newest.is_some_and(|p| p > 7);

    let mode = match (oldest_is_modern, newest_is_modern) {
        (false, false) => PriorityMode::Legacy,
        (true, true) => PriorityMode::Modern,
        _ => PriorityMode::Mixed,
    };

    PriorityDetection {
        mode,
        degraded: false,
        oldest,
        newest,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::entry::NewEvent;

    fn store_with(rows: &[(&str, i64, i64)]) -> EventStore {
        let store = EventStore::open_in_memory().unwrap();
        store.ensure_schema().unwrap();
        for (ts, facility, priority) in rows {
            store
                .insert(&NewEvent {
                    received_at: (*ts).to_string(),
                    facility: *facility,
                    priority: *priority,
                    from_host: "host".to_string(),
                    message: "msg".to_string(),
                    ..NewEvent::default()
                })
                .unwrap();
        }
        store
    }

    #[test]
    fn both_low_samples_classify_legacy() {
        let store = store_with(&[
            ("2025-01-01T00:00:00Z", 3, 3),
            ("2025-06-01T00:00:00Z", 4, 3),
        ]);
        let detection = detect_priority_mode(&store);
        assert_eq!(detection.mode, PriorityMode::Legacy);
        assert!(!detection.degraded);
        assert_eq!(detection.oldest, Some(3));
        assert_eq!(detection.newest, Some(3));
    }

    #[test]
    fn both_high_samples_classify_modern() {
        let store = store_with(&[
            ("2025-01-01T00:00:00Z", 4, 35),
            ("2025-06-01T00:00:00Z", 5, 40),
        ]);
        let detection = detect_priority_mode(&store);
        assert_eq!(detection.mode, PriorityMode::Modern);
        assert_eq!(detection.oldest, Some(35));
        assert_eq!(detection.newest, Some(40));
    }

    #[test]
    fn low_then_high_classifies_mixed() {
        let store = store_with(&[
            ("2025-01-01T00:00:00Z", 3, 3),
            ("2025-06-01T00:00:00Z", 5, 40),
        ]);
        assert_eq!(detect_priority_mode(&store).mode, PriorityMode::Mixed);
    }

    #[test]
    fn empty_dataset_degrades_to_legacy() {
        let store = store_with(&[]);
        let detection = detect_priority_mode(&store);
        assert_eq!(detection.mode, PriorityMode::Legacy);
        assert!(detection.degraded);
        assert_eq!(detection.oldest, None);
        assert_eq!(detection.newest, None);
    }

    #[test]
    fn kernel_only_dataset_degrades_to_legacy() {
        let store = store_with(&[
            ("2025-01-01T00:00:00Z", 0, 2),
            ("2025-06-01T00:00:00Z", 0, 100),
        ]);
        let detection = detect_priority_mode(&store);
        assert_eq!(detection.mode, PriorityMode::Legacy);
        assert!(detection.degraded);
    }

    #[test]
    fn single_row_dataset_samples_same_row_twice() {
        let store = store_with(&[("2025-01-01T00:00:00Z", 3, 30)]);
        let detection = detect_priority_mode(&store);
        assert_eq!(detection.mode, PriorityMode::Modern);
        assert_eq!(detection.oldest, detection.newest);
    }

    #[test]
    fn display_labels_are_descriptive() {
        assert!(PriorityMode::Legacy.to_string().contains("Severity 0-7"));
        assert!(PriorityMode::Mixed.to_string().contains("mixed"));
    }
}
