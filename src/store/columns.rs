//! Closed column table for the metadata endpoint.
//!
//! Every queryable column is declared here with an explicit kind, resolved
//! once at lookup time. There is no runtime type inspection and no path by
//! which a request-supplied name reaches SQL unchecked.

#![allow(missing_docs)]

/// How a column's distinct values are queried and rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Derived virtual column: distinct `Priority % 8`, severity-labeled.
    VirtualSeverity,
    /// Stored integer column rendered with an RFC-5424 facility label.
    Labeled,
    /// Plain stored integer column.
    Integer,
    /// Stored text column; NULL and empty values are dropped.
    Text,
}

/// One entry of the closed column table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub kind: ColumnKind,
}

/// Every column the metadata endpoint knows about. `Severity` is virtual —
/// it is computed from the stored priority via the modulo-8 rule, never
/// stored directly.
pub const COLUMNS: &[ColumnDef] = &[
    ColumnDef {
        name: "Severity",
        kind: ColumnKind::VirtualSeverity,
    },
    ColumnDef {
        name: "Facility",
        kind: ColumnKind::Labeled,
    },
    ColumnDef {
        name: "Priority",
        kind: ColumnKind::Integer,
    },
    ColumnDef {
        name: "ID",
        kind: ColumnKind::Integer,
    },
    ColumnDef {
        name: "CustomerID",
        kind: ColumnKind::Integer,
    },
    ColumnDef {
        name: "ReceivedAt",
        kind: ColumnKind::Text,
    },
    ColumnDef {
        name: "DeviceReportedTime",
        kind: ColumnKind::Text,
    },
    ColumnDef {
        name: "FromHost",
        kind: ColumnKind::Text,
    },
    ColumnDef {
        name: "Message",
        kind: ColumnKind::Text,
    },
    ColumnDef {
        name: "NTSeverity",
        kind: ColumnKind::Integer,
    },
    ColumnDef {
        name: "Importance",
        kind: ColumnKind::Integer,
    },
    ColumnDef {
        name: "EventSource",
        kind: ColumnKind::Text,
    },
    ColumnDef {
        name: "EventUser",
        kind: ColumnKind::Text,
    },
    ColumnDef {
        name: "EventCategory",
        kind: ColumnKind::Integer,
    },
    ColumnDef {
        name: "EventID",
        kind: ColumnKind::Integer,
    },
    ColumnDef {
        name: "EventBinaryData",
        kind: ColumnKind::Text,
    },
    ColumnDef {
        name: "MaxAvailable",
        kind: ColumnKind::Integer,
    },
    ColumnDef {
        name: "CurrUsage",
        kind: ColumnKind::Integer,
    },
    ColumnDef {
        name: "MinUsage",
        kind: ColumnKind::Integer,
    },
    ColumnDef {
        name: "MaxUsage",
        kind: ColumnKind::Integer,
    },
    ColumnDef {
        name: "InfoUnitID",
        kind: ColumnKind::Integer,
    },
    ColumnDef {
        name: "SysLogTag",
        kind: ColumnKind::Text,
    },
    ColumnDef {
        name: "EventLogType",
        kind: ColumnKind::Text,
    },
    ColumnDef {
        name: "GenericFileName",
        kind: ColumnKind::Text,
    },
    ColumnDef {
        name: "SystemID",
        kind: ColumnKind::Integer,
    },
];

/// Resolve a column by exact name.
#[must_use]
pub fn lookup(name: &str) -> Option<&'static ColumnDef> {
    COLUMNS.iter().find(|def| def.name == name)
}

/// Names of every known column, table order.
#[must_use]
pub fn available_columns() -> Vec<&'static str> {
    COLUMNS.iter().map(|def| def.name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_exact_match() {
        assert!(lookup("FromHost").is_some());
        assert!(lookup("fromhost").is_none());
        assert!(lookup("Bogus").is_none());
    }

    #[test]
    fn severity_is_virtual_priority_is_raw() {
        assert_eq!(lookup("Severity").unwrap().kind, ColumnKind::VirtualSeverity);
        assert_eq!(lookup("Priority").unwrap().kind, ColumnKind::Integer);
    }

    #[test]
    fn facility_is_labeled() {
        assert_eq!(lookup("Facility").unwrap().kind, ColumnKind::Labeled);
    }

    #[test]
    fn table_has_no_duplicate_names() {
        let names = available_columns();
        let unique: std::collections::HashSet<_> = names.iter().collect();
        assert_eq!(names.len(), unique.len());
    }
}
