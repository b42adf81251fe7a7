//! Row model for the `SystemEvents` table.

#![allow(missing_docs)]

use rusqlite::Row;
use serde::Serialize;

use crate::syslog::reconcile::reconcile;
use crate::syslog::rfc::{facility_label, severity_label};

/// Column list every row query selects, in `LogEntry::from_row` order.
pub const SELECT_COLUMNS: &str = "ID, CustomerID, ReceivedAt, DeviceReportedTime, Facility, \
     Priority, FromHost, Message, NTSeverity, Importance, EventSource, EventUser, \
     EventCategory, EventID, EventBinaryData, MaxAvailable, CurrUsage, MinUsage, \
     MaxUsage, InfoUnitID, SysLogTag, EventLogType, GenericFileName, SystemID";

/// One reconciled log record.
///
/// `priority` is always the canonical RFC PRI and `severity` the canonical
/// 0-7 level, regardless of which storage generation wrote the row —
/// [`reconcile`] runs on every read. Secondary Windows-event fields are each
/// independently nullable.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LogEntry {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "CustomerID")]
    pub customer_id: Option<i64>,
    #[serde(rename = "ReceivedAt")]
    pub received_at: String,
    #[serde(rename = "DeviceReportedTime")]
    pub device_reported_time: Option<String>,
    #[serde(rename = "Facility")]
    pub facility: i64,
    #[serde(rename = "Facility_Label")]
    pub facility_label: String,
    #[serde(rename = "Priority")]
    pub priority: i64,
    #[serde(rename = "Severity")]
    pub severity: i64,
    #[serde(rename = "Severity_Label")]
    pub severity_label: String,
    #[serde(rename = "FromHost")]
    pub from_host: String,
    #[serde(rename = "Message")]
    pub message: String,
    #[serde(rename = "NTSeverity")]
    pub nt_severity: Option<i64>,
    #[serde(rename = "Importance")]
    pub importance: Option<i64>,
    #[serde(rename = "EventSource")]
    pub event_source: Option<String>,
    #[serde(rename = "EventUser")]
    pub event_user: Option<String>,
    #[serde(rename = "EventCategory")]
    pub event_category: Option<i64>,
    #[serde(rename = "EventID")]
    pub event_id: Option<i64>,
    #[serde(rename = "EventBinaryData")]
    pub event_binary_data: Option<String>,
    #[serde(rename = "MaxAvailable")]
    pub max_available: Option<i64>,
    #[serde(rename = "CurrUsage")]
    pub curr_usage: Option<i64>,
    #[serde(rename = "MinUsage")]
    pub min_usage: Option<i64>,
    #[serde(rename = "MaxUsage")]
    pub max_usage: Option<i64>,
    #[serde(rename = "InfoUnitID")]
    pub info_unit_id: Option<i64>,
    #[serde(rename = "SysLogTag")]
    pub syslog_tag: Option<String>,
    #[serde(rename = "EventLogType")]
    pub event_log_type: Option<String>,
    #[serde(rename = "GenericFileName")]
    pub generic_file_name: Option<String>,
    #[serde(rename = "SystemID")]
    pub system_id: Option<i64>,
}

impl LogEntry {
    /// Map a [`SELECT_COLUMNS`] row, reconciling the stored priority into
    /// canonical severity/PRI and attaching labels.
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let facility: i64 = row.get(4)?;
        let raw_priority: i64 = row.get(5)?;
        let reconciled = reconcile(raw_priority, facility);

        Ok(Self {
            id: row.get(0)?,
            customer_id: row.get(1)?,
            received_at: row.get(2)?,
            device_reported_time: row.get(3)?,
            facility,
            facility_label: facility_label(facility),
            priority: reconciled.pri,
            severity: reconciled.severity,
            severity_label: severity_label(reconciled.severity),
            from_host: row.get(6)?,
            message: row.get(7)?,
            nt_severity: row.get(8)?,
            importance: row.get(9)?,
            event_source: row.get(10)?,
            event_user: row.get(11)?,
            event_category: row.get(12)?,
            event_id: row.get(13)?,
            event_binary_data: row.get(14)?,
            max_available: row.get(15)?,
            curr_usage: row.get(16)?,
            min_usage: row.get(17)?,
            max_usage: row.get(18)?,
            info_unit_id: row.get(19)?,
            syslog_tag: row.get(20)?,
            event_log_type: row.get(21)?,
            generic_file_name: row.get(22)?,
            system_id: row.get(23)?,
        })
    }
}

/// Insertable event, used by ingestion helpers and test fixtures. The
/// collector daemon that normally writes these rows is an external process.
#[derive(Debug, Clone, Default)]
pub struct NewEvent {
    pub received_at: String,
    pub device_reported_time: Option<String>,
    pub facility: i64,
    pub priority: i64,
    pub from_host: String,
    pub message: String,
    pub syslog_tag: Option<String>,
    pub customer_id: Option<i64>,
    pub nt_severity: Option<i64>,
    pub importance: Option<i64>,
    pub event_source: Option<String>,
    pub event_user: Option<String>,
    pub event_category: Option<i64>,
    pub event_id: Option<i64>,
    pub event_binary_data: Option<String>,
    pub max_available: Option<i64>,
    pub curr_usage: Option<i64>,
    pub min_usage: Option<i64>,
    pub max_usage: Option<i64>,
    pub info_unit_id: Option<i64>,
    pub event_log_type: Option<String>,
    pub generic_file_name: Option<String>,
    pub system_id: Option<i64>,
}
