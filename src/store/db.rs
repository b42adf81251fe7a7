//! SQLite-backed SystemEvents store: WAL mode, prepared statements, and the
//! only code that turns compiled filters into executed SQL.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{Connection, OpenFlags, params, params_from_iter};
use serde::Serialize;

use crate::core::errors::{Result, SqhError};
use crate::query::filter::{FilterArg, FilterSet};
use crate::store::columns::{self, ColumnKind};
use crate::store::entry::{LogEntry, NewEvent, SELECT_COLUMNS};
use crate::syslog::rfc::{facility_label, severity_label};

/// One page of reconciled log rows plus the unpaged match count.
#[derive(Debug, Clone, Serialize)]
pub struct LogsPage {
    pub total: i64,
    pub offset: i64,
    pub limit: i64,
    pub rows: Vec<LogEntry>,
}

/// A labeled distinct value (severity or facility).
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MetaValue {
    pub val: i64,
    pub label: String,
}

/// Distinct values for one metadata column, shaped by its declared kind.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum DistinctValues {
    Labeled(Vec<MetaValue>),
    Integers(Vec<i64>),
    Texts(Vec<String>),
}

/// Which chronological extreme to sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleOrder {
    Oldest,
    Newest,
}

/// Store handle wrapping one SQLite connection.
///
/// Connections are cheap; concurrent users (request paths, the retention
/// monitor) each open their own handle and WAL mode arbitrates.
pub struct EventStore {
    conn: Connection,
    path: PathBuf,
}

impl EventStore {
    /// Open (or create) the database at `path`, applying PRAGMAs.
    pub fn open(path: &Path, busy_timeout: Duration) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| SqhError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| SqhError::Sql {
            context: "open",
            details: e.to_string(),
        })?;

        apply_pragmas(&conn, busy_timeout)?;

        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    /// In-memory store, for tests and ad hoc experiments.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| SqhError::Sql {
            context: "open",
            details: e.to_string(),
        })?;
        Ok(Self {
            conn,
            path: PathBuf::from(":memory:"),
        })
    }

    /// Database file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the `SystemEvents` table (when absent) and the query-path
    /// indexes. rsyslog normally owns the table; this exists for fresh
    /// deployments and test databases.
    pub fn ensure_schema(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS SystemEvents (
                    ID INTEGER PRIMARY KEY AUTOINCREMENT,
                    CustomerID INTEGER,
                    ReceivedAt TEXT NOT NULL,
                    DeviceReportedTime TEXT,
                    Facility INTEGER NOT NULL,
                    Priority INTEGER NOT NULL,
                    FromHost TEXT NOT NULL DEFAULT '',
                    Message TEXT NOT NULL DEFAULT '',
                    NTSeverity INTEGER,
                    Importance INTEGER,
                    EventSource TEXT,
                    EventUser TEXT,
                    EventCategory INTEGER,
                    EventID INTEGER,
                    EventBinaryData TEXT,
                    MaxAvailable INTEGER,
                    CurrUsage INTEGER,
                    MinUsage INTEGER,
                    MaxUsage INTEGER,
                    InfoUnitID INTEGER,
                    SysLogTag TEXT,
                    EventLogType TEXT,
                    GenericFileName TEXT,
                    SystemID INTEGER
                );

                CREATE INDEX IF NOT EXISTS idx_receivedat
                    ON SystemEvents (ReceivedAt);
                CREATE INDEX IF NOT EXISTS idx_host_time
                    ON SystemEvents (FromHost, ReceivedAt);
                CREATE INDEX IF NOT EXISTS idx_priority
                    ON SystemEvents (Priority);
                CREATE INDEX IF NOT EXISTS idx_facility
                    ON SystemEvents (Facility);
                CREATE INDEX IF NOT EXISTS idx_syslogtag
                    ON SystemEvents (SysLogTag);",
            )
            .map_err(|e| SqhError::Sql {
                context: "ensure_schema",
                details: e.to_string(),
            })
    }

    /// Insert one event row. Returns the new row id.
    pub fn insert(&self, event: &NewEvent) -> Result<i64> {
        self.conn
            .prepare_cached(
                "INSERT INTO SystemEvents (
                    CustomerID, ReceivedAt, DeviceReportedTime, Facility, Priority,
                    FromHost, Message, NTSeverity, Importance, EventSource, EventUser,
                    EventCategory, EventID, EventBinaryData, MaxAvailable, CurrUsage,
                    MinUsage, MaxUsage, InfoUnitID, SysLogTag, EventLogType,
                    GenericFileName, SystemID
                ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16,?17,?18,?19,?20,?21,?22,?23)",
            )
            .and_then(|mut stmt| {
                stmt.execute(params![
                    event.customer_id,
                    event.received_at,
                    event.device_reported_time,
                    event.facility,
                    event.priority,
                    event.from_host,
                    event.message,
                    event.nt_severity,
                    event.importance,
                    event.event_source,
                    event.event_user,
                    event.event_category,
                    event.event_id,
                    event.event_binary_data,
                    event.max_available,
                    event.curr_usage,
                    event.min_usage,
                    event.max_usage,
                    event.info_unit_id,
                    event.syslog_tag,
                    event.event_log_type,
                    event.generic_file_name,
                    event.system_id,
                ])
            })
            .map_err(|e| SqhError::Sql {
                context: "insert",
                details: e.to_string(),
            })?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Execute a filtered, paginated query, newest first. Every row passes
    /// through the reconciler on its way out.
    pub fn query_logs(&self, filter: &FilterSet, limit: i64, offset: i64) -> Result<Vec<LogEntry>> {
        let (where_expr, mut args) = filter.build();
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM SystemEvents \
             WHERE {where_expr} ORDER BY ReceivedAt DESC LIMIT ? OFFSET ?"
        );
        args.push(FilterArg::Int(limit));
        args.push(FilterArg::Int(offset));

        let run = || -> rusqlite::Result<Vec<LogEntry>> {
            let mut stmt = self.conn.prepare_cached(&sql)?;
            let rows = stmt.query_map(params_from_iter(args.iter()), |row| {
                LogEntry::from_row(row)
            })?;
            rows.collect()
        };
        run().map_err(|e| SqhError::Sql {
            context: "query_logs",
            details: e.to_string(),
        })
    }

    /// Count all rows matching the filter, ignoring pagination.
    pub fn count_logs(&self, filter: &FilterSet) -> Result<i64> {
        let (where_expr, args) = filter.build();
        let sql = format!("SELECT COUNT(*) FROM SystemEvents WHERE {where_expr}");
        self.conn
            .prepare_cached(&sql)
            .and_then(|mut stmt| {
                stmt.query_row(params_from_iter(args.iter()), |row| row.get(0))
            })
            .map_err(|e| SqhError::Sql {
                context: "count_logs",
                details: e.to_string(),
            })
    }

    /// Query + count in one call, producing a response page.
    pub fn logs_page(&self, filter: &FilterSet, limit: i64, offset: i64) -> Result<LogsPage> {
        let total = self.count_logs(filter)?;
        let rows = self.query_logs(filter, limit, offset)?;
        Ok(LogsPage {
            total,
            offset,
            limit,
            rows,
        })
    }

    /// Distinct values for a known column under the same filter set.
    ///
    /// The column name is resolved against the closed column table; unknown
    /// names fail before any SQL is built.
    pub fn distinct_values(&self, column: &str, filter: &FilterSet) -> Result<DistinctValues> {
        let def = columns::lookup(column).ok_or_else(|| SqhError::InvalidColumn {
            column: column.to_string(),
            detail: Some(format!(
                "available columns: {}",
                columns::available_columns().join(", ")
            )),
        })?;

        let (where_expr, args) = filter.build();

        let run = || -> rusqlite::Result<DistinctValues> {
            match def.kind {
                ColumnKind::VirtualSeverity => {
                    let sql = format!(
                        "SELECT DISTINCT Priority % 8 AS sev FROM SystemEvents \
                         WHERE {where_expr} ORDER BY sev ASC"
                    );
                    let mut stmt = self.conn.prepare_cached(&sql)?;
                    let values = stmt
                        .query_map(params_from_iter(args.iter()), |row| row.get::<_, i64>(0))?
                        .collect::<rusqlite::Result<Vec<i64>>>()?;
                    Ok(DistinctValues::Labeled(
                        values
                            .into_iter()
                            .map(|val| MetaValue {
                                val,
                                label: severity_label(val),
                            })
                            .collect(),
                    ))
                }
                ColumnKind::Labeled => {
                    let sql = format!(
                        "SELECT DISTINCT {col} FROM SystemEvents \
                         WHERE {where_expr} AND {col} IS NOT NULL ORDER BY {col} ASC",
                        col = def.name
                    );
                    let mut stmt = self.conn.prepare_cached(&sql)?;
                    let values = stmt
                        .query_map(params_from_iter(args.iter()), |row| row.get::<_, i64>(0))?
                        .collect::<rusqlite::Result<Vec<i64>>>()?;
                    Ok(DistinctValues::Labeled(
                        values
                            .into_iter()
                            .map(|val| MetaValue {
                                val,
                                label: facility_label(val),
                            })
                            .collect(),
                    ))
                }
                ColumnKind::Integer => {
                    let sql = format!(
                        "SELECT DISTINCT {col} FROM SystemEvents \
                         WHERE {where_expr} AND {col} IS NOT NULL ORDER BY {col} ASC",
                        col = def.name
                    );
                    let mut stmt = self.conn.prepare_cached(&sql)?;
                    let values = stmt
                        .query_map(params_from_iter(args.iter()), |row| row.get::<_, i64>(0))?
                        .collect::<rusqlite::Result<Vec<i64>>>()?;
                    Ok(DistinctValues::Integers(values))
                }
                ColumnKind::Text => {
                    let sql = format!(
                        "SELECT DISTINCT {col} FROM SystemEvents \
                         WHERE {where_expr} AND {col} IS NOT NULL ORDER BY {col} ASC",
                        col = def.name
                    );
                    let mut stmt = self.conn.prepare_cached(&sql)?;
                    let values = stmt
                        .query_map(params_from_iter(args.iter()), |row| {
                            row.get::<_, String>(0)
                        })?
                        .collect::<rusqlite::Result<Vec<String>>>()?;
                    Ok(DistinctValues::Texts(
                        values.into_iter().filter(|v| !v.is_empty()).collect(),
                    ))
                }
            }
        };
        run().map_err(|e| SqhError::Sql {
            context: "distinct_values",
            details: e.to_string(),
        })
    }

    /// Raw priority of the chronologically oldest or newest non-kernel row.
    ///
    /// Kernel rows (facility 0) are excluded: a low value there is ambiguous
    /// between the two storage generations.
    pub fn extreme_priority(&self, order: SampleOrder) -> Result<Option<i64>> {
        let sql = match order {
            SampleOrder::Oldest => {
                "SELECT Priority FROM SystemEvents WHERE Facility > 0 \
                 ORDER BY ReceivedAt ASC LIMIT 1"
            }
            SampleOrder::Newest => {
                "SELECT Priority FROM SystemEvents WHERE Facility > 0 \
                 ORDER BY ReceivedAt DESC LIMIT 1"
            }
        };
        use rusqlite::OptionalExtension;
        self.conn
            .query_row(sql, [], |row| row.get(0))
            .optional()
            .map_err(|e| SqhError::Sql {
                context: "extreme_priority",
                details: e.to_string(),
            })
    }

    /// Delete the `batch` oldest rows (receipt time ascending, id as the
    /// tie-break) in one bounded statement. Returns rows actually removed.
    pub fn delete_oldest(&self, batch: usize) -> Result<usize> {
        let limit = i64::try_from(batch).unwrap_or(i64::MAX);
        self.conn
            .execute(
                "DELETE FROM SystemEvents WHERE ID IN (
                    SELECT ID FROM SystemEvents
                    ORDER BY ReceivedAt ASC, ID ASC
                    LIMIT ?1
                )",
                params![limit],
            )
            .map_err(|e| SqhError::Sql {
                context: "delete_oldest",
                details: e.to_string(),
            })
    }
}

fn apply_pragmas(conn: &Connection, busy_timeout: Duration) -> Result<()> {
    conn.execute_batch(&format!(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;
         PRAGMA cache_size = -8000;
         PRAGMA temp_store = MEMORY;
         PRAGMA busy_timeout = {};",
        busy_timeout.as_millis()
    ))
    .map_err(|e| SqhError::Sql {
        context: "pragmas",
        details: e.to_string(),
    })?;
    // Verify WAL mode is active; in-memory databases legitimately report "memory".
    let mode: String = conn
        .query_row("PRAGMA journal_mode", [], |row| row.get(0))
        .map_err(|e| SqhError::Sql {
            context: "pragmas",
            details: e.to_string(),
        })?;
    if !mode.eq_ignore_ascii_case("wal") && !mode.eq_ignore_ascii_case("memory") {
        eprintln!("[SQH-STORE] WARNING: requested WAL mode but got '{mode}'");
    }
    Ok(())
}
