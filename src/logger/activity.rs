//! Activity logger thread: a dedicated thread owns the [`JsonlWriter`] and
//! everything else sends [`ActivityEvent`]s over a bounded crossbeam
//! channel. `try_send` plus a dropped-events counter means the retention
//! loop is never blocked by logging back-pressure.

#![allow(missing_docs)]

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};

use crate::core::errors::{Result, SqhError};
use crate::logger::jsonl::{EventType, JsonlConfig, JsonlWriter, Level, LogLine};

/// Default bounded channel capacity for log events.
const CHANNEL_CAPACITY: usize = 1024;

/// Events logged through the activity logger.
#[derive(Debug, Clone)]
pub enum ActivityEvent {
    DaemonStarted {
        version: String,
        config_hash: String,
    },
    DaemonStopped {
        reason: String,
        uptime_secs: u64,
    },
    ModeDetected {
        mode: String,
        oldest: Option<i64>,
        newest: Option<i64>,
        degraded: bool,
    },
    RetentionChecked {
        used_pct: f64,
        threshold_pct: f64,
    },
    RetentionDeleted {
        removed: u64,
        used_pct: f64,
        duration_ms: u64,
    },
    Error {
        code: String,
        message: String,
    },
    /// Sentinel requesting graceful shutdown of the logger thread.
    Shutdown,
}

/// Thread-safe, cheaply-cloneable handle for sending log events.
#[derive(Clone)]
pub struct ActivityLoggerHandle {
    tx: Sender<ActivityEvent>,
    dropped_events: Arc<AtomicU64>,
}

impl ActivityLoggerHandle {
    /// Send an event to the logger thread. Non-blocking: a full channel
    /// drops the event and bumps the counter.
    pub fn send(&self, event: ActivityEvent) {
        if let Err(TrySendError::Full(_)) = self.tx.try_send(event) {
            self.dropped_events.fetch_add(1, Ordering::Relaxed);
        }
        // Disconnected is fine during shutdown.
    }

    /// Number of events dropped due to channel back-pressure.
    pub fn dropped_events(&self) -> u64 {
        self.dropped_events.load(Ordering::Relaxed)
    }

    /// Request graceful shutdown of the logger thread.
    pub fn shutdown(&self) {
        let _ = self.tx.send(ActivityEvent::Shutdown);
    }
}

/// Spawn the logger thread and return a handle plus its join handle.
pub fn spawn_logger(
    config: JsonlConfig,
) -> Result<(ActivityLoggerHandle, thread::JoinHandle<()>)> {
    let (tx, rx) = bounded::<ActivityEvent>(CHANNEL_CAPACITY);
    let dropped = Arc::new(AtomicU64::new(0));
    let dropped_clone = Arc::clone(&dropped);

    let handle = ActivityLoggerHandle {
        tx,
        dropped_events: dropped,
    };

    let join = thread::Builder::new()
        .name("sqh-logger".to_string())
        .spawn(move || logger_thread_main(&rx, config, &dropped_clone))
        .map_err(|e| SqhError::Runtime {
            details: format!("failed to spawn logger thread: {e}"),
        })?;

    Ok((handle, join))
}

fn logger_thread_main(rx: &Receiver<ActivityEvent>, config: JsonlConfig, dropped: &AtomicU64) {
    let mut jsonl = JsonlWriter::open(config);

    while let Ok(event) = rx.recv() {
        let d = dropped.swap(0, Ordering::Relaxed);
        if d > 0 {
            let mut warn = LogLine::new(EventType::Error, Level::Warning);
            warn.details = Some(format!("{d} log events dropped due to back-pressure"));
            jsonl.write_line(&warn);
        }

        if matches!(event, ActivityEvent::Shutdown) {
            break;
        }

        jsonl.write_line(&event_to_log_line(&event));
    }

    jsonl.flush();
    jsonl.fsync();
}

fn event_to_log_line(event: &ActivityEvent) -> LogLine {
    match event {
        ActivityEvent::DaemonStarted {
            version,
            config_hash,
        } => {
            let mut e = LogLine::new(EventType::DaemonStart, Level::Info);
            e.details = Some(format!("version={version} config_hash={config_hash}"));
            e.ok = Some(true);
            e
        }
        ActivityEvent::DaemonStopped {
            reason,
            uptime_secs,
        } => {
            let mut e = LogLine::new(EventType::DaemonStop, Level::Info);
            e.details = Some(format!("reason={reason} uptime={uptime_secs}s"));
            e.ok = Some(true);
            e
        }
        ActivityEvent::ModeDetected {
            mode,
            oldest,
            newest,
            degraded,
        } => {
            let mut e = LogLine::new(
                EventType::ModeDetect,
                if *degraded { Level::Warning } else { Level::Info },
            );
            e.mode = Some(mode.clone());
            e.details = Some(format!(
                "oldest={oldest:?} newest={newest:?} degraded={degraded}"
            ));
            e
        }
        ActivityEvent::RetentionChecked {
            used_pct,
            threshold_pct,
        } => {
            let mut e = LogLine::new(EventType::RetentionCheck, Level::Info);
            e.used_pct = Some(*used_pct);
            e.threshold_pct = Some(*threshold_pct);
            e.ok = Some(true);
            e
        }
        ActivityEvent::RetentionDeleted {
            removed,
            used_pct,
            duration_ms,
        } => {
            let mut e = LogLine::new(EventType::RetentionDelete, Level::Info);
            e.removed = Some(*removed);
            e.used_pct = Some(*used_pct);
            e.duration_ms = Some(*duration_ms);
            e.ok = Some(true);
            e
        }
        ActivityEvent::Error { code, message } => {
            let mut e = LogLine::new(EventType::Error, Level::Critical);
            e.error_code = Some(code.clone());
            e.error_message = Some(message.clone());
            e.ok = Some(false);
            e
        }
        ActivityEvent::Shutdown => LogLine::new(EventType::DaemonStop, Level::Info),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(dir: &std::path::Path) -> JsonlConfig {
        JsonlConfig {
            path: dir.join("activity.jsonl"),
            max_size_bytes: 10 * 1024 * 1024,
            max_rotated_files: 3,
            fsync_interval_secs: 60,
        }
    }

    #[test]
    fn spawn_and_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let (handle, join) = spawn_logger(test_config(dir.path())).unwrap();
        handle.send(ActivityEvent::DaemonStarted {
            version: "0.3.1".to_string(),
            config_hash: "abc".to_string(),
        });
        handle.shutdown();
        join.join().unwrap();

        let contents = std::fs::read_to_string(dir.path().join("activity.jsonl")).unwrap();
        assert!(contents.contains("daemon_start"));
    }

    #[test]
    fn retention_events_carry_counters() {
        let dir = tempfile::tempdir().unwrap();
        let (handle, join) = spawn_logger(test_config(dir.path())).unwrap();

        handle.send(ActivityEvent::RetentionChecked {
            used_pct: 84.2,
            threshold_pct: 85.0,
        });
        handle.send(ActivityEvent::RetentionDeleted {
            removed: 500,
            used_pct: 86.1,
            duration_ms: 12,
        });
        handle.shutdown();
        join.join().unwrap();

        let contents = std::fs::read_to_string(dir.path().join("activity.jsonl")).unwrap();
        assert_eq!(contents.lines().count(), 2);
        assert!(contents.contains("retention_delete"));
        assert!(contents.contains("\"removed\":500"));
    }

    #[test]
    fn handle_is_clone_and_send() {
        let dir = tempfile::tempdir().unwrap();
        let (handle, join) = spawn_logger(test_config(dir.path())).unwrap();
        let h2 = handle.clone();

        handle.send(ActivityEvent::Error {
            code: "SQH-3101".to_string(),
            message: "probe failed".to_string(),
        });
        h2.send(ActivityEvent::ModeDetected {
            mode: "mixed".to_string(),
            oldest: Some(3),
            newest: Some(40),
            degraded: false,
        });
        handle.shutdown();
        join.join().unwrap();

        let contents = std::fs::read_to_string(dir.path().join("activity.jsonl")).unwrap();
        assert_eq!(contents.lines().count(), 2);
        assert!(contents.contains("mode_detect"));
    }

    #[test]
    fn dropped_counter_starts_at_zero() {
        let dir = tempfile::tempdir().unwrap();
        let (handle, _join) = spawn_logger(test_config(dir.path())).unwrap();
        assert_eq!(handle.dropped_events(), 0);
        handle.shutdown();
    }
}
