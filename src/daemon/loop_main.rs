//! Daemon orchestration: wires config, store, activity logger, signal
//! handler, and the retention monitor together.
//!
//! Thread layout: the retention monitor runs on its own thread driven by a
//! control channel; the logger thread drains a bounded event channel; the
//! main thread polls signal flags and translates them into control
//! messages. The priority-format detection runs once, synchronously, before
//! anything else — its result is logged and then treated as an immutable
//! fact.

#![allow(missing_docs)]

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::TrySendError;

use crate::core::config::Config;
use crate::core::errors::{Result, SqhError};
use crate::logger::activity::{ActivityEvent, ActivityLoggerHandle, spawn_logger};
use crate::logger::jsonl::JsonlConfig;
use crate::platform::pal::{Platform, detect_platform};
use crate::retention::monitor::{RetentionControl, RetentionMonitor};
use crate::store::db::EventStore;
use crate::store::detect::{PriorityDetection, detect_priority_mode};
use crate::daemon::signals::SignalHandler;

/// How often the main thread polls signal flags.
const SIGNAL_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// The retention daemon: detection at startup, then a monitor loop until a
/// shutdown signal.
pub struct RetentionDaemon {
    config: Config,
    platform: Arc<dyn Platform>,
    logger_handle: ActivityLoggerHandle,
    logger_join: Option<thread::JoinHandle<()>>,
    signal_handler: SignalHandler,
    detection: PriorityDetection,
    start_time: Instant,
}

impl RetentionDaemon {
    /// Build and initialize the daemon from configuration.
    pub fn init(config: Config) -> Result<Self> {
        let platform = detect_platform()?;
        let start_time = Instant::now();

        let (logger_handle, logger_join) = spawn_logger(JsonlConfig {
            path: config.paths.jsonl_log.clone(),
            ..JsonlConfig::default()
        })?;

        let signal_handler = SignalHandler::new();

        // One-shot classification, before the service does anything else.
        // Informational: per-row decoding never consults it.
        let store = EventStore::open(
            &config.database.path,
            Duration::from_millis(config.database.busy_timeout_ms),
        )?;
        let detection = detect_priority_mode(&store);
        logger_handle.send(ActivityEvent::ModeDetected {
            mode: detection.mode.to_string(),
            oldest: detection.oldest,
            newest: detection.newest,
            degraded: detection.degraded,
        });
        if detection.degraded {
            eprintln!(
                "[SQH-DAEMON] priority mode detection: no non-kernel rows found, assuming legacy"
            );
        } else {
            eprintln!(
                "[SQH-DAEMON] priority mode detected: {} (oldest non-kernel Priority={:?}, newest={:?})",
                detection.mode, detection.oldest, detection.newest,
            );
        }

        Ok(Self {
            config,
            platform,
            logger_handle,
            logger_join: Some(logger_join),
            signal_handler,
            detection,
            start_time,
        })
    }

    /// Dataset classification sampled at startup.
    pub fn detection(&self) -> PriorityDetection {
        self.detection
    }

    /// Run until SIGTERM/SIGINT. SIGUSR1 forces an immediate retention
    /// check between ticks.
    pub fn run(&mut self) -> Result<()> {
        let config_hash = self.config.stable_hash().unwrap_or_default();
        self.logger_handle.send(ActivityEvent::DaemonStarted {
            version: env!("CARGO_PKG_VERSION").to_string(),
            config_hash,
        });

        // The monitor gets its own store connection; WAL arbitrates with
        // any concurrent readers.
        let monitor_store = EventStore::open(
            &self.config.database.path,
            Duration::from_millis(self.config.database.busy_timeout_ms),
        )?;
        let monitor = RetentionMonitor::new(
            Box::new(monitor_store),
            Arc::clone(&self.platform),
            self.config.retention.clone(),
            self.logger_handle.clone(),
        );
        let (monitor_join, control_tx) = monitor.spawn()?;

        loop {
            if self.signal_handler.should_shutdown() {
                eprintln!("[SQH-DAEMON] shutdown requested");
                break;
            }
            if self.signal_handler.should_check() {
                eprintln!("[SQH-DAEMON] immediate retention check requested (SIGUSR1)");
                if let Err(TrySendError::Full(_)) = control_tx.try_send(RetentionControl::CheckNow)
                {
                    eprintln!("[SQH-DAEMON] control channel full, check deferred");
                }
            }
            if monitor_join.is_finished() {
                // A disabled monitor exits immediately; keep the daemon
                // alive anyway so signal semantics stay uniform.
                thread::sleep(SIGNAL_POLL_INTERVAL);
                continue;
            }
            thread::sleep(SIGNAL_POLL_INTERVAL);
        }

        // ──────── shutdown sequence ────────
        let _ = control_tx.send(RetentionControl::Stop);
        monitor_join.join().map_err(|_| SqhError::Runtime {
            details: "retention thread panicked".to_string(),
        })?;

        let uptime_secs = self.start_time.elapsed().as_secs();
        self.logger_handle.send(ActivityEvent::DaemonStopped {
            reason: "clean shutdown".to_string(),
            uptime_secs,
        });
        self.logger_handle.shutdown();
        if let Some(logger_join) = self.logger_join.take() {
            let _ = logger_join.join();
        }

        eprintln!("[SQH-DAEMON] shutdown complete (uptime={uptime_secs}s)");
        Ok(())
    }

    /// Request shutdown programmatically (tests, embedding).
    pub fn request_shutdown(&self) {
        self.signal_handler.request_shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use crate::store::detect::PriorityMode;
    use crate::store::entry::NewEvent;

    fn daemon_config(dir: &std::path::Path, enabled: bool) -> Config {
        let mut config = Config::default();
        config.database.path = dir.join("events.sqlite3");
        config.paths.jsonl_log = dir.join("activity.jsonl");
        config.retention.enabled = enabled;
        config.retention.disk_path = dir.to_path_buf();
        config.retention.check_interval_secs = 3600;
        config
    }

    fn seed(dir: &std::path::Path, rows: &[(&str, i64, i64)]) {
        let store =
            EventStore::open(&dir.join("events.sqlite3"), Duration::from_millis(500)).unwrap();
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
    }

    #[test]
    fn init_runs_detection_once() {
        let dir = tempfile::tempdir().unwrap();
        seed(
            dir.path(),
            &[
                ("2025-01-01T00:00:00Z", 3, 3),
                ("2025-06-01T00:00:00Z", 5, 40),
            ],
        );
        let daemon = RetentionDaemon::init(daemon_config(dir.path(), false)).unwrap();
        assert_eq!(daemon.detection().mode, PriorityMode::Mixed);
    }

    #[test]
    fn init_on_empty_store_degrades_gracefully() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path(), &[]);
        let daemon = RetentionDaemon::init(daemon_config(dir.path(), false)).unwrap();
        assert_eq!(daemon.detection().mode, PriorityMode::Legacy);
        assert!(daemon.detection().degraded);
    }

    #[test]
    fn run_exits_on_shutdown_request() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path(), &[]);
        let mut daemon = RetentionDaemon::init(daemon_config(dir.path(), true)).unwrap();
        daemon.request_shutdown();
        daemon.run().unwrap();
    }
}
