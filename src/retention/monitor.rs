//! Timer-driven retention loop with channel-based cooperative stop.
//!
//! Two states only: disabled monitors log once and stay idle; enabled
//! monitors tick on a fixed interval until a stop message arrives. The stop
//! channel is checked between ticks, never mid-operation — a tick in flight
//! finishes its single bounded delete. Probe and delete failures are logged
//! and skip the tick; the next tick tries again. Nothing here ever touches a
//! request path.

use std::sync::Arc;
use std::thread;
use std::time::Instant;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded};

use crate::core::config::RetentionConfig;
use crate::core::errors::{Result, SqhError};
use crate::logger::activity::{ActivityEvent, ActivityLoggerHandle};
use crate::platform::pal::Platform;
use crate::store::db::EventStore;

/// Store surface the monitor needs: one bounded oldest-first delete.
pub trait RetentionStore: Send {
    /// Remove the `batch` oldest rows. Returns rows actually removed.
    fn delete_oldest(&self, batch: usize) -> Result<usize>;
}

impl RetentionStore for EventStore {
    fn delete_oldest(&self, batch: usize) -> Result<usize> {
        Self::delete_oldest(self, batch)
    }
}

/// Control messages for a running monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetentionControl {
    /// Run a check immediately instead of waiting for the interval.
    CheckNow,
    /// Exit the loop before the next tick.
    Stop,
}

/// Outcome of a single retention tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// Usage below threshold; nothing deleted.
    BelowThreshold { used_pct: f64 },
    /// Threshold crossed; one bounded delete ran.
    Deleted { used_pct: f64, removed: usize },
    /// Disk usage probe failed; tick skipped.
    ProbeFailed,
    /// Delete statement failed; tick skipped.
    DeleteFailed { used_pct: f64 },
}

/// The retention monitor. Owns its own store handle so it never contends
/// with request-path connections beyond what WAL already arbitrates.
pub struct RetentionMonitor {
    store: Box<dyn RetentionStore>,
    platform: Arc<dyn Platform>,
    config: RetentionConfig,
    logger: ActivityLoggerHandle,
}

impl RetentionMonitor {
    pub fn new(
        store: Box<dyn RetentionStore>,
        platform: Arc<dyn Platform>,
        config: RetentionConfig,
        logger: ActivityLoggerHandle,
    ) -> Self {
        Self {
            store,
            platform,
            config,
            logger,
        }
    }

    /// Run until a stop message arrives. Disabled monitors log and return
    /// immediately.
    pub fn run(&self, control_rx: &Receiver<RetentionControl>) {
        if !self.config.enabled {
            eprintln!("[SQH-RETENTION] disabled in config, monitor idle");
            return;
        }

        eprintln!(
            "[SQH-RETENTION] started (threshold: {:.1}%, interval: {}s, batch: {})",
            self.config.threshold_pct, self.config.check_interval_secs, self.config.batch_size,
        );

        loop {
            match control_rx.recv_timeout(self.config.check_interval()) {
                Ok(RetentionControl::Stop) | Err(RecvTimeoutError::Disconnected) => break,
                Ok(RetentionControl::CheckNow) | Err(RecvTimeoutError::Timeout) => {
                    self.tick();
                }
            }
        }

        eprintln!("[SQH-RETENTION] stopped");
    }

    /// Spawn the monitor on its own thread. Returns the join handle and the
    /// control sender; dropping the sender also stops the loop.
    pub fn spawn(self) -> Result<(thread::JoinHandle<()>, Sender<RetentionControl>)> {
        let (control_tx, control_rx) = bounded::<RetentionControl>(4);
        let join = thread::Builder::new()
            .name("sqh-retention".to_string())
            .spawn(move || self.run(&control_rx))
            .map_err(|source| SqhError::Runtime {
                details: format!("failed to spawn retention thread: {source}"),
            })?;
        Ok((join, control_tx))
    }

    /// One retention pass: probe usage, delete one bounded batch when the
    /// threshold is crossed. Failures are logged and skipped, never fatal.
    pub fn tick(&self) -> TickOutcome {
        let stats = match self.platform.fs_stats(&self.config.disk_path) {
            Ok(stats) => stats,
            Err(e) => {
                self.logger.send(ActivityEvent::Error {
                    code: e.code().to_string(),
                    message: format!(
                        "disk usage probe failed for {}: {e}",
                        self.config.disk_path.display()
                    ),
                });
                return TickOutcome::ProbeFailed;
            }
        };

        let used_pct = stats.used_pct();
        self.logger.send(ActivityEvent::RetentionChecked {
            used_pct,
            threshold_pct: self.config.threshold_pct,
        });

        if used_pct < self.config.threshold_pct {
            return TickOutcome::BelowThreshold { used_pct };
        }

        eprintln!(
            "[SQH-RETENTION] disk usage {:.1}% exceeds threshold {:.1}% — deleting {} oldest rows",
            used_pct, self.config.threshold_pct, self.config.batch_size,
        );

        let started = Instant::now();
        match self.store.delete_oldest(self.config.batch_size) {
            Ok(removed) => {
                #[allow(clippy::cast_possible_truncation)]
                let duration_ms = started.elapsed().as_millis() as u64;
                self.logger.send(ActivityEvent::RetentionDeleted {
                    removed: removed as u64,
                    used_pct,
                    duration_ms,
                });
                eprintln!("[SQH-RETENTION] deleted {removed} rows in {duration_ms}ms");
                TickOutcome::Deleted { used_pct, removed }
            }
            Err(e) => {
                self.logger.send(ActivityEvent::Error {
                    code: e.code().to_string(),
                    message: format!("retention delete failed: {e}"),
                });
                TickOutcome::DeleteFailed { used_pct }
            }
        }
    }
}
