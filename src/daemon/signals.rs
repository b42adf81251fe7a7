//! Signal handling: SIGTERM/SIGINT graceful shutdown and SIGUSR1 immediate
//! retention check.
//!
//! Uses the `signal-hook` crate for safe signal registration. The daemon
//! loop polls `SignalHandler` flags between ticks rather than blocking on
//! signals.

#![allow(missing_docs)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use signal_hook::consts::{SIGINT, SIGTERM};

/// Thread-safe signal state shared between the signal handler and the
/// daemon loop.
///
/// All flags use `Ordering::Relaxed`; the loop polls them every iteration
/// and no ordering with other atomics is required.
#[derive(Clone)]
pub struct SignalHandler {
    shutdown_flag: Arc<AtomicBool>,
    check_flag: Arc<AtomicBool>,
}

impl SignalHandler {
    /// Create a new handler and register OS signal hooks.
    ///
    /// SIGTERM/SIGINT -> shutdown, SIGUSR1 -> immediate retention check.
    /// Registration is best-effort; failures are logged to stderr but not
    /// fatal.
    pub fn new() -> Self {
        let handler = Self::unregistered();
        handler.register_signals();
        handler
    }

    /// Handler with no OS hooks, for tests and embedding.
    pub fn unregistered() -> Self {
        Self {
            shutdown_flag: Arc::new(AtomicBool::new(false)),
            check_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Check whether a shutdown has been requested.
    pub fn should_shutdown(&self) -> bool {
        self.shutdown_flag.load(Ordering::Relaxed)
    }

    /// Check (and clear) whether an immediate retention check was requested.
    pub fn should_check(&self) -> bool {
        self.check_flag.swap(false, Ordering::Relaxed)
    }

    /// Programmatically request shutdown.
    pub fn request_shutdown(&self) {
        self.shutdown_flag.store(true, Ordering::Relaxed);
    }

    /// Programmatically request an immediate retention check.
    pub fn request_check(&self) {
        self.check_flag.store(true, Ordering::Relaxed);
    }

    fn register_signals(&self) {
        if let Err(e) = signal_hook::flag::register(SIGTERM, Arc::clone(&self.shutdown_flag)) {
            eprintln!("[SQH-SIGNAL] failed to register SIGTERM: {e}");
        }
        if let Err(e) = signal_hook::flag::register(SIGINT, Arc::clone(&self.shutdown_flag)) {
            eprintln!("[SQH-SIGNAL] failed to register SIGINT: {e}");
        }

        #[cfg(unix)]
        {
            use signal_hook::consts::SIGUSR1;
            if let Err(e) = signal_hook::flag::register(SIGUSR1, Arc::clone(&self.check_flag)) {
                eprintln!("[SQH-SIGNAL] failed to register SIGUSR1: {e}");
            }
        }
    }
}

impl Default for SignalHandler {
    fn default() -> Self {
        Self::new()
    }
}
