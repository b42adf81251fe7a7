//! PAL trait and platform-specific implementations.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use crate::core::errors::{Result, SqhError};

/// Filesystem statistics for the mount holding a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FsStats {
    pub total_bytes: u64,
    pub free_bytes: u64,
    pub available_bytes: u64,
}

impl FsStats {
    /// Used space as a percentage of total. Empty/virtual filesystems
    /// report 0.
    #[must_use]
    pub fn used_pct(&self) -> f64 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        let used = self.total_bytes.saturating_sub(self.free_bytes);
        #[allow(clippy::cast_precision_loss)]
        {
            (used as f64 * 100.0) / self.total_bytes as f64
        }
    }
}

/// OS abstraction used by the retention monitor.
pub trait Platform: Send + Sync {
    fn fs_stats(&self, path: &Path) -> Result<FsStats>;
}

/// Linux implementation using `statvfs`, with a short-lived result cache so
/// tight polling does not hammer the syscall.
pub struct LinuxPlatform {
    cache: RwLock<Option<(PathBuf, FsStats, Instant)>>,
    cache_ttl: Duration,
}

impl Default for LinuxPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl LinuxPlatform {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache: RwLock::new(None),
            cache_ttl: Duration::from_secs(1),
        }
    }
}

impl Platform for LinuxPlatform {
    fn fs_stats(&self, path: &Path) -> Result<FsStats> {
        {
            let cache = self.cache.read();
            if let Some((cached_path, stats, collected_at)) = &*cache
                && cached_path == path
                && collected_at.elapsed() < self.cache_ttl
            {
                return Ok(*stats);
            }
        }

        let stat = nix::sys::statvfs::statvfs(path).map_err(|error| SqhError::FsStats {
            path: path.to_path_buf(),
            details: error.to_string(),
        })?;
        let fragment = stat.fragment_size();
        let stats = FsStats {
            total_bytes: stat.blocks().saturating_mul(fragment),
            free_bytes: stat.blocks_free().saturating_mul(fragment),
            available_bytes: stat.blocks_available().saturating_mul(fragment),
        };

        *self.cache.write() = Some((path.to_path_buf(), stats, Instant::now()));
        Ok(stats)
    }
}

/// In-memory mock implementation for deterministic tests.
#[derive(Debug, Clone)]
pub struct MockPlatform {
    stats: Option<FsStats>,
}

impl MockPlatform {
    /// Mock that always reports the given stats.
    #[must_use]
    pub const fn with_stats(stats: FsStats) -> Self {
        Self { stats: Some(stats) }
    }

    /// Mock that reports `used_pct` percent used of a 100 GiB volume.
    #[must_use]
    pub fn with_used_pct(used_pct: f64) -> Self {
        let total: u64 = 100 * 1024 * 1024 * 1024;
        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let free = (total as f64 * (100.0 - used_pct) / 100.0) as u64;
        Self::with_stats(FsStats {
            total_bytes: total,
            free_bytes: free,
            available_bytes: free,
        })
    }

    /// Mock whose probe always fails.
    #[must_use]
    pub const fn failing() -> Self {
        Self { stats: None }
    }
}

impl Platform for MockPlatform {
    fn fs_stats(&self, path: &Path) -> Result<FsStats> {
        self.stats.ok_or_else(|| SqhError::FsStats {
            path: path.to_path_buf(),
            details: "mock stats not configured".to_string(),
        })
    }
}

/// Detect the active platform implementation.
pub fn detect_platform() -> Result<Arc<dyn Platform>> {
    #[cfg(target_os = "linux")]
    {
        Ok(Arc::new(LinuxPlatform::new()))
    }
    #[cfg(not(target_os = "linux"))]
    {
        Err(SqhError::UnsupportedPlatform {
            details: "only Linux is currently implemented".to_string(),
        })
    }
}
