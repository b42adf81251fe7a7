//! Configuration system: TOML file + env var overrides + smart defaults.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, SqhError};

/// Full sqh configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub retention: RetentionConfig,
    pub paths: PathsConfig,
}

/// SystemEvents store location and connection knobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database file holding the `SystemEvents` table.
    pub path: PathBuf,
    /// Busy timeout applied to every connection.
    pub busy_timeout_ms: u64,
}

/// Capacity-driven retention policy. Read once at process start.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetentionConfig {
    /// Master switch — when false the monitor logs and stays idle.
    pub enabled: bool,
    /// Filesystem path whose mount is watched for usage (e.g. the database
    /// directory).
    pub disk_path: PathBuf,
    /// Usage percentage at or above which the oldest rows are deleted.
    pub threshold_pct: f64,
    /// Rows removed per retention pass.
    pub batch_size: usize,
    /// Seconds between disk-usage checks.
    pub check_interval_secs: u64,
}

impl RetentionConfig {
    /// Check interval as a `Duration`.
    #[must_use]
    pub const fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }
}

/// Filesystem paths used by sqh itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    pub config_file: PathBuf,
    pub jsonl_log: PathBuf,
}

fn home_dir() -> PathBuf {
    env::var_os("HOME").map_or_else(
        || {
            eprintln!("[SQH-CONFIG] WARNING: HOME not set, falling back to /tmp for data paths");
            PathBuf::from("/tmp")
        },
        PathBuf::from,
    )
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: home_dir()
                .join(".local")
                .join("share")
                .join("sqh")
                .join("systemevents.sqlite3"),
            busy_timeout_ms: 5_000,
        }
    }
}

impl Default for RetentionConfig {
    fn default() -> Self {
        let db_dir = DatabaseConfig::default()
            .path
            .parent()
            .map_or_else(|| PathBuf::from("/"), Path::to_path_buf);
        Self {
            enabled: false,
            disk_path: db_dir,
            threshold_pct: 85.0,
            batch_size: 500,
            check_interval_secs: 60,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        let home = home_dir();
        Self {
            config_file: home.join(".config").join("sqh").join("config.toml"),
            jsonl_log: home
                .join(".local")
                .join("share")
                .join("sqh")
                .join("activity.jsonl"),
        }
    }
}

impl Config {
    /// Default configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathsConfig::default().config_file
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from the default
    /// path; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);
        let is_explicit_path = path.is_some();

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| SqhError::Io {
                path: path_buf.clone(),
                source,
            })?;
            let parsed: Self = toml::from_str(&raw)?;
            parsed
        } else if is_explicit_path {
            return Err(SqhError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.paths.config_file = path_buf;
        cfg.apply_env_overrides()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Deterministic hash of the effective config for logging.
    ///
    /// FNV-1a over the canonical JSON form, stable across processes and
    /// Rust releases.
    pub fn stable_hash(&self) -> Result<String> {
        let canonical = serde_json::to_string(self)?;
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in canonical.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        Ok(format!("{hash:016x}"))
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        // database
        if let Some(raw) = env_var("SQH_DATABASE_PATH") {
            self.database.path = PathBuf::from(raw);
        }
        set_env_u64(
            "SQH_DATABASE_BUSY_TIMEOUT_MS",
            &mut self.database.busy_timeout_ms,
        )?;

        // retention
        set_env_bool("SQH_RETENTION_ENABLED", &mut self.retention.enabled)?;
        if let Some(raw) = env_var("SQH_RETENTION_DISK_PATH") {
            self.retention.disk_path = PathBuf::from(raw);
        }
        set_env_f64(
            "SQH_RETENTION_THRESHOLD_PCT",
            &mut self.retention.threshold_pct,
        )?;
        set_env_usize("SQH_RETENTION_BATCH_SIZE", &mut self.retention.batch_size)?;
        set_env_u64(
            "SQH_RETENTION_CHECK_INTERVAL_SECS",
            &mut self.retention.check_interval_secs,
        )?;

        // paths
        if let Some(raw) = env_var("SQH_JSONL_LOG") {
            self.paths.jsonl_log = PathBuf::from(raw);
        }

        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.database.path.as_os_str().is_empty() {
            return Err(SqhError::InvalidConfig {
                details: "database.path must not be empty".to_string(),
            });
        }
        if self.database.busy_timeout_ms == 0 {
            return Err(SqhError::InvalidConfig {
                details: "database.busy_timeout_ms must be > 0".to_string(),
            });
        }

        if !(0.0..=100.0).contains(&self.retention.threshold_pct)
            || self.retention.threshold_pct == 0.0
        {
            return Err(SqhError::InvalidConfig {
                details: format!(
                    "retention.threshold_pct must be in (0, 100], got {}",
                    self.retention.threshold_pct
                ),
            });
        }
        if self.retention.batch_size == 0 {
            return Err(SqhError::InvalidConfig {
                details: "retention.batch_size must be >= 1".to_string(),
            });
        }
        if self.retention.check_interval_secs == 0 {
            return Err(SqhError::InvalidConfig {
                details: "retention.check_interval_secs must be >= 1".to_string(),
            });
        }
        if self.retention.enabled && self.retention.disk_path.as_os_str().is_empty() {
            return Err(SqhError::InvalidConfig {
                details: "retention.disk_path must not be empty when retention is enabled"
                    .to_string(),
            });
        }

        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}

fn set_env_f64(name: &str, slot: &mut f64) -> Result<()> {
    if let Some(raw) = env_var(name) {
        *slot = raw.parse::<f64>().map_err(|error| SqhError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })?;
    }
    Ok(())
}

fn set_env_u64(name: &str, slot: &mut u64) -> Result<()> {
    if let Some(raw) = env_var(name) {
        *slot = raw.parse::<u64>().map_err(|error| SqhError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })?;
    }
    Ok(())
}

fn set_env_usize(name: &str, slot: &mut usize) -> Result<()> {
    if let Some(raw) = env_var(name) {
        *slot = raw
            .parse::<usize>()
            .map_err(|error| SqhError::ConfigParse {
                context: "env",
                details: format!("{name}={raw:?}: {error}"),
            })?;
    }
    Ok(())
}

fn set_env_bool(name: &str, slot: &mut bool) -> Result<()> {
    if let Some(raw) = env_var(name) {
        *slot = raw.parse::<bool>().map_err(|error| SqhError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{Config, SqhError};
    use std::path::Path;

    #[test]
    fn default_config_is_valid() {
        let cfg = Config::default();
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn retention_defaults_are_sane() {
        let cfg = Config::default();
        assert!(!cfg.retention.enabled);
        assert!((cfg.retention.threshold_pct - 85.0).abs() < f64::EPSILON);
        assert_eq!(cfg.retention.batch_size, 500);
        assert_eq!(cfg.retention.check_interval_secs, 60);
    }

    #[test]
    fn zero_threshold_rejected() {
        let mut cfg = Config::default();
        cfg.retention.threshold_pct = 0.0;
        let err = cfg.validate().expect_err("expected threshold error");
        assert!(err.to_string().contains("threshold_pct"));
    }

    #[test]
    fn threshold_above_hundred_rejected() {
        let mut cfg = Config::default();
        cfg.retention.threshold_pct = 101.0;
        let err = cfg.validate().expect_err("expected threshold error");
        assert!(err.to_string().contains("threshold_pct"));
    }

    #[test]
    fn zero_batch_size_rejected() {
        let mut cfg = Config::default();
        cfg.retention.batch_size = 0;
        let err = cfg.validate().expect_err("expected batch size error");
        assert!(err.to_string().contains("batch_size"));
    }

    #[test]
    fn zero_interval_rejected() {
        let mut cfg = Config::default();
        cfg.retention.check_interval_secs = 0;
        let err = cfg.validate().expect_err("expected interval error");
        assert!(err.to_string().contains("check_interval_secs"));
    }

    #[test]
    fn load_returns_error_for_explicit_missing_path() {
        let result = Config::load(Some(Path::new("/nonexistent/sqh/config.toml")));
        let err = result.expect_err("explicit missing path should fail");
        assert!(matches!(err, SqhError::MissingConfig { .. }));
    }

    #[test]
    fn load_parses_toml_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[database]\npath = \"/var/lib/sqh/events.sqlite3\"\n\
             [retention]\nenabled = true\nthreshold_pct = 90.0\nbatch_size = 250\n",
        )
        .unwrap();

        let cfg = Config::load(Some(&path)).expect("config should load");
        assert_eq!(
            cfg.database.path,
            Path::new("/var/lib/sqh/events.sqlite3")
        );
        assert!(cfg.retention.enabled);
        assert!((cfg.retention.threshold_pct - 90.0).abs() < f64::EPSILON);
        assert_eq!(cfg.retention.batch_size, 250);
        // Unspecified fields keep defaults.
        assert_eq!(cfg.retention.check_interval_secs, 60);
    }

    #[test]
    fn stable_hash_deterministic() {
        let cfg = Config::default();
        let h1 = cfg.stable_hash().expect("hash");
        let h2 = cfg.stable_hash().expect("hash");
        assert_eq!(h1, h2);
    }

    #[test]
    fn stable_hash_changes_when_config_changes() {
        let cfg = Config::default();
        let hash_before = cfg.stable_hash().expect("hash should compute");
        let mut modified = Config::default();
        modified.retention.batch_size += 1;
        let hash_after = modified.stable_hash().expect("hash should compute");
        assert_ne!(hash_before, hash_after);
    }
}
