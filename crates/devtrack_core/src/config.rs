//! Configuration types for the activity tracker.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

/// Comprehensive configuration for the tracker.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct TrackerConfig {
    /// Capture scheduling configuration.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

impl TrackerConfig {
    /// Load configuration from `config.toml` under the data directory.
    ///
    /// A missing file yields the defaults. An unreadable or unparsable
    /// file also yields the defaults, with a warning, so a broken config
    /// can never stop tracking.
    pub fn load(data_dir: &Path) -> Self {
        let path = data_dir.join("config.toml");
        if !path.exists() {
            return Self::default();
        }
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read config, using defaults");
                return Self::default();
            }
        };
        match toml::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to parse config, using defaults");
                Self::default()
            }
        }
    }

    /// Save configuration to `config.toml` under the data directory.
    pub fn save(&self, data_dir: &Path) -> crate::error::Result<()> {
        fs::create_dir_all(data_dir)?;
        let path = data_dir.join("config.toml");
        let content = toml::to_string_pretty(self).map_err(|e| {
            crate::error::TrackerError::ConfigError(format!("failed to serialize config: {}", e))
        })?;
        fs::write(&path, content)?;
        Ok(())
    }
}

/// Capture scheduling configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Seconds between captures of a tracked project (default: 900).
    pub analysis_interval_secs: u64,

    /// Seconds between scheduler wake-ups (default: 60). Elapsed time is
    /// checked against the analysis interval on every wake-up, so capture
    /// timing drifts by at most one poll.
    pub poll_interval_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            analysis_interval_secs: 15 * 60,
            poll_interval_secs: 60,
        }
    }
}

impl SchedulerConfig {
    /// Returns the analysis interval as a Duration.
    pub fn analysis_interval(&self) -> Duration {
        Duration::from_secs(self.analysis_interval_secs)
    }

    /// Returns the poll interval as a Duration.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

/// Path of the database file under the data directory.
pub fn database_path(data_dir: &Path) -> PathBuf {
    data_dir.join("devtrack.redb")
}

/// Snapshot mirror directory for a project, keyed by the project's id so
/// renames never move the mirror.
pub fn mirror_dir(data_dir: &Path, project_id: &str) -> PathBuf {
    data_dir.join("tracked_projects").join(project_id)
}
