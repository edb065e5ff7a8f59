//! Durable record of what was last communicated to the operator.
//!
//! The state lives in a single JSON file. Writes go to a sibling temporary
//! file which is synced and then renamed over the committed copy, so an
//! interrupted save leaves the previous state readable. The directory is
//! synced after the rename so the new entry survives power loss.
//!
//! Store calls block; the engine runs them on the blocking pool.

use std::{
    fs::{self, File},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::PersistenceError;
use crate::{Fan, Led, Priority};

// ---

/// Last communicated actuation and alert levels.
///
/// `None` means nothing has been communicated yet and serializes as `null`;
/// it compares below every real value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertState {
    // ---
    pub last_fan_state: Option<Fan>,
    pub last_led_color: Option<Led>,
    pub last_gas_alert: bool,
    pub last_priority: Option<Priority>,
    pub last_gas_alert_time: Option<DateTime<Utc>>,
}

/// Persistence for [`AlertState`]. Only the alert engine saves.
pub trait StateStore: Send + Sync {
    /// Return the committed state, or the default when none is readable.
    fn load(&self) -> AlertState;

    /// Commit `state`. On error the previously committed state is kept.
    fn save(&self, state: &AlertState) -> Result<(), PersistenceError>;
}

/// [`StateStore`] backed by a JSON file, replaced atomically on save.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        // ---
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "alert_state".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Directory holding the state file; `.` for a bare file name.
    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }

    fn io_error(&self, source: std::io::Error) -> PersistenceError {
        PersistenceError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> std::io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}

impl StateStore for JsonFileStore {
    fn load(&self) -> AlertState {
        // ---
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No previous alert state at {} - starting fresh", self.path.display());
                return AlertState::default();
            }
            Err(e) => {
                warn!("Failed to read alert state {}: {}", self.path.display(), e);
                return AlertState::default();
            }
        };

        match serde_json::from_slice::<AlertState>(&bytes) {
            Ok(state) => {
                debug!("Loaded alert state: {:?}", state);
                state
            }
            Err(e) => {
                warn!(
                    "Alert state {} is corrupt, using defaults: {}",
                    self.path.display(),
                    e
                );
                AlertState::default()
            }
        }
    }

    fn save(&self, state: &AlertState) -> Result<(), PersistenceError> {
        // ---
        let encoded = serde_json::to_vec_pretty(state)?;
        let tmp = self.temp_path();

        let write_tmp = || -> std::io::Result<()> {
            let mut file = File::create(&tmp)?;
            file.write_all(&encoded)?;
            file.sync_all()
        };

        if let Err(e) = write_tmp() {
            // Best effort; the committed file is untouched either way.
            let _ = fs::remove_file(&tmp);
            return Err(self.io_error(e));
        }

        fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;

        // The rename has already landed; a failed directory sync is only logged.
        let dir = self.parent_dir();
        if let Err(e) = sync_dir(dir) {
            warn!("Failed to sync directory {}: {}", dir.display(), e);
        }
        debug!("Saved alert state to {}", self.path.display());
        Ok(())
    }
}
