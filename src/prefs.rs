//! User preferences persisted to disk
//!
//! Stores the selected data source and the last viewed map position as a JSON
//! file in the platform config directory (`~/.config/ddrfinder/` on Linux).

use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

use crate::data::LatLng;

const PREFERENCES_FILE: &str = "preferences.json";

/// Errors that can occur when saving preferences
#[derive(Debug, Error)]
pub enum PrefsError {
    #[error("failed to write preferences: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode preferences: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Preferences remembered between runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    /// Data source key to query
    pub data_source: String,
    /// Center of the last viewed box
    pub last_center: Option<LatLng>,
    /// Latitude and longitude span of the last viewed box, in degrees
    pub last_span: Option<(f64, f64)>,
    /// When the preferences were last written
    #[serde(default)]
    pub saved_at: Option<DateTime<Utc>>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            data_source: "ziv".to_string(),
            last_center: None,
            last_span: None,
            saved_at: None,
        }
    }
}

/// Reads and writes [`Preferences`] in a directory
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    dir: PathBuf,
}

impl PreferenceStore {
    /// Creates a store in the XDG-compliant config directory
    ///
    /// Returns `None` if the directory cannot be determined (e.g., no home directory).
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "ddrfinder")?;
        Some(Self {
            dir: project_dirs.config_dir().to_path_buf(),
        })
    }

    /// Creates a store with a custom directory
    pub fn with_dir(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn path(&self) -> PathBuf {
        self.dir.join(PREFERENCES_FILE)
    }

    /// Loads saved preferences
    ///
    /// Returns `None` if nothing was saved or the file cannot be parsed.
    pub fn load(&self) -> Option<Preferences> {
        let content = fs::read_to_string(self.path()).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Saves preferences, stamping `saved_at`, creating the directory if needed
    pub fn save(&self, prefs: &Preferences) -> Result<(), PrefsError> {
        fs::create_dir_all(&self.dir)?;

        let stamped = Preferences {
            saved_at: Some(Utc::now()),
            ..prefs.clone()
        };
        let json = serde_json::to_string_pretty(&stamped)?;

        fs::write(self.path(), json)?;
        Ok(())
    }
}
