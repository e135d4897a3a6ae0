//! Persisted user settings, stored as JSON in the OS config directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::model::{WindowMargins, ZoomLevel};
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub zoom: ZoomLevel,
    pub margins: WindowMargins,
    /// How long a drag warning stays on screen.
    pub advisory_seconds: u64,
    pub last_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            zoom: ZoomLevel::default(),
            margins: WindowMargins::default(),
            advisory_seconds: 4,
            last_file: None,
        }
    }
}

impl Settings {
    pub fn settings_path() -> Result<PathBuf> {
        let dirs =
            directories::ProjectDirs::from("", "", "SiteTimeline").ok_or(Error::NoConfigDir)?;
        Ok(dirs.config_dir().join("settings.json"))
    }

    /// Load from the default location; any problem falls back to defaults.
    pub fn load() -> Self {
        match Self::settings_path() {
            Ok(path) => Self::load_from(&path),
            Err(e) => {
                warn!("settings unavailable: {}", e);
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Self {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => {
                debug!("no settings at {}, using defaults", path.display());
                return Self::default();
            }
        };
        match serde_json::from_str::<Settings>(&contents) {
            Ok(mut settings) => {
                let margins = settings.margins.clamped();
                if margins != settings.margins {
                    warn!("clamping window margins {:?} to {:?}", settings.margins, margins);
                    settings.margins = margins;
                }
                settings
            }
            Err(e) => {
                warn!("ignoring invalid settings file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::settings_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        debug!("settings saved to {}", path.display());
        Ok(())
    }
}
