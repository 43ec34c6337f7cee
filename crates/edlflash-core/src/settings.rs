//! Application settings stored in settings.json

use crate::dialog::FileDialog;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors loading or saving settings
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    #[error("Invalid settings file: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Could not determine configuration directory")]
    NoConfigDir,
}

/// Settings panel state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Passed to every backend call
    pub is_debug: bool,

    /// Where partition dumps and advanced command output go
    pub image_saving_path: PathBuf,

    /// Use the built-in loader boot mode when sending a loader
    pub native_loader: bool,

    /// Skip LUN 5 during bulk flashing
    pub protect_lun5: bool,

    /// Send keep-alive pings while a loader is running
    pub enable_ping: bool,

    /// UI locale (en, zh_CN, zh_TW)
    pub language: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            is_debug: false,
            image_saving_path: PathBuf::from("img/"),
            native_loader: false,
            protect_lun5: true,
            enable_ping: true,
            language: "en".to_string(),
        }
    }
}

impl Settings {
    /// Default location: `<config dir>/edlflash/settings.json`
    pub fn default_path() -> Result<PathBuf, SettingsError> {
        let base = dirs::config_dir().ok_or(SettingsError::NoConfigDir)?;
        Ok(base.join("edlflash").join("settings.json"))
    }

    /// Load settings, falling back to defaults when the file does not exist
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save settings, creating the parent directory if needed
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), SettingsError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Let the user pick the folder dumps are saved to.
    ///
    /// Returns false and keeps the current folder if the picker is cancelled.
    pub fn choose_image_saving_path(&mut self, dialog: &impl FileDialog) -> bool {
        match dialog.pick_folder() {
            Some(folder) => {
                tracing::info!("Image saving path set to {}", folder.display());
                self.image_saving_path = folder;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialog::FileFilter;
    use tempfile::tempdir;

    struct FolderPicker(Option<PathBuf>);

    impl FileDialog for FolderPicker {
        fn pick_file(&self, _filter: Option<FileFilter>) -> Option<PathBuf> {
            None
        }

        fn pick_folder(&self) -> Option<PathBuf> {
            self.0.clone()
        }

        fn save_file(&self, _filter: Option<FileFilter>) -> Option<PathBuf> {
            None
        }
    }

    #[test]
    fn test_choose_image_saving_path() {
        let mut settings = Settings::default();
        assert!(settings.choose_image_saving_path(&FolderPicker(Some("/dumps".into()))));
        assert_eq!(settings.image_saving_path, PathBuf::from("/dumps"));

        // Cancelled: previous folder stays
        assert!(!settings.choose_image_saving_path(&FolderPicker(None)));
        assert_eq!(settings.image_saving_path, PathBuf::from("/dumps"));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let settings = Settings::load(dir.path().join("nope.json")).unwrap();
        assert_eq!(settings, Settings::default());
        assert!(settings.protect_lun5);
        assert!(settings.enable_ping);
        assert_eq!(settings.image_saving_path, PathBuf::from("img/"));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cfg").join("settings.json");

        let settings = Settings {
            is_debug: true,
            language: "zh_CN".to_string(),
            ..Settings::default()
        };
        settings.save(&path).unwrap();

        let loaded = Settings::load(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "is_debug": true }"#).unwrap();

        let loaded = Settings::load(&path).unwrap();
        assert!(loaded.is_debug);
        assert!(loaded.protect_lun5);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            Settings::load(&path),
            Err(SettingsError::JsonError(_))
        ));
    }
}
