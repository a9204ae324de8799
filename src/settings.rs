//! User settings stored as RON

use crate::rasterizer::{Camera, Color, HEIGHT, WIDTH};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Settings file, relative to the working directory
pub const SETTINGS_PATH: &str = "settings.ron";

/// Field of view limits, degrees
const MIN_FOV: f32 = 30.0;
const MAX_FOV: f32 = 150.0;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("Serialize error: {0}")]
    Serialize(#[from] ron::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub car_color: Color,
    pub width: usize,
    pub height: usize,
    /// Camera field of view in degrees
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            car_color: Color::RED,
            width: WIDTH,
            height: HEIGHT,
            fov: 90.0,
            near: 1.2,
            far: 1000.0,
        }
    }
}

impl Settings {
    pub fn from_ron(s: &str) -> Result<Self, SettingsError> {
        let mut settings: Settings = ron::from_str(s)?;
        settings.fov = settings.fov.clamp(MIN_FOV, MAX_FOV);
        settings.width = settings.width.max(1);
        settings.height = settings.height.max(1);
        Ok(settings)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let contents = fs::read_to_string(path)?;
        Self::from_ron(&contents)
    }

    /// Load, or fall back to defaults when the file is missing or bad
    ///
    /// A missing file is created with the defaults so there is something to
    /// edit.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            let settings = Self::default();
            match settings.save(path) {
                Ok(()) => tracing::info!(path = %path.display(), "wrote default settings"),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to write default settings"),
            }
            return settings;
        }
        match Self::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to load settings, using defaults");
                Self::default()
            }
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), SettingsError> {
        let config = ron::ser::PrettyConfig::new()
            .depth_limit(2)
            .indentor("  ".to_string());
        let contents = ron::ser::to_string_pretty(self, config)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Camera with the configured lens
    pub fn camera(&self) -> Camera {
        Camera::new(self.fov, self.near, self.far)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.ron");
        let settings = Settings {
            car_color: Color::new(10, 200, 30),
            fov: 70.0,
            ..Default::default()
        };
        settings.save(&path).unwrap();
        assert_eq!(Settings::load(&path).unwrap(), settings);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings = Settings::from_ron("(fov: 75.0)").unwrap();
        assert_eq!(settings.fov, 75.0);
        assert_eq!(settings.width, WIDTH);
        assert_eq!(settings.car_color, Color::RED);
    }

    #[test]
    fn test_fov_clamped() {
        let settings = Settings::from_ron("(fov: 400.0)").unwrap();
        assert_eq!(settings.fov, MAX_FOV);
    }

    #[test]
    fn test_bad_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.ron");
        fs::write(&path, "(fov: \"wide\"").unwrap();
        assert!(matches!(Settings::load(&path), Err(SettingsError::Parse(_))));
        assert_eq!(Settings::load_or_default(&path), Settings::default());
    }

    #[test]
    fn test_missing_file_written_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.ron");
        assert_eq!(Settings::load_or_default(&path), Settings::default());
        assert!(path.exists());
        assert_eq!(Settings::load(&path).unwrap(), Settings::default());
    }

    #[test]
    fn test_camera_uses_lens() {
        let camera = Settings { fov: 60.0, near: 2.0, far: 500.0, ..Default::default() }.camera();
        assert_eq!((camera.fov, camera.near, camera.far), (60.0, 2.0, 500.0));
    }
}
