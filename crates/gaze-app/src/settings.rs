//! Application settings
//!
//! Loaded from an optional TOML file, then overridden by `GAZE_`-prefixed
//! environment variables using `__` between sections, e.g.
//! `GAZE_CAMERA__FRAMES_DIR=/data/session1`.

use std::path::{Path, PathBuf};

use camera_capture::CameraConfig;
use config::{Config, Environment, File};
use gaze::{GazeConfig, ScriptedSignals};
use serde::{Deserialize, Serialize};

use crate::AppError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub camera: CameraConfig,
    pub gaze: GazeConfig,
    pub landmarks: LandmarkSettings,
    pub calibration: CalibrationSettings,
    pub output: OutputSettings,
    pub logging: LoggingSettings,
}

impl Settings {
    /// Load settings; a missing file leaves every value at its default
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let settings = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix("GAZE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }
}

/// Recorded landmark stream standing in for a detection model
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LandmarkSettings {
    pub path: PathBuf,
}

impl Default for LandmarkSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("landmarks.json"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationSettings {
    /// Run the five-point calibration before tracking
    pub enabled: bool,
    /// Preview frames per point before the scripted ready signal
    pub ready_after_frames: usize,
    /// Abort on this preview frame (counted across all points)
    pub abort_after_frames: Option<usize>,
}

impl Default for CalibrationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            ready_after_frames: 15,
            abort_after_frames: None,
        }
    }
}

impl CalibrationSettings {
    pub fn signals(&self) -> ScriptedSignals {
        let signals = ScriptedSignals::new(self.ready_after_frames);
        match self.abort_after_frames {
            Some(frames) => signals.with_abort_after(frames),
            None => signals,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Write annotated debug frames here
    pub annotate_dir: Option<PathBuf>,
    /// Print each frame's analysis as a JSON line on stdout
    pub json: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_missing_file_uses_defaults() {
        let settings = Settings::load(Path::new("/nonexistent/gaze.toml")).unwrap();
        assert_eq!(settings.gaze.debug_width, 640);
        assert_eq!(settings.gaze.samples_per_point, 30);
        assert!(settings.calibration.enabled);
        assert_eq!(settings.landmarks.path, PathBuf::from("landmarks.json"));
    }

    #[test]
    fn test_file_overrides() {
        let path = std::env::temp_dir().join(format!("gaze-settings-{}.toml", std::process::id()));
        fs::write(
            &path,
            r#"
[camera]
index = 1
frames_dir = "/data/frames"

[gaze]
pupil_threshold = 40

[gaze.thresholds]
dx = 0.2
dy = 0.1

[calibration]
ready_after_frames = 5
abort_after_frames = 7
"#,
        )
        .unwrap();

        let settings = Settings::load(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(settings.camera.index, 1);
        assert_eq!(settings.camera.frames_dir, Some(PathBuf::from("/data/frames")));
        assert_eq!(settings.gaze.pupil_threshold, 40);
        assert_eq!(settings.gaze.thresholds, gaze::Thresholds::new(0.2, 0.1));
        assert_eq!(settings.gaze.debug_height, 480);
        assert_eq!(settings.calibration.ready_after_frames, 5);
        assert_eq!(settings.calibration.abort_after_frames, Some(7));
    }
}
