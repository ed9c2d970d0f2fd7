//! Camera Capture Library for the Gaze Tracker
//!
//! Provides the frame boundary of the tracker:
//! - Decoded RGB frames with grayscale conversion and resizing
//! - The `FrameSource` contract consumed by tracking and calibration loops
//! - In-memory and image-sequence sources for replays and tests

pub mod frame;
pub mod source;

pub use frame::VideoFrame;
pub use source::{FrameSource, ImageSequenceSource, MemorySource};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

/// Camera error types
#[derive(Error, Debug)]
pub enum CameraError {
    #[error("Failed to open camera: {0}")]
    Open(String),

    #[error("Failed to decode frame {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Invalid format: {0}")]
    Format(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Camera configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Capture device index (0 = default camera)
    pub index: u32,
    /// Directory of pre-recorded frames replayed instead of a live device
    pub frames_dir: Option<PathBuf>,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            index: 0,
            frames_dir: None,
        }
    }
}

/// Open the frame source described by `config`.
///
/// Only recorded sequences are supported; a bare device index has no capture
/// backend and fails with [`CameraError::Open`].
pub fn open_source(config: &CameraConfig) -> Result<Box<dyn FrameSource>, CameraError> {
    match &config.frames_dir {
        Some(dir) => {
            let source = ImageSequenceSource::open(dir)?;
            info!(
                "Replaying {} frames from {} in place of camera {}",
                source.remaining(),
                dir.display(),
                config.index
            );
            Ok(Box::new(source))
        }
        None => Err(CameraError::Open(format!(
            "no capture backend for camera index {} (set camera.frames_dir to replay recorded frames)",
            config.index
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CameraConfig::default();
        assert_eq!(config.index, 0);
        assert!(config.frames_dir.is_none());
    }

    #[test]
    fn test_open_without_frames_dir_fails() {
        let config = CameraConfig {
            index: 2,
            ..Default::default()
        };
        match open_source(&config) {
            Err(CameraError::Open(msg)) => assert!(msg.contains("camera index 2")),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("expected open to fail"),
        }
    }
}
