//! Recorded landmark streams
//!
//! A replay file is a JSON array with one entry per frame. Each entry lists
//! the faces found in that frame, each face being 68 `[x, y]` pairs:
//!
//! ```json
//! [ [ [[120, 200], [121, 214], ...] ], [], ... ]
//! ```
//!
//! Frames past the end of the recording report no face.

use std::collections::VecDeque;
use std::fs;
use std::path::Path;

use gaze::{GazeError, LandmarkProvider, LandmarkSet, Point};
use image::GrayImage;
use tracing::info;

use crate::AppError;

type RecordedFrame = Vec<Vec<(i32, i32)>>;

/// Landmark provider replaying a recorded stream, one entry per call
#[derive(Debug, Default)]
pub struct ReplayLandmarks {
    frames: VecDeque<Vec<LandmarkSet>>,
}

impl ReplayLandmarks {
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let json = fs::read_to_string(path).map_err(|source| AppError::Landmarks {
            path: path.to_path_buf(),
            source,
        })?;
        let replay = Self::from_json(&json)?;
        info!("Loaded landmarks for {} frames from {}", replay.remaining(), path.display());
        Ok(replay)
    }

    pub fn from_json(json: &str) -> Result<Self, AppError> {
        let recorded: Vec<RecordedFrame> = serde_json::from_str(json)?;

        let frames = recorded
            .into_iter()
            .map(|faces| {
                faces
                    .into_iter()
                    .map(|face| LandmarkSet::new(face.into_iter().map(Point::from).collect()))
                    .collect::<Result<Vec<_>, GazeError>>()
            })
            .collect::<Result<VecDeque<_>, GazeError>>()?;

        Ok(Self { frames })
    }

    /// Frames left in the recording
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl LandmarkProvider for ReplayLandmarks {
    fn landmarks(&mut self, _gray: &GrayImage) -> Result<Vec<LandmarkSet>, GazeError> {
        Ok(self.frames.pop_front().unwrap_or_default())
    }
}
