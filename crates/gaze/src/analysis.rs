//! Per-frame gaze analysis results

use serde::{Deserialize, Serialize};

use crate::classifier::Direction;
use crate::pupil::PupilReading;
use crate::vector::GazeVector;

/// Complete gaze analysis of one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GazeAnalysis {
    /// Whether a face was detected
    pub face_detected: bool,

    /// Classified direction (`NoFace` when no face was found)
    pub direction: Direction,

    /// Mean of both eyes' vectors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gaze_vector: Option<GazeVector>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub left_eye: Option<PupilReading>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub right_eye: Option<PupilReading>,
}

impl GazeAnalysis {
    pub fn no_face() -> Self {
        Self {
            face_detected: false,
            direction: Direction::NoFace,
            gaze_vector: None,
            left_eye: None,
            right_eye: None,
        }
    }

    /// Both eye readings, when a face was found
    pub fn eyes(&self) -> impl Iterator<Item = &PupilReading> {
        self.left_eye.iter().chain(self.right_eye.iter())
    }
}
