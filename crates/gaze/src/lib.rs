//! Gaze Direction Tracking
//!
//! Coarse gaze estimation from facial landmarks:
//! - Eye region extraction from 68-point landmarks
//! - Pupil location by thresholding and image moments
//! - Two-eye vector averaging
//! - Nine-way direction classification
//! - Five-point calibration of the classifier thresholds
//!
//! Landmark detection is external and plugs in through [`LandmarkProvider`].

pub mod analysis;
pub mod calibration;
pub mod classifier;
pub mod config;
pub mod landmarks;
pub mod pupil;
pub mod vector;

pub use analysis::GazeAnalysis;
pub use calibration::{
    run_calibration, Calibration, CalibrationEvent, CalibrationPoint, CalibrationSamples,
    CalibrationState, ScriptedSignals, SignalSource, UserSignal,
};
pub use classifier::{classify, Direction, Thresholds};
pub use config::GazeConfig;
pub use landmarks::{Eye, EyeBox, EyeRegion, LandmarkProvider, LandmarkSet, Point, StaticLandmarks};
pub use pupil::{PupilLocator, PupilReading};
pub use vector::{combine, GazeVector};

use camera_capture::{CameraError, VideoFrame};
use image::GrayImage;
use thiserror::Error;
use tracing::{debug, info};

/// Gaze tracking error types
#[derive(Error, Debug)]
pub enum GazeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Expected {expected} landmarks, got {found}")]
    LandmarkCount { expected: usize, found: usize },

    #[error("Frame error: {0}")]
    Camera(#[from] CameraError),
}

/// Per-frame gaze tracker
pub struct GazeTracker<P> {
    config: GazeConfig,
    provider: P,
    locator: PupilLocator,
    thresholds: Thresholds,
    last_gaze_vector: GazeVector,
}

impl<P: LandmarkProvider> GazeTracker<P> {
    /// Create a tracker using `provider` for landmark detection
    pub fn new(config: GazeConfig, provider: P) -> Result<Self, GazeError> {
        config.validate()?;
        info!(
            "Gaze tracker ready: {}x{} debug frame, pupil threshold {}, thresholds dx={:.3} dy={:.3}",
            config.debug_width,
            config.debug_height,
            config.pupil_threshold,
            config.thresholds.dx,
            config.thresholds.dy
        );

        Ok(Self {
            locator: PupilLocator::new(config.pupil_threshold),
            thresholds: config.thresholds,
            last_gaze_vector: GazeVector::ZERO,
            config,
            provider,
        })
    }

    pub fn config(&self) -> &GazeConfig {
        &self.config
    }

    /// Thresholds currently used for classification
    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    pub fn set_thresholds(&mut self, thresholds: Thresholds) {
        self.thresholds = thresholds;
    }

    /// Vector of the most recent frame with a face; frames without one leave it unchanged
    pub fn last_gaze_vector(&self) -> GazeVector {
        self.last_gaze_vector
    }

    /// Analyze a frame at any resolution; it is resized to the debug size first
    pub fn process_frame(&mut self, frame: &VideoFrame) -> Result<GazeAnalysis, GazeError> {
        let resized = frame.resize(self.config.debug_width, self.config.debug_height)?;
        let gray = resized.to_grayscale()?;
        self.process_gray(&gray)
    }

    /// Analyze a grayscale frame already at the debug size
    pub fn process_gray(&mut self, gray: &GrayImage) -> Result<GazeAnalysis, GazeError> {
        let faces = self.provider.landmarks(gray)?;

        let Some(face) = faces.first() else {
            return Ok(GazeAnalysis::no_face());
        };
        if faces.len() > 1 {
            debug!("{} faces detected, tracking the first", faces.len());
        }

        let left = self.locator.locate(&face.eye(Eye::Left), gray);
        let right = self.locator.locate(&face.eye(Eye::Right), gray);
        let gaze_vector = combine(left.vector, right.vector);
        self.last_gaze_vector = gaze_vector;

        Ok(GazeAnalysis {
            face_detected: true,
            direction: classify(gaze_vector, &self.thresholds),
            gaze_vector: Some(gaze_vector),
            left_eye: Some(left),
            right_eye: Some(right),
        })
    }

    /// Replace the thresholds with ones derived from `samples`
    pub fn apply_calibration(&mut self, samples: &CalibrationSamples) -> Thresholds {
        self.thresholds = self.thresholds.calibrated(samples);
        info!(
            "Calibration applied: thresholds dx={:.3} dy={:.3}",
            self.thresholds.dx, self.thresholds.dy
        );
        self.thresholds
    }
}
