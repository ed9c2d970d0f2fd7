//! Gaze tracker configuration

use serde::{Deserialize, Serialize};

use crate::calibration::CALIBRATION_SAMPLES;
use crate::classifier::Thresholds;
use crate::pupil::DEFAULT_PUPIL_THRESHOLD;
use crate::GazeError;

/// Gaze tracker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GazeConfig {
    /// Width every frame is resized to before processing. Thresholds derived
    /// at one debug size do not carry over to another.
    pub debug_width: u32,

    /// Height every frame is resized to before processing
    pub debug_height: u32,

    /// Pupil mask intensity threshold (0-255, after equalization)
    pub pupil_threshold: u8,

    /// Frames averaged per calibration point
    pub samples_per_point: usize,

    /// Classifier thresholds in effect until calibration replaces them
    pub thresholds: Thresholds,
}

impl Default for GazeConfig {
    fn default() -> Self {
        Self {
            debug_width: 640,
            debug_height: 480,
            pupil_threshold: DEFAULT_PUPIL_THRESHOLD,
            samples_per_point: CALIBRATION_SAMPLES,
            thresholds: Thresholds::default(),
        }
    }
}

impl GazeConfig {
    pub fn validate(&self) -> Result<(), GazeError> {
        if self.debug_width == 0 || self.debug_height == 0 {
            return Err(GazeError::Config(format!(
                "debug frame size must be non-zero, got {}x{}",
                self.debug_width, self.debug_height
            )));
        }
        if self.samples_per_point == 0 {
            return Err(GazeError::Config("samples_per_point must be at least 1".into()));
        }
        let t = self.thresholds;
        if !(t.dx.is_finite() && t.dx > 0.0 && t.dy.is_finite() && t.dy > 0.0) {
            return Err(GazeError::Config(format!(
                "thresholds must be positive, got dx={} dy={}",
                t.dx, t.dy
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GazeConfig::default();
        assert_eq!((config.debug_width, config.debug_height), (640, 480));
        assert_eq!(config.pupil_threshold, 50);
        assert_eq!(config.samples_per_point, 30);
        assert_eq!(config.thresholds, Thresholds::new(0.15, 0.15));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let zero_size = GazeConfig {
            debug_width: 0,
            ..Default::default()
        };
        assert!(matches!(zero_size.validate(), Err(GazeError::Config(_))));

        let no_samples = GazeConfig {
            samples_per_point: 0,
            ..Default::default()
        };
        assert!(no_samples.validate().is_err());

        let negative = GazeConfig {
            thresholds: Thresholds::new(-0.1, 0.1),
            ..Default::default()
        };
        assert!(negative.validate().is_err());
    }
}
