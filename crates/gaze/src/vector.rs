//! Gaze vectors and their combination

use serde::{Deserialize, Serialize};

/// Normalized pupil displacement from the eye-region center.
///
/// Each axis is nominally in [-1, 1] but not clamped. Negative `dy` is
/// upward in image coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GazeVector {
    pub dx: f32,
    pub dy: f32,
}

impl GazeVector {
    pub const ZERO: GazeVector = GazeVector { dx: 0.0, dy: 0.0 };

    pub const fn new(dx: f32, dy: f32) -> Self {
        Self { dx, dy }
    }
}

/// Element-wise mean of the two per-eye vectors
pub fn combine(left: GazeVector, right: GazeVector) -> GazeVector {
    GazeVector {
        dx: (left.dx + right.dx) / 2.0,
        dy: (left.dy + right.dy) / 2.0,
    }
}

/// Incremental component-wise mean.
///
/// Updated as `mean += (v - mean) / n`, so a run of identical vectors
/// averages to exactly that vector.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningMean {
    mean: GazeVector,
    count: usize,
}

impl RunningMean {
    pub fn push(&mut self, v: GazeVector) {
        self.count += 1;
        let n = self.count as f32;
        self.mean.dx += (v.dx - self.mean.dx) / n;
        self.mean.dy += (v.dy - self.mean.dy) / n;
    }

    pub fn mean(&self) -> GazeVector {
        self.mean
    }

    pub fn count(&self) -> usize {
        self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine_averages() {
        let v = combine(GazeVector::new(-0.4, 0.2), GazeVector::new(0.2, 0.6));
        assert!((v.dx - -0.1).abs() < 1e-6);
        assert!((v.dy - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_combine_opposite_cancels() {
        assert_eq!(combine(GazeVector::new(0.5, -0.5), GazeVector::new(-0.5, 0.5)), GazeVector::ZERO);
    }

    #[test]
    fn test_running_mean_identical_is_exact() {
        let v = GazeVector::new(0.1, 0.1);
        let mut mean = RunningMean::default();
        for _ in 0..30 {
            mean.push(v);
        }
        assert_eq!(mean.count(), 30);
        assert_eq!(mean.mean(), v);
    }

    #[test]
    fn test_running_mean_mixed() {
        let mut mean = RunningMean::default();
        for dx in [0.0, 0.2, 0.4, 0.6] {
            mean.push(GazeVector::new(dx, -dx));
        }
        assert!((mean.mean().dx - 0.3).abs() < 1e-6);
        assert!((mean.mean().dy + 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_empty_mean_is_zero() {
        assert_eq!(RunningMean::default().mean(), GazeVector::ZERO);
    }
}
