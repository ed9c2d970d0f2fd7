//! Facial landmarks and eye region extraction
//!
//! Landmarks follow the 68-point iBUG scheme: indices 36..42 outline the
//! subject's right eye and 42..48 the left eye. Swapping in a landmark model
//! with another layout means remapping [`Eye::range`].

use std::ops::Range;

use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::GazeError;

/// Points per face in the landmark scheme
pub const LANDMARK_COUNT: usize = 68;

/// Points outlining one eye
pub const EYE_POINT_COUNT: usize = 6;

/// Landmark coordinate in debug-frame pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// Landmarks of one detected face
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LandmarkSet {
    points: Vec<Point>,
}

impl LandmarkSet {
    pub fn new(points: Vec<Point>) -> Result<Self, GazeError> {
        if points.len() != LANDMARK_COUNT {
            return Err(GazeError::LandmarkCount {
                expected: LANDMARK_COUNT,
                found: points.len(),
            });
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Outline of one eye
    pub fn eye(&self, eye: Eye) -> EyeRegion {
        EyeRegion::extract(self, eye)
    }
}

/// Which eye a region belongs to (the subject's side)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Eye {
    Left,
    Right,
}

impl Eye {
    /// Landmark indices outlining this eye
    pub const fn range(self) -> Range<usize> {
        match self {
            Eye::Left => 42..48,
            Eye::Right => 36..42,
        }
    }
}

/// Six landmark points outlining one eye, in landmark order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EyeRegion {
    pub eye: Eye,
    pub points: [Point; EYE_POINT_COUNT],
}

impl EyeRegion {
    pub fn extract(landmarks: &LandmarkSet, eye: Eye) -> Self {
        let start = eye.range().start;
        Self {
            eye,
            points: std::array::from_fn(|i| landmarks.points[start + i]),
        }
    }

    /// Axis-aligned box spanning the outline. The max edge is exclusive, so
    /// collinear points give a zero-area box.
    pub fn bounding_box(&self) -> EyeBox {
        let min_x = self.points.iter().map(|p| p.x).min().unwrap_or(0);
        let max_x = self.points.iter().map(|p| p.x).max().unwrap_or(0);
        let min_y = self.points.iter().map(|p| p.y).min().unwrap_or(0);
        let max_y = self.points.iter().map(|p| p.y).max().unwrap_or(0);

        EyeBox {
            x: min_x,
            y: min_y,
            width: (max_x - min_x) as u32,
            height: (max_y - min_y) as u32,
        }
    }
}

/// Pixel rectangle around an eye
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EyeBox {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl EyeBox {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Intersection with a `width` x `height` frame
    pub fn clip(&self, width: u32, height: u32) -> EyeBox {
        let x0 = (self.x as i64).clamp(0, width as i64);
        let y0 = (self.y as i64).clamp(0, height as i64);
        let x1 = (self.x as i64 + self.width as i64).clamp(0, width as i64);
        let y1 = (self.y as i64 + self.height as i64).clamp(0, height as i64);

        EyeBox {
            x: x0 as i32,
            y: y0 as i32,
            width: (x1 - x0).max(0) as u32,
            height: (y1 - y0).max(0) as u32,
        }
    }
}

/// Source of facial landmarks for a grayscale frame.
///
/// Detection itself is an external model; implementations wrap one. An empty
/// result means no face was found in the frame.
pub trait LandmarkProvider {
    fn landmarks(&mut self, gray: &GrayImage) -> Result<Vec<LandmarkSet>, GazeError>;
}

impl<P: LandmarkProvider + ?Sized> LandmarkProvider for Box<P> {
    fn landmarks(&mut self, gray: &GrayImage) -> Result<Vec<LandmarkSet>, GazeError> {
        (**self).landmarks(gray)
    }
}

/// Provider that reports the same faces for every frame
#[derive(Debug, Clone, Default)]
pub struct StaticLandmarks {
    faces: Vec<LandmarkSet>,
}

impl StaticLandmarks {
    pub fn new(faces: Vec<LandmarkSet>) -> Self {
        Self { faces }
    }

    /// Provider that never finds a face
    pub fn empty() -> Self {
        Self::default()
    }
}

impl LandmarkProvider for StaticLandmarks {
    fn landmarks(&mut self, _gray: &GrayImage) -> Result<Vec<LandmarkSet>, GazeError> {
        Ok(self.faces.clone())
    }
}
