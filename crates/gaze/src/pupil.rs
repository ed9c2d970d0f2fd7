//! Pupil location within an eye crop
//!
//! The crop is histogram-equalized so its darkest level maps to 0 and its
//! brightest to 255, then every pixel at or below the threshold is treated
//! as pupil. The mask centroid, taken from its image
//! moments, is normalized against the crop's half-size.

use image::{imageops, GrayImage};
use imageproc::stats::cumulative_histogram;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::landmarks::{Eye, EyeBox, EyeRegion};
use crate::vector::GazeVector;

/// Intensity (0-255, after equalization) at or below which a pixel counts as pupil
pub const DEFAULT_PUPIL_THRESHOLD: u8 = 50;

/// Result of locating the pupil in one eye
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PupilReading {
    pub eye: Eye,
    /// Crop rectangle in frame coordinates, clipped to the frame
    pub bbox: EyeBox,
    /// Pupil centroid in crop coordinates; `None` for a zero-area crop
    pub centroid: Option<(u32, u32)>,
    /// Foreground pixel count of the pupil mask
    pub mask_area: u64,
    /// Normalized displacement from the crop center
    pub vector: GazeVector,
}

impl PupilReading {
    /// Centroid in frame coordinates
    pub fn frame_centroid(&self) -> Option<(i32, i32)> {
        self.centroid
            .map(|(cx, cy)| (self.bbox.x + cx as i32, self.bbox.y + cy as i32))
    }
}

/// Threshold-and-moments pupil locator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PupilLocator {
    threshold: u8,
}

impl Default for PupilLocator {
    fn default() -> Self {
        Self::new(DEFAULT_PUPIL_THRESHOLD)
    }
}

impl PupilLocator {
    pub fn new(threshold: u8) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Locate the pupil of `region` inside the grayscale frame
    pub fn locate(&self, region: &EyeRegion, gray: &GrayImage) -> PupilReading {
        let bbox = region.bounding_box().clip(gray.width(), gray.height());
        if bbox.is_empty() {
            trace!(eye = ?region.eye, "Degenerate eye crop");
            return PupilReading {
                eye: region.eye,
                bbox,
                centroid: None,
                mask_area: 0,
                vector: GazeVector::ZERO,
            };
        }

        let crop = imageops::crop_imm(gray, bbox.x as u32, bbox.y as u32, bbox.width, bbox.height)
            .to_image();
        let equalized = equalize(crop);

        let (m00, m10, m01) = self.moments(&equalized);
        let (width, height) = equalized.dimensions();

        // Whole-pixel centroid; an empty mask falls back to the crop center
        let (cx, cy) = if m00 > 0 {
            ((m10 / m00) as u32, (m01 / m00) as u32)
        } else {
            (width / 2, height / 2)
        };

        let half_w = width as f32 / 2.0;
        let half_h = height as f32 / 2.0;
        let vector = GazeVector {
            dx: (cx as f32 - half_w) / half_w,
            dy: (cy as f32 - half_h) / half_h,
        };

        PupilReading {
            eye: region.eye,
            bbox,
            centroid: Some((cx, cy)),
            mask_area: m00,
            vector,
        }
    }

    /// Zeroth and first-order moments of the inverse-thresholded mask
    fn moments(&self, image: &GrayImage) -> (u64, u64, u64) {
        let mut m00 = 0u64;
        let mut m10 = 0u64;
        let mut m01 = 0u64;

        for (x, y, pixel) in image.enumerate_pixels() {
            if pixel[0] <= self.threshold {
                m00 += 1;
                m10 += x as u64;
                m01 += y as u64;
            }
        }

        (m00, m10, m01)
    }
}

/// Histogram equalization anchored at the darkest level present.
///
/// Level `v` maps to `round((cdf(v) - cdf_min) * 255 / (total - cdf_min))`,
/// so the darkest level always becomes 0 however much of the crop it covers.
/// A single-level crop is returned unchanged.
fn equalize(mut image: GrayImage) -> GrayImage {
    let cdf = cumulative_histogram(&image).channels[0];
    let total = cdf[255];
    let cdf_min = cdf.iter().copied().find(|&c| c > 0).unwrap_or(0);
    if total == cdf_min {
        return image;
    }

    let scale = 255.0 / (total - cdf_min) as f32;
    let mut lut = [0u8; 256];
    for (level, mapped) in lut.iter_mut().enumerate() {
        let rank = cdf[level].saturating_sub(cdf_min) as f32;
        *mapped = (rank * scale).round().min(255.0) as u8;
    }

    for pixel in image.pixels_mut() {
        pixel[0] = lut[pixel[0] as usize];
    }
    image
}
