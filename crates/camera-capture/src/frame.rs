//! Video frame types and processing

use image::imageops::{self, FilterType};
use image::{GrayImage, RgbImage};

use crate::CameraError;

/// Decoded RGB video frame
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// RGB pixel data (width * height * 3)
    pub data: Vec<u8>,
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Capture timestamp (nanoseconds)
    pub timestamp_ns: u64,
    /// Frame sequence number
    pub sequence: u32,
}

impl VideoFrame {
    /// Create a new video frame from raw RGB data
    pub fn new(data: Vec<u8>, width: u32, height: u32, timestamp_ns: u64, sequence: u32) -> Self {
        Self {
            data,
            width,
            height,
            timestamp_ns,
            sequence,
        }
    }

    /// Wrap a decoded RGB image
    pub fn from_rgb_image(image: RgbImage, timestamp_ns: u64, sequence: u32) -> Self {
        let (width, height) = image.dimensions();
        Self::new(image.into_raw(), width, height, timestamp_ns, sequence)
    }

    /// Copy the frame into an `RgbImage`
    pub fn to_rgb_image(&self) -> Result<RgbImage, CameraError> {
        RgbImage::from_raw(self.width, self.height, self.data.clone()).ok_or_else(|| {
            CameraError::Format(format!(
                "frame {} has {} bytes, expected {}x{}x3",
                self.sequence,
                self.data.len(),
                self.width,
                self.height
            ))
        })
    }

    /// Get pixel at (x, y)
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y * self.width + x) * 3) as usize;
        self.data
            .get(idx..idx + 3)
            .map(|p| [p[0], p[1], p[2]])
    }

    /// Convert to grayscale
    pub fn to_grayscale(&self) -> Result<GrayImage, CameraError> {
        let mut gray = Vec::with_capacity((self.width * self.height) as usize);
        for pixel in self.data.chunks_exact(3) {
            // Luminance formula: 0.299*R + 0.587*G + 0.114*B
            let y = (pixel[0] as f32 * 0.299
                   + pixel[1] as f32 * 0.587
                   + pixel[2] as f32 * 0.114) as u8;
            gray.push(y);
        }
        GrayImage::from_raw(self.width, self.height, gray).ok_or_else(|| {
            CameraError::Format(format!(
                "frame {} is not a {}x{} RGB frame",
                self.sequence, self.width, self.height
            ))
        })
    }

    /// Resize frame using bilinear interpolation
    pub fn resize(&self, new_width: u32, new_height: u32) -> Result<VideoFrame, CameraError> {
        if new_width == self.width && new_height == self.height {
            return Ok(self.clone());
        }
        let resized = imageops::resize(&self.to_rgb_image()?, new_width, new_height, FilterType::Triangle);
        Ok(Self::from_rgb_image(resized, self.timestamp_ns, self.sequence))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, rgb: [u8; 3]) -> VideoFrame {
        let data = rgb.repeat((width * height) as usize);
        VideoFrame::new(data, width, height, 0, 0)
    }

    #[test]
    fn test_grayscale_luminance() {
        let frame = solid(4, 2, [255, 255, 255]);
        let gray = frame.to_grayscale().unwrap();
        assert_eq!(gray.dimensions(), (4, 2));
        assert!(gray.pixels().all(|p| p[0] >= 254));

        let red = solid(1, 1, [100, 0, 0]).to_grayscale().unwrap();
        assert_eq!(red.get_pixel(0, 0)[0], 29);
    }

    #[test]
    fn test_grayscale_rejects_short_buffer() {
        let frame = VideoFrame::new(vec![0; 5], 2, 2, 0, 7);
        assert!(matches!(frame.to_grayscale(), Err(CameraError::Format(_))));
    }

    #[test]
    fn test_get_pixel_bounds() {
        let frame = solid(3, 3, [1, 2, 3]);
        assert_eq!(frame.get_pixel(2, 2), Some([1, 2, 3]));
        assert_eq!(frame.get_pixel(3, 0), None);
    }

    #[test]
    fn test_resize_to_debug_size() {
        let frame = solid(320, 240, [50, 60, 70]);
        let resized = frame.resize(640, 480).unwrap();
        assert_eq!((resized.width, resized.height), (640, 480));
        assert_eq!(resized.data.len(), 640 * 480 * 3);
        let pixel = resized.get_pixel(100, 100).unwrap();
        for (got, want) in pixel.iter().zip([50u8, 60, 70]) {
            assert!(got.abs_diff(want) <= 1, "{:?}", pixel);
        }
    }
}
