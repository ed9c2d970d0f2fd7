//! Debug annotations
//!
//! Draws each eye's crop box and pupil centroid onto the debug frame, plus a
//! 3x3 direction grid in the top-left corner with the classified cell filled.

use std::fs;
use std::path::{Path, PathBuf};

use camera_capture::VideoFrame;
use gaze::{Direction, GazeAnalysis};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;
use tracing::debug;

use crate::AppError;

const EYE_BOX_COLOR: Rgb<u8> = Rgb([255, 255, 0]);
const PUPIL_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const GRID_COLOR: Rgb<u8> = Rgb([200, 200, 200]);
const ACTIVE_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

const GRID_ORIGIN: (i32, i32) = (10, 10);
const GRID_CELL: u32 = 16;

/// Grid cell (column, row) for a direction; `None` for no face
pub fn grid_cell(direction: Direction) -> Option<(u32, u32)> {
    let cell = match direction {
        Direction::UpLeft => (0, 0),
        Direction::Up => (1, 0),
        Direction::UpRight => (2, 0),
        Direction::Left => (0, 1),
        Direction::Center => (1, 1),
        Direction::Right => (2, 1),
        Direction::DownLeft => (0, 2),
        Direction::Down => (1, 2),
        Direction::DownRight => (2, 2),
        Direction::NoFace => return None,
    };
    Some(cell)
}

fn cell_rect(col: u32, row: u32) -> Rect {
    Rect::at(
        GRID_ORIGIN.0 + (col * GRID_CELL) as i32,
        GRID_ORIGIN.1 + (row * GRID_CELL) as i32,
    )
    .of_size(GRID_CELL, GRID_CELL)
}

/// Draw the analysis onto a debug-size frame
pub fn annotate(image: &mut RgbImage, analysis: &GazeAnalysis) {
    for eye in analysis.eyes() {
        if !eye.bbox.is_empty() {
            let rect = Rect::at(eye.bbox.x, eye.bbox.y).of_size(eye.bbox.width, eye.bbox.height);
            draw_hollow_rect_mut(image, rect, EYE_BOX_COLOR);
        }
        if let Some(center) = eye.frame_centroid() {
            draw_filled_circle_mut(image, center, 2, PUPIL_COLOR);
        }
    }

    for row in 0..3 {
        for col in 0..3 {
            draw_hollow_rect_mut(image, cell_rect(col, row), GRID_COLOR);
        }
    }
    if let Some((col, row)) = grid_cell(analysis.direction) {
        draw_filled_rect_mut(image, cell_rect(col, row), ACTIVE_COLOR);
    }
}

/// Writes annotated frames as PNGs into a directory
#[derive(Debug)]
pub struct AnnotationWriter {
    dir: PathBuf,
}

impl AnnotationWriter {
    pub fn create(dir: &Path) -> Result<Self, AppError> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn write(&self, frame: &VideoFrame, analysis: &GazeAnalysis) -> Result<PathBuf, AppError> {
        let mut image = frame.to_rgb_image()?;
        annotate(&mut image, analysis);

        let path = self.dir.join(format!("frame_{:06}.png", frame.sequence));
        image.save(&path)?;
        debug!("Wrote {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gaze::{Eye, EyeBox, GazeVector, PupilReading};

    fn analysis(direction: Direction) -> GazeAnalysis {
        let reading = PupilReading {
            eye: Eye::Left,
            bbox: EyeBox { x: 100, y: 100, width: 40, height: 20 },
            centroid: Some((10, 10)),
            mask_area: 12,
            vector: GazeVector::new(-0.5, 0.0),
        };
        GazeAnalysis {
            face_detected: true,
            direction,
            gaze_vector: Some(reading.vector),
            left_eye: Some(reading),
            right_eye: None,
        }
    }

    #[test]
    fn test_grid_cells() {
        assert_eq!(grid_cell(Direction::Center), Some((1, 1)));
        assert_eq!(grid_cell(Direction::DownRight), Some((2, 2)));
        assert_eq!(grid_cell(Direction::NoFace), None);
    }

    #[test]
    fn test_annotate_marks_direction_and_eye() {
        let mut image = RgbImage::new(640, 480);
        annotate(&mut image, &analysis(Direction::Left));

        // Left cell filled, center cell interior untouched
        let left = (GRID_ORIGIN.0 as u32 + GRID_CELL / 2, GRID_ORIGIN.1 as u32 + GRID_CELL + GRID_CELL / 2);
        assert_eq!(*image.get_pixel(left.0, left.1), ACTIVE_COLOR);
        let center = (left.0 + GRID_CELL, left.1);
        assert_eq!(*image.get_pixel(center.0, center.1), Rgb([0, 0, 0]));

        assert_eq!(*image.get_pixel(100, 100), EYE_BOX_COLOR);
        assert_eq!(*image.get_pixel(110, 110), PUPIL_COLOR);
    }

    #[test]
    fn test_annotate_no_face() {
        let mut image = RgbImage::new(64, 64);
        annotate(&mut image, &GazeAnalysis::no_face());
        assert!(image.pixels().all(|p| *p != ACTIVE_COLOR));
    }

    #[test]
    fn test_writer_saves_png() {
        let dir = std::env::temp_dir().join(format!("gaze-annotations-{}", std::process::id()));
        let writer = AnnotationWriter::create(&dir).unwrap();
        let frame = VideoFrame::new(vec![0; 640 * 480 * 3], 640, 480, 0, 42);

        let path = writer.write(&frame, &analysis(Direction::Up)).unwrap();
        assert!(path.ends_with("frame_000042.png"));
        assert_eq!(image::open(&path).unwrap().width(), 640);

        fs::remove_dir_all(&dir).unwrap();
    }
}
