//! Gaze Tracker Application
//!
//! Wires a frame source and a landmark provider into the gaze tracker:
//! optional five-point calibration, then per-frame tracking until the source
//! runs out, with optional annotated debug frames and JSON output.

pub mod overlay;
pub mod replay;
pub mod settings;

pub use overlay::AnnotationWriter;
pub use replay::ReplayLandmarks;
pub use settings::Settings;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;

use camera_capture::{CameraError, FrameSource};
use gaze::{run_calibration, Direction, GazeAnalysis, GazeError, GazeTracker, LandmarkProvider, Thresholds};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use settings::LoggingSettings;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Failed to read landmarks from {path}: {source}")]
    Landmarks {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Gaze(#[from] GazeError),

    #[error(transparent)]
    Camera(#[from] CameraError),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Logging setup failed: {0}")]
    Logging(String),
}

/// Initialize logging
pub fn init_logging(settings: &LoggingSettings) -> Result<(), AppError> {
    let level = Level::from_str(&settings.level)
        .map_err(|e| AppError::Logging(format!("invalid level {:?}: {}", settings.level, e)))?;

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    let result = if settings.json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    result.map_err(|e| AppError::Logging(e.to_string()))
}

/// Totals for one run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    /// Frames tracked after calibration
    pub frames: usize,
    /// Tracked frames with a face
    pub faces: usize,
    pub directions: BTreeMap<Direction, usize>,
    /// Thresholds derived by a completed calibration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calibrated: Option<Thresholds>,
}

impl RunSummary {
    fn record(&mut self, analysis: &GazeAnalysis) {
        self.frames += 1;
        if analysis.face_detected {
            self.faces += 1;
        }
        *self.directions.entry(analysis.direction).or_insert(0) += 1;
    }
}

/// Run against the configured frame source and landmark recording
pub fn run(settings: &Settings) -> Result<RunSummary, AppError> {
    let mut source = camera_capture::open_source(&settings.camera)?;
    let provider = ReplayLandmarks::load(&settings.landmarks.path)?;
    run_with(settings, &mut source, provider)
}

/// Calibrate (if enabled) and track every remaining frame of `source`
pub fn run_with<S, P>(settings: &Settings, source: &mut S, provider: P) -> Result<RunSummary, AppError>
where
    S: FrameSource + ?Sized,
    P: LandmarkProvider,
{
    let mut tracker = GazeTracker::new(settings.gaze.clone(), provider)?;
    let mut summary = RunSummary::default();

    if settings.calibration.enabled {
        let mut signals = settings.calibration.signals();
        match run_calibration(&mut tracker, source, &mut signals)? {
            Some(samples) => summary.calibrated = Some(tracker.apply_calibration(&samples)),
            None => {
                let t = tracker.thresholds();
                warn!("Calibration not completed; keeping thresholds dx={:.3} dy={:.3}", t.dx, t.dy);
            }
        }
    }

    let writer = settings
        .output
        .annotate_dir
        .as_deref()
        .map(AnnotationWriter::create)
        .transpose()?;

    let (width, height) = (settings.gaze.debug_width, settings.gaze.debug_height);
    info!("Tracking gaze");

    while let Some(frame) = source.next_frame()? {
        // The annotation writer draws on the same debug-size frame the tracker sees
        let frame = frame.resize(width, height)?;
        let analysis = tracker.process_gray(&frame.to_grayscale()?)?;
        summary.record(&analysis);

        match analysis.gaze_vector {
            Some(v) => info!(
                frame = frame.sequence,
                direction = %analysis.direction,
                "Gaze ({:.2}, {:.2})",
                v.dx,
                v.dy
            ),
            None => info!(frame = frame.sequence, direction = %analysis.direction, "No face"),
        }

        if settings.output.json {
            println!("{}", serde_json::to_string(&analysis)?);
        }
        if let Some(writer) = &writer {
            writer.write(&frame, &analysis)?;
        }
    }

    info!(
        "Frame source exhausted after {} tracked frames ({} with a face)",
        summary.frames, summary.faces
    );
    Ok(summary)
}
