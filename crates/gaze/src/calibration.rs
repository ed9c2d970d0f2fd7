//! Five-point calibration
//!
//! The operator looks at center, left, right, up and down in turn. For each
//! point the tracker previews frames until a ready signal, then averages the
//! gaze vector over a fixed number of frames. The left/right and up/down
//! averages yield new classifier thresholds.

use std::collections::BTreeMap;
use std::fmt;

use camera_capture::FrameSource;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::classifier::Thresholds;
use crate::landmarks::LandmarkProvider;
use crate::vector::{GazeVector, RunningMean};
use crate::{GazeError, GazeTracker};

/// Frames averaged per calibration point
pub const CALIBRATION_SAMPLES: usize = 30;

/// Divisor applied to the summed extreme magnitudes. Larger than 2 so the
/// deadzone sits inside the midpoint and the classifier leans sensitive.
pub const THRESHOLD_DIVISOR: f32 = 3.0;

/// Calibration target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationPoint {
    Center,
    Left,
    Right,
    Up,
    Down,
}

impl CalibrationPoint {
    /// Order the points are visited in
    pub const ORDER: [CalibrationPoint; 5] = [
        CalibrationPoint::Center,
        CalibrationPoint::Left,
        CalibrationPoint::Right,
        CalibrationPoint::Up,
        CalibrationPoint::Down,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CalibrationPoint::Center => "center",
            CalibrationPoint::Left => "left",
            CalibrationPoint::Right => "right",
            CalibrationPoint::Up => "up",
            CalibrationPoint::Down => "down",
        }
    }

    /// Point visited after this one
    pub fn next(self) -> Option<CalibrationPoint> {
        let idx = Self::ORDER.iter().position(|&p| p == self)?;
        Self::ORDER.get(idx + 1).copied()
    }
}

impl fmt::Display for CalibrationPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Averaged gaze vector per calibration point. May be partial.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalibrationSamples {
    samples: BTreeMap<CalibrationPoint, GazeVector>,
}

impl CalibrationSamples {
    pub fn insert(&mut self, point: CalibrationPoint, mean: GazeVector) {
        self.samples.insert(point, mean);
    }

    pub fn get(&self, point: CalibrationPoint) -> Option<GazeVector> {
        self.samples.get(&point).copied()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// All five points sampled
    pub fn is_complete(&self) -> bool {
        CalibrationPoint::ORDER.iter().all(|p| self.samples.contains_key(p))
    }

    pub fn iter(&self) -> impl Iterator<Item = (CalibrationPoint, GazeVector)> + '_ {
        self.samples.iter().map(|(&p, &v)| (p, v))
    }
}

impl FromIterator<(CalibrationPoint, GazeVector)> for CalibrationSamples {
    fn from_iter<I: IntoIterator<Item = (CalibrationPoint, GazeVector)>>(iter: I) -> Self {
        Self {
            samples: iter.into_iter().collect(),
        }
    }
}

impl Thresholds {
    /// Thresholds derived from calibration samples.
    ///
    /// An axis is only re-derived when both of its opposite points were
    /// sampled; otherwise it keeps the value from `self`.
    pub fn calibrated(&self, samples: &CalibrationSamples) -> Thresholds {
        let mut derived = *self;

        if let (Some(left), Some(right)) = (
            samples.get(CalibrationPoint::Left),
            samples.get(CalibrationPoint::Right),
        ) {
            derived.dx = (left.dx.abs() + right.dx.abs()) / THRESHOLD_DIVISOR;
        }

        if let (Some(up), Some(down)) = (
            samples.get(CalibrationPoint::Up),
            samples.get(CalibrationPoint::Down),
        ) {
            derived.dy = (up.dy.abs() + down.dy.abs()) / THRESHOLD_DIVISOR;
        }

        derived
    }
}

/// Calibration progress
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalibrationState {
    /// Previewing until the operator is ready to look at `point`
    AwaitingReady(CalibrationPoint),
    /// Averaging frames for `point`
    Sampling {
        point: CalibrationPoint,
        collected: RunningMean,
    },
    Done,
    Aborted,
}

/// Input driving the calibration state machine
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalibrationEvent {
    Ready,
    Abort,
    /// Gaze vector of a processed frame
    Sample(GazeVector),
}

/// Operator signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserSignal {
    Ready,
    Abort,
}

impl From<UserSignal> for CalibrationEvent {
    fn from(signal: UserSignal) -> Self {
        match signal {
            UserSignal::Ready => CalibrationEvent::Ready,
            UserSignal::Abort => CalibrationEvent::Abort,
        }
    }
}

/// Calibration state machine
#[derive(Debug, Clone)]
pub struct Calibration {
    state: CalibrationState,
    samples: CalibrationSamples,
    samples_per_point: usize,
}

impl Default for Calibration {
    fn default() -> Self {
        Self::new(CALIBRATION_SAMPLES)
    }
}

impl Calibration {
    pub fn new(samples_per_point: usize) -> Self {
        Self {
            state: CalibrationState::AwaitingReady(CalibrationPoint::ORDER[0]),
            samples: CalibrationSamples::default(),
            samples_per_point: samples_per_point.max(1),
        }
    }

    pub fn state(&self) -> &CalibrationState {
        &self.state
    }

    /// Samples collected so far
    pub fn samples(&self) -> &CalibrationSamples {
        &self.samples
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, CalibrationState::Done | CalibrationState::Aborted)
    }

    /// Apply one event. Events that do not apply to the current state
    /// (samples while awaiting ready, anything after the end) are ignored.
    pub fn handle(&mut self, event: CalibrationEvent) -> &CalibrationState {
        self.state = match (self.state, event) {
            (CalibrationState::Done | CalibrationState::Aborted, _) => self.state,

            (_, CalibrationEvent::Abort) => {
                info!("Calibration aborted after {} of {} points", self.samples.len(), CalibrationPoint::ORDER.len());
                CalibrationState::Aborted
            }

            (CalibrationState::AwaitingReady(point), CalibrationEvent::Ready) => {
                debug!("Sampling calibration point {}", point);
                CalibrationState::Sampling {
                    point,
                    collected: RunningMean::default(),
                }
            }

            (CalibrationState::Sampling { point, mut collected }, CalibrationEvent::Sample(v)) => {
                collected.push(v);
                if collected.count() < self.samples_per_point {
                    CalibrationState::Sampling { point, collected }
                } else {
                    let mean = collected.mean();
                    info!("Calibration point {} recorded: ({:.3}, {:.3})", point, mean.dx, mean.dy);
                    self.samples.insert(point, mean);
                    match point.next() {
                        Some(next) => CalibrationState::AwaitingReady(next),
                        None => CalibrationState::Done,
                    }
                }
            }

            (state, _) => state,
        };
        &self.state
    }

    /// Collected samples if every point was sampled; `None` when aborted or
    /// unfinished.
    pub fn finish(self) -> Option<CalibrationSamples> {
        match self.state {
            CalibrationState::Done => Some(self.samples),
            _ => None,
        }
    }
}

/// Source of operator signals, polled once per previewed frame
pub trait SignalSource {
    fn poll(&mut self, point: CalibrationPoint) -> Option<UserSignal>;
}

/// Signals on a fixed schedule: ready on the `ready_after`-th poll for each
/// point, and optionally abort on the `abort_after`-th poll overall.
#[derive(Debug, Clone)]
pub struct ScriptedSignals {
    ready_after: usize,
    abort_after: Option<usize>,
    waited: usize,
    polls: usize,
}

impl ScriptedSignals {
    pub fn new(ready_after: usize) -> Self {
        Self {
            ready_after: ready_after.max(1),
            abort_after: None,
            waited: 0,
            polls: 0,
        }
    }

    pub fn with_abort_after(mut self, polls: usize) -> Self {
        self.abort_after = Some(polls);
        self
    }
}

impl SignalSource for ScriptedSignals {
    fn poll(&mut self, _point: CalibrationPoint) -> Option<UserSignal> {
        self.polls += 1;
        if self.abort_after == Some(self.polls) {
            return Some(UserSignal::Abort);
        }

        self.waited += 1;
        if self.waited >= self.ready_after {
            self.waited = 0;
            return Some(UserSignal::Ready);
        }
        None
    }
}

/// Drive a calibration from live frames.
///
/// Every frame runs through the tracker. While awaiting ready the signal
/// source is polled; while sampling, the tracker's last gaze vector is fed
/// in. Returns `None` when aborted or when the frame source ends first, in
/// which case nothing should be applied.
pub fn run_calibration<P, S, U>(
    tracker: &mut GazeTracker<P>,
    source: &mut S,
    signals: &mut U,
) -> Result<Option<CalibrationSamples>, GazeError>
where
    P: LandmarkProvider,
    S: FrameSource + ?Sized,
    U: SignalSource + ?Sized,
{
    let mut calibration = Calibration::new(tracker.config().samples_per_point);
    let mut prompted = None;

    while !calibration.is_finished() {
        let Some(frame) = source.next_frame()? else {
            warn!("Frame source ended during calibration; keeping current thresholds");
            return Ok(None);
        };

        let analysis = tracker.process_frame(&frame)?;

        let state = *calibration.state();
        match state {
            CalibrationState::AwaitingReady(point) => {
                if prompted != Some(point) {
                    info!("Look {} and signal ready", point);
                    prompted = Some(point);
                }
                debug!(direction = %analysis.direction, "Preview frame {}", frame.sequence);
                if let Some(signal) = signals.poll(point) {
                    calibration.handle(signal.into());
                }
            }
            CalibrationState::Sampling { .. } => {
                calibration.handle(CalibrationEvent::Sample(tracker.last_gaze_vector()));
            }
            CalibrationState::Done | CalibrationState::Aborted => {}
        }
    }

    Ok(calibration.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_point(calibration: &mut Calibration, v: GazeVector) {
        calibration.handle(CalibrationEvent::Ready);
        for _ in 0..CALIBRATION_SAMPLES {
            calibration.handle(CalibrationEvent::Sample(v));
        }
    }

    #[test]
    fn test_point_order() {
        assert_eq!(CalibrationPoint::Center.next(), Some(CalibrationPoint::Left));
        assert_eq!(CalibrationPoint::Up.next(), Some(CalibrationPoint::Down));
        assert_eq!(CalibrationPoint::Down.next(), None);
    }

    #[test]
    fn test_identical_samples_average_exactly() {
        let v = GazeVector::new(0.37, 0.37);
        let mut calibration = Calibration::default();
        sample_point(&mut calibration, v);

        assert_eq!(calibration.samples().get(CalibrationPoint::Center), Some(v));
        assert_eq!(*calibration.state(), CalibrationState::AwaitingReady(CalibrationPoint::Left));
    }

    #[test]
    fn test_samples_ignored_until_ready() {
        let mut calibration = Calibration::new(2);
        calibration.handle(CalibrationEvent::Sample(GazeVector::new(9.0, 9.0)));
        assert_eq!(*calibration.state(), CalibrationState::AwaitingReady(CalibrationPoint::Center));

        calibration.handle(CalibrationEvent::Ready);
        calibration.handle(CalibrationEvent::Ready);
        calibration.handle(CalibrationEvent::Sample(GazeVector::new(0.2, 0.0)));
        calibration.handle(CalibrationEvent::Sample(GazeVector::new(0.4, 0.0)));

        let center = calibration.samples().get(CalibrationPoint::Center).unwrap();
        assert!((center.dx - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_full_sequence_completes() {
        let mut calibration = Calibration::default();
        for point in CalibrationPoint::ORDER {
            assert_eq!(*calibration.state(), CalibrationState::AwaitingReady(point));
            sample_point(&mut calibration, GazeVector::new(0.1, 0.1));
        }
        assert_eq!(*calibration.state(), CalibrationState::Done);

        // Events after completion change nothing
        calibration.handle(CalibrationEvent::Abort);
        assert_eq!(*calibration.state(), CalibrationState::Done);

        let samples = calibration.finish().unwrap();
        assert!(samples.is_complete());
        assert_eq!(samples.len(), 5);
    }

    #[test]
    fn test_abort_on_second_point_yields_nothing() {
        let mut calibration = Calibration::default();
        sample_point(&mut calibration, GazeVector::new(0.0, 0.0));
        calibration.handle(CalibrationEvent::Ready);
        calibration.handle(CalibrationEvent::Sample(GazeVector::new(-0.5, 0.0)));
        calibration.handle(CalibrationEvent::Abort);

        assert_eq!(*calibration.state(), CalibrationState::Aborted);
        assert!(calibration.finish().is_none());
    }

    #[test]
    fn test_unfinished_yields_nothing() {
        let mut calibration = Calibration::default();
        sample_point(&mut calibration, GazeVector::ZERO);
        assert!(calibration.finish().is_none());
    }

    #[test]
    fn test_threshold_derivation() {
        let samples: CalibrationSamples = [
            (CalibrationPoint::Left, GazeVector::new(-0.6, 0.0)),
            (CalibrationPoint::Right, GazeVector::new(0.6, 0.0)),
            (CalibrationPoint::Up, GazeVector::new(0.0, -0.3)),
            (CalibrationPoint::Down, GazeVector::new(0.0, 0.6)),
        ]
        .into_iter()
        .collect();

        let derived = Thresholds::default().calibrated(&samples);
        assert!((derived.dx - 0.4).abs() < 1e-6);
        assert!((derived.dy - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_partial_samples_keep_prior() {
        let prior = Thresholds::new(0.12, 0.18);
        let samples: CalibrationSamples = [(CalibrationPoint::Left, GazeVector::new(-0.6, 0.2))]
            .into_iter()
            .collect();
        assert_eq!(prior.calibrated(&samples), prior);

        let vertical_only: CalibrationSamples = [
            (CalibrationPoint::Up, GazeVector::new(0.5, -0.45)),
            (CalibrationPoint::Down, GazeVector::new(-0.5, 0.45)),
        ]
        .into_iter()
        .collect();
        let derived = prior.calibrated(&vertical_only);
        assert_eq!(derived.dx, 0.12);
        assert!((derived.dy - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_scripted_signals() {
        let mut signals = ScriptedSignals::new(3);
        let point = CalibrationPoint::Center;
        assert_eq!(signals.poll(point), None);
        assert_eq!(signals.poll(point), None);
        assert_eq!(signals.poll(point), Some(UserSignal::Ready));
        assert_eq!(signals.poll(point), None);

        let mut aborting = ScriptedSignals::new(10).with_abort_after(2);
        assert_eq!(aborting.poll(point), None);
        assert_eq!(aborting.poll(point), Some(UserSignal::Abort));
    }
}
