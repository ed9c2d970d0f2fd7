//! Gaze direction classification

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::vector::GazeVector;

/// Default deadzone half-width on each axis
pub const DEFAULT_THRESHOLD: f32 = 0.15;

/// Coarse gaze direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Center,
    Up,
    Down,
    Left,
    Right,
    UpLeft,
    UpRight,
    DownLeft,
    DownRight,
    /// No face in the frame
    #[serde(rename = "N/A")]
    NoFace,
}

impl Direction {
    /// The nine labels the classifier can produce
    pub const GAZE: [Direction; 9] = [
        Direction::Center,
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
        Direction::UpLeft,
        Direction::UpRight,
        Direction::DownLeft,
        Direction::DownRight,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Center => "center",
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::UpLeft => "up_left",
            Direction::UpRight => "up_right",
            Direction::DownLeft => "down_left",
            Direction::DownRight => "down_right",
            Direction::NoFace => "N/A",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-axis deadzone separating "center" from a directional gaze
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub dx: f32,
    pub dy: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            dx: DEFAULT_THRESHOLD,
            dy: DEFAULT_THRESHOLD,
        }
    }
}

impl Thresholds {
    pub const fn new(dx: f32, dy: f32) -> Self {
        Self { dx, dy }
    }
}

/// Map a gaze vector to a direction.
///
/// Diagonals are checked before single axes. A component equal to its
/// threshold is inside the deadzone.
pub fn classify(v: GazeVector, t: &Thresholds) -> Direction {
    let right = v.dx > t.dx;
    let left = v.dx < -t.dx;
    let up = v.dy < -t.dy;
    let down = v.dy > t.dy;

    if right && up {
        return Direction::UpRight;
    }
    if right && down {
        return Direction::DownRight;
    }
    if left && up {
        return Direction::UpLeft;
    }
    if left && down {
        return Direction::DownLeft;
    }

    if v.dx.abs() <= t.dx && v.dy.abs() <= t.dy {
        return Direction::Center;
    }

    if right {
        return Direction::Right;
    }
    if left {
        return Direction::Left;
    }
    if up {
        return Direction::Up;
    }
    if down {
        return Direction::Down;
    }

    // NaN components fail every comparison above
    Direction::Center
}
