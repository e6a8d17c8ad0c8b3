//! Point and heading primitives
//!
//! Positions are in meters with the origin at the bottom-left of the world and
//! y growing upward. Conversions to raster pixels live here too.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::consts::{EPSILON, SPOT_ANGLE_STEP};
use crate::error::{SimError, SimResult};

/// A point in the world (meters). Neither coordinate is ever NaN.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position(DVec2);

impl Position {
    /// Create a position, rejecting NaN coordinates
    pub fn new(x: f64, y: f64) -> SimResult<Self> {
        if x.is_nan() {
            return Err(SimError::InvalidCoordinate(x));
        }
        if y.is_nan() {
            return Err(SimError::InvalidCoordinate(y));
        }
        Ok(Self(DVec2::new(x, y)))
    }

    /// Wrap a vector produced by arithmetic on valid positions
    #[inline]
    pub(crate) fn from_vec(v: DVec2) -> Self {
        debug_assert!(!v.is_nan(), "position arithmetic produced NaN");
        Self(v)
    }

    #[inline]
    pub fn x(&self) -> f64 {
        self.0.x
    }

    #[inline]
    pub fn y(&self) -> f64 {
        self.0.y
    }

    #[inline]
    pub fn as_vec(&self) -> DVec2 {
        self.0
    }

    pub fn set_x(&mut self, x: f64) -> SimResult<()> {
        if x.is_nan() {
            return Err(SimError::InvalidCoordinate(x));
        }
        self.0.x = x;
        Ok(())
    }

    pub fn set_y(&mut self, y: f64) -> SimResult<()> {
        if y.is_nan() {
            return Err(SimError::InvalidCoordinate(y));
        }
        self.0.y = y;
        Ok(())
    }

    /// Euclidean distance to another position
    #[inline]
    pub fn distance_to(&self, other: &Position) -> f64 {
        self.0.distance(other.0)
    }

    /// Slope angle of the line through both points.
    ///
    /// Returns 0 for a vertical line and otherwise `atan(dy/dx)`, so the result
    /// is confined to (-π/2, π/2) and cannot tell opposite directions apart.
    pub fn slope(&self, other: &Position) -> f64 {
        if self.0.x == other.0.x {
            return 0.0;
        }
        ((self.0.y - other.0.y) / (self.0.x - other.0.x)).atan()
    }

    /// Point at `distance` from this one along `angle`
    #[inline]
    pub fn offset(&self, angle: f64, distance: f64) -> Position {
        Position::from_vec(self.0 + DVec2::from_angle(angle) * distance)
    }

    /// Raster pixel containing this point.
    ///
    /// Column uses floor and row uses ceil: samples on a cell edge are pushed
    /// inward so they never index past the raster.
    pub fn to_pixel(&self, scale_x: f64, scale_y: f64) -> (i64, i64) {
        (
            (self.0.x / scale_x).floor() as i64,
            (self.0.y / scale_y).ceil() as i64,
        )
    }

    /// Meter position of a pixel coordinate
    pub fn from_pixel(column: f64, row: f64, scale_x: f64, scale_y: f64) -> SimResult<Position> {
        Position::new(column * scale_x, row * scale_y)
    }

    /// Sample points on the circle of `radius` around this point (full turn)
    pub fn circular_positions(&self, radius: f64) -> CircularPositions {
        self.circular_positions_between(radius, 0.0, std::f64::consts::TAU, SPOT_ANGLE_STEP)
    }

    /// Sample points on an arc of the circle of `radius` around this point
    pub fn circular_positions_between(
        &self,
        radius: f64,
        min_angle: f64,
        max_angle: f64,
        angle_step: f64,
    ) -> CircularPositions {
        let count = if angle_step > 0.0 && max_angle > min_angle {
            ((max_angle - min_angle) / angle_step).round() as usize
        } else {
            0
        };
        CircularPositions {
            center: self.0,
            radius: radius - EPSILON,
            start: min_angle,
            step: angle_step,
            index: 0,
            count,
        }
    }
}

/// Lazy, restartable sequence of evenly spaced points on a circle.
///
/// Points sit at `radius - EPSILON` so they stay strictly inside the circle.
#[derive(Debug, Clone)]
pub struct CircularPositions {
    center: DVec2,
    radius: f64,
    start: f64,
    step: f64,
    index: usize,
    count: usize,
}

impl Iterator for CircularPositions {
    type Item = Position;

    fn next(&mut self) -> Option<Position> {
        if self.index >= self.count {
            return None;
        }
        let angle = self.start + self.step * self.index as f64;
        self.index += 1;
        Some(Position::from_vec(
            self.center + DVec2::from_angle(angle) * self.radius,
        ))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.count - self.index;
        (left, Some(left))
    }
}

impl ExactSizeIterator for CircularPositions {}

/// A position plus a facing direction (radians)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vector {
    pub position: Position,
    direction: f64,
}

impl Vector {
    pub fn new(position: Position, direction: f64) -> SimResult<Self> {
        if direction.is_nan() {
            return Err(SimError::InvalidCoordinate(direction));
        }
        Ok(Self {
            position,
            direction,
        })
    }

    #[inline]
    pub fn direction(&self) -> f64 {
        self.direction
    }

    /// Whether turning by `angle` keeps the direction a finite number
    pub fn can_change_direction(&self, angle: f64) -> bool {
        angle.is_finite() && (self.direction + angle).is_finite()
    }

    /// Turn by `angle`. Callers check `can_change_direction` first.
    pub(crate) fn change_direction(&mut self, angle: f64) {
        debug_assert!(self.can_change_direction(angle));
        self.direction += angle;
    }

    /// Unit vector along the facing direction
    #[inline]
    pub fn heading(&self) -> DVec2 {
        DVec2::from_angle(self.direction)
    }
}
