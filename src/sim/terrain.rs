//! Raster-backed terrain queries
//!
//! The raster is stored row-major with row 0 at the top of the world, so the
//! vertical axis is flipped when converting from meters.

use crate::consts::{ADJACENCY_BAND, ADJACENCY_STEP, EPSILON};
use crate::error::{SimError, SimResult};

use super::geometry::Position;

/// World bounds plus the passability raster
#[derive(Debug, Clone)]
pub struct Terrain {
    width: f64,
    height: f64,
    columns: usize,
    rows: usize,
    /// Row-major passability, `rows * columns` cells
    cells: Vec<bool>,
}

impl Terrain {
    /// Build terrain from world dimensions and a rectangular raster.
    ///
    /// Width and height must be finite and non-negative; the raster must have
    /// at least one cell and all rows must have the same length.
    pub fn new(width: f64, height: f64, raster: Vec<Vec<bool>>) -> SimResult<Self> {
        let rows = raster.len();
        let columns = raster.first().map_or(0, Vec::len);
        let invalid = || SimError::InvalidSize {
            width,
            height,
            columns,
            rows,
        };

        if !is_valid_dimension(width) || !is_valid_dimension(height) {
            return Err(invalid());
        }
        if rows == 0 || columns == 0 || raster.iter().any(|row| row.len() != columns) {
            return Err(invalid());
        }

        Ok(Self {
            width,
            height,
            columns,
            rows,
            cells: raster.into_iter().flatten().collect(),
        })
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Raster size as (columns, rows)
    #[inline]
    pub fn dimensions(&self) -> (usize, usize) {
        (self.columns, self.rows)
    }

    /// Meters per raster column
    #[inline]
    pub fn width_scale(&self) -> f64 {
        self.width / self.columns as f64
    }

    /// Meters per raster row
    #[inline]
    pub fn height_scale(&self) -> f64 {
        self.height / self.rows as f64
    }

    /// Smaller of the two axis scales
    #[inline]
    pub fn min_scale(&self) -> f64 {
        self.width_scale().min(self.height_scale())
    }

    pub fn center(&self) -> Position {
        Position::from_vec(glam::DVec2::new(self.width / 2.0, self.height / 2.0))
    }

    /// Raw raster lookup; row 0 is the top row
    pub fn cell(&self, column: usize, row: usize) -> Option<bool> {
        if column < self.columns && row < self.rows {
            self.cells.get(row * self.columns + column).copied()
        } else {
            None
        }
    }

    /// Whether a circle of `radius` at `pos` fits inside `[0,w] x [0,h]`
    pub fn lies_within_world(&self, pos: &Position, radius: f64) -> bool {
        pos.x() - radius >= 0.0
            && pos.y() - radius >= 0.0
            && pos.x() + radius <= self.width
            && pos.y() + radius <= self.height
    }

    /// Whether the raster cell containing `pos` is passable.
    ///
    /// Points mapping outside the raster are impassable.
    pub fn is_passable_position(&self, pos: &Position) -> bool {
        let (column, row_from_bottom) = pos.to_pixel(self.width_scale(), self.height_scale());
        let row = self.rows as i64 - row_from_bottom;
        if column < 0 || row < 0 {
            return false;
        }
        self.cell(column as usize, row as usize).unwrap_or(false)
    }

    /// Whether every sample on the circle lies in the world on passable terrain
    pub fn is_passable_spot(&self, center: &Position, radius: f64) -> bool {
        center
            .circular_positions(radius)
            .all(|p| self.lies_within_world(&p, 0.0) && self.is_passable_position(&p))
    }

    #[inline]
    pub fn is_impassable_spot(&self, center: &Position, radius: f64) -> bool {
        !self.is_passable_spot(center, radius)
    }

    /// Whether a circle at `pos` is open but touches impassable terrain within
    /// a thin band just outside it, i.e. it rests on the terrain.
    pub fn is_adjacent_position(&self, pos: &Position, radius: f64) -> bool {
        if !self.is_passable_spot(pos, radius) {
            return false;
        }
        let steps = (ADJACENCY_BAND / ADJACENCY_STEP).round() as u32;
        (1..=steps)
            .map(|k| radius * (1.0 + k as f64 * ADJACENCY_STEP))
            .any(|r| !self.is_passable_spot(pos, r))
    }

    /// Walk from `from` toward the world centre until an adjacent position is
    /// found.
    ///
    /// Returns `None` when the walk reaches within `radius` of the centre or
    /// when `max_steps` iterations pass without success.
    pub fn find_adjacent_position(
        &self,
        from: &Position,
        radius: f64,
        max_steps: u32,
    ) -> Option<Position> {
        let center = self.center().as_vec();
        let step = EPSILON * 10.0;
        let mut current = from.as_vec();

        for _ in 0..max_steps {
            let pos = Position::from_vec(current);
            if center.distance(current) <= radius {
                return None;
            }
            if self.is_adjacent_position(&pos, radius) {
                return Some(pos);
            }
            let delta = center - current;
            current.x += delta.x.signum() * step.min(delta.x.abs());
            current.y += delta.y.signum() * step.min(delta.y.abs());
        }

        log::warn!(
            "Adjacent search from ({:.3}, {:.3}) gave up after {} steps",
            from.x(),
            from.y(),
            max_steps
        );
        None
    }
}

fn is_valid_dimension(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}
