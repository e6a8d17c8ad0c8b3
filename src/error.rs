//! Error kinds for the simulation
//!
//! Every failure is a precondition violation reported to the caller before
//! any state changes. None are retried internally.

use thiserror::Error;

use crate::sim::WormId;

/// Errors surfaced by world construction, placement and actions
#[derive(Debug, Error)]
pub enum SimError {
    #[error("radius {0} is not a valid radius")]
    InvalidRadius(f64),
    #[error("name {0:?} is not a valid worm name")]
    InvalidName(String),
    #[error("yield {0} must be between 0 and 100")]
    InvalidYield(u32),
    #[error("world size {width}x{height} with a {columns}x{rows} raster is not valid")]
    InvalidSize {
        width: f64,
        height: f64,
        columns: usize,
        rows: usize,
    },
    #[error("coordinate {0} is not a number")]
    InvalidCoordinate(f64),
    #[error("position ({x}, {y}) with radius {radius} is not a legal resting place")]
    IllegalPlacement { x: f64, y: f64, radius: f64 },
    #[error("illegal game state: {0}")]
    IllegalGameState(&'static str),
    #[error("worm {0} cannot move")]
    IllegalMove(WormId),
    #[error("worm {0} cannot turn by {1} rad")]
    IllegalTurn(WormId, f64),
    #[error("jump not possible: {0}")]
    IllegalJump(&'static str),
    #[error("worm {0} cannot shoot")]
    IllegalShoot(WormId),
    #[error("no worm with id {0}")]
    UnknownWorm(WormId),
    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias for simulation results
pub type SimResult<T> = Result<T, SimError>;
