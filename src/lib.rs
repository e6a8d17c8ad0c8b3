//! Worms Sim - A turn-based artillery simulation
//!
//! Core modules:
//! - `sim`: Terrain-aware ballistics and the turn state machine
//! - `settings`: Tunable search caps, loadable from JSON
//! - `error`: Error kinds reported by every fallible operation

pub mod error;
pub mod settings;
pub mod sim;

pub use error::{SimError, SimResult};
pub use settings::Settings;

/// Simulation constants
pub mod consts {
    /// Standard gravitational acceleration on Earth (m/s²)
    pub const GRAVITY: f64 = 9.80665;

    /// Tolerance used to keep circular samples strictly inside a circle
    pub const EPSILON: f64 = 1e-4;

    /// Angle between two samples when probing a spot (16 samples per circle)
    pub const SPOT_ANGLE_STEP: f64 = std::f64::consts::PI / 8.0;

    /// Worm body density (kg/m³)
    pub const WORM_DENSITY: f64 = 1062.0;
    /// Smallest radius a worm may have (m)
    pub const WORM_MIN_RADIUS: f64 = 0.25;
    /// Largest radius a worm may have (m); its mass still rounds to a `u32`
    /// point count
    pub const WORM_MAX_RADIUS: f64 = 98.0;
    /// Hit points regained at the start of each of a worm's turns
    pub const TURN_REGEN_HP: u32 = 10;
    /// Damage multiplier per meter fallen
    pub const FALL_DAMAGE_PER_METER: u32 = 3;

    /// Projectile material density (kg/m³)
    pub const PROJECTILE_DENSITY: f64 = 7800.0;
    /// Inclusive yield range for variable-force weapons
    pub const MIN_YIELD: u32 = 0;
    pub const MAX_YIELD: u32 = 100;

    /// Move search: half-width of the cone around the facing direction (rad)
    pub const MOVE_CONE_HALF_WIDTH: f64 = 0.7875;
    /// Move search: angular step inside the cone (rad)
    pub const MOVE_CONE_STEP: f64 = 0.0175;
    /// Move search: shortest distance tried (m)
    pub const MOVE_MIN_DISTANCE: f64 = 0.1;

    /// Adjacency band: probe radii up to `radius * (1 + ADJACENCY_BAND)`
    pub const ADJACENCY_BAND: f64 = 0.1;
    /// Adjacency band: relative step between probed radii
    pub const ADJACENCY_STEP: f64 = 0.01;
}

/// Mass of a solid sphere of the given density and radius
#[inline]
pub fn mass_for_radius(density: f64, radius: f64) -> f64 {
    density * (4.0 / 3.0) * std::f64::consts::PI * radius.powi(3)
}

/// Radius of a solid sphere of the given density and mass
#[inline]
pub fn radius_for_mass(density: f64, mass: f64) -> f64 {
    (3.0 * (mass / density) / (4.0 * std::f64::consts::PI)).cbrt()
}

/// Round a non-negative mass to the nearest whole point count, saturating at
/// `u32::MAX`
#[inline]
pub fn points_for_mass(mass: f64) -> u32 {
    mass.round() as u32
}
