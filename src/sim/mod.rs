//! Deterministic simulation module
//!
//! All game logic lives here:
//! - Geometry and raster terrain queries
//! - Worms, projectiles and the weapon catalog
//! - Ballistic arcs, falling and the move search
//! - The world and its turn state machine
//!
//! Randomness only comes from the world's seeded RNG.

pub mod actor;
pub mod ballistics;
pub mod geometry;
pub mod terrain;
pub mod weapon;
pub mod world;

pub use actor::{ActorKind, Body, Projectile, Worm, WormId};
pub use ballistics::{Fall, JumpStrategy, Launch, MoveOutcome, Propulsion, Trajectory};
pub use geometry::{CircularPositions, Position, Vector};
pub use terrain::Terrain;
pub use weapon::{ForceLaw, Weapon};
pub use world::{ABSENT_WINNER, GamePhase, World, WorldSnapshot};
