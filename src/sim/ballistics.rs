//! Ballistic motion
//!
//! Closed-form jump arcs, the per-kind jump strategies, falling, the move
//! search and the action point cost formulas. Everything here is a pure
//! computation over borrowed state; the world applies the results.

use std::f64::consts::TAU;

use crate::consts::*;
use crate::error::{SimError, SimResult};

use super::actor::{ActorKind, Body, Projectile, Worm, WormId};
use super::geometry::{Position, Vector};
use super::terrain::Terrain;

/// Free-flight arc starting at `origin` with speed `velocity` along `direction`
#[derive(Debug, Clone, Copy)]
pub struct Trajectory {
    pub origin: Position,
    pub direction: f64,
    pub velocity: f64,
}

impl Trajectory {
    /// Position after `t` seconds of flight
    pub fn position_at(&self, t: f64) -> Position {
        let (sin, cos) = self.direction.sin_cos();
        Position::from_vec(glam::DVec2::new(
            self.origin.x() + self.velocity * cos * t,
            self.origin.y() + self.velocity * sin * t - 0.5 * GRAVITY * t * t,
        ))
    }
}

/// What drives a launch, per actor kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Propulsion {
    /// A worm jumps on its remaining action points
    Worm { action_points: u32 },
    /// A projectile leaves with its weapon's force at the fired yield (N)
    Projectile { force: f64 },
}

/// What a strategy needs to know about the actor being launched
#[derive(Debug, Clone, Copy)]
pub struct Launch<'a> {
    pub body: &'a Body,
    pub propulsion: Propulsion,
}

impl<'a> Launch<'a> {
    pub fn worm(worm: &'a Worm) -> Self {
        Self {
            body: &worm.body,
            propulsion: Propulsion::Worm {
                action_points: worm.action_points(),
            },
        }
    }

    pub fn projectile(projectile: &'a Projectile) -> Self {
        Self {
            body: &projectile.body,
            propulsion: Propulsion::Projectile {
                force: projectile.weapon().force(projectile.yield_()),
            },
        }
    }
}

/// Surroundings consulted by the termination predicates
#[derive(Debug, Clone, Copy)]
pub struct Surroundings<'a> {
    pub terrain: &'a Terrain,
    pub worms: &'a [Worm],
    /// Worm a projectile may pass through
    pub shooter: Option<WormId>,
}

/// Per-kind jump behaviour
pub struct JumpStrategy {
    pub kind: ActorKind,
    /// Launch force (N)
    pub jump_force: fn(&Launch<'_>) -> f64,
    /// Launch speed from force and propelled mass (m/s)
    pub initial_velocity: fn(force: f64, mass: f64) -> f64,
    /// Whether flight ends at `pos`
    pub is_finished: fn(&Surroundings<'_>, &Body, &Position) -> bool,
    /// Reject arcs that end within one radius of the launch point
    pub reject_short_jump: bool,
}

static WORM_JUMP: JumpStrategy = JumpStrategy {
    kind: ActorKind::Worm,
    jump_force: worm_jump_force,
    initial_velocity: half_impulse_velocity,
    is_finished: worm_jump_finished,
    reject_short_jump: true,
};

static PROJECTILE_JUMP: JumpStrategy = JumpStrategy {
    kind: ActorKind::Projectile,
    jump_force: projectile_jump_force,
    initial_velocity: half_impulse_velocity,
    is_finished: projectile_flight_finished,
    reject_short_jump: false,
};

impl ActorKind {
    pub fn strategy(self) -> &'static JumpStrategy {
        match self {
            ActorKind::Worm => &WORM_JUMP,
            ActorKind::Projectile => &PROJECTILE_JUMP,
        }
    }
}

// A launch whose propulsion belongs to the other kind has no force, so
// `jump_time` rejects it for lack of launch velocity.

fn worm_jump_force(launch: &Launch<'_>) -> f64 {
    match launch.propulsion {
        Propulsion::Worm { action_points } => {
            5.0 * f64::from(action_points) + launch.body.mass() * GRAVITY
        }
        Propulsion::Projectile { .. } => 0.0,
    }
}

fn projectile_jump_force(launch: &Launch<'_>) -> f64 {
    match launch.propulsion {
        Propulsion::Projectile { force } => force,
        Propulsion::Worm { .. } => 0.0,
    }
}

/// Force applied for half a second
fn half_impulse_velocity(force: f64, mass: f64) -> f64 {
    force / mass * 0.5
}

fn worm_jump_finished(env: &Surroundings<'_>, body: &Body, pos: &Position) -> bool {
    let radius = body.radius();
    !body.is_active()
        || env.terrain.is_adjacent_position(pos, radius)
        || !env.terrain.lies_within_world(pos, radius)
        || env.terrain.is_impassable_spot(pos, radius)
}

fn projectile_flight_finished(env: &Surroundings<'_>, body: &Body, pos: &Position) -> bool {
    let radius = body.radius();
    !env.terrain.lies_within_world(pos, radius)
        || env.terrain.is_impassable_spot(pos, radius)
        || !body.is_active()
        || overlapped_worm(env.worms, env.shooter, body, pos).is_some()
}

/// Index of the first worm other than `shooter` that `body` overlaps at `pos`
pub fn overlapped_worm(
    worms: &[Worm],
    shooter: Option<WormId>,
    body: &Body,
    pos: &Position,
) -> Option<usize> {
    worms
        .iter()
        .position(|w| Some(w.id()) != shooter && w.body.overlaps_with(body, pos))
}

/// Launch trajectory for an actor
pub fn trajectory(launch: &Launch<'_>) -> Trajectory {
    let strategy = launch.body.kind.strategy();
    let force = (strategy.jump_force)(launch);
    Trajectory {
        origin: launch.body.position(),
        direction: launch.body.direction(),
        velocity: (strategy.initial_velocity)(force, launch.body.mass()),
    }
}

/// Time of flight until the actor's termination predicate first holds.
///
/// Starts at `radius / v0` and advances by `time_step`, at most `max_steps`
/// times. Worm arcs that end within one radius of the launch point are
/// rejected.
pub fn jump_time(
    launch: &Launch<'_>,
    env: &Surroundings<'_>,
    time_step: f64,
    max_steps: u32,
) -> SimResult<f64> {
    if !(time_step > 0.0 && time_step.is_finite()) {
        return Err(SimError::IllegalJump("time step must be positive and finite"));
    }
    let strategy = launch.body.kind.strategy();
    let arc = trajectory(launch);
    if !(arc.velocity > 0.0 && arc.velocity.is_finite()) {
        return Err(SimError::IllegalJump("no launch velocity"));
    }

    let radius = launch.body.radius();
    let mut t = radius / arc.velocity;
    for _ in 0..max_steps {
        let pos = arc.position_at(t);
        if (strategy.is_finished)(env, launch.body, &pos) {
            if strategy.reject_short_jump && pos.distance_to(&arc.origin) < radius {
                return Err(SimError::IllegalJump("landing too close to the launch point"));
            }
            return Ok(t);
        }
        t += time_step;
    }

    log::warn!(
        "{:?} flight from ({:.3}, {:.3}) did not end within {} steps",
        strategy.kind,
        arc.origin.x(),
        arc.origin.y(),
        max_steps
    );
    Err(SimError::IllegalJump("flight did not end within the step cap"))
}

/// Result of letting a worm drop until it rests on terrain
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fall {
    pub landing: Position,
    /// Vertical distance covered (m)
    pub drop: f64,
    pub left_world: bool,
}

impl Fall {
    /// Hit points lost: a fixed amount per whole meter dropped, saturating at
    /// `u32::MAX`
    pub fn damage(&self) -> u32 {
        // Float-to-int casts saturate
        (f64::from(FALL_DAMAGE_PER_METER) * self.drop.floor()) as u32
    }
}

/// A worm can fall while it is active and not resting on terrain
pub fn can_fall(terrain: &Terrain, body: &Body) -> bool {
    body.is_active() && !terrain.is_adjacent_position(&body.position(), body.radius())
}

/// Lower the body one raster row at a time until it is adjacent to terrain or
/// leaves the world.
pub fn fall(terrain: &Terrain, body: &Body, max_steps: u32) -> Fall {
    let start = body.position();
    let radius = body.radius();
    let step = terrain.height_scale();
    let mut pos = start.as_vec();
    let mut left_world = false;

    let mut steps = 0;
    loop {
        let here = Position::from_vec(pos);
        if terrain.is_adjacent_position(&here, radius) {
            break;
        }
        if !terrain.lies_within_world(&here, radius) {
            left_world = true;
            break;
        }
        if steps == max_steps {
            log::warn!(
                "Fall from ({:.3}, {:.3}) stopped after {} steps",
                start.x(),
                start.y(),
                max_steps
            );
            break;
        }
        pos.y -= step;
        steps += 1;
    }

    let landing = Position::from_vec(pos);
    Fall {
        landing,
        drop: (start.y() - landing.y()).max(0.0),
        left_world,
    }
}

/// Where a move search ended up
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MoveOutcome {
    /// Largest step onto a spot resting on terrain
    Adjacent(Position),
    /// No resting spot; the largest open spot straight ahead
    Fallback(Position),
    /// Nothing reachable; stay put
    Stationary(Position),
}

impl MoveOutcome {
    pub fn position(&self) -> Position {
        match *self {
            MoveOutcome::Adjacent(p) | MoveOutcome::Fallback(p) | MoveOutcome::Stationary(p) => p,
        }
    }
}

/// Candidate step lengths, longest first: from `radius` down to the minimum
/// move distance in `step` decrements
fn move_distances(radius: f64, step: f64) -> impl Iterator<Item = f64> {
    let count = if step > 0.0 && step.is_finite() && radius >= MOVE_MIN_DISTANCE {
        ((radius - MOVE_MIN_DISTANCE) / step).floor() as usize + 1
    } else {
        1
    };
    (0..count).map(move |i| radius - i as f64 * step)
}

/// Angular offsets to try, nearest the facing first, each on both sides
fn move_deviations() -> impl Iterator<Item = f64> {
    let count = (MOVE_CONE_HALF_WIDTH / MOVE_CONE_STEP + 1e-9).floor() as usize + 1;
    (0..count).flat_map(|i| {
        let angle = i as f64 * MOVE_CONE_STEP;
        [-angle, angle]
    })
}

/// Search for the best step from `vector` for a worm of `radius`
pub fn find_move(terrain: &Terrain, vector: &Vector, radius: f64) -> MoveOutcome {
    let from = vector.position;
    let facing = vector.direction();

    for distance in move_distances(radius, terrain.min_scale()) {
        for deviation in move_deviations() {
            let candidate = from.offset(facing + deviation, distance);
            if terrain.is_adjacent_position(&candidate, radius) {
                return MoveOutcome::Adjacent(candidate);
            }
        }
    }

    move_distances(radius, terrain.min_scale())
        .map(|distance| from.offset(facing, distance))
        .find(|candidate| terrain.is_passable_spot(candidate, radius))
        .map_or(MoveOutcome::Stationary(from), MoveOutcome::Fallback)
}

/// Action points for a step from `from` to `to`
pub fn move_cost(from: &Position, to: &Position) -> u32 {
    let slope = to.slope(from);
    (slope.cos() + 4.0 * slope.sin()).abs().ceil() as u32
}

/// Action points for turning by `angle` radians
pub fn turn_cost(angle: f64) -> u32 {
    (angle / TAU * 60.0).abs().ceil() as u32
}
