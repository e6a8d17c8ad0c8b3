//! Worms and projectiles
//!
//! Both kinds share a [`Body`] (mass, radius, activity, vector) tagged with
//! its [`ActorKind`]; kind-specific state lives in [`Worm`] and
//! [`Projectile`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{SimError, SimResult};
use crate::{mass_for_radius, points_for_mass, radius_for_mass};

use super::geometry::{Position, Vector};
use super::weapon::{Weapon, default_arsenal};

/// Stable worm identifier, unique within a world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WormId(u32);

impl WormId {
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for WormId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which kind of ballistic object a body belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActorKind {
    Worm,
    Projectile,
}

/// Fields shared by every ballistic object
#[derive(Debug, Clone, Serialize)]
pub struct Body {
    pub kind: ActorKind,
    /// Mass (kg), always derived from the radius and the kind's density
    mass: f64,
    /// Radius (m)
    radius: f64,
    active: bool,
    pub vector: Vector,
}

impl Body {
    fn new(kind: ActorKind, vector: Vector, radius: f64) -> Self {
        Self {
            kind,
            mass: mass_for_radius(Self::density(kind), radius),
            radius,
            active: true,
            vector,
        }
    }

    /// Material density for a kind (kg/m³)
    pub const fn density(kind: ActorKind) -> f64 {
        match kind {
            ActorKind::Worm => WORM_DENSITY,
            ActorKind::Projectile => PROJECTILE_DENSITY,
        }
    }

    #[inline]
    pub fn mass(&self) -> f64 {
        self.mass
    }

    #[inline]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[inline]
    pub fn position(&self) -> Position {
        self.vector.position
    }

    #[inline]
    pub fn direction(&self) -> f64 {
        self.vector.direction()
    }

    pub(crate) fn deactivate(&mut self) {
        self.active = false;
    }

    /// Whether `other`, centred at `at`, overlaps this body
    pub fn overlaps_with(&self, other: &Body, at: &Position) -> bool {
        self.position().distance_to(at) < self.radius + other.radius
    }

    fn set_radius(&mut self, radius: f64) {
        self.radius = radius;
        self.mass = mass_for_radius(Self::density(self.kind), radius);
    }
}

/// A worm: the player-controlled actor
#[derive(Debug, Clone, Serialize)]
pub struct Worm {
    id: WormId,
    pub body: Body,
    name: String,
    action_points: u32,
    max_action_points: u32,
    hit_points: u32,
    max_hit_points: u32,
    weapons: Vec<Weapon>,
    selected_weapon: usize,
}

impl Worm {
    /// Create a worm with full action and hit points and the default arsenal
    pub fn new(id: WormId, vector: Vector, radius: f64, name: &str) -> SimResult<Self> {
        if !Self::can_have_as_radius(radius) {
            return Err(SimError::InvalidRadius(radius));
        }
        if !Self::is_valid_name(name) {
            return Err(SimError::InvalidName(name.to_string()));
        }
        let body = Body::new(ActorKind::Worm, vector, radius);
        let points = points_for_mass(body.mass());
        Ok(Self {
            id,
            body,
            name: name.to_string(),
            action_points: points,
            max_action_points: points,
            hit_points: points,
            max_hit_points: points,
            weapons: default_arsenal(),
            selected_weapon: 0,
        })
    }

    /// At least two characters, starting with an uppercase letter, using only
    /// letters, digits, spaces and quotes
    pub fn is_valid_name(name: &str) -> bool {
        let mut chars = name.chars();
        let Some(first) = chars.next() else {
            return false;
        };
        name.chars().count() >= 2
            && first.is_ascii_uppercase()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '\'' | '"'))
    }

    pub fn can_have_as_radius(radius: f64) -> bool {
        (WORM_MIN_RADIUS..=WORM_MAX_RADIUS).contains(&radius)
    }

    /// Whether the radius is valid and keeps current AP and HP within the
    /// recomputed maxima
    pub fn can_accept_radius(&self, radius: f64) -> bool {
        if !Self::can_have_as_radius(radius) {
            return false;
        }
        let points = points_for_mass(mass_for_radius(WORM_DENSITY, radius));
        points >= self.action_points && points >= self.hit_points
    }

    /// Change the radius, recomputing mass, max AP and max HP together
    pub fn set_radius(&mut self, radius: f64) -> SimResult<()> {
        if !self.can_accept_radius(radius) {
            return Err(SimError::InvalidRadius(radius));
        }
        self.body.set_radius(radius);
        let points = points_for_mass(self.body.mass());
        self.max_action_points = points;
        self.max_hit_points = points;
        Ok(())
    }

    pub fn rename(&mut self, name: &str) -> SimResult<()> {
        if !Self::is_valid_name(name) {
            return Err(SimError::InvalidName(name.to_string()));
        }
        self.name = name.to_string();
        Ok(())
    }

    #[inline]
    pub fn id(&self) -> WormId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn position(&self) -> Position {
        self.body.position()
    }

    #[inline]
    pub fn direction(&self) -> f64 {
        self.body.direction()
    }

    #[inline]
    pub fn radius(&self) -> f64 {
        self.body.radius()
    }

    #[inline]
    pub fn mass(&self) -> f64 {
        self.body.mass()
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.body.is_active()
    }

    /// Active and still has hit points
    pub fn is_alive(&self) -> bool {
        self.is_active() && self.hit_points > 0
    }

    pub fn action_points(&self) -> u32 {
        self.action_points
    }

    pub fn max_action_points(&self) -> u32 {
        self.max_action_points
    }

    pub fn hit_points(&self) -> u32 {
        self.hit_points
    }

    pub fn max_hit_points(&self) -> u32 {
        self.max_hit_points
    }

    /// Spend action points, bottoming out at zero
    pub fn use_action_points(&mut self, amount: u32) {
        self.action_points = self.action_points.saturating_sub(amount);
    }

    /// Take damage, bottoming out at zero
    pub fn deduct_hit_points(&mut self, amount: u32) {
        self.hit_points = self.hit_points.saturating_sub(amount);
    }

    /// Refill action points and regenerate some hit points
    pub fn initialize_for_turn(&mut self) {
        self.action_points = self.max_action_points;
        self.hit_points = self
            .hit_points
            .saturating_add(TURN_REGEN_HP)
            .min(self.max_hit_points);
    }

    pub fn weapons(&self) -> &[Weapon] {
        &self.weapons
    }

    pub fn selected_weapon(&self) -> &Weapon {
        &self.weapons[self.selected_weapon]
    }

    pub fn selected_weapon_name(&self) -> &'static str {
        self.selected_weapon().name
    }

    /// Cycle to the next weapon in the inventory
    pub fn select_next_weapon(&mut self) {
        self.selected_weapon = (self.selected_weapon + 1) % self.weapons.len();
    }

    pub(crate) fn deactivate(&mut self) {
        self.body.deactivate();
    }
}

/// A fired projectile
#[derive(Debug, Clone, Serialize)]
pub struct Projectile {
    pub body: Body,
    shooter: WormId,
    weapon: Weapon,
    #[serde(rename = "yield")]
    yield_: u32,
}

impl Projectile {
    pub fn is_valid_yield(yield_: u32) -> bool {
        (MIN_YIELD..=MAX_YIELD).contains(&yield_)
    }

    /// Radius of a solid projectile with the weapon's mass
    pub fn radius_for(weapon: &Weapon) -> f64 {
        radius_for_mass(PROJECTILE_DENSITY, weapon.mass)
    }

    /// Launch a projectile from the rim of `shooter` along its facing
    pub fn new(shooter: &Worm, weapon: Weapon, yield_: u32) -> SimResult<Self> {
        if !Self::is_valid_yield(yield_) {
            return Err(SimError::InvalidYield(yield_));
        }
        let origin = shooter
            .position()
            .offset(shooter.direction(), shooter.radius());
        let vector = Vector::new(origin, shooter.direction())?;
        let body = Body::new(ActorKind::Projectile, vector, Self::radius_for(&weapon));
        Ok(Self {
            body,
            shooter: shooter.id(),
            weapon,
            yield_,
        })
    }

    pub fn shooter(&self) -> WormId {
        self.shooter
    }

    pub fn weapon(&self) -> &Weapon {
        &self.weapon
    }

    pub fn yield_(&self) -> u32 {
        self.yield_
    }

    #[inline]
    pub fn position(&self) -> Position {
        self.body.position()
    }

    #[inline]
    pub fn radius(&self) -> f64 {
        self.body.radius()
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.body.is_active()
    }

    pub(crate) fn deactivate(&mut self) {
        self.body.deactivate();
    }
}
