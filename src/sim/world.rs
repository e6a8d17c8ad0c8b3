//! World state and the turn state machine
//!
//! The world owns the terrain, the worm roster, the projectile slot and the
//! seeded RNG. It is the only place that mutates actors; every action is
//! validated before anything changes.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::actor::{Projectile, Worm, WormId};
use super::ballistics::{self, Fall, Launch, MoveOutcome, Surroundings};
use super::geometry::{Position, Vector};
use super::terrain::Terrain;
use crate::consts::WORM_MIN_RADIUS;
use crate::error::{SimError, SimResult};
use crate::settings::Settings;

/// Name reported when no worm is left standing
pub const ABSENT_WINNER: &str = "absent";

/// Current phase of the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Worms can be added; actions run as a sandbox without turns
    AwaitingStart,
    /// One worm acts at a time
    InTurn,
    /// At most one worm remains
    Ended,
}

/// A bounded world with terrain, worms and at most one projectile
#[derive(Debug, Clone)]
pub struct World {
    seed: u64,
    terrain: Terrain,
    /// Roster in turn order
    worms: Vec<Worm>,
    projectile: Option<Projectile>,
    phase: GamePhase,
    /// Index of the current worm; valid whenever the roster is non-empty
    current: usize,
    rng: Pcg32,
    settings: Settings,
    next_id: u32,
    /// Counter for generated worm names
    next_worm_number: u32,
}

impl World {
    /// Create a world with default settings
    pub fn new(width: f64, height: f64, raster: Vec<Vec<bool>>, seed: u64) -> SimResult<Self> {
        Self::with_settings(width, height, raster, seed, Settings::default())
    }

    pub fn with_settings(
        width: f64,
        height: f64,
        raster: Vec<Vec<bool>>,
        seed: u64,
        settings: Settings,
    ) -> SimResult<Self> {
        let terrain = Terrain::new(width, height, raster)?;
        let (columns, rows) = terrain.dimensions();
        log::debug!(
            "Created {}x{} m world ({}x{} raster, seed {})",
            width,
            height,
            columns,
            rows,
            seed
        );
        Ok(Self {
            seed,
            terrain,
            worms: Vec::new(),
            projectile: None,
            phase: GamePhase::AwaitingStart,
            current: 0,
            rng: Pcg32::seed_from_u64(seed),
            settings,
            next_id: 1,
            next_worm_number: 1,
        })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn terrain(&self) -> &Terrain {
        &self.terrain
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn is_game_finished(&self) -> bool {
        self.phase == GamePhase::Ended
    }

    /// Name of the first remaining worm, or `"absent"` if none is left
    pub fn winner_name(&self) -> &str {
        self.worms.first().map_or(ABSENT_WINNER, Worm::name)
    }

    pub fn worms(&self) -> &[Worm] {
        &self.worms
    }

    pub fn worm(&self, id: WormId) -> SimResult<&Worm> {
        self.index_of(id)
            .map(|i| &self.worms[i])
            .ok_or(SimError::UnknownWorm(id))
    }

    /// The worm whose turn it is, while the game is running
    pub fn current_worm(&self) -> Option<&Worm> {
        match self.phase {
            GamePhase::InTurn => self.worms.get(self.current),
            _ => None,
        }
    }

    pub fn active_projectile(&self) -> Option<&Projectile> {
        self.projectile.as_ref()
    }

    /// Whether a circle at (x, y) is fully in the world on passable terrain
    pub fn is_passable(&self, x: f64, y: f64, radius: f64) -> SimResult<bool> {
        Ok(self.terrain.is_passable_spot(&Position::new(x, y)?, radius))
    }

    /// Whether a circle at (x, y) rests against impassable terrain
    pub fn is_adjacent(&self, x: f64, y: f64, radius: f64) -> SimResult<bool> {
        Ok(self.terrain.is_adjacent_position(&Position::new(x, y)?, radius))
    }

    fn index_of(&self, id: WormId) -> Option<usize> {
        self.worms.iter().position(|w| w.id() == id)
    }

    fn projectile_in_flight(&self) -> bool {
        self.projectile.as_ref().is_some_and(Projectile::is_active)
    }

    fn allocate_id(&mut self) -> WormId {
        let id = WormId::new(self.next_id);
        self.next_id += 1;
        id
    }

    /// Roster index of `id` if that worm may act now.
    ///
    /// While the game runs only the current worm acts; before it starts any
    /// worm may; once it has ended none may.
    fn acting_index(&self, id: WormId) -> SimResult<usize> {
        let index = self.index_of(id).ok_or(SimError::UnknownWorm(id))?;
        match self.phase {
            GamePhase::Ended => Err(SimError::IllegalGameState("the game has ended")),
            GamePhase::InTurn if index != self.current => {
                Err(SimError::IllegalGameState("it is not this worm's turn"))
            }
            _ => Ok(index),
        }
    }

    fn ensure_not_ended(&self) -> SimResult<()> {
        if self.phase == GamePhase::Ended {
            return Err(SimError::IllegalGameState("the game has ended"));
        }
        Ok(())
    }

    // --- Placement ---

    /// Place a worm resting on terrain. Only allowed before the game starts.
    pub fn add_worm(
        &mut self,
        x: f64,
        y: f64,
        direction: f64,
        radius: f64,
        name: &str,
    ) -> SimResult<WormId> {
        if self.phase != GamePhase::AwaitingStart {
            return Err(SimError::IllegalGameState("worms can only be added before the game starts"));
        }
        let vector = Vector::new(Position::new(x, y)?, direction)?;
        let worm = Worm::new(WormId::new(self.next_id), vector, radius, name)?;
        let pos = worm.position();
        if !self.terrain.lies_within_world(&pos, radius)
            || !self.terrain.is_adjacent_position(&pos, radius)
        {
            return Err(SimError::IllegalPlacement { x, y, radius });
        }

        let id = self.allocate_id();
        log::debug!("Added {} {} at ({:.3}, {:.3})", worm.name(), id, x, y);
        self.worms.push(worm);
        Ok(id)
    }

    /// Place a worm of random size and facing, walking from a random point
    /// toward the world centre until it rests on terrain.
    pub fn add_random_worm(&mut self) -> SimResult<WormId> {
        if self.phase != GamePhase::AwaitingStart {
            return Err(SimError::IllegalGameState("worms can only be added before the game starts"));
        }
        let x = self.rng.random::<f64>() * self.terrain.width();
        let y = self.rng.random::<f64>() * self.terrain.height();
        let radius = WORM_MIN_RADIUS + WORM_MIN_RADIUS * self.rng.random::<f64>();
        let direction = std::f64::consts::TAU * self.rng.random::<f64>();

        let start = Position::new(x, y)?;
        let spot = self
            .terrain
            .find_adjacent_position(&start, radius, self.settings.max_search_steps)
            .filter(|p| self.terrain.lies_within_world(p, radius))
            .ok_or(SimError::IllegalPlacement { x, y, radius })?;

        let name = format!("Worm {}", self.next_worm_number);
        let id = self.add_worm(spot.x(), spot.y(), direction, radius, &name)?;
        self.next_worm_number += 1;
        Ok(id)
    }

    // --- Turns ---

    /// Begin the first turn
    pub fn start_game(&mut self) -> SimResult<()> {
        if self.phase != GamePhase::AwaitingStart {
            return Err(SimError::IllegalGameState("the game has already started"));
        }
        if self.projectile_in_flight() {
            return Err(SimError::IllegalGameState("a projectile is in flight"));
        }
        if self.worms.is_empty() {
            return Err(SimError::IllegalGameState("no worms to play with"));
        }

        self.projectile = None;
        self.current = 0;
        self.phase = GamePhase::InTurn;
        self.worms[0].initialize_for_turn();
        log::info!(
            "Game started with {} worms, {} goes first",
            self.worms.len(),
            self.worms[0].name()
        );
        Ok(())
    }

    /// End the current turn: reap dead worms, then hand the turn to the next
    /// surviving worm or end the game.
    pub fn start_next_turn(&mut self) -> SimResult<()> {
        if self.phase != GamePhase::InTurn {
            return Err(SimError::IllegalGameState("the game is not running"));
        }
        if self.projectile_in_flight() {
            return Err(SimError::IllegalGameState("a projectile is in flight"));
        }
        self.projectile = None;

        // Turn order after the current worm, ending with it
        let n = self.worms.len();
        let rotation: Vec<WormId> = (1..=n)
            .map(|k| self.worms[(self.current + k) % n].id())
            .collect();

        self.reap_dead_worms();
        if self.phase == GamePhase::Ended {
            return Ok(());
        }

        self.current = rotation
            .iter()
            .find_map(|&id| self.index_of(id))
            .unwrap_or(0);
        let worm = &mut self.worms[self.current];
        worm.initialize_for_turn();
        log::info!(
            "Turn passes to {} ({} AP, {} HP)",
            worm.name(),
            worm.action_points(),
            worm.hit_points()
        );
        Ok(())
    }

    /// Drop worms that are out of hit points or no longer active. The current
    /// index keeps pointing at the same worm when it survives. A running game
    /// ends as soon as at most one worm is left.
    fn reap_dead_worms(&mut self) {
        let current = self.worms.get(self.current).map(Worm::id);
        self.worms.retain_mut(|worm| {
            if worm.is_alive() {
                return true;
            }
            worm.deactivate();
            log::debug!("{} {} removed from the roster", worm.name(), worm.id());
            false
        });
        self.current = current.and_then(|id| self.index_of(id)).unwrap_or(0);
        if self.phase == GamePhase::InTurn && self.worms.len() <= 1 {
            self.end_game();
        }
    }

    /// Nothing stays in flight once the game is over
    fn end_game(&mut self) {
        self.phase = GamePhase::Ended;
        self.current = 0;
        self.projectile = None;
        log::info!("Game over, winner: {}", self.winner_name());
    }

    /// Hand over the turn once `id`, the current worm, is spent. Deferred while
    /// a projectile is in flight.
    fn advance_if_spent(&mut self, id: WormId) -> SimResult<()> {
        if self.phase != GamePhase::InTurn || self.projectile_in_flight() {
            return Ok(());
        }
        let Some(worm) = self.worms.get(self.current) else {
            return Ok(());
        };
        if worm.id() == id
            && (worm.action_points() == 0 || worm.hit_points() == 0 || !worm.is_active())
        {
            self.start_next_turn()?;
        }
        Ok(())
    }

    // --- Moving ---

    pub fn can_move(&self, id: WormId) -> bool {
        self.plan_move(id).is_ok()
    }

    fn plan_move(&self, id: WormId) -> SimResult<(usize, MoveOutcome, u32)> {
        let index = self.acting_index(id)?;
        let worm = &self.worms[index];
        if !worm.is_alive() || worm.action_points() == 0 || self.projectile_in_flight() {
            return Err(SimError::IllegalMove(id));
        }
        let outcome = ballistics::find_move(&self.terrain, &worm.body.vector, worm.radius());
        let cost = ballistics::move_cost(&worm.position(), &outcome.position());
        if cost > worm.action_points() {
            return Err(SimError::IllegalMove(id));
        }
        Ok((index, outcome, cost))
    }

    /// Step along the facing direction, preferring spots that rest on terrain
    pub fn move_worm(&mut self, id: WormId) -> SimResult<MoveOutcome> {
        let (index, outcome, cost) = self.plan_move(id)?;
        let worm = &mut self.worms[index];
        let dest = outcome.position();
        worm.body.vector.position = dest;
        worm.use_action_points(cost);
        if !self.terrain.lies_within_world(&dest, worm.radius()) {
            worm.deactivate();
        }
        log::debug!(
            "{} moved to ({:.3}, {:.3}) for {} AP: {:?}",
            worm.name(),
            dest.x(),
            dest.y(),
            cost,
            outcome
        );
        self.advance_if_spent(id)?;
        Ok(outcome)
    }

    // --- Turning ---

    pub fn can_turn(&self, id: WormId, angle: f64) -> bool {
        self.plan_turn(id, angle).is_ok()
    }

    fn plan_turn(&self, id: WormId, angle: f64) -> SimResult<(usize, u32)> {
        let index = self.acting_index(id)?;
        let worm = &self.worms[index];
        if !worm.is_alive()
            || self.projectile_in_flight()
            || !worm.body.vector.can_change_direction(angle)
        {
            return Err(SimError::IllegalTurn(id, angle));
        }
        let cost = ballistics::turn_cost(angle);
        if cost > worm.action_points() {
            return Err(SimError::IllegalTurn(id, angle));
        }
        Ok((index, cost))
    }

    /// Turn by `angle` radians
    pub fn turn_worm(&mut self, id: WormId, angle: f64) -> SimResult<()> {
        let (index, cost) = self.plan_turn(id, angle)?;
        let worm = &mut self.worms[index];
        worm.body.vector.change_direction(angle);
        worm.use_action_points(cost);
        log::debug!(
            "{} turned to {:.3} rad for {} AP",
            worm.name(),
            worm.direction(),
            cost
        );
        self.advance_if_spent(id)
    }

    // --- Jumping ---

    fn worm_surroundings(&self) -> Surroundings<'_> {
        Surroundings {
            terrain: &self.terrain,
            worms: &self.worms,
            shooter: None,
        }
    }

    /// Flight time of a jump by `id` with its current action points
    pub fn worm_jump_time(&self, id: WormId, time_step: f64) -> SimResult<f64> {
        let worm = self.worm(id)?;
        ballistics::jump_time(
            &Launch::worm(worm),
            &self.worm_surroundings(),
            time_step,
            self.settings.max_jump_steps,
        )
    }

    /// Where a jump by `id` would be after `t` seconds
    pub fn worm_jump_step(&self, id: WormId, t: f64) -> SimResult<Position> {
        if !(t >= 0.0 && t.is_finite()) {
            return Err(SimError::IllegalJump("time must be finite and not negative"));
        }
        let worm = self.worm(id)?;
        Ok(ballistics::trajectory(&Launch::worm(worm)).position_at(t))
    }

    pub fn can_jump(&self, id: WormId) -> bool {
        self.plan_jump(id, self.settings.jump_time_step).is_ok()
    }

    fn plan_jump(&self, id: WormId, time_step: f64) -> SimResult<(usize, Position)> {
        let index = self.acting_index(id)?;
        let worm = &self.worms[index];
        if !worm.is_alive() {
            return Err(SimError::IllegalJump("the worm is out of the game"));
        }
        if worm.action_points() == 0 {
            return Err(SimError::IllegalJump("the worm has no action points left"));
        }
        if self.projectile_in_flight() {
            return Err(SimError::IllegalJump("a projectile is in flight"));
        }
        if !self
            .terrain
            .is_passable_spot(&worm.position(), worm.radius())
        {
            return Err(SimError::IllegalJump("the worm is stuck in terrain"));
        }
        let t = self.worm_jump_time(id, time_step)?;
        Ok((index, self.worm_jump_step(id, t)?))
    }

    /// Jump along the facing direction; spends all remaining action points
    pub fn jump_worm(&mut self, id: WormId, time_step: f64) -> SimResult<Position> {
        let (index, landing) = self.plan_jump(id, time_step)?;
        let worm = &mut self.worms[index];
        worm.body.vector.position = landing;
        worm.use_action_points(worm.action_points());
        if !self.terrain.lies_within_world(&landing, worm.radius()) {
            worm.deactivate();
        }
        log::debug!(
            "{} jumped to ({:.3}, {:.3})",
            worm.name(),
            landing.x(),
            landing.y()
        );
        self.advance_if_spent(id)?;
        Ok(landing)
    }

    // --- Falling ---

    pub fn can_fall(&self, id: WormId) -> bool {
        self.plan_fall(id).is_ok()
    }

    fn plan_fall(&self, id: WormId) -> SimResult<usize> {
        let index = self.acting_index(id)?;
        let worm = &self.worms[index];
        if !worm.is_alive()
            || self.projectile_in_flight()
            || !ballistics::can_fall(&self.terrain, &worm.body)
        {
            return Err(SimError::IllegalMove(id));
        }
        Ok(index)
    }

    /// Drop until resting on terrain, taking damage per meter fallen
    pub fn fall_worm(&mut self, id: WormId) -> SimResult<Fall> {
        let index = self.plan_fall(id)?;
        let worm = &mut self.worms[index];
        let fall = ballistics::fall(&self.terrain, &worm.body, self.settings.max_fall_steps);
        worm.body.vector.position = fall.landing;
        if fall.left_world {
            worm.deactivate();
        }
        worm.deduct_hit_points(fall.damage());
        log::debug!(
            "{} fell {:.3} m for {} damage{}",
            worm.name(),
            fall.drop,
            fall.damage(),
            if fall.left_world { ", out of the world" } else { "" }
        );
        self.advance_if_spent(id)?;
        Ok(fall)
    }

    // --- Weapons ---

    /// Cycle to the next weapon; costs nothing
    pub fn select_next_weapon(&mut self, id: WormId) -> SimResult<()> {
        let index = self.acting_index(id)?;
        let worm = &mut self.worms[index];
        worm.select_next_weapon();
        log::debug!("{} selected {}", worm.name(), worm.selected_weapon_name());
        Ok(())
    }

    pub fn can_shoot(&self, id: WormId, yield_: u32) -> bool {
        Projectile::is_valid_yield(yield_) && self.plan_shot(id).is_ok()
    }

    fn plan_shot(&self, id: WormId) -> SimResult<usize> {
        let index = self.acting_index(id)?;
        let worm = &self.worms[index];
        if !worm.is_alive()
            || worm.action_points() < worm.selected_weapon().cost
            || !self
                .terrain
                .is_passable_spot(&worm.position(), worm.radius())
            || self.projectile.is_some()
        {
            return Err(SimError::IllegalShoot(id));
        }
        Ok(index)
    }

    /// Fire the selected weapon. The projectile stays in flight until
    /// [`World::jump_projectile`].
    pub fn shoot(&mut self, id: WormId, yield_: u32) -> SimResult<()> {
        if !Projectile::is_valid_yield(yield_) {
            return Err(SimError::InvalidYield(yield_));
        }
        let index = self.plan_shot(id)?;
        let worm = &mut self.worms[index];
        let weapon = worm.selected_weapon().clone();
        let projectile = Projectile::new(worm, weapon, yield_)?;
        worm.use_action_points(projectile.weapon().cost);
        log::debug!(
            "{} fired the {} at yield {}",
            worm.name(),
            projectile.weapon().name,
            yield_
        );
        self.projectile = Some(projectile);

        // Ends the game, dropping the shot, if no opponent is left standing
        self.reap_dead_worms();
        self.advance_if_spent(id)
    }

    fn projectile_surroundings(&self) -> SimResult<(Launch<'_>, Surroundings<'_>)> {
        let projectile = self
            .projectile
            .as_ref()
            .filter(|p| p.is_active())
            .ok_or(SimError::IllegalJump("no projectile in flight"))?;
        let env = Surroundings {
            terrain: &self.terrain,
            worms: &self.worms,
            shooter: Some(projectile.shooter()),
        };
        Ok((Launch::projectile(projectile), env))
    }

    /// Flight time of the projectile in flight
    pub fn projectile_jump_time(&self, time_step: f64) -> SimResult<f64> {
        let (launch, env) = self.projectile_surroundings()?;
        ballistics::jump_time(&launch, &env, time_step, self.settings.max_jump_steps)
    }

    /// Fly the projectile to where it stops. The first worm other than the
    /// shooter it overlaps there takes the weapon's damage. Returns that
    /// worm, if any.
    pub fn jump_projectile(&mut self, time_step: f64) -> SimResult<Option<WormId>> {
        self.ensure_not_ended()?;
        let t = self.projectile_jump_time(time_step)?;
        let Some(mut projectile) = self.projectile.take() else {
            return Err(SimError::IllegalJump("no projectile in flight"));
        };

        let landing = ballistics::trajectory(&Launch::projectile(&projectile)).position_at(t);
        projectile.body.vector.position = landing;
        let hit = ballistics::overlapped_worm(
            &self.worms,
            Some(projectile.shooter()),
            &projectile.body,
            &landing,
        );
        projectile.deactivate();

        let hit_id = hit.map(|i| {
            let target = &mut self.worms[i];
            target.deduct_hit_points(projectile.weapon().damage);
            log::debug!(
                "{} hit {} for {} damage ({} HP left)",
                projectile.weapon().name,
                target.name(),
                projectile.weapon().damage,
                target.hit_points()
            );
            target.id()
        });
        if hit_id.is_none() {
            log::debug!(
                "{} landed at ({:.3}, {:.3})",
                projectile.weapon().name,
                landing.x(),
                landing.y()
            );
        }

        self.advance_if_spent(projectile.shooter())?;
        Ok(hit_id)
    }

    // --- Administrative changes ---

    /// Take hit points from a worm. Never ends a turn by itself; dead worms
    /// leave the roster at the next turn boundary.
    pub fn deduct_hit_points(&mut self, id: WormId, amount: u32) -> SimResult<()> {
        self.ensure_not_ended()?;
        let index = self.index_of(id).ok_or(SimError::UnknownWorm(id))?;
        self.worms[index].deduct_hit_points(amount);
        Ok(())
    }

    pub fn set_worm_radius(&mut self, id: WormId, radius: f64) -> SimResult<()> {
        self.ensure_not_ended()?;
        let index = self.index_of(id).ok_or(SimError::UnknownWorm(id))?;
        self.worms[index].set_radius(radius)
    }

    pub fn rename_worm(&mut self, id: WormId, name: &str) -> SimResult<()> {
        self.ensure_not_ended()?;
        let index = self.index_of(id).ok_or(SimError::UnknownWorm(id))?;
        self.worms[index].rename(name)
    }

    // --- Snapshots ---

    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            seed: self.seed,
            width: self.terrain.width(),
            height: self.terrain.height(),
            phase: self.phase,
            current_worm: self.current_worm().map(Worm::id),
            worms: self.worms.clone(),
            projectile: self.projectile.clone(),
            winner: self.is_game_finished().then(|| self.winner_name().to_string()),
        }
    }
}

/// Serializable view of a world at one moment
#[derive(Debug, Clone, Serialize)]
pub struct WorldSnapshot {
    pub seed: u64,
    pub width: f64,
    pub height: f64,
    pub phase: GamePhase,
    pub current_worm: Option<WormId>,
    pub worms: Vec<Worm>,
    pub projectile: Option<Projectile>,
    pub winner: Option<String>,
}

impl WorldSnapshot {
    pub fn to_json(&self) -> SimResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
