//! Worms Sim headless demo
//!
//! Builds a seeded cave-floor world, scatters worms over it and lets a simple
//! aim-and-fire policy play until one worm is left.
//!
//! Usage: `worms-sim [seed] [settings.json]`. Set `RUST_LOG=debug` for a
//! play-by-play.

use std::f64::consts::{PI, TAU};
use std::process::ExitCode;

use worms_sim::sim::{GamePhase, World, WormId};
use worms_sim::{Settings, SimResult};

const WORLD_WIDTH: f64 = 40.0;
const WORLD_HEIGHT: f64 = 20.0;
const COLUMNS: usize = 80;
const ROWS: usize = 40;
const WORM_COUNT: usize = 4;
const PLACEMENT_ATTEMPTS: usize = 200;
const MAX_TURNS: usize = 300;
const SHOT_YIELD: u32 = 60;

fn main() -> ExitCode {
    env_logger::init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> SimResult<()> {
    let mut args = std::env::args().skip(1);
    let seed = args
        .next()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0x5EED);
    let settings = match args.next() {
        Some(path) => match std::fs::read_to_string(&path) {
            Ok(json) => Settings::from_json(&json)?,
            Err(e) => {
                log::warn!("Could not read {path}: {e}, using default settings");
                Settings::default()
            }
        },
        None => Settings::default(),
    };
    log::info!("Worms Sim starting (seed {seed}, {} precision)", settings.precision.as_str());

    let time_step = settings.jump_time_step;
    let mut world = World::with_settings(WORLD_WIDTH, WORLD_HEIGHT, cave_raster(), seed, settings)?;
    for _ in 0..PLACEMENT_ATTEMPTS {
        if world.worms().len() == WORM_COUNT {
            break;
        }
        if let Err(e) = world.add_random_worm() {
            log::debug!("Placement attempt failed: {e}");
        }
    }
    if world.worms().len() < 2 {
        log::warn!("Only {} worms could be placed", world.worms().len());
    }
    for worm in world.worms() {
        println!(
            "{:>8} at ({:5.2}, {:5.2}) radius {:.2}, {} HP",
            worm.name(),
            worm.position().x(),
            worm.position().y(),
            worm.radius(),
            worm.max_hit_points()
        );
    }

    world.start_game()?;
    let mut turns = 0;
    while world.phase() == GamePhase::InTurn && turns < MAX_TURNS {
        let Some(id) = world.current_worm().map(|w| w.id()) else {
            break;
        };
        play_turn(&mut world, id, time_step)?;
        // The turn may already have passed if the worm spent everything
        if world.phase() == GamePhase::InTurn && world.current_worm().map(|w| w.id()) == Some(id) {
            world.start_next_turn()?;
        }
        turns += 1;
    }

    if world.is_game_finished() {
        println!("Winner after {turns} turns: {}", world.winner_name());
    } else {
        println!("No winner after {turns} turns");
    }
    println!("{}", world.snapshot().to_json()?);
    Ok(())
}

/// Face the nearest opponent, fire the bazooka at it, then step toward it
fn play_turn(world: &mut World, id: WormId, time_step: f64) -> SimResult<()> {
    let Some(angle) = aim_at_nearest(world, id) else {
        return Ok(());
    };
    if world.can_turn(id, angle) {
        world.turn_worm(id, angle)?;
    }

    if world.worm(id)?.selected_weapon_name() != "Bazooka" {
        world.select_next_weapon(id)?;
    }
    if world.can_shoot(id, SHOT_YIELD) {
        world.shoot(id, SHOT_YIELD)?;
        match world.jump_projectile(time_step) {
            Ok(Some(target)) => log::info!("{} scored a hit on {}", id, target),
            Ok(None) => {}
            Err(e) => log::debug!("Shot fizzled: {e}"),
        }
    }

    for _ in 0..3 {
        if world.current_worm().map(|w| w.id()) != Some(id) || !world.can_move(id) {
            break;
        }
        world.move_worm(id)?;
        if world.can_fall(id) {
            world.fall_worm(id)?;
        }
    }
    Ok(())
}

/// Turn angle in (-π, π] that faces `id` toward its nearest opponent
fn aim_at_nearest(world: &World, id: WormId) -> Option<f64> {
    let me = world.worm(id).ok()?;
    let target = world
        .worms()
        .iter()
        .filter(|w| w.id() != id)
        .min_by(|a, b| {
            let da = a.position().distance_to(&me.position());
            let db = b.position().distance_to(&me.position());
            da.total_cmp(&db)
        })?;
    let delta = target.position().as_vec() - me.position().as_vec();
    let wanted = delta.y.atan2(delta.x);
    let mut angle = (wanted - me.direction()).rem_euclid(TAU);
    if angle > PI {
        angle -= TAU;
    }
    Some(angle)
}

/// Open cave over a rolling floor, with a rock shelf hanging from the left
fn cave_raster() -> Vec<Vec<bool>> {
    let row_height = WORLD_HEIGHT / ROWS as f64;
    let column_width = WORLD_WIDTH / COLUMNS as f64;
    (0..ROWS)
        .map(|row| {
            // Row 0 is the top of the world
            let y = WORLD_HEIGHT - (row as f64 + 0.5) * row_height;
            (0..COLUMNS)
                .map(|column| {
                    let x = (column as f64 + 0.5) * column_width;
                    let floor = 2.0 + 1.5 * (x / 6.0).sin() + 0.5 * (x / 2.3).cos();
                    let shelf = x < 12.0 && (11.0..12.0).contains(&y);
                    y > floor && !shelf
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cave_raster_has_sky_and_floor() {
        let raster = cave_raster();
        assert_eq!(raster.len(), ROWS);
        assert!(raster.iter().all(|row| row.len() == COLUMNS));
        assert!(raster[0].iter().all(|&open| open));
        assert!(raster[ROWS - 1].iter().all(|&open| !open));
    }

    #[test]
    fn test_demo_turns_play_out() {
        let settings = Settings::default();
        let time_step = settings.jump_time_step;
        let mut world =
            World::with_settings(WORLD_WIDTH, WORLD_HEIGHT, cave_raster(), 7, settings).unwrap();
        for _ in 0..PLACEMENT_ATTEMPTS {
            if world.worms().len() == WORM_COUNT {
                break;
            }
            let _ = world.add_random_worm();
        }
        assert!(world.worms().len() >= 2);

        world.start_game().unwrap();
        for _ in 0..8 {
            let Some(id) = world.current_worm().map(|w| w.id()) else {
                break;
            };
            assert!(aim_at_nearest(&world, id).is_some());
            play_turn(&mut world, id, time_step).unwrap();
            if world.phase() == GamePhase::InTurn
                && world.current_worm().map(|w| w.id()) == Some(id)
            {
                world.start_next_turn().unwrap();
            }
        }
    }
}
