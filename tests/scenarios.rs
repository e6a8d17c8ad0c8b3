use std::f64::consts::PI;

use worms_sim::sim::{GamePhase, MoveOutcome, World, WormId};
use worms_sim::{SimError, Settings};

/// 10x10 m world over a 10x10 raster whose bottom row is rock
fn floor_world(seed: u64) -> World {
    let mut raster = vec![vec![true; 10]; 10];
    raster[9] = vec![false; 10];
    World::new(10.0, 10.0, raster, seed).expect("valid world")
}

#[test]
fn single_worm_moves_along_the_floor() {
    let mut world = floor_world(1);
    let id = world
        .add_worm(5.0, 1.52, 0.0, 0.5, "Solo")
        .expect("worm rests on the floor");
    world.start_game().expect("one worm is enough to start");

    let before = world.worm(id).unwrap().position();
    let ap_before = world.worm(id).unwrap().action_points();
    let outcome = world.move_worm(id).expect("move is affordable");
    let after = world.worm(id).unwrap().position();

    assert!(matches!(outcome, MoveOutcome::Adjacent(_)));
    assert!(after.x() > before.x(), "worm should advance along its facing");
    let slope = after.slope(&before);
    let cost = (slope.cos() + 4.0 * slope.sin()).abs().ceil() as u32;
    assert_eq!(world.worm(id).unwrap().action_points(), ap_before - cost);
    assert_eq!(world.phase(), GamePhase::InTurn);
}

#[test]
fn bazooka_shot_damages_only_on_overlap() {
    let mut world = floor_world(2);
    let shooter = world.add_worm(2.0, 1.52, 0.0, 0.5, "Shooter").unwrap();
    let target = world.add_worm(5.0, 1.52, PI, 0.5, "Target").unwrap();
    world.start_game().unwrap();

    world.select_next_weapon(shooter).unwrap();
    assert_eq!(world.worm(shooter).unwrap().selected_weapon_name(), "Bazooka");
    world.shoot(shooter, 50).expect("shot is legal");

    let projectile = world.active_projectile().expect("projectile in flight");
    let expected_radius = (3.0 * (0.300 / 7800.0) / (4.0 * PI)).cbrt();
    assert!((projectile.radius() - expected_radius).abs() < 1e-12);
    assert_eq!(projectile.yield_(), 50);

    let hp_before = world.worm(target).unwrap().hit_points();
    let hit = world.jump_projectile(0.0001).expect("projectile lands");
    let hp_after = world.worm(target).unwrap().hit_points();

    if hit == Some(target) {
        assert_eq!(hp_after, hp_before - 80);
    } else {
        assert_eq!(hp_after, hp_before);
    }
    // Fired flat at a worm three meters away: the shell drops into it
    assert_eq!(hit, Some(target));
    assert!(world.active_projectile().is_none());
    assert_eq!(world.worm(shooter).unwrap().action_points(), 556 - 50);
}

#[test]
fn last_worm_standing_wins() {
    let mut world = floor_world(3);
    let first = world.add_worm(2.0, 1.52, 0.0, 0.5, "First").unwrap();
    let second = world.add_worm(7.0, 1.52, PI, 0.5, "Second").unwrap();
    world.start_game().unwrap();

    let hp = world.worm(second).unwrap().hit_points();
    world.deduct_hit_points(second, hp).unwrap();
    world.start_next_turn().unwrap();

    assert!(world.is_game_finished());
    assert_eq!(world.worms().len(), 1);
    assert_eq!(world.winner_name(), "First");
    assert!(matches!(world.worm(second), Err(SimError::UnknownWorm(_))));
    assert!(matches!(
        world.move_worm(first),
        Err(SimError::IllegalGameState(_))
    ));

    let json = world.snapshot().to_json().unwrap();
    assert!(json.contains("\"winner\": \"First\""));
}

#[test]
fn turn_passes_after_projectile_lands() {
    let mut world = floor_world(4);
    // Small worms start with 70 AP
    let shooter = world.add_worm(2.0, 1.27, 0.0, 0.25, "Small").unwrap();
    let other = world.add_worm(8.0, 1.27, PI, 0.25, "Other").unwrap();
    world.start_game().unwrap();
    assert_eq!(world.worm(shooter).unwrap().action_points(), 70);

    // Costs 20 AP, leaving exactly the bazooka's 50
    world.turn_worm(shooter, 19.5 / 60.0 * 2.0 * PI).unwrap();
    world.select_next_weapon(shooter).unwrap();
    world.shoot(shooter, 100).unwrap();
    assert_eq!(world.worm(shooter).unwrap().action_points(), 0);
    // Still the shooter's turn while the shell is in the air
    assert_eq!(world.current_worm().unwrap().id(), shooter);

    world.jump_projectile(0.001).unwrap();
    assert_eq!(world.current_worm().unwrap().id(), other);
}

#[test]
fn same_seed_replays_identically() {
    fn play(seed: u64) -> String {
        let mut raster = vec![vec![true; 20]; 10];
        raster[8] = vec![false; 20];
        raster[9] = vec![false; 20];
        let mut world =
            World::with_settings(20.0, 10.0, raster, seed, Settings::default()).unwrap();
        let ids: Vec<WormId> = (0..100)
            .filter_map(|_| world.add_random_worm().ok())
            .take(3)
            .collect();
        if ids.len() >= 2 {
            world.start_game().unwrap();
            for _ in 0..6 {
                let Some(id) = world.current_worm().map(|w| w.id()) else {
                    break;
                };
                if world.can_move(id) {
                    world.move_worm(id).unwrap();
                }
                if world.phase() == GamePhase::InTurn {
                    let _ = world.start_next_turn();
                }
            }
        }
        world.snapshot().to_json().unwrap()
    }

    assert_eq!(play(99), play(99));
}
