// bow_arena/server/tests/integration/bot_lifecycle.rs

use bow_arena_server_core::core::config::ServerConfig;
use bow_arena_server_core::core::types::{EntityId, GameCommand, Vec3};
use bow_arena_server_core::host::{CharacterControl, EntityQueries, TraitStore};
use bow_arena_server_core::server::game_loop::SimulationStep;
use bow_arena_server_core::server::instance::ArenaServer;
use bow_arena_server_core::world::open_arena::OpenArena;

use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

const DT: f32 = 1.0 / 30.0;

fn test_config(bots: usize) -> ServerConfig {
    let mut config = ServerConfig::default();
    config.bots.target_count = bots;
    config.arena.seed = Some(7);
    config
}

// Helper function to set up a test server over a prepared arena
fn setup_test_server(config: ServerConfig, arena: OpenArena) -> Arc<ArenaServer<OpenArena>> {
    info!("[Test Setup] Setting up test server instance...");
    let server = Arc::new(ArenaServer::new(Arc::new(config), Arc::new(arena)));
    server.start_game();
    server
}

/// Steps the stand-in host and the server together for `secs` of world time.
fn run_for(server: &ArenaServer<OpenArena>, secs: f32) {
    let ticks = (secs / DT).round() as usize;
    for _ in 0..ticks {
        for (player, pickup) in server.host.step(DT) {
            server.handle_pickup_contact(player, pickup);
        }
        server.process_game_tick(server.host.world_time());
    }
}

fn tick_at(server: &ArenaServer<OpenArena>, now: f64) {
    server.host.set_time(now);
    server.process_game_tick(now);
}

fn arrows_from(server: &ArenaServer<OpenArena>, owner: EntityId) -> usize {
    server
        .host
        .take_broadcasts()
        .into_iter()
        .filter(|b| matches!(b.command, GameCommand::Arrow { owner_id, .. } if owner_id == owner))
        .count()
}

/// One respawner at the origin and a human standing `distance` away along +z.
fn duel_arena(distance: f32) -> (OpenArena, EntityId) {
    let arena = OpenArena::new();
    arena.add_respawner(Vec3::ZERO);
    let alice = arena.add_player("alice", Vec3::new(0.0, 0.0, distance));
    (arena, alice)
}

#[test]
fn roster_fills_to_target_on_first_sweep() {
    let arena = OpenArena::new();
    for x in [-10.0, 0.0, 10.0, 20.0] {
        arena.add_respawner(Vec3::new(x, 0.0, 0.0));
    }
    let server = setup_test_server(test_config(3), arena);

    tick_at(&server, 0.5);
    assert_eq!(server.bot_count(), 0, "sweep runs at most once per second from t=0");

    tick_at(&server, 1.0);
    assert_eq!(server.bot_count(), 3);

    let spawn_points: Vec<Vec3> = server.respawn_manager.spawn_points().iter().map(|p| p.position).collect();
    for bot in server.bot_ids() {
        assert!(server.is_bot(bot));
        let record = server.host.player_record(bot).expect("bot has a player record");
        assert_eq!(record.arrow_count, 3);
        assert_eq!(record.max_arrows, 3);
        assert!(server.host.is_alive(bot));
        let position = server.host.entity_position(bot).expect("bot positioned");
        assert!(spawn_points.contains(&position));
    }
}

#[test]
fn expired_bots_are_replaced_within_one_sweep() {
    let arena = OpenArena::new();
    arena.add_respawner(Vec3::ZERO);
    let server = setup_test_server(test_config(3), arena);

    tick_at(&server, 1.0);
    let first_generation: HashSet<EntityId> = server.bot_ids().into_iter().collect();
    assert_eq!(first_generation.len(), 3);

    for bot in &first_generation {
        let leave_time = server.bot_manager.lock().bot(*bot).map(|b| b.state.leave_time).unwrap();
        assert!((201.0..=301.0).contains(&leave_time));
    }

    tick_at(&server, 301.0);
    let second_generation: HashSet<EntityId> = server.bot_ids().into_iter().collect();
    assert_eq!(second_generation.len(), 3);
    assert!(first_generation.is_disjoint(&second_generation));
    for bot in &first_generation {
        assert!(server.host.character(*bot).is_none(), "expired bot entity removed from host");
    }
}

#[test]
fn bot_fires_at_visible_player_and_spends_an_arrow() {
    let (arena, alice) = duel_arena(20.0);
    let server = setup_test_server(test_config(1), arena);
    server.host.take_broadcasts();

    tick_at(&server, 1.0);
    let bot = server.bot_ids()[0];
    assert_eq!(arrows_from(&server, bot), 0, "cooldown counts from t=0");

    tick_at(&server, 4.0);
    let arrows: Vec<GameCommand> = server
        .host
        .take_broadcasts()
        .into_iter()
        .filter(|b| b.exclude.is_none())
        .map(|b| b.command)
        .filter(|c| matches!(c, GameCommand::Arrow { .. }))
        .collect();
    assert_eq!(arrows.len(), 1);
    let GameCommand::Arrow { view_ray, draw, owner_id, .. } = &arrows[0] else {
        panic!("expected an arrow, got {:?}", arrows[0]);
    };
    assert_eq!(*owner_id, bot);
    assert!((0.7..=1.0).contains(draw));
    assert_eq!(view_ray.origin, Vec3::new(0.0, 1.6, 0.0));
    assert!(view_ray.direction.z > 0.9, "aimed toward alice");

    // Height of the shot ray where it crosses alice's plane.
    let aim_y = view_ray.origin.y + view_ray.direction.y / view_ray.direction.z * 20.0;
    assert!(aim_y < 1.6 && aim_y > -0.5, "jitter pulls the aim point below the eye, got {}", aim_y);

    assert_eq!(server.host.player_record(bot).map(|r| r.arrow_count), Some(2));
    assert!(server.host.is_alive(alice));
}

#[test]
fn bot_keeps_enemy_aim_while_travelling_to_pickup() {
    let (arena, _alice) = duel_arena(20.0);
    arena.add_pickup_spawner(Vec3::new(6.0, 0.0, 0.0));
    let server = setup_test_server(test_config(1), arena);

    tick_at(&server, 1.0);
    let bot = server.bot_ids()[0];

    let aim = server.host.look_at_target(bot).expect("bot tracks alice");
    assert_eq!(aim.z, 20.0);
    assert!(aim.y < 1.6 && aim.y > -0.5, "got {}", aim.y);
    let path = server.host.move_target(bot);
    assert!(!path.is_empty());
    assert_eq!(path.last().map(|w| (w.x, w.z)), Some((6.5, 0.5)));
}

#[test]
fn bot_without_any_pickup_clears_movement_and_aim() {
    let (arena, _alice) = duel_arena(20.0);
    let server = setup_test_server(test_config(1), arena);

    tick_at(&server, 1.0);
    let bot = server.bot_ids()[0];
    assert!(server.host.look_at_target(bot).is_none());
    assert!(server.host.move_target(bot).is_empty());
}

#[test]
fn shots_are_spaced_by_cooldown_and_stop_when_quiver_is_empty() {
    let (arena, _alice) = duel_arena(15.0);
    let server = setup_test_server(test_config(1), arena);
    server.host.take_broadcasts();

    let mut shot_times = Vec::new();
    let ticks = (20.0 / DT) as usize;
    for _ in 0..ticks {
        server.host.step(DT);
        let now = server.host.world_time();
        server.process_game_tick(now);
        if let Some(bot) = server.bot_ids().first().copied() {
            for _ in 0..arrows_from(&server, bot) {
                shot_times.push(now);
            }
        }
    }

    assert_eq!(shot_times.len(), 3, "three arrows, no pickups: {:?}", shot_times);
    for pair in shot_times.windows(2) {
        assert!(pair[1] - pair[0] >= 3.0 - 1e-6, "shots too close: {:?}", shot_times);
    }
}

#[test]
fn dead_bot_clears_targets_and_never_fires() {
    let (arena, _alice) = duel_arena(12.0);
    let server = setup_test_server(test_config(1), arena);

    run_for(&server, 1.2);
    let bot = server.bot_ids()[0];
    server.host.take_broadcasts();

    let now = server.host.world_time();
    server.respawn_manager.kill_player(server.host.as_ref(), bot, now);
    server.host.set_look_at_target(bot, Vec3::new(1.0, 1.0, 1.0));
    server.host.set_move_target(bot, &[Vec3::new(3.0, 0.2, 3.0)]);

    run_for(&server, 4.0);
    assert!(!server.host.is_alive(bot));
    assert_eq!(arrows_from(&server, bot), 0);
    assert!(server.host.look_at_target(bot).is_none());
    assert!(server.host.move_target(bot).is_empty());
    let record = server.host.player_record(bot).unwrap();
    assert_eq!(record.death_count, 1);

    run_for(&server, 1.5);
    assert!(server.host.is_alive(bot), "bot respawns after the delay");
}

#[test]
fn bot_walks_to_pickup_and_collects_it() {
    let arena = OpenArena::new();
    arena.add_respawner(Vec3::ZERO);
    let spawner = arena.add_pickup_spawner(Vec3::new(6.0, 0.0, 0.0));
    let server = setup_test_server(test_config(1), arena);

    let pickup = server.host.pickup_spawner_record(spawner).and_then(|r| r.spawned_item).expect("initial pickup");

    run_for(&server, 1.1);
    let bot = server.bot_ids()[0];
    assert!(!server.host.move_target(bot).is_empty() || server.host.entity_position(bot) != Some(Vec3::ZERO));

    let mut record = server.host.player_record(bot).unwrap();
    record.arrow_count = 1;
    server.host.set_player_record(bot, record);

    run_for(&server, 3.0);
    assert_eq!(server.host.player_record(bot).map(|r| r.arrow_count), Some(2));
    assert!(server.host.entity_position(pickup).is_none());
    assert!(server
        .host
        .broadcasts()
        .iter()
        .any(|b| matches!(b.command, GameCommand::Pickup { player_id, .. } if player_id == bot)));
}

#[test]
fn unreachable_pickup_is_retried_every_think_cycle() {
    let arena = OpenArena::new();
    arena.add_respawner(Vec3::ZERO);
    arena.add_pickup_spawner(Vec3::new(6.0, 0.0, 0.0));
    arena.block_cell(6, 0);
    let server = setup_test_server(test_config(1), arena);

    run_for(&server, 4.0);
    let bot = server.bot_ids()[0];
    assert!(server.host.path_query_count() >= 4, "queries: {}", server.host.path_query_count());
    assert!(server.host.move_target(bot).is_empty());
    let state = server.bot_manager.lock().bot(bot).map(|b| b.state.clone()).unwrap();
    assert!(state.current_target_pickup.is_none());
    assert!(state.current_path.is_empty());
}
