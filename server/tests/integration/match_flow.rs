// bow_arena/server/tests/integration/match_flow.rs

use bow_arena_server_core::core::config::ServerConfig;
use bow_arena_server_core::core::types::{EntityId, GameCommand, Vec3, ViewRay};
use bow_arena_server_core::host::{EntityQueries, TraitStore};
use bow_arena_server_core::server::instance::ArenaServer;
use bow_arena_server_core::world::map_generator::MapGenerator;
use bow_arena_server_core::world::open_arena::{Broadcast, OpenArena};

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

fn no_bots() -> ServerConfig {
    let mut config = ServerConfig::default();
    config.bots.target_count = 0;
    config.arena.seed = Some(11);
    config
}

fn server_over(arena: OpenArena) -> Arc<ArenaServer<OpenArena>> {
    Arc::new(ArenaServer::new(Arc::new(no_bots()), Arc::new(arena)))
}

fn tick_at(server: &ArenaServer<OpenArena>, now: f64) {
    server.host.set_time(now);
    server.process_game_tick(now);
}

fn arrow_from(owner_id: EntityId) -> GameCommand {
    GameCommand::Arrow {
        view_ray: ViewRay { origin: Vec3::new(0.0, 1.6, 0.0), direction: Vec3::new(0.0, 0.0, 1.0) },
        draw: 1.0,
        owner_id,
        net_id: 42,
    }
}

#[test]
fn game_start_spawns_connected_players_and_fills_spawners_silently() {
    let arena = OpenArena::new();
    let alice = arena.add_player("alice", Vec3::new(3.0, 0.0, 3.0));
    let spawner = arena.add_pickup_spawner(Vec3::new(5.0, 0.0, 0.0));
    arena.add_respawner(Vec3::ZERO);
    let server = server_over(arena);

    server.start_game();

    let record = server.host.player_record(alice).expect("record created on spawn");
    assert_eq!(record.name, "alice");
    assert_eq!(record.arrow_count, 3);
    assert!(server.host.is_alive(alice));
    assert_eq!(server.host.entity_position(alice), Some(Vec3::new(3.0, 0.0, 3.0)), "game start does not relocate");

    let pickup = server.host.pickup_spawner_record(spawner).and_then(|r| r.spawned_item).expect("spawner filled");
    assert_eq!(server.host.entity_position(pickup), Some(Vec3::new(5.0, 1.0, 0.0)));
    assert!(server.host.broadcasts().is_empty(), "nothing announced at game start: {:?}", server.host.broadcasts());
}

#[test]
fn joining_player_is_initialised_in_place() {
    let arena = OpenArena::new();
    arena.add_respawner(Vec3::ZERO);
    let server = server_over(arena);
    server.start_game();

    let bob = server.host.add_player("bob", Vec3::new(1.0, 0.0, 1.0));
    server.on_player_join(bob);
    assert!(!server.is_bot(bob));
    let record = server.host.player_record(bob).unwrap();
    assert_eq!((record.name.as_str(), record.kills, record.arrow_count), ("bob", 0, 3));
}

#[test]
fn arrow_command_spends_ammo_and_skips_the_sender() {
    let arena = OpenArena::new();
    let alice = arena.add_player("alice", Vec3::ZERO);
    let server = server_over(arena);
    server.start_game();

    assert!(server.handle_command(alice, arrow_from(alice)));
    assert_eq!(server.host.player_record(alice).map(|r| r.arrow_count), Some(2));
    assert_eq!(
        server.host.take_broadcasts(),
        vec![Broadcast { command: arrow_from(alice), exclude: Some(alice) }]
    );

    assert!(server.handle_command(alice, arrow_from(alice)));
    assert!(server.handle_command(alice, arrow_from(alice)));
    server.host.take_broadcasts();

    assert!(!server.handle_command(alice, arrow_from(alice)), "empty quiver rejects");
    assert!(server.host.broadcasts().is_empty());
    assert_eq!(server.host.player_record(alice).map(|r| r.arrow_count), Some(0));
}

#[test]
fn hit_kills_victim_and_credits_attacker() {
    let arena = OpenArena::new();
    let alice = arena.add_player("alice", Vec3::ZERO);
    let bob = arena.add_player("bob", Vec3::new(5.0, 0.0, 0.0));
    let server = server_over(arena);
    server.start_game();
    server.host.set_time(12.0);

    let hit = GameCommand::Hit { attacker_id: alice, victim_id: bob, position: Vec3::new(5.0, 1.5, 0.0), net_id: 3 };
    assert!(server.handle_command(alice, hit.clone()));

    assert!(!server.host.is_alive(bob));
    let victim = server.host.player_record(bob).unwrap();
    assert_eq!(victim.death_count, 1);
    assert_eq!(victim.respawn_time, 17.0);
    assert_eq!(victim.kill_streak, 0);

    let attacker = server.host.player_record(alice).unwrap();
    assert_eq!((attacker.kills, attacker.kill_streak, attacker.last_kill_time), (1, 1, 12.0));
    assert_eq!(server.host.take_broadcasts(), vec![Broadcast { command: hit, exclude: None }]);
}

#[test]
fn suicide_is_not_credited() {
    let arena = OpenArena::new();
    let alice = arena.add_player("alice", Vec3::ZERO);
    let server = server_over(arena);
    server.start_game();

    let mut record = server.host.player_record(alice).unwrap();
    record.kill_streak = 4;
    server.host.set_player_record(alice, record);

    server.handle_command(alice, GameCommand::Hit { attacker_id: alice, victim_id: alice, position: Vec3::ZERO, net_id: 1 });
    let record = server.host.player_record(alice).unwrap();
    assert_eq!((record.kills, record.kill_streak, record.death_count), (0, 0, 1));
}

#[test]
fn environmental_death_kills_and_rebroadcasts() {
    let arena = OpenArena::new();
    let alice = arena.add_player("alice", Vec3::ZERO);
    let server = server_over(arena);
    server.start_game();

    let fall = GameCommand::EnvironmentalDeath { victim_id: alice, reason: "fell".into() };
    assert!(server.handle_command(alice, fall.clone()));
    assert!(!server.host.is_alive(alice));
    assert_eq!(server.host.take_broadcasts(), vec![Broadcast { command: fall, exclude: None }]);
}

#[test]
fn dead_player_respawns_at_the_farthest_point_after_the_delay() {
    let arena = OpenArena::new();
    let near = Vec3::new(2.0, 0.0, 0.0);
    let far = Vec3::new(40.0, 0.0, 0.0);
    arena.add_respawner(near);
    arena.add_respawner(far);
    let alice = arena.add_player("alice", Vec3::ZERO);
    let bob = arena.add_player("bob", Vec3::new(10.0, 0.0, 0.0));
    let server = server_over(arena);
    server.start_game();

    server.respawn_manager.kill_player(server.host.as_ref(), bob, 0.0);
    tick_at(&server, 4.9);
    assert!(!server.host.is_alive(bob));

    tick_at(&server, 5.0);
    assert!(server.host.is_alive(bob));
    assert_eq!(server.host.entity_position(bob), Some(far));
    assert_eq!(server.host.player_record(bob).map(|r| r.arrow_count), Some(3));
    assert!(server
        .host
        .broadcasts()
        .contains(&Broadcast { command: GameCommand::Respawn { player_id: bob, position: far }, exclude: None }));
    assert!(server.host.is_alive(alice));
}

#[test]
fn collected_pickup_respawns_after_the_dry_period() {
    let arena = OpenArena::new();
    let alice = arena.add_player("alice", Vec3::ZERO);
    let spawner = arena.add_pickup_spawner(Vec3::new(4.0, 0.0, 0.0));
    let server = server_over(arena);
    server.start_game();

    let pickup = server.host.pickup_spawner_record(spawner).and_then(|r| r.spawned_item).unwrap();
    assert!(!server.handle_pickup_contact(alice, pickup), "full quiver ignores pickups");

    let mut record = server.host.player_record(alice).unwrap();
    record.arrow_count = 2;
    server.host.set_player_record(alice, record);
    assert!(server.handle_pickup_contact(alice, pickup));
    assert_eq!(server.host.player_record(alice).map(|r| r.arrow_count), Some(3));
    assert!(server.host.pickups().is_empty());

    tick_at(&server, 1.0);
    let dry = server.host.pickup_spawner_record(spawner).unwrap();
    assert_eq!((dry.spawned_item, dry.dry_since), (None, Some(1.0)));

    tick_at(&server, 10.9);
    assert!(server.host.pickups().is_empty());

    server.host.take_broadcasts();
    tick_at(&server, 11.0);
    assert_eq!(server.host.pickups().len(), 1);
    assert_eq!(
        server.host.take_broadcasts(),
        vec![Broadcast { command: GameCommand::ItemSpawn { position: Vec3::new(4.0, 1.0, 0.0) }, exclude: None }]
    );
}

#[tokio::test]
async fn game_loop_ticks_until_shutdown() {
    let mut config = ServerConfig::default();
    config.arena.seed = Some(5);
    let layout = MapGenerator::generate_arena(&config.arena, &mut StdRng::seed_from_u64(5));
    let host = Arc::new(OpenArena::from_layout(&layout));
    let server = Arc::new(ArenaServer::new(Arc::new(config), host));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(Arc::clone(&server).run_game_loop(shutdown_rx));

    tokio::time::sleep(Duration::from_millis(2000)).await;
    shutdown_tx.send(true).expect("loop still listening");
    handle.await.expect("loop task joins");

    assert!(server.game_started.load(Ordering::Acquire));
    assert!(server.frame_counter.load(Ordering::Relaxed) > 10);
    assert_eq!(server.bot_count(), 3, "roster filled once world time passes 1s");
}
