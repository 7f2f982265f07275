// bow_arena/server/tests/performance/bot_tick_stress.rs
use std::sync::Arc;
use std::time::Instant;
use metrics::histogram;
use rand::rngs::StdRng;
use rand::SeedableRng;
use bow_arena_server_core::core::config::ServerConfig;
use bow_arena_server_core::host::EntityQueries;
use bow_arena_server_core::server::game_loop::SimulationStep;
use bow_arena_server_core::server::instance::ArenaServer;
use bow_arena_server_core::world::map_generator::MapGenerator;
use bow_arena_server_core::world::open_arena::OpenArena;

fn setup_crowded_server(bots: usize) -> Arc<ArenaServer<OpenArena>> {
    let mut config = ServerConfig::default();
    config.bots.target_count = bots;
    config.arena.seed = Some(99);
    config.arena.radius = 60.0;
    config.arena.respawner_count = 16;

    let layout = MapGenerator::generate_arena(&config.arena, &mut StdRng::seed_from_u64(99));
    let host = Arc::new(OpenArena::from_layout(&layout));
    let server = Arc::new(ArenaServer::new(Arc::new(config), host));
    server.start_game();
    server
}

#[tokio::test]
async fn stress_test_bot_ticks() {
    let server = setup_crowded_server(32);
    let delta_time = 1.0 / 30.0;

    // Two simulated minutes.
    for _ in 0..3600 {
        let start = Instant::now();
        for (player, pickup) in server.host.step(delta_time) {
            server.handle_pickup_contact(player, pickup);
        }
        server.process_game_tick(server.host.world_time());
        histogram!("bot_tick_duration_ms").record(start.elapsed().as_secs_f64() * 1000.0);
    }

    assert_eq!(server.bot_count(), 32);
    assert!(server.host.players().len() >= 32);
    assert!(server.host.path_query_count() > 0);
}
