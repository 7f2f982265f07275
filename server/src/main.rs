// bow_arena/server/src/main.rs
use bow_arena_server_core::built_info;
use bow_arena_server_core::core::config::ServerConfig;
use bow_arena_server_core::operational::monitoring::metrics::{init_logging, MetricsSystem};
use bow_arena_server_core::server::instance::ArenaServer;
use bow_arena_server_core::world::map_generator::MapGenerator;
use bow_arena_server_core::world::open_arena::OpenArena;

use anyhow::Context;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};

const CONFIG_ENV_VAR: &str = "BOW_ARENA_CONFIG";

fn load_config() -> anyhow::Result<ServerConfig> {
    let path = std::env::args().nth(1).or_else(|| std::env::var(CONFIG_ENV_VAR).ok());
    match path {
        Some(path) => ServerConfig::from_yaml_file(&path)
            .with_context(|| format!("Failed to load configuration from {}", path)),
        None => {
            info!("No configuration file given, using defaults");
            Ok(ServerConfig::default())
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = init_logging() {
        eprintln!("Failed to initialize logging: {:?}", e);
        return Err(e);
    }

    info!(
        "{} v{} starting up ({}, {})",
        built_info::PKG_NAME,
        built_info::PKG_VERSION,
        built_info::PROFILE,
        built_info::TARGET
    );

    let config = Arc::new(load_config()?);
    info!("Server configuration loaded. Tick rate: {}", config.tick_rate);

    let metrics = match config.metrics_port {
        Some(port) => {
            let system = MetricsSystem::new(port)?;
            info!("Prometheus exporter listening on 0.0.0.0:{}", port);
            Some(system)
        }
        None => None,
    };

    let mut layout_rng = match config.arena.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let layout = MapGenerator::generate_arena(&config.arena, &mut layout_rng);
    let host = Arc::new(OpenArena::from_layout(&layout));
    info!(
        "Arena generated: radius {}, {} respawners, {} pickup spawners",
        config.arena.radius,
        layout.respawners.len(),
        layout.pickup_spawners.len()
    );

    let server = Arc::new(ArenaServer::new(config.clone(), host));
    server.start_game();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let game_loop = tokio::spawn(Arc::clone(&server).run_game_loop(shutdown_rx));

    match config.run_for_secs {
        Some(secs) => {
            info!("Running for {}s", secs);
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs_f64(secs)) => {}
                signal = tokio::signal::ctrl_c() => {
                    if let Err(e) = signal {
                        warn!("Failed to listen for ctrl-c: {}", e);
                    }
                }
            }
        }
        None => {
            tokio::signal::ctrl_c().await.context("Failed to listen for ctrl-c")?;
        }
    }

    info!("Shutting down...");
    if shutdown_tx.send(true).is_err() {
        warn!("Game loop already stopped");
    }
    if let Err(e) = game_loop.await {
        error!("Game loop task failed: {:?}", e);
    }

    info!("Bow arena server shut down with {} bots in the roster.", server.bot_count());
    if let Some(metrics) = metrics {
        info!("Uptime: {:.1}s", metrics.uptime_secs());
    }
    Ok(())
}
