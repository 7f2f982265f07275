// bow_arena/server/src/server/instance.rs
use crate::core::config::ServerConfig;
use crate::core::types::EntityId;
use crate::host::GameHost;
use crate::systems::bots::BotManager;
use crate::systems::pickups::PickupManager;
use crate::systems::respawn::RespawnManager;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use tracing::{debug, info, trace};

pub struct ArenaServer<H: GameHost> {
    pub config: Arc<ServerConfig>,
    pub host: Arc<H>,

    pub respawn_manager: Arc<RespawnManager>,
    pub pickup_manager: Arc<PickupManager>,
    pub bot_manager: Arc<Mutex<BotManager>>,

    pub frame_counter: Arc<AtomicU64>,
    pub game_started: Arc<AtomicBool>,
}

impl<H: GameHost> ArenaServer<H> {
    pub fn new(config: Arc<ServerConfig>, host: Arc<H>) -> Self {
        info!("Initializing ArenaServer...");

        let rng = match config.arena.seed {
            Some(seed) => {
                info!("Bot randomness seeded with {}", seed);
                StdRng::seed_from_u64(seed)
            }
            None => StdRng::from_entropy(),
        };

        let respawn_manager = Arc::new(RespawnManager::new(config.respawn.clone()));
        let pickup_manager = Arc::new(PickupManager::new(config.pickups.clone()));
        let bot_manager = Arc::new(Mutex::new(BotManager::new(config.bots.clone(), config.aim.clone(), rng)));
        info!("Bot manager initialized with target roster of {}.", config.bots.target_count);

        ArenaServer {
            config,
            host,
            respawn_manager,
            pickup_manager,
            bot_manager,
            frame_counter: Arc::new(AtomicU64::new(0)),
            game_started: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Gathers spawn points, fills pickup spawners and brings every
    /// connected player to life in place.
    pub fn start_game(&self) {
        let host = self.host.as_ref();
        let spawn_points = self.respawn_manager.gather_spawn_points(host);
        let pickups = self.pickup_manager.on_game_start(host);

        let players = host.players();
        for &player_id in &players {
            self.respawn_manager.spawn_player(host, player_id, false);
        }

        self.game_started.store(true, AtomicOrdering::Release);
        info!(
            "Game started: {} spawn points, {} pickups, {} players",
            spawn_points,
            pickups,
            players.len()
        );
    }

    pub fn on_player_join(&self, player_id: EntityId) {
        debug!("Player {} joined", player_id);
        self.respawn_manager.spawn_player(self.host.as_ref(), player_id, false);
    }

    /// One simulation step at world time `now`: respawns, pickup spawners, then bots.
    pub fn process_game_tick(&self, now: f64) {
        let frame = self.frame_counter.load(AtomicOrdering::Relaxed);
        let host = self.host.as_ref();

        let respawned = self.respawn_manager.update(host, now);
        if respawned > 0 {
            trace!("[Frame {}] {} players respawned", frame, respawned);
        }

        self.pickup_manager.update(host, now);
        self.bot_manager.lock().update(host, &self.respawn_manager, now);

        self.frame_counter.fetch_add(1, AtomicOrdering::Relaxed);
    }

    pub fn handle_pickup_contact(&self, player_id: EntityId, pickup_id: EntityId) -> bool {
        self.pickup_manager.on_pickup_contact(self.host.as_ref(), player_id, pickup_id)
    }

    pub fn bot_count(&self) -> usize {
        self.bot_manager.lock().bot_count()
    }

    pub fn bot_ids(&self) -> Vec<EntityId> {
        self.bot_manager.lock().bot_ids()
    }

    pub fn is_bot(&self, entity: EntityId) -> bool {
        self.bot_manager.lock().is_bot(entity)
    }
}
