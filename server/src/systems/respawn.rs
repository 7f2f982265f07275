// bow_arena/server/src/systems/respawn.rs

use crate::core::config::RespawnConfig;
use crate::core::constants::UNKNOWN_PLAYER_NAME;
use crate::core::types::{Emote, EntityId, MovementProfile, PlayerPermissions, PlayerRecord, GameCommand, Vec3};
use crate::host::GameHost;
use crate::operational::monitoring::metrics as arena_metrics;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Clone, Debug, Copy, PartialEq)]
pub struct SpawnPoint {
    pub marker: EntityId,
    pub position: Vec3,
}

/// Picks the spawn point whose closest living agent is farthest away.
///
/// `living` must already exclude the agent being placed. With no living
/// agents every point scores infinity and the first one wins.
pub fn select_spawn_point(points: &[Vec3], living: &[Vec3]) -> Option<Vec3> {
    let mut best: Option<Vec3> = None;
    let mut best_min_distance = f32::NEG_INFINITY;

    for point in points {
        let min_distance = living
            .iter()
            .map(|agent| point.distance(*agent))
            .fold(f32::INFINITY, f32::min);

        if min_distance > best_min_distance {
            best_min_distance = min_distance;
            best = Some(*point);
        }
    }

    best.or_else(|| points.first().copied())
}

pub struct RespawnManager {
    spawn_points: Arc<RwLock<Vec<SpawnPoint>>>,
    config: RespawnConfig,
}

impl RespawnManager {
    pub fn new(config: RespawnConfig) -> Self {
        Self {
            spawn_points: Arc::new(RwLock::new(Vec::new())),
            config,
        }
    }

    /// Rebuilds the spawn point list from the host's respawner markers.
    pub fn gather_spawn_points<H: GameHost + ?Sized>(&self, host: &H) -> usize {
        let points: Vec<SpawnPoint> = host
            .respawners()
            .into_iter()
            .filter_map(|marker| {
                let position = host.entity_position(marker);
                if position.is_none() {
                    warn!("[Respawn] Respawner {} has no position, skipped", marker);
                }
                position.map(|position| SpawnPoint { marker, position })
            })
            .collect();

        let count = points.len();
        *self.spawn_points.write() = points;
        info!("[Respawn] Gathered {} spawn points", count);
        count
    }

    pub fn spawn_points(&self) -> Vec<SpawnPoint> {
        self.spawn_points.read().clone()
    }

    pub fn has_spawn_points(&self) -> bool {
        !self.spawn_points.read().is_empty()
    }

    pub fn choose_spawn_point<H: GameHost + ?Sized>(&self, host: &H, player_id: EntityId) -> Option<Vec3> {
        let points: Vec<Vec3> = self.spawn_points.read().iter().map(|p| p.position).collect();
        let living: Vec<Vec3> = host
            .players()
            .into_iter()
            .filter(|id| *id != player_id && host.is_alive(*id))
            .filter_map(|id| host.entity_position(id))
            .collect();
        select_spawn_point(&points, &living)
    }

    pub fn kill_player<H: GameHost + ?Sized>(&self, host: &H, player_id: EntityId, now: f64) {
        host.set_alive(player_id, false);
        host.play_emote(player_id, Emote::Death);

        if let Some(mut record) = host.player_record(player_id) {
            record.death_count += 1;
            record.respawn_time = now + self.config.respawn_delay_secs;
            record.kill_streak = 0;
            debug!("[Respawn] Player {} died ({} deaths), respawn at {:.2}", player_id, record.death_count, record.respawn_time);
            host.set_player_record(player_id, record);
        }
    }

    /// Revives a player. With `from_respawn` the returned point is chosen by
    /// max-min distance and announced; without spawn points nothing happens.
    pub fn spawn_player<H: GameHost + ?Sized>(&self, host: &H, player_id: EntityId, from_respawn: bool) -> Option<Vec3> {
        if from_respawn && !self.has_spawn_points() {
            warn!("[Respawn] No spawn points available for player {}", player_id);
            return None;
        }

        let mut record = host.player_record(player_id).unwrap_or_else(|| {
            let name = host.username(player_id).unwrap_or_else(|| UNKNOWN_PLAYER_NAME.to_string());
            PlayerRecord::new(name)
        });

        let spawn_position = if from_respawn { self.choose_spawn_point(host, player_id) } else { None };

        host.set_alive(player_id, true);
        host.stop_emote(player_id);

        record.arrow_count = record.max_arrows;
        host.set_player_record(player_id, record);

        if let Some(position) = spawn_position {
            host.send_to_all(GameCommand::Respawn { player_id, position }, None);
        }
        host.set_permissions(player_id, PlayerPermissions::default());
        host.set_movement_profile(player_id, MovementProfile::default());

        spawn_position
    }

    /// Revives every dead player whose respawn time has passed. Returns how many came back.
    pub fn update<H: GameHost + ?Sized>(&self, host: &H, now: f64) -> usize {
        let mut respawned = 0;
        for player_id in host.players() {
            let Some(record) = host.player_record(player_id) else {
                continue;
            };
            if host.is_alive(player_id) || record.respawn_time <= 0.0 || now < record.respawn_time {
                continue;
            }

            if let Some(position) = self.spawn_player(host, player_id, true) {
                host.set_entity_position(player_id, position);
                arena_metrics::record_respawn();
                respawned += 1;
                debug!("[Respawn] Player {} respawned at {:?}", player_id, position);
            }
        }
        respawned
    }
}
