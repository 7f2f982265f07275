// bow_arena/server/src/systems/pickups.rs
//
// Arrow pickup spawners: initial placement, dry/refill cycle and collection.

use crate::core::config::PickupConfig;
use crate::core::error::{ServerError, ServerResult};
use crate::core::types::{EntityId, GameCommand, PickupSpawnerRecord, Vec3};
use crate::host::GameHost;
use crate::operational::monitoring::metrics as arena_metrics;
use tracing::{debug, info, warn};

pub struct PickupManager {
    config: PickupConfig,
}

impl PickupManager {
    pub fn new(config: PickupConfig) -> Self {
        Self { config }
    }

    fn spawn_pickup<H: GameHost + ?Sized>(
        &self,
        host: &H,
        spawner_id: EntityId,
        announce: bool,
    ) -> ServerResult<EntityId> {
        let base = host.entity_position(spawner_id).ok_or(ServerError::EntityNotFound(spawner_id))?;
        let position = base + Vec3::new(0.0, self.config.spawn_height_offset, 0.0);

        let pickup = host.spawn_pickup(position, self.config.scale)?;
        host.mark_pickup(pickup);
        host.set_pickup_spawner(spawner_id, PickupSpawnerRecord { spawned_item: Some(pickup), dry_since: None });

        if announce {
            host.send_to_all(GameCommand::ItemSpawn { position }, None);
        }
        Ok(pickup)
    }

    /// Fills every spawner without announcing the items.
    pub fn on_game_start<H: GameHost + ?Sized>(&self, host: &H) -> usize {
        let mut spawned = 0;
        for (spawner_id, _) in host.pickup_spawners() {
            match self.spawn_pickup(host, spawner_id, false) {
                Ok(_) => spawned += 1,
                Err(e) => warn!("[Pickups] Spawner {} failed initial spawn: {}", spawner_id, e),
            }
        }
        info!("[Pickups] Placed {} initial pickups", spawned);
        spawned
    }

    pub fn update<H: GameHost + ?Sized>(&self, host: &H, now: f64) {
        let live_pickups = host.pickups();

        for (spawner_id, record) in host.pickup_spawners() {
            match (record.spawned_item, record.dry_since) {
                (Some(item), _) if !live_pickups.contains(&item) => {
                    host.set_pickup_spawner(spawner_id, PickupSpawnerRecord { spawned_item: None, dry_since: Some(now) });
                    debug!("[Pickups] Spawner {} ran dry at {:.2}", spawner_id, now);
                }
                (None, Some(dry_since)) if now - dry_since >= self.config.dry_respawn_secs => {
                    if let Err(e) = self.spawn_pickup(host, spawner_id, true) {
                        warn!("[Pickups] Spawner {} failed to refill: {}", spawner_id, e);
                    }
                }
                _ => {}
            }
        }
    }

    /// Collects `pickup_id` for `player_id` unless the quiver is full.
    pub fn on_pickup_contact<H: GameHost + ?Sized>(&self, host: &H, player_id: EntityId, pickup_id: EntityId) -> bool {
        let Some(mut record) = host.player_record(player_id) else {
            return false;
        };
        if record.has_max_arrows() {
            return false;
        }
        let Some(pickup_position) = host.entity_position(pickup_id) else {
            return false;
        };

        record.arrow_count += 1;
        host.set_player_record(player_id, record);
        host.remove_entity(pickup_id);
        host.send_to_all(GameCommand::Pickup { player_id, pickup_position }, None);
        arena_metrics::record_pickup_collected();
        debug!("[Pickups] Player {} collected pickup {}", player_id, pickup_id);
        true
    }
}
