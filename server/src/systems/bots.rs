// bow_arena/server/src/systems/bots.rs

use crate::core::config::{AimConfig, BotConfig};
use crate::core::constants::DEFAULT_MAX_ARROWS;
use crate::core::error::{ServerError, ServerResult};
use crate::core::types::{Avatar, EntityId, PlayerRecord, BOT_AVATARS};
use crate::host::GameHost;
use crate::operational::monitoring::metrics as arena_metrics;
use crate::systems::ai::bot_ai::{BotAISystem, BotSelf, BotState, ThinkRolls};
use crate::systems::ai::targeting::WorldSnapshot;
use crate::systems::respawn::RespawnManager;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashMap;
use tracing::{debug, info, trace, warn};

pub const BOT_NAMES: [&str; 20] = [
    "Arrow Dodger", "Arcs Daddy", "Bullseye Bobby", "Captain Quiver", "The Fletcher",
    "Arrow McArrowface", "Sharpshooter Steve", "Legolas", "Quiver Kid", "Sniper Elf",
    "Straight Shooter", "Pointy Boi", "Bowboy 420", "Arc", "Mid Madonna",
    "Based Bowman", "Delulu Dan", "OP Bow Enjoyer", "Arrow Diff", "Skitz's Future",
];

#[derive(Clone, Debug)]
pub struct BotEntry {
    pub entity: EntityId,
    pub name: String,
    pub avatar: Avatar,
    pub state: BotState,
}

/// Dense slot table of live bots. Removed bots leave a tombstone that the
/// next insert reuses; `index` maps entity ids back to slots.
#[derive(Debug, Default)]
pub struct BotRoster {
    slots: Vec<Option<BotEntry>>,
    free: Vec<usize>,
    index: HashMap<EntityId, usize>,
}

impl BotRoster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entry: BotEntry) -> usize {
        if let Some(&slot) = self.index.get(&entry.entity) {
            self.slots[slot] = Some(entry);
            return slot;
        }

        let entity = entry.entity;
        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(entry);
                slot
            }
            None => {
                self.slots.push(Some(entry));
                self.slots.len() - 1
            }
        };
        self.index.insert(entity, slot);
        slot
    }

    pub fn remove(&mut self, entity: EntityId) -> Option<BotEntry> {
        let slot = self.index.remove(&entity)?;
        let entry = self.slots.get_mut(slot)?.take();
        self.free.push(slot);
        entry
    }

    pub fn get(&self, entity: EntityId) -> Option<&BotEntry> {
        self.index.get(&entity).and_then(|&slot| self.slots.get(slot)?.as_ref())
    }

    pub fn get_mut(&mut self, entity: EntityId) -> Option<&mut BotEntry> {
        let slot = *self.index.get(&entity)?;
        self.slots.get_mut(slot)?.as_mut()
    }

    pub fn contains(&self, entity: EntityId) -> bool {
        self.index.contains_key(&entity)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Live bots in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &BotEntry> {
        self.slots.iter().flatten()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut BotEntry> {
        self.slots.iter_mut().flatten()
    }

    pub fn entity_ids(&self) -> Vec<EntityId> {
        self.iter().map(|entry| entry.entity).collect()
    }

    pub fn expired(&self, now: f64) -> Vec<EntityId> {
        self.iter().filter(|entry| now >= entry.state.leave_time).map(|entry| entry.entity).collect()
    }
}

pub struct BotManager {
    roster: BotRoster,
    config: BotConfig,
    aim: AimConfig,
    last_roster_check: f64,
    rng: StdRng,
}

impl BotManager {
    pub fn new(config: BotConfig, aim: AimConfig, rng: StdRng) -> Self {
        Self {
            roster: BotRoster::new(),
            config,
            aim,
            last_roster_check: 0.0,
            rng,
        }
    }

    pub fn bot_count(&self) -> usize {
        self.roster.len()
    }

    pub fn bot_ids(&self) -> Vec<EntityId> {
        self.roster.entity_ids()
    }

    pub fn bot(&self, entity: EntityId) -> Option<&BotEntry> {
        self.roster.get(entity)
    }

    pub fn is_bot(&self, entity: EntityId) -> bool {
        self.roster.contains(entity)
    }

    /// Runs the roster sweep when due, then one decision step for every bot.
    pub fn update<H: GameHost + ?Sized>(&mut self, host: &H, respawn: &RespawnManager, now: f64) {
        if now - self.last_roster_check >= self.config.roster_check_interval_secs {
            self.last_roster_check = now;
            self.maintain_bot_count(host, respawn, now);
        }

        if self.roster.is_empty() {
            return;
        }

        let snapshot = WorldSnapshot::capture(host);
        let Self { roster, config, aim, rng, .. } = self;

        for entry in roster.iter_mut() {
            let record = host.player_record(entry.entity);
            let me = BotSelf {
                id: entry.entity,
                alive: host.is_alive(entry.entity),
                position: host.entity_position(entry.entity),
                view_ray: host.view_ray(entry.entity),
                arrow_count: record.as_ref().map_or(0, |r| r.arrow_count),
                max_arrows: record.as_ref().map_or(DEFAULT_MAX_ARROWS, |r| r.max_arrows),
            };
            if me.position.is_none() {
                trace!("[Bot {}]: No position this tick", entry.entity);
            }

            let rolls = ThinkRolls::sample(&mut *rng, config, aim);
            let decision = BotAISystem::think(&mut entry.state, &me, &snapshot, &rolls, host, config, aim, now);
            BotAISystem::apply_decision(host, entry.entity, &decision);
        }
    }

    /// Expires bots past their leave time and tops the roster back up to the target count.
    pub fn maintain_bot_count<H: GameHost + ?Sized>(&mut self, host: &H, respawn: &RespawnManager, now: f64) -> usize {
        for entity in self.roster.expired(now) {
            if let Some(entry) = self.remove_bot(host, entity) {
                arena_metrics::record_bot_expired();
                info!("[Bot Management] {} ({}) left the arena", entry.name, entity);
            }
        }

        let missing = self.config.target_count.saturating_sub(self.roster.len());
        let mut spawned = 0;
        for _ in 0..missing {
            match self.create_bot(host, now) {
                Ok(entity) => {
                    if let Some(position) = respawn.spawn_player(host, entity, true) {
                        host.set_entity_position(entity, position);
                    }
                    spawned += 1;
                }
                Err(e) => {
                    warn!("[Bot Management] Failed to spawn bot: {}", e);
                    break;
                }
            }
        }

        if spawned > 0 {
            debug!("[Bot Management] Spawned {} bots, roster now {}", spawned, self.roster.len());
        }
        arena_metrics::set_active_bots(self.roster.len());
        spawned
    }

    pub fn create_bot<H: GameHost + ?Sized>(&mut self, host: &H, now: f64) -> ServerResult<EntityId> {
        let avatar = *BOT_AVATARS
            .choose(&mut self.rng)
            .ok_or_else(|| ServerError::SpawnFailed("no bot avatars configured".into()))?;
        let name = BOT_NAMES
            .choose(&mut self.rng)
            .ok_or_else(|| ServerError::SpawnFailed("no bot names configured".into()))?
            .to_string();

        let entity = host.spawn_character(avatar)?;
        host.set_player_record(entity, PlayerRecord::new(name.clone()));

        let lifetime = if self.config.lifetime_max_secs > self.config.lifetime_min_secs {
            self.rng.gen_range(self.config.lifetime_min_secs..self.config.lifetime_max_secs)
        } else {
            self.config.lifetime_min_secs
        };

        self.roster.insert(BotEntry {
            entity,
            name: name.clone(),
            avatar,
            state: BotState::new(now, now + lifetime),
        });
        arena_metrics::record_bot_spawned();
        info!("[Bot Management] {} ({}) joined as {:?}, leaving in {:.0}s", name, entity, avatar, lifetime);
        Ok(entity)
    }

    pub fn remove_bot<H: GameHost + ?Sized>(&mut self, host: &H, entity: EntityId) -> Option<BotEntry> {
        let entry = self.roster.remove(entity)?;
        host.remove_entity(entity);
        Some(entry)
    }
}
