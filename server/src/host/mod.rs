// bow_arena/server/src/host/mod.rs
//
// Contracts consumed from the host engine. Every call is synchronous and
// fire-and-forget from this crate's point of view; implementations take
// `&self` and synchronise internally.

use crate::core::error::ServerResult;
use crate::core::types::{
    Avatar, Emote, EntityId, GameCommand, GridCell, MovementProfile, PickupSpawnerRecord,
    PlayerPermissions, PlayerRecord, Vec3, ViewRay,
};

/// Outcome of a host path query.
#[derive(Clone, Debug, PartialEq)]
pub struct PathResult {
    pub success: bool,
    pub path: Vec<GridCell>,
}

impl PathResult {
    pub fn failed() -> Self {
        PathResult { success: false, path: Vec::new() }
    }
}

#[derive(Clone, Debug, Copy, PartialEq)]
pub struct RayHit {
    pub hit: bool,
    pub hit_entity: Option<EntityId>,
    pub point: Option<Vec3>,
}

impl RayHit {
    pub const MISS: RayHit = RayHit { hit: false, hit_entity: None, point: None };
}

/// Read access to entity state.
pub trait EntityQueries {
    fn world_time(&self) -> f64;
    fn entity_position(&self, id: EntityId) -> Option<Vec3>;
    fn is_alive(&self, id: EntityId) -> bool;
    fn view_ray(&self, id: EntityId) -> Option<ViewRay>;
    fn username(&self, id: EntityId) -> Option<String>;
    /// Player characters, humans and bots alike, in stable host order.
    fn players(&self) -> Vec<EntityId>;
    /// Entities carrying the Pickup trait.
    fn pickups(&self) -> Vec<EntityId>;
    /// Spawn point markers.
    fn respawners(&self) -> Vec<EntityId>;
    fn pickup_spawners(&self) -> Vec<(EntityId, PickupSpawnerRecord)>;
}

/// Trait storage. Last write wins.
pub trait TraitStore {
    fn player_record(&self, id: EntityId) -> Option<PlayerRecord>;
    fn set_player_record(&self, id: EntityId, record: PlayerRecord);
    fn set_pickup_spawner(&self, id: EntityId, record: PickupSpawnerRecord);
    fn mark_pickup(&self, id: EntityId);
}

pub trait Pathfinder {
    fn find_path(&self, start: GridCell, goal: GridCell, budget: u32) -> PathResult;
}

pub trait Raycaster {
    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> RayHit;
}

/// Movement and aim sink plus character presentation.
pub trait CharacterControl {
    fn set_move_target(&self, id: EntityId, path: &[Vec3]);
    fn clear_move_target(&self, id: EntityId);
    fn set_look_at_target(&self, id: EntityId, target: Vec3);
    fn clear_look_at_target(&self, id: EntityId);
    fn set_crouching(&self, id: EntityId, crouching: bool);
    fn set_alive(&self, id: EntityId, alive: bool);
    fn play_emote(&self, id: EntityId, emote: Emote);
    fn stop_emote(&self, id: EntityId);
    fn set_movement_profile(&self, id: EntityId, profile: MovementProfile);
    fn set_permissions(&self, id: EntityId, permissions: PlayerPermissions);
}

pub trait NetBroadcast {
    /// Unordered, at-most-once. `exclude` skips the originating peer.
    fn send_to_all(&self, command: GameCommand, exclude: Option<EntityId>);
}

pub trait EntityLifecycle {
    fn spawn_character(&self, avatar: Avatar) -> ServerResult<EntityId>;
    fn spawn_pickup(&self, position: Vec3, scale: f32) -> ServerResult<EntityId>;
    fn remove_entity(&self, id: EntityId);
    fn set_entity_position(&self, id: EntityId, position: Vec3);
}

/// Everything the gameplay systems need from the engine.
pub trait GameHost:
    EntityQueries + TraitStore + Pathfinder + Raycaster + CharacterControl + NetBroadcast + EntityLifecycle
{
}

impl<T> GameHost for T where
    T: EntityQueries + TraitStore + Pathfinder + Raycaster + CharacterControl + NetBroadcast + EntityLifecycle
{
}
