// bow_arena/server/src/world/open_arena.rs
//
// In-memory host: flat floor, box walls, kinematic characters. Grid search
// stands in for the engine navigator and sphere/box tests for its raycaster.

use crate::core::constants::*;
use crate::core::error::{ServerError, ServerResult};
use crate::core::types::{
    Avatar, Emote, EntityId, GameCommand, GridCell, MovementProfile, PickupSpawnerRecord,
    PlayerPermissions, PlayerRecord, Vec3, ViewRay,
};
use crate::host::{
    CharacterControl, EntityLifecycle, EntityQueries, NetBroadcast, PathResult, Pathfinder, RayHit, Raycaster,
    TraitStore,
};
use crate::server::game_loop::SimulationStep;
use crate::world::map_generator::{ArenaLayout, Wall};

use dashmap::{DashMap, DashSet};
use parking_lot::RwLock;
use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap, HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use tracing::{debug, trace};

const CROUCH_EYE_HEIGHT: f32 = 1.0;
const CONTACT_HEIGHT: f32 = 2.0;

#[derive(Clone, Debug)]
pub struct Character {
    pub avatar: Avatar,
    pub position: Vec3,
    pub alive: bool,
    pub crouching: bool,
    pub look_at: Option<Vec3>,
    pub path: VecDeque<Vec3>,
    pub emote: Option<Emote>,
    pub profile: MovementProfile,
    pub permissions: PlayerPermissions,
    pub username: Option<String>,
}

impl Character {
    fn new(avatar: Avatar, username: Option<String>, position: Vec3) -> Self {
        Character {
            avatar,
            position,
            alive: true,
            crouching: false,
            look_at: None,
            path: VecDeque::new(),
            emote: None,
            profile: MovementProfile::default(),
            permissions: PlayerPermissions::default(),
            username,
        }
    }

    fn eye(&self) -> Vec3 {
        let height = if self.crouching { CROUCH_EYE_HEIGHT } else { CHARACTER_EYE_HEIGHT };
        self.position + Vec3::new(0.0, height, 0.0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Broadcast {
    pub command: GameCommand,
    pub exclude: Option<EntityId>,
}

#[derive(Default)]
struct ArenaState {
    time: f64,
    characters: BTreeMap<EntityId, Character>,
    pickups: BTreeMap<EntityId, Vec3>,
    respawners: BTreeMap<EntityId, Vec3>,
    spawners: BTreeMap<EntityId, Vec3>,
    walls: Vec<Wall>,
    blocked: HashSet<(i32, i32)>,
    broadcasts: Vec<Broadcast>,
}

pub struct OpenArena {
    state: RwLock<ArenaState>,
    player_records: DashMap<EntityId, PlayerRecord>,
    spawner_records: DashMap<EntityId, PickupSpawnerRecord>,
    pickup_marks: DashSet<EntityId>,
    next_id: AtomicU64,
    path_queries: AtomicU64,
}

impl Default for OpenArena {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenArena {
    pub fn new() -> Self {
        OpenArena {
            state: RwLock::new(ArenaState::default()),
            player_records: DashMap::new(),
            spawner_records: DashMap::new(),
            pickup_marks: DashSet::new(),
            next_id: AtomicU64::new(1),
            path_queries: AtomicU64::new(0),
        }
    }

    pub fn from_layout(layout: &ArenaLayout) -> Self {
        let arena = Self::new();
        for position in &layout.respawners {
            arena.add_respawner(*position);
        }
        for position in &layout.pickup_spawners {
            arena.add_pickup_spawner(*position);
        }
        for wall in &layout.walls {
            arena.add_wall(*wall);
        }
        debug!(
            "[OpenArena] Built from layout: {} respawners, {} pickup spawners, {} walls",
            layout.respawners.len(),
            layout.pickup_spawners.len(),
            layout.walls.len()
        );
        arena
    }

    fn allocate_id(&self) -> EntityId {
        self.next_id.fetch_add(1, AtomicOrdering::Relaxed)
    }

    // --- Scene setup ---

    /// Adds a connected human player (no trait record until spawned).
    pub fn add_player(&self, username: &str, position: Vec3) -> EntityId {
        let id = self.allocate_id();
        self.state
            .write()
            .characters
            .insert(id, Character::new(Avatar::Player, Some(username.to_string()), position));
        id
    }

    pub fn add_respawner(&self, position: Vec3) -> EntityId {
        let id = self.allocate_id();
        self.state.write().respawners.insert(id, position);
        id
    }

    pub fn add_pickup_spawner(&self, position: Vec3) -> EntityId {
        let id = self.allocate_id();
        self.state.write().spawners.insert(id, position);
        self.spawner_records.insert(id, PickupSpawnerRecord::default());
        id
    }

    /// Places a loose pickup not owned by any spawner.
    pub fn add_pickup(&self, position: Vec3) -> EntityId {
        let id = self.allocate_id();
        self.state.write().pickups.insert(id, position);
        self.pickup_marks.insert(id);
        id
    }

    /// Adds an obstacle and blocks every grid cell whose centre lies in its footprint.
    pub fn add_wall(&self, wall: Wall) {
        let mut state = self.state.write();
        let (x0, x1) = (wall.min.x.floor() as i32, wall.max.x.ceil() as i32);
        let (z0, z1) = (wall.min.z.floor() as i32, wall.max.z.ceil() as i32);
        for x in x0..=x1 {
            for z in z0..=z1 {
                if wall.contains_xz(x as f32 + 0.5, z as f32 + 0.5) {
                    state.blocked.insert((x, z));
                }
            }
        }
        state.walls.push(wall);
    }

    pub fn block_cell(&self, x: i32, z: i32) {
        self.state.write().blocked.insert((x, z));
    }

    pub fn set_time(&self, time: f64) {
        self.state.write().time = time;
    }

    pub fn advance_time(&self, dt: f64) -> f64 {
        let mut state = self.state.write();
        state.time += dt;
        state.time
    }

    // --- Inspection ---

    pub fn character(&self, id: EntityId) -> Option<Character> {
        self.state.read().characters.get(&id).cloned()
    }

    pub fn character_count(&self) -> usize {
        self.state.read().characters.len()
    }

    pub fn look_at_target(&self, id: EntityId) -> Option<Vec3> {
        self.state.read().characters.get(&id).and_then(|c| c.look_at)
    }

    pub fn move_target(&self, id: EntityId) -> Vec<Vec3> {
        self.state
            .read()
            .characters
            .get(&id)
            .map(|c| c.path.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn is_crouching(&self, id: EntityId) -> bool {
        self.state.read().characters.get(&id).is_some_and(|c| c.crouching)
    }

    pub fn broadcasts(&self) -> Vec<Broadcast> {
        self.state.read().broadcasts.clone()
    }

    pub fn take_broadcasts(&self) -> Vec<Broadcast> {
        std::mem::take(&mut self.state.write().broadcasts)
    }

    pub fn path_query_count(&self) -> u64 {
        self.path_queries.load(AtomicOrdering::Relaxed)
    }

    pub fn pickup_spawner_record(&self, id: EntityId) -> Option<PickupSpawnerRecord> {
        self.spawner_records.get(&id).map(|r| r.clone())
    }

    /// A* over the floor grid, 4-connected, counting expansions against `budget`.
    fn grid_search(blocked: &HashSet<(i32, i32)>, start: (i32, i32), goal: (i32, i32), budget: u32) -> Option<Vec<(i32, i32)>> {
        if blocked.contains(&goal) {
            return None;
        }
        let heuristic = |(x, z): (i32, i32)| (x - goal.0).abs() + (z - goal.1).abs();

        let mut open = BinaryHeap::new();
        let mut came_from: HashMap<(i32, i32), (i32, i32)> = HashMap::new();
        let mut g_score: HashMap<(i32, i32), i32> = HashMap::new();
        g_score.insert(start, 0);
        open.push(Reverse((heuristic(start), 0, start)));

        let mut expanded = 0u32;
        while let Some(Reverse((_, g, node))) = open.pop() {
            if node == goal {
                let mut path = vec![node];
                let mut current = node;
                while let Some(&previous) = came_from.get(&current) {
                    path.push(previous);
                    current = previous;
                }
                path.reverse();
                return Some(path);
            }
            if g > g_score.get(&node).copied().unwrap_or(i32::MAX) {
                continue;
            }
            expanded += 1;
            if expanded > budget {
                return None;
            }

            for (dx, dz) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
                let next = (node.0 + dx, node.1 + dz);
                if blocked.contains(&next) {
                    continue;
                }
                let tentative = g + 1;
                if tentative < g_score.get(&next).copied().unwrap_or(i32::MAX) {
                    g_score.insert(next, tentative);
                    came_from.insert(next, node);
                    open.push(Reverse((tentative + heuristic(next), tentative, next)));
                }
            }
        }
        None
    }
}

impl EntityQueries for OpenArena {
    fn world_time(&self) -> f64 {
        self.state.read().time
    }

    fn entity_position(&self, id: EntityId) -> Option<Vec3> {
        let state = self.state.read();
        state
            .characters
            .get(&id)
            .map(|c| c.position)
            .or_else(|| state.pickups.get(&id).copied())
            .or_else(|| state.respawners.get(&id).copied())
            .or_else(|| state.spawners.get(&id).copied())
    }

    fn is_alive(&self, id: EntityId) -> bool {
        self.state.read().characters.get(&id).is_some_and(|c| c.alive)
    }

    fn view_ray(&self, id: EntityId) -> Option<ViewRay> {
        let state = self.state.read();
        let character = state.characters.get(&id)?;
        let origin = character.eye();
        let direction = match character.look_at {
            Some(target) if target != origin => (target - origin).normalize(),
            _ => Vec3::new(0.0, 0.0, 1.0),
        };
        Some(ViewRay { origin, direction })
    }

    fn username(&self, id: EntityId) -> Option<String> {
        self.state.read().characters.get(&id).and_then(|c| c.username.clone())
    }

    fn players(&self) -> Vec<EntityId> {
        self.state.read().characters.keys().copied().collect()
    }

    fn pickups(&self) -> Vec<EntityId> {
        self.state
            .read()
            .pickups
            .keys()
            .copied()
            .filter(|id| self.pickup_marks.contains(id))
            .collect()
    }

    fn respawners(&self) -> Vec<EntityId> {
        self.state.read().respawners.keys().copied().collect()
    }

    fn pickup_spawners(&self) -> Vec<(EntityId, PickupSpawnerRecord)> {
        let ids: Vec<EntityId> = self.state.read().spawners.keys().copied().collect();
        ids.into_iter()
            .map(|id| (id, self.spawner_records.get(&id).map(|r| r.clone()).unwrap_or_default()))
            .collect()
    }
}

impl TraitStore for OpenArena {
    fn player_record(&self, id: EntityId) -> Option<PlayerRecord> {
        self.player_records.get(&id).map(|r| r.clone())
    }

    fn set_player_record(&self, id: EntityId, record: PlayerRecord) {
        self.player_records.insert(id, record);
    }

    fn set_pickup_spawner(&self, id: EntityId, record: PickupSpawnerRecord) {
        self.spawner_records.insert(id, record);
    }

    fn mark_pickup(&self, id: EntityId) {
        self.pickup_marks.insert(id);
    }
}

impl Pathfinder for OpenArena {
    fn find_path(&self, start: GridCell, goal: GridCell, budget: u32) -> PathResult {
        self.path_queries.fetch_add(1, AtomicOrdering::Relaxed);
        let state = self.state.read();

        match Self::grid_search(&state.blocked, (start.x, start.z), (goal.x, goal.z), budget) {
            Some(cells) => {
                let last = cells.len().saturating_sub(1);
                let path = cells
                    .into_iter()
                    .enumerate()
                    .map(|(i, (x, z))| GridCell::new(x, if i == last { goal.y } else { start.y }, z))
                    .collect();
                PathResult { success: true, path }
            }
            None => {
                trace!("[OpenArena] No path {:?} -> {:?} within {} expansions", start, goal, budget);
                PathResult::failed()
            }
        }
    }
}

impl Raycaster for OpenArena {
    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> RayHit {
        let direction = direction.normalize();
        let state = self.state.read();
        let mut best: Option<(f32, Option<EntityId>)> = None;

        for (id, character) in &state.characters {
            if !character.alive {
                continue;
            }
            let offset = origin - character.eye();
            let b = offset.dot(direction);
            let c = offset.dot(offset) - CHARACTER_HIT_RADIUS * CHARACTER_HIT_RADIUS;
            let discriminant = b * b - c;
            if discriminant < 0.0 {
                continue;
            }
            let root = discriminant.sqrt();
            let t = if -b - root >= 0.0 { -b - root } else { -b + root };
            if t >= 0.0 && t <= max_distance && best.map_or(true, |(bt, _)| t < bt) {
                best = Some((t, Some(*id)));
            }
        }

        for wall in &state.walls {
            if let Some(t) = wall.ray_intersection(origin, direction, max_distance) {
                if best.map_or(true, |(bt, _)| t < bt) {
                    best = Some((t, None));
                }
            }
        }

        match best {
            Some((t, hit_entity)) => RayHit { hit: true, hit_entity, point: Some(origin + direction * t) },
            None => RayHit::MISS,
        }
    }
}

impl CharacterControl for OpenArena {
    fn set_move_target(&self, id: EntityId, path: &[Vec3]) {
        if let Some(c) = self.state.write().characters.get_mut(&id) {
            c.path = path.iter().copied().collect();
        }
    }

    fn clear_move_target(&self, id: EntityId) {
        if let Some(c) = self.state.write().characters.get_mut(&id) {
            c.path.clear();
        }
    }

    fn set_look_at_target(&self, id: EntityId, target: Vec3) {
        if let Some(c) = self.state.write().characters.get_mut(&id) {
            c.look_at = Some(target);
        }
    }

    fn clear_look_at_target(&self, id: EntityId) {
        if let Some(c) = self.state.write().characters.get_mut(&id) {
            c.look_at = None;
        }
    }

    fn set_crouching(&self, id: EntityId, crouching: bool) {
        if let Some(c) = self.state.write().characters.get_mut(&id) {
            c.crouching = crouching;
        }
    }

    fn set_alive(&self, id: EntityId, alive: bool) {
        if let Some(c) = self.state.write().characters.get_mut(&id) {
            c.alive = alive;
        }
    }

    fn play_emote(&self, id: EntityId, emote: Emote) {
        if let Some(c) = self.state.write().characters.get_mut(&id) {
            c.emote = Some(emote);
        }
    }

    fn stop_emote(&self, id: EntityId) {
        if let Some(c) = self.state.write().characters.get_mut(&id) {
            c.emote = None;
        }
    }

    fn set_movement_profile(&self, id: EntityId, profile: MovementProfile) {
        if let Some(c) = self.state.write().characters.get_mut(&id) {
            c.profile = profile;
        }
    }

    fn set_permissions(&self, id: EntityId, permissions: PlayerPermissions) {
        if let Some(c) = self.state.write().characters.get_mut(&id) {
            c.permissions = permissions;
        }
    }
}

impl NetBroadcast for OpenArena {
    fn send_to_all(&self, command: GameCommand, exclude: Option<EntityId>) {
        if tracing::enabled!(tracing::Level::TRACE) {
            match serde_json::to_string(&command) {
                Ok(payload) => trace!("[OpenArena] broadcast {}", payload),
                Err(e) => trace!("[OpenArena] broadcast {} (unserialisable: {})", command.kind(), e),
            }
        }
        self.state.write().broadcasts.push(Broadcast { command, exclude });
    }
}

impl EntityLifecycle for OpenArena {
    fn spawn_character(&self, avatar: Avatar) -> ServerResult<EntityId> {
        if avatar == Avatar::Player {
            return Err(ServerError::SpawnFailed("player avatars belong to connected peers".into()));
        }
        let id = self.allocate_id();
        self.state.write().characters.insert(id, Character::new(avatar, None, Vec3::ZERO));
        Ok(id)
    }

    fn spawn_pickup(&self, position: Vec3, _scale: f32) -> ServerResult<EntityId> {
        let id = self.allocate_id();
        self.state.write().pickups.insert(id, position);
        Ok(id)
    }

    fn remove_entity(&self, id: EntityId) {
        {
            let mut state = self.state.write();
            state.characters.remove(&id);
            state.pickups.remove(&id);
        }
        self.player_records.remove(&id);
        self.pickup_marks.remove(&id);
    }

    fn set_entity_position(&self, id: EntityId, position: Vec3) {
        let mut state = self.state.write();
        if let Some(c) = state.characters.get_mut(&id) {
            c.position = position;
            c.path.clear();
        } else if let Some(p) = state.pickups.get_mut(&id) {
            *p = position;
        }
    }
}

impl SimulationStep for OpenArena {
    /// Advances time, walks living characters along their paths and
    /// reports every character overlapping a pickup.
    fn step(&self, dt: f32) -> Vec<(EntityId, EntityId)> {
        let mut state = self.state.write();
        state.time += dt as f64;

        for character in state.characters.values_mut() {
            if !character.alive {
                continue;
            }
            let mut budget = character.profile.walk_speed * dt;
            while budget > 0.0 {
                let Some(&waypoint) = character.path.front() else {
                    break;
                };
                let to_target = Vec3::new(waypoint.x - character.position.x, 0.0, waypoint.z - character.position.z);
                let remaining = to_target.length();
                if remaining <= WAYPOINT_REACHED_DISTANCE.max(budget) {
                    character.position.x = waypoint.x;
                    character.position.z = waypoint.z;
                    character.path.pop_front();
                    budget -= remaining;
                } else {
                    character.position = character.position + to_target.normalize() * budget;
                    budget = 0.0;
                }
            }
        }

        let mut contacts = Vec::new();
        for (character_id, character) in &state.characters {
            if !character.alive {
                continue;
            }
            for (pickup_id, pickup) in &state.pickups {
                if !self.pickup_marks.contains(pickup_id) {
                    continue;
                }
                let dx = pickup.x - character.position.x;
                let dz = pickup.z - character.position.z;
                let horizontal = (dx * dx + dz * dz).sqrt();
                let vertical = (pickup.y - character.position.y).abs();
                if horizontal <= PICKUP_COLLECTION_RADIUS && vertical <= CONTACT_HEIGHT {
                    contacts.push((*character_id, *pickup_id));
                }
            }
        }
        contacts
    }
}
