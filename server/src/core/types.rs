// bow_arena/server/src/core/types.rs
use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

use crate::core::constants::*;

pub type EntityId = u64;

// --- Basic Geometric Types ---
#[derive(Clone, Debug, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Vec3 { x, y, z }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn distance(self, other: Vec3) -> f32 {
        (self - other).length()
    }

    /// Unit vector in the same direction, or zero for a zero-length input.
    pub fn normalize(self) -> Vec3 {
        let len = self.length();
        if len > 0.0 {
            self * (1.0 / len)
        } else {
            Vec3::ZERO
        }
    }

    pub fn dot(self, other: Vec3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;
    fn mul(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

/// Integer grid cell used by path queries.
#[derive(Clone, Debug, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GridCell {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl GridCell {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        GridCell { x, y, z }
    }

    pub fn as_vec3(self) -> Vec3 {
        Vec3::new(self.x as f32, self.y as f32, self.z as f32)
    }
}

/// Eye position and facing of a character.
#[derive(Clone, Debug, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewRay {
    pub origin: Vec3,
    pub direction: Vec3,
}

// --- Traits stored on entities ---

/// Per-player progression and ammunition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub kills: u32,
    pub death_count: u32,
    pub respawn_time: f64,
    pub arrow_count: u32,
    pub max_arrows: u32,
    pub last_kill_time: f64,
    pub name: String,
    pub kill_streak: u32,
}

impl PlayerRecord {
    pub fn new(name: impl Into<String>) -> Self {
        PlayerRecord {
            kills: 0,
            death_count: 0,
            respawn_time: 0.0,
            arrow_count: DEFAULT_MAX_ARROWS,
            max_arrows: DEFAULT_MAX_ARROWS,
            last_kill_time: 0.0,
            name: name.into(),
            kill_streak: 0,
        }
    }

    pub fn has_max_arrows(&self) -> bool {
        self.arrow_count >= self.max_arrows
    }
}

/// State of a pickup spawner. `spawned_item` is `None` while the spawner is dry.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PickupSpawnerRecord {
    pub spawned_item: Option<EntityId>,
    pub dry_since: Option<f64>,
}

// --- Character presentation ---

#[derive(Clone, Debug, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Avatar {
    SquireBot,
    SkeletonBot,
    Maid,
    Babe,
    Wizard,
    Turtles,
    Player,
}

/// Avatars a bot may be spawned with.
pub const BOT_AVATARS: [Avatar; 6] = [
    Avatar::SquireBot,
    Avatar::SkeletonBot,
    Avatar::Maid,
    Avatar::Babe,
    Avatar::Wizard,
    Avatar::Turtles,
];

#[derive(Clone, Debug, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Emote {
    Death,
}

#[derive(Clone, Debug, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovementProfile {
    pub walk_speed: f32,
    pub can_sprint: bool,
    pub sprint_speed_multiplier: f32,
    pub air_acceleration: f32,
    pub max_horizontal_speed_multiplier: f32,
    pub air_friction: f32,
}

impl Default for MovementProfile {
    fn default() -> Self {
        MovementProfile {
            walk_speed: PLAYER_WALK_SPEED,
            can_sprint: true,
            sprint_speed_multiplier: PLAYER_SPRINT_SPEED_MULTIPLIER,
            air_acceleration: PLAYER_AIR_ACCELERATION,
            max_horizontal_speed_multiplier: PLAYER_MAX_HORIZONTAL_SPEED_MULTIPLIER,
            air_friction: PLAYER_AIR_FRICTION,
        }
    }
}

#[derive(Clone, Debug, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlayerPermissions {
    pub can_fly: bool,
    pub can_force_respawn: bool,
    pub can_use_individual_blocks: bool,
}

// --- Network commands ---

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum GameCommand {
    Arrow {
        view_ray: ViewRay,
        draw: f32,
        owner_id: EntityId,
        net_id: u32,
    },
    Hit {
        attacker_id: EntityId,
        victim_id: EntityId,
        position: Vec3,
        net_id: u32,
    },
    Respawn {
        player_id: EntityId,
        position: Vec3,
    },
    Pickup {
        player_id: EntityId,
        pickup_position: Vec3,
    },
    ItemSpawn {
        position: Vec3,
    },
    EnvironmentalDeath {
        victim_id: EntityId,
        reason: String,
    },
}

impl GameCommand {
    pub fn kind(&self) -> &'static str {
        match self {
            GameCommand::Arrow { .. } => "arrow",
            GameCommand::Hit { .. } => "hit",
            GameCommand::Respawn { .. } => "respawn",
            GameCommand::Pickup { .. } => "pickup",
            GameCommand::ItemSpawn { .. } => "itemSpawn",
            GameCommand::EnvironmentalDeath { .. } => "environmentalDeath",
        }
    }
}
