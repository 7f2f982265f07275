// bow_arena/server/src/systems/mod.rs
pub mod ai;
pub mod bots;
pub mod pickups;
pub mod respawn;
