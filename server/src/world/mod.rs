// bow_arena/server/src/world/mod.rs
pub mod map_generator;
pub mod open_arena;
