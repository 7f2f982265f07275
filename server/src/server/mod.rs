// bow_arena/server/src/server/mod.rs
pub mod commands;
pub mod game_loop;
pub mod instance;
