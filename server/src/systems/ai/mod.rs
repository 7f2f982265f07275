// bow_arena/server/src/systems/ai/mod.rs
pub mod aim;
pub mod bot_ai;
pub mod targeting;
