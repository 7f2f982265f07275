// bow_arena/server/src/operational/mod.rs
pub mod monitoring;
