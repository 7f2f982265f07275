// bow_arena/server/src/operational/monitoring/mod.rs
pub mod metrics;
