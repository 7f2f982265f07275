// bow_arena/server/src/lib.rs

// Package metadata generated by build.rs
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub mod core;
pub mod host;
pub mod world;
pub mod server;
pub mod operational;
pub mod systems;

pub use crate::host::GameHost;
pub use crate::server::instance::ArenaServer;
