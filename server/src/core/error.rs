// bow_arena/server/src/core/error.rs
use thiserror::Error;

use crate::core::types::EntityId;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    #[error("Host refused to spawn entity: {0}")]
    SpawnFailed(String),

    #[error("Entity {0} not found")]
    EntityNotFound(EntityId),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type ServerResult<T> = Result<T, ServerError>;
