// bow_arena/server/src/core/config.rs
use serde::Deserialize;
use std::path::Path;

use super::constants::*;
use super::error::{ServerError, ServerResult};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub target_count: usize,
    pub lifetime_min_secs: f64,
    pub lifetime_max_secs: f64,
    pub roster_check_interval_secs: f64,
    pub think_interval_secs: f64,
    pub shoot_cooldown_secs: f64,
    pub stuck_threshold_secs: f64,
    pub progress_threshold: f32,
    pub idle_min_secs: f64,
    pub idle_max_secs: f64,
    pub crouch_chance: f64,
    pub idle_after_shot_chance: f64,
    pub los_ray_start_offset: f32,
    pub los_max_distance: f32,
    pub path_search_budget: u32,
}

impl Default for BotConfig {
    fn default() -> Self {
        BotConfig {
            target_count: MAX_BOTS,
            lifetime_min_secs: BOT_LIFETIME_MIN_SECS,
            lifetime_max_secs: BOT_LIFETIME_MAX_SECS,
            roster_check_interval_secs: BOT_ROSTER_CHECK_INTERVAL_SECS,
            think_interval_secs: BOT_THINK_INTERVAL_SECS,
            shoot_cooldown_secs: BOT_SHOOT_COOLDOWN_SECS,
            stuck_threshold_secs: BOT_STUCK_THRESHOLD_SECS,
            progress_threshold: BOT_PROGRESS_THRESHOLD,
            idle_min_secs: BOT_IDLE_DURATION_MIN_SECS,
            idle_max_secs: BOT_IDLE_DURATION_MAX_SECS,
            crouch_chance: BOT_CROUCH_CHANCE,
            idle_after_shot_chance: BOT_IDLE_AFTER_SHOT_CHANCE,
            los_ray_start_offset: BOT_LOS_RAY_START_OFFSET,
            los_max_distance: BOT_LOS_MAX_DISTANCE,
            path_search_budget: BOT_PATH_SEARCH_BUDGET,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AimConfig {
    pub arrow_base_speed: f32,
    pub arrow_speed_multiplier: f32,
    pub gravity: f32,
    pub draw_min: f32,
    pub draw_max: f32,
    pub jitter_min: f32,
    pub jitter_max: f32,
}

impl Default for AimConfig {
    fn default() -> Self {
        AimConfig {
            arrow_base_speed: ARROW_BASE_SPEED,
            arrow_speed_multiplier: ARROW_SPEED_MULTIPLIER,
            gravity: GRAVITY,
            draw_min: DRAW_STRENGTH_MIN,
            draw_max: DRAW_STRENGTH_MAX,
            jitter_min: AIM_JITTER_MIN,
            jitter_max: AIM_JITTER_MAX,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RespawnConfig {
    pub respawn_delay_secs: f64,
}

impl Default for RespawnConfig {
    fn default() -> Self {
        RespawnConfig { respawn_delay_secs: RESPAWN_DELAY_SECS }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PickupConfig {
    pub dry_respawn_secs: f64,
    pub spawn_height_offset: f32,
    pub scale: f32,
}

impl Default for PickupConfig {
    fn default() -> Self {
        PickupConfig {
            dry_respawn_secs: PICKUP_DRY_RESPAWN_SECS,
            spawn_height_offset: PICKUP_SPAWN_HEIGHT_OFFSET,
            scale: PICKUP_SCALE,
        }
    }
}

/// Layout and seeding of the in-memory arena host.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    pub radius: f32,
    pub respawner_count: usize,
    pub seed: Option<u64>,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        ArenaConfig {
            radius: ARENA_DEFAULT_RADIUS,
            respawner_count: 8,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub tick_rate: u64,
    pub metrics_port: Option<u16>,
    pub run_for_secs: Option<f64>,
    pub bots: BotConfig,
    pub aim: AimConfig,
    pub respawn: RespawnConfig,
    pub pickups: PickupConfig,
    pub arena: ArenaConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            tick_rate: SERVER_TICK_RATE,
            metrics_port: None,
            run_for_secs: None,
            bots: BotConfig::default(),
            aim: AimConfig::default(),
            respawn: RespawnConfig::default(),
            pickups: PickupConfig::default(),
            arena: ArenaConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_yaml_str(source: &str) -> ServerResult<Self> {
        let config: ServerConfig = serde_yaml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> ServerResult<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&source)
    }

    pub fn validate(&self) -> ServerResult<()> {
        if self.tick_rate == 0 {
            return Err(ServerError::ConfigError("tick_rate must be positive".into()));
        }
        let bots = &self.bots;
        check_range("bots.lifetime", bots.lifetime_min_secs, bots.lifetime_max_secs)?;
        check_range("bots.idle", bots.idle_min_secs, bots.idle_max_secs)?;
        check_positive("bots.think_interval_secs", bots.think_interval_secs)?;
        check_positive("bots.roster_check_interval_secs", bots.roster_check_interval_secs)?;
        check_positive("bots.stuck_threshold_secs", bots.stuck_threshold_secs)?;
        check_probability("bots.crouch_chance", bots.crouch_chance)?;
        check_probability("bots.idle_after_shot_chance", bots.idle_after_shot_chance)?;
        if bots.shoot_cooldown_secs < 0.0 {
            return Err(ServerError::ConfigError("bots.shoot_cooldown_secs must not be negative".into()));
        }

        let aim = &self.aim;
        check_range("aim.draw", aim.draw_min as f64, aim.draw_max as f64)?;
        check_range("aim.jitter", aim.jitter_min as f64, aim.jitter_max as f64)?;
        if aim.draw_min <= 0.0 || aim.draw_max > 1.0 {
            return Err(ServerError::ConfigError("aim.draw range must lie within (0, 1]".into()));
        }
        check_positive("aim.arrow_base_speed", aim.arrow_base_speed as f64)?;
        check_positive("aim.arrow_speed_multiplier", aim.arrow_speed_multiplier as f64)?;

        check_positive("respawn.respawn_delay_secs", self.respawn.respawn_delay_secs)?;
        check_positive("pickups.dry_respawn_secs", self.pickups.dry_respawn_secs)?;
        check_positive("arena.radius", self.arena.radius as f64)?;
        if let Some(secs) = self.run_for_secs {
            check_positive("run_for_secs", secs)?;
        }
        Ok(())
    }
}

fn check_range(name: &str, min: f64, max: f64) -> ServerResult<()> {
    if !min.is_finite() || !max.is_finite() {
        return Err(ServerError::ConfigError(format!("{name}: bounds must be finite, got {min}..{max}")));
    }
    if min > max {
        return Err(ServerError::ConfigError(format!("{name}: min ({min}) exceeds max ({max})")));
    }
    Ok(())
}

fn check_positive(name: &str, value: f64) -> ServerResult<()> {
    if value <= 0.0 || !value.is_finite() {
        return Err(ServerError::ConfigError(format!("{name} must be positive, got {value}")));
    }
    Ok(())
}

fn check_probability(name: &str, value: f64) -> ServerResult<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ServerError::ConfigError(format!("{name} must be within [0, 1], got {value}")));
    }
    Ok(())
}
