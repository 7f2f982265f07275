// bow_arena/server/src/core/constants.rs
pub const SERVER_TICK_RATE: u64 = 30;

// Bot roster
pub const MAX_BOTS: usize = 3;
pub const BOT_LIFETIME_MIN_SECS: f64 = 200.0;
pub const BOT_LIFETIME_MAX_SECS: f64 = 300.0;
pub const BOT_ROSTER_CHECK_INTERVAL_SECS: f64 = 1.0;

// Bot decision cadence and timers
pub const BOT_THINK_INTERVAL_SECS: f64 = 0.7;
pub const BOT_SHOOT_COOLDOWN_SECS: f64 = 3.0;
pub const BOT_STUCK_THRESHOLD_SECS: f64 = 5.0;
pub const BOT_PROGRESS_THRESHOLD: f32 = 0.1;
pub const BOT_IDLE_DURATION_MIN_SECS: f64 = 0.5;
pub const BOT_IDLE_DURATION_MAX_SECS: f64 = 2.0;
pub const BOT_CROUCH_CHANCE: f64 = 0.2;
pub const BOT_IDLE_AFTER_SHOT_CHANCE: f64 = 0.3;

// Line of sight probe
pub const BOT_LOS_RAY_START_OFFSET: f32 = 2.0; // clears the bot's own collider
pub const BOT_LOS_MAX_DISTANCE: f32 = 200.0;

// Path queries
pub const BOT_PATH_SEARCH_BUDGET: u32 = 1000;
pub const PATH_WAYPOINT_OFFSET_X: f32 = 0.5;
pub const PATH_WAYPOINT_LIFT: f32 = 0.2;
pub const PATH_WAYPOINT_OFFSET_Z: f32 = 0.5;

// Arrow ballistics (m/s, m/s^2)
pub const ARROW_BASE_SPEED: f32 = 50.0;
pub const ARROW_SPEED_MULTIPLIER: f32 = 1.5;
pub const GRAVITY: f32 = 9.81;
pub const DRAW_STRENGTH_MIN: f32 = 0.7;
pub const DRAW_STRENGTH_MAX: f32 = 1.0;
pub const AIM_JITTER_MIN: f32 = -2.0;
pub const AIM_JITTER_MAX: f32 = -1.0;

// Player progression
pub const DEFAULT_MAX_ARROWS: u32 = 3;
pub const RESPAWN_DELAY_SECS: f64 = 5.0;
pub const UNKNOWN_PLAYER_NAME: &str = "Unknown";

// Movement profile applied on every spawn
pub const PLAYER_WALK_SPEED: f32 = 7.0;
pub const PLAYER_SPRINT_SPEED_MULTIPLIER: f32 = 1.3;
pub const PLAYER_AIR_ACCELERATION: f32 = 5.0;
pub const PLAYER_MAX_HORIZONTAL_SPEED_MULTIPLIER: f32 = 6.0;
pub const PLAYER_AIR_FRICTION: f32 = 0.1;

// Pickups
pub const PICKUP_DRY_RESPAWN_SECS: f64 = 10.0;
pub const PICKUP_SPAWN_HEIGHT_OFFSET: f32 = 1.0;
pub const PICKUP_SCALE: f32 = 0.15;
pub const PICKUP_COLLECTION_RADIUS: f32 = 1.0;

// Stand-in host geometry
pub const CHARACTER_EYE_HEIGHT: f32 = 1.6;
pub const CHARACTER_HIT_RADIUS: f32 = 0.6;
pub const ARENA_DEFAULT_RADIUS: f32 = 30.0;
pub const WAYPOINT_REACHED_DISTANCE: f32 = 0.3;
