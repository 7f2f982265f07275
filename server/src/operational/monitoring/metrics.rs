// bow_arena/server/src/operational/monitoring/metrics.rs
use metrics::{counter, gauge, histogram, describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::time::Instant;
use anyhow::{Context, Result};

pub const BOT_SHOTS_TOTAL: &str = "arena_bot_shots_total";
pub const BOTS_SPAWNED_TOTAL: &str = "arena_bots_spawned_total";
pub const BOTS_EXPIRED_TOTAL: &str = "arena_bots_expired_total";
pub const BOT_PATH_FAILURES_TOTAL: &str = "arena_bot_path_failures_total";
pub const RESPAWNS_TOTAL: &str = "arena_respawns_total";
pub const PICKUPS_COLLECTED_TOTAL: &str = "arena_pickups_collected_total";
pub const ACTIVE_BOTS: &str = "arena_active_bots";
pub const TICKS_TOTAL: &str = "arena_ticks_total";
pub const TICK_TIME_SECONDS: &str = "arena_tick_time_seconds";

pub struct MetricsSystem {
    start_time: Instant,
}

impl MetricsSystem {
    /// Installs the Prometheus exporter on `port` and registers descriptions.
    pub fn new(port: u16) -> Result<Self> {
        PrometheusBuilder::new()
            .with_http_listener(([0, 0, 0, 0], port))
            .install()
            .context("Failed to install Prometheus exporter")?;

        describe_counter!(BOT_SHOTS_TOTAL, "Arrows fired by bots");
        describe_counter!(BOTS_SPAWNED_TOTAL, "Bots added to the roster");
        describe_counter!(BOTS_EXPIRED_TOTAL, "Bots removed after their lifetime ran out");
        describe_counter!(BOT_PATH_FAILURES_TOTAL, "Failed bot path queries");
        describe_counter!(RESPAWNS_TOTAL, "Players respawned after death");
        describe_counter!(PICKUPS_COLLECTED_TOTAL, "Arrow pickups collected");
        describe_counter!(TICKS_TOTAL, "Game ticks processed");
        describe_gauge!(ACTIVE_BOTS, "Bots currently in the roster");
        describe_histogram!(TICK_TIME_SECONDS, "Tick processing time in seconds");

        Ok(MetricsSystem {
            start_time: Instant::now(),
        })
    }

    pub fn uptime_secs(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64()
    }
}

pub fn record_tick_time(duration: f64) {
    histogram!(TICK_TIME_SECONDS).record(duration);
    counter!(TICKS_TOTAL).increment(1);
}

pub fn record_bot_shot() {
    counter!(BOT_SHOTS_TOTAL).increment(1);
}

pub fn record_bot_spawned() {
    counter!(BOTS_SPAWNED_TOTAL).increment(1);
}

pub fn record_bot_expired() {
    counter!(BOTS_EXPIRED_TOTAL).increment(1);
}

pub fn record_path_failure() {
    counter!(BOT_PATH_FAILURES_TOTAL).increment(1);
}

pub fn record_respawn() {
    counter!(RESPAWNS_TOTAL).increment(1);
}

pub fn record_pickup_collected() {
    counter!(PICKUPS_COLLECTED_TOTAL).increment(1);
}

pub fn set_active_bots(count: usize) {
    gauge!(ACTIVE_BOTS).set(count as f64);
}

// Logging setup
pub fn init_logging() -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, fmt};

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bow_arena_server_core=info,bow_arena_server=info,warn".into()),
        )
        .with(fmt::layer())
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    Ok(())
}
