// bow_arena/server/src/server/game_loop.rs
use super::instance::ArenaServer;
use crate::core::types::EntityId;
use crate::host::GameHost;
use crate::operational::monitoring::metrics as arena_metrics;
use std::sync::atomic::Ordering as AtomicOrdering;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, trace, warn};

/// Host-side simulation advanced between ticks. Returns the (player, pickup)
/// contacts produced by the step.
pub trait SimulationStep {
    fn step(&self, dt: f32) -> Vec<(EntityId, EntityId)>;
}

impl<H> ArenaServer<H>
where
    H: GameHost + SimulationStep + Send + Sync + 'static,
{
    pub async fn run_game_loop(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let tick_duration = Duration::from_secs_f64(1.0 / self.config.tick_rate as f64);
        let delta_time_fixed = tick_duration.as_secs_f32();
        let log_every = self.config.tick_rate * 10;

        let mut tick_timer = interval(tick_duration);
        tick_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        if !self.game_started.load(AtomicOrdering::Acquire) {
            self.start_game();
        }

        info!("Game loop started. Tick rate: {}ms, Delta time: {}s", tick_duration.as_millis(), delta_time_fixed);

        loop {
            tokio::select! {
                _ = tick_timer.tick() => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
            }

            let frame_start_time = Instant::now();
            let current_frame = self.frame_counter.load(AtomicOrdering::Relaxed);

            for (player_id, pickup_id) in self.host.step(delta_time_fixed) {
                self.handle_pickup_contact(player_id, pickup_id);
            }

            let now = self.host.world_time();
            self.process_game_tick(now);

            let frame_time = frame_start_time.elapsed();
            arena_metrics::record_tick_time(frame_time.as_secs_f64());
            trace!("[Frame {}] Tick took {:?}", current_frame, frame_time);

            if frame_time > tick_duration + Duration::from_millis(5) {
                warn!("Frame {} took too long: {:?}", current_frame, frame_time);
            }
            if log_every > 0 && current_frame % log_every == 0 {
                info!("Game loop running - Frame: {}, world time {:.1}s, bots {}", current_frame, now, self.bot_count());
            }
        }

        info!("Game loop stopped after {} frames", self.frame_counter.load(AtomicOrdering::Relaxed));
    }
}
