// bow_arena/server/src/systems/ai/bot_ai.rs
//
// Per-bot decision policy. `think` reads the snapshot, queries the host's
// pathfinder/raycaster and updates the bot's private timers; it never touches
// the host's movement, trait or network sinks. `apply_decision` performs
// those effects afterwards.

use rand::Rng;
use tracing::{debug, trace, warn};

use crate::core::config::{AimConfig, BotConfig};
use crate::core::types::{EntityId, GameCommand, GridCell, Vec3, ViewRay};
use crate::host::{GameHost, Pathfinder, Raycaster};
use crate::core::constants::{PATH_WAYPOINT_LIFT, PATH_WAYPOINT_OFFSET_X, PATH_WAYPOINT_OFFSET_Z};
use crate::operational::monitoring::metrics as arena_metrics;
use super::aim::solve_aim;
use super::targeting::{nearest_living_enemy, nearest_pickup, random_pickup, WorldSnapshot};

/// Private memory of one bot.
#[derive(Clone, Debug, PartialEq)]
pub struct BotState {
    pub last_think_time: f64,
    pub last_shoot_time: f64,
    pub current_target_pickup: Option<EntityId>,
    pub current_path: Vec<Vec3>,
    pub current_path_start: GridCell,
    pub current_path_goal: GridCell,
    pub last_distance_to_goal: f32,
    pub last_distance_decrease_time: f64,
    pub idle_until_time: f64,
    pub spawn_time: f64,
    pub leave_time: f64,
}

impl BotState {
    pub fn new(spawn_time: f64, leave_time: f64) -> Self {
        BotState {
            last_think_time: 0.0,
            last_shoot_time: 0.0,
            current_target_pickup: None,
            current_path: Vec::new(),
            current_path_start: GridCell::default(),
            current_path_goal: GridCell::default(),
            last_distance_to_goal: f32::INFINITY,
            last_distance_decrease_time: 0.0,
            idle_until_time: 0.0,
            spawn_time,
            leave_time,
        }
    }

    fn reset_goal_tracking(&mut self, now: f64) {
        self.last_distance_to_goal = f32::INFINITY;
        self.last_distance_decrease_time = now;
    }
}

/// Random draws for one think cycle, sampled before the policy runs.
#[derive(Clone, Debug, Copy, PartialEq)]
pub struct ThinkRolls {
    pub draw: f32,
    pub aim_jitter: f32,
    pub crouch: bool,
    /// Idle window to enter if this cycle fires.
    pub idle_after_shot: Option<f64>,
    pub pickup_pick: f32,
    pub net_id: u32,
}

impl ThinkRolls {
    pub fn sample(rng: &mut impl Rng, bots: &BotConfig, aim: &AimConfig) -> Self {
        let draw = if aim.draw_max > aim.draw_min {
            rng.gen_range(aim.draw_min..=aim.draw_max)
        } else {
            aim.draw_min
        };
        let aim_jitter = if aim.jitter_max > aim.jitter_min {
            rng.gen_range(aim.jitter_min..aim.jitter_max)
        } else {
            aim.jitter_min
        };
        let crouch = rng.gen_bool(bots.crouch_chance);
        let idle_after_shot = if rng.gen_bool(bots.idle_after_shot_chance) {
            Some(if bots.idle_max_secs > bots.idle_min_secs {
                rng.gen_range(bots.idle_min_secs..bots.idle_max_secs)
            } else {
                bots.idle_min_secs
            })
        } else {
            None
        };

        ThinkRolls {
            draw,
            aim_jitter,
            crouch,
            idle_after_shot,
            pickup_pick: rng.gen::<f32>(),
            net_id: rng.gen_range(0..i32::MAX as u32),
        }
    }
}

/// What the bot knows about itself this tick.
#[derive(Clone, Debug, Copy, PartialEq)]
pub struct BotSelf {
    pub id: EntityId,
    pub alive: bool,
    pub position: Option<Vec3>,
    pub view_ray: Option<ViewRay>,
    pub arrow_count: u32,
    pub max_arrows: u32,
}

#[derive(Clone, Debug, Copy, PartialEq)]
pub struct Shot {
    pub aim_ray: ViewRay,
    pub draw: f32,
    pub net_id: u32,
}

#[derive(Clone, Debug, Copy, PartialEq)]
pub struct Engagement {
    pub enemy: EntityId,
    pub aim_point: Vec3,
    pub line_of_sight: bool,
    pub crouch: bool,
    pub shot: Option<Shot>,
}

#[derive(Clone, Debug, Copy, PartialEq)]
pub enum Combat {
    /// No living enemy: stand up.
    NoEnemy,
    /// Enemy found but its aim origin is unknown; leave aim untouched.
    Untracked(EntityId),
    Tracking(Engagement),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Movement {
    /// Post-shot hesitation: stop moving.
    Idle,
    /// Keep following the committed path.
    Continue,
    Travel {
        pickup: EntityId,
        path: Vec<Vec3>,
        look_at: Option<Vec3>,
    },
    /// Path query failed; retried next cycle.
    Replan { start: GridCell, goal: GridCell },
    /// No pickup anywhere: clear movement and look targets.
    NoGoal,
}

#[derive(Clone, Debug, PartialEq)]
pub enum BotDecision {
    /// Dead bot: clear movement and look targets.
    Dead,
    /// Not due to think, or missing host data.
    Noop,
    Act { combat: Combat, movement: Movement },
}

impl BotDecision {
    pub fn shot(&self) -> Option<&Shot> {
        match self {
            BotDecision::Act { combat: Combat::Tracking(engagement), .. } => engagement.shot.as_ref(),
            _ => None,
        }
    }
}

/// JS-style rounding (half up), matching the engine's cell convention.
fn round_half_up(value: f32) -> i32 {
    (value + 0.5).floor() as i32
}

pub fn path_start_cell(position: Vec3) -> GridCell {
    GridCell::new(
        round_half_up(position.x - 0.5),
        round_half_up(position.y),
        round_half_up(position.z - 0.5),
    )
}

pub fn path_goal_cell(pickup_position: Vec3) -> GridCell {
    GridCell::new(
        round_half_up(pickup_position.x - 0.5),
        (pickup_position.y - 1.0).floor() as i32,
        round_half_up(pickup_position.z - 0.5),
    )
}

/// Centre of the cell, lifted slightly off the floor.
pub fn waypoint_from_cell(cell: GridCell) -> Vec3 {
    cell.as_vec3() + Vec3::new(PATH_WAYPOINT_OFFSET_X, PATH_WAYPOINT_LIFT, PATH_WAYPOINT_OFFSET_Z)
}

pub struct BotAISystem;

impl BotAISystem {
    pub fn think<Q>(
        state: &mut BotState,
        me: &BotSelf,
        snapshot: &WorldSnapshot,
        rolls: &ThinkRolls,
        queries: &Q,
        bots: &BotConfig,
        aim: &AimConfig,
        now: f64,
    ) -> BotDecision
    where
        Q: Pathfinder + Raycaster + ?Sized,
    {
        if !me.alive {
            state.current_target_pickup = None;
            return BotDecision::Dead;
        }

        let Some(bot_pos) = me.position else {
            return BotDecision::Noop;
        };

        if now - state.last_think_time < bots.think_interval_secs {
            return BotDecision::Noop;
        }
        state.last_think_time = now;

        let enemy = nearest_living_enemy(me.id, bot_pos, &snapshot.agents);

        let combat = match enemy {
            None => Combat::NoEnemy,
            Some(enemy) => match enemy.aim_origin {
                None => Combat::Untracked(enemy.id),
                Some(enemy_view_pos) => {
                    let Some(view_ray) = me.view_ray else {
                        return BotDecision::Noop;
                    };
                    let distance = bot_pos.distance(enemy_view_pos);

                    let direction = (enemy_view_pos - view_ray.origin).normalize();
                    let ray_start = view_ray.origin + direction * bots.los_ray_start_offset;
                    let hit = queries.raycast(ray_start, direction, bots.los_max_distance);
                    let line_of_sight = !hit.hit || hit.hit_entity == Some(enemy.id);

                    let solution = solve_aim(enemy_view_pos, distance, rolls.draw, rolls.aim_jitter, aim);

                    let mut shot = None;
                    if line_of_sight
                        && now - state.last_shoot_time >= bots.shoot_cooldown_secs
                        && me.arrow_count > 0
                    {
                        shot = Some(Shot {
                            aim_ray: ViewRay {
                                origin: view_ray.origin,
                                direction: (solution.aim_point - view_ray.origin).normalize(),
                            },
                            draw: rolls.draw,
                            net_id: rolls.net_id,
                        });
                        state.last_shoot_time = now;
                        if let Some(idle_for) = rolls.idle_after_shot {
                            state.idle_until_time = now + idle_for;
                        }
                    }

                    Combat::Tracking(Engagement {
                        enemy: enemy.id,
                        aim_point: solution.aim_point,
                        line_of_sight,
                        crouch: line_of_sight && rolls.crouch,
                        shot,
                    })
                }
            },
        };

        if now < state.idle_until_time {
            return BotDecision::Act { combat, movement: Movement::Idle };
        }

        if let Some(target_id) = state.current_target_pickup {
            match snapshot.pickup(target_id) {
                None => {
                    state.current_target_pickup = None;
                    state.current_path.clear();
                    state.last_distance_to_goal = f32::INFINITY;
                }
                Some(target) => {
                    let current_distance = bot_pos.distance(target.position);
                    if current_distance < state.last_distance_to_goal - bots.progress_threshold {
                        state.last_distance_to_goal = current_distance;
                        state.last_distance_decrease_time = now;
                    }

                    if now - state.last_distance_decrease_time < bots.stuck_threshold_secs {
                        return BotDecision::Act { combat, movement: Movement::Continue };
                    }

                    // Stuck: abandon and pick a fresh goal below.
                    state.reset_goal_tracking(now);
                }
            }
        }

        let has_max_arrows = me.arrow_count >= me.max_arrows;
        let target = if has_max_arrows {
            random_pickup(&snapshot.pickups, rolls.pickup_pick)
        } else {
            nearest_pickup(bot_pos, &snapshot.pickups)
        };

        let Some(target) = target else {
            state.current_path.clear();
            return BotDecision::Act { combat, movement: Movement::NoGoal };
        };

        let start = path_start_cell(bot_pos);
        let goal = path_goal_cell(target.position);
        let result = queries.find_path(start, goal, bots.path_search_budget);

        state.current_path_start = start;
        state.current_path_goal = goal;

        if !result.success || result.path.is_empty() {
            state.current_path.clear();
            return BotDecision::Act { combat, movement: Movement::Replan { start, goal } };
        }

        let path: Vec<Vec3> = result.path.iter().copied().map(waypoint_from_cell).collect();

        state.current_target_pickup = Some(target.id);
        state.current_path = path.clone();
        state.last_distance_to_goal = bot_pos.distance(target.position);
        state.last_distance_decrease_time = now;

        // Enemy tracking keeps priority over looking at the pickup.
        let look_at = if enemy.is_none() { Some(target.position) } else { None };

        BotDecision::Act {
            combat,
            movement: Movement::Travel { pickup: target.id, path, look_at },
        }
    }

    pub fn apply_decision<H: GameHost + ?Sized>(host: &H, bot_id: EntityId, decision: &BotDecision) {
        let (combat, movement) = match decision {
            BotDecision::Noop => return,
            BotDecision::Dead => {
                host.clear_move_target(bot_id);
                host.clear_look_at_target(bot_id);
                return;
            }
            BotDecision::Act { combat, movement } => (combat, movement),
        };

        match combat {
            Combat::NoEnemy => host.set_crouching(bot_id, false),
            Combat::Untracked(_) => {}
            Combat::Tracking(engagement) => {
                host.set_look_at_target(bot_id, engagement.aim_point);
                host.set_crouching(bot_id, engagement.crouch);
                if let Some(shot) = &engagement.shot {
                    Self::fire(host, bot_id, engagement.enemy, shot);
                }
            }
        }

        match movement {
            Movement::Idle => host.clear_move_target(bot_id),
            Movement::Continue => {}
            Movement::Travel { pickup, path, look_at } => {
                if let Some(target) = look_at {
                    host.set_look_at_target(bot_id, *target);
                }
                host.set_move_target(bot_id, path);
                trace!("[Bot {}]: Travelling to pickup {} via {} waypoints", bot_id, pickup, path.len());
            }
            Movement::Replan { start, goal } => {
                arena_metrics::record_path_failure();
                trace!("[Bot {}]: Path {:?} -> {:?} failed, retrying next cycle", bot_id, start, goal);
            }
            Movement::NoGoal => {
                host.clear_move_target(bot_id);
                host.clear_look_at_target(bot_id);
            }
        }
    }

    fn fire<H: GameHost + ?Sized>(host: &H, bot_id: EntityId, enemy: EntityId, shot: &Shot) {
        let Some(mut record) = host.player_record(bot_id) else {
            warn!("[Bot {}]: Player record missing at fire time, shot dropped", bot_id);
            return;
        };
        if record.arrow_count == 0 {
            return;
        }

        host.send_to_all(
            GameCommand::Arrow {
                view_ray: shot.aim_ray,
                draw: shot.draw,
                owner_id: bot_id,
                net_id: shot.net_id,
            },
            None,
        );
        record.arrow_count -= 1;
        host.set_player_record(bot_id, record);
        arena_metrics::record_bot_shot();
        debug!("[Bot {}]: Fired at {} (draw {:.2})", bot_id, enemy, shot.draw);
    }
}
