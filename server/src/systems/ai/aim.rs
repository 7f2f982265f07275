// bow_arena/server/src/systems/ai/aim.rs

use crate::core::config::AimConfig;
use crate::core::types::Vec3;

#[derive(Clone, Debug, Copy, PartialEq)]
pub struct AimSolution {
    pub aim_point: Vec3,
    pub arrow_speed: f32,
    pub time_to_target: f32,
    pub drop: f32,
}

/// Raises the target by the gravity drop an arrow accumulates over `distance`
/// and applies the vertical `jitter`. Horizontal deceleration is ignored.
pub fn solve_aim(target: Vec3, distance: f32, draw: f32, jitter: f32, config: &AimConfig) -> AimSolution {
    let arrow_speed = config.arrow_base_speed * draw * config.arrow_speed_multiplier;
    let (time_to_target, drop) = if arrow_speed > 0.0 {
        let t = distance / arrow_speed;
        (t, 0.5 * config.gravity * t * t)
    } else {
        (0.0, 0.0)
    };

    AimSolution {
        aim_point: Vec3::new(target.x, target.y + drop + jitter, target.z),
        arrow_speed,
        time_to_target,
        drop,
    }
}
