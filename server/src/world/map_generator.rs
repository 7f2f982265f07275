// bow_arena/server/src/world/map_generator.rs
use crate::core::config::ArenaConfig;
use crate::core::types::Vec3;
use rand::Rng;
use std::f32::consts::{FRAC_PI_4, FRAC_PI_8, TAU};

const BORDER_THICKNESS: f32 = 1.0;
const WALL_HEIGHT: f32 = 4.0;
const RESPAWN_RING_FACTOR: f32 = 0.8;
const PICKUP_RING_FACTOR: f32 = 0.45;
const COVER_RING_FACTOR: f32 = 0.6;

/// Axis-aligned box obstacle.
#[derive(Clone, Debug, Copy, PartialEq)]
pub struct Wall {
    pub min: Vec3,
    pub max: Vec3,
}

impl Wall {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Wall { min, max }
    }

    pub fn centered(center: Vec3, half_extents: Vec3) -> Self {
        Wall { min: center - half_extents, max: center + half_extents }
    }

    pub fn contains_xz(&self, x: f32, z: f32) -> bool {
        x >= self.min.x && x <= self.max.x && z >= self.min.z && z <= self.max.z
    }

    /// Distance along `direction` to the first intersection within `max_distance` (slab test).
    pub fn ray_intersection(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<f32> {
        let mut t_min = 0.0f32;
        let mut t_max = max_distance;

        let axes = [
            (origin.x, direction.x, self.min.x, self.max.x),
            (origin.y, direction.y, self.min.y, self.max.y),
            (origin.z, direction.z, self.min.z, self.max.z),
        ];
        for (o, d, lo, hi) in axes {
            if d.abs() < f32::EPSILON {
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / d;
            let (mut t0, mut t1) = ((lo - o) * inv, (hi - o) * inv);
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return None;
            }
        }
        Some(t_min)
    }
}

#[derive(Clone, Debug, Default)]
pub struct ArenaLayout {
    pub respawners: Vec<Vec3>,
    pub pickup_spawners: Vec<Vec3>,
    pub walls: Vec<Wall>,
}

pub struct MapGenerator;

impl MapGenerator {
    pub fn generate_arena(config: &ArenaConfig, rng: &mut impl Rng) -> ArenaLayout {
        let mut walls = Self::create_border_walls(config.radius);
        walls.extend(Self::create_cover_pillars(config.radius, rng));

        ArenaLayout {
            respawners: Self::create_respawn_ring(config.radius, config.respawner_count),
            pickup_spawners: Self::create_pickup_spawners(config.radius),
            walls,
        }
    }

    fn create_respawn_ring(radius: f32, count: usize) -> Vec<Vec3> {
        let ring = radius * RESPAWN_RING_FACTOR;
        (0..count)
            .map(|i| {
                let angle = i as f32 * TAU / count as f32;
                Vec3::new(ring * angle.cos(), 0.0, ring * angle.sin())
            })
            .collect()
    }

    // Centre plus one per axis direction.
    fn create_pickup_spawners(radius: f32) -> Vec<Vec3> {
        let ring = radius * PICKUP_RING_FACTOR;
        let mut spawners = vec![Vec3::ZERO];
        spawners.extend((0..4).map(|i| {
            let angle = i as f32 * TAU / 4.0;
            Vec3::new(ring * angle.cos(), 0.0, ring * angle.sin())
        }));
        spawners
    }

    fn create_cover_pillars(radius: f32, rng: &mut impl Rng) -> Vec<Wall> {
        let ring = radius * COVER_RING_FACTOR;
        (0..8)
            .map(|i| {
                let angle = FRAC_PI_8 + i as f32 * FRAC_PI_4;
                let half_width = rng.gen_range(0.75..1.5);
                let center = Vec3::new(ring * angle.cos(), WALL_HEIGHT / 2.0, ring * angle.sin());
                Wall::centered(center, Vec3::new(half_width, WALL_HEIGHT / 2.0, half_width))
            })
            .collect()
    }

    fn create_border_walls(radius: f32) -> Vec<Wall> {
        let outer = radius + BORDER_THICKNESS;
        vec![
            Wall::new(Vec3::new(-outer, 0.0, -outer), Vec3::new(outer, WALL_HEIGHT, -radius)),
            Wall::new(Vec3::new(-outer, 0.0, radius), Vec3::new(outer, WALL_HEIGHT, outer)),
            Wall::new(Vec3::new(-outer, 0.0, -outer), Vec3::new(-radius, WALL_HEIGHT, outer)),
            Wall::new(Vec3::new(radius, 0.0, -outer), Vec3::new(outer, WALL_HEIGHT, outer)),
        ]
    }
}
