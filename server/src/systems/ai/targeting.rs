// bow_arena/server/src/systems/ai/targeting.rs
//
// Nearest-enemy and pickup queries over a per-tick snapshot of the world.

use crate::core::types::{EntityId, Vec3};
use crate::host::EntityQueries;

#[derive(Clone, Debug, Copy, PartialEq)]
pub struct AgentSnapshot {
    pub id: EntityId,
    pub position: Vec3,
    pub alive: bool,
    /// Eye position used as the aim origin; `None` when the host has no view ray.
    pub aim_origin: Option<Vec3>,
}

#[derive(Clone, Debug, Copy, PartialEq)]
pub struct PickupSnapshot {
    pub id: EntityId,
    pub position: Vec3,
}

/// Read-only positions of every player and pickup, captured once per tick.
#[derive(Clone, Debug, Default)]
pub struct WorldSnapshot {
    pub agents: Vec<AgentSnapshot>,
    pub pickups: Vec<PickupSnapshot>,
}

impl WorldSnapshot {
    pub fn capture<Q: EntityQueries + ?Sized>(host: &Q) -> Self {
        let agents = host
            .players()
            .into_iter()
            .filter_map(|id| {
                let position = host.entity_position(id)?;
                Some(AgentSnapshot {
                    id,
                    position,
                    alive: host.is_alive(id),
                    aim_origin: host.view_ray(id).map(|ray| ray.origin),
                })
            })
            .collect();

        let pickups = host
            .pickups()
            .into_iter()
            .filter_map(|id| host.entity_position(id).map(|position| PickupSnapshot { id, position }))
            .collect();

        WorldSnapshot { agents, pickups }
    }

    pub fn agent(&self, id: EntityId) -> Option<&AgentSnapshot> {
        self.agents.iter().find(|a| a.id == id)
    }

    pub fn pickup(&self, id: EntityId) -> Option<&PickupSnapshot> {
        self.pickups.iter().find(|p| p.id == id)
    }
}

/// Closest living agent other than `self_id`. Ties keep the first one encountered.
pub fn nearest_living_enemy(self_id: EntityId, from: Vec3, agents: &[AgentSnapshot]) -> Option<&AgentSnapshot> {
    let mut nearest: Option<&AgentSnapshot> = None;
    let mut nearest_distance = f32::INFINITY;

    for agent in agents {
        if agent.id == self_id || !agent.alive {
            continue;
        }
        let distance = from.distance(agent.position);
        if distance < nearest_distance {
            nearest_distance = distance;
            nearest = Some(agent);
        }
    }
    nearest
}

pub fn nearest_pickup(from: Vec3, pickups: &[PickupSnapshot]) -> Option<&PickupSnapshot> {
    let mut nearest: Option<&PickupSnapshot> = None;
    let mut nearest_distance = f32::INFINITY;

    for pickup in pickups {
        let distance = from.distance(pickup.position);
        if distance < nearest_distance {
            nearest_distance = distance;
            nearest = Some(pickup);
        }
    }
    nearest
}

/// Uniform choice driven by `roll` in `[0, 1)`.
pub fn random_pickup(pickups: &[PickupSnapshot], roll: f32) -> Option<&PickupSnapshot> {
    if pickups.is_empty() {
        return None;
    }
    let index = ((roll.clamp(0.0, 1.0) * pickups.len() as f32) as usize).min(pickups.len() - 1);
    pickups.get(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn agent(id: EntityId, x: f32, alive: bool) -> AgentSnapshot {
        AgentSnapshot { id, position: Vec3::new(x, 0.0, 0.0), alive, aim_origin: Some(Vec3::new(x, 1.6, 0.0)) }
    }

    #[test]
    fn nearest_enemy_skips_self_and_dead() {
        let agents = [agent(1, 0.0, true), agent(2, 1.0, false), agent(3, 5.0, true), agent(4, 3.0, true)];
        let found = nearest_living_enemy(1, Vec3::ZERO, &agents).map(|a| a.id);
        assert_eq!(found, Some(4));
    }

    #[test]
    fn nearest_enemy_ties_keep_first_encountered() {
        let agents = [agent(7, -2.0, true), agent(8, 2.0, true)];
        assert_eq!(nearest_living_enemy(1, Vec3::ZERO, &agents).map(|a| a.id), Some(7));
    }

    #[test]
    fn lone_bot_has_no_enemy() {
        let agents = [agent(1, 0.0, true), agent(2, 3.0, false)];
        assert!(nearest_living_enemy(1, Vec3::ZERO, &agents).is_none());
    }

    #[test]
    fn random_pickup_maps_roll_onto_indices() {
        let pickups: Vec<PickupSnapshot> = (0..4)
            .map(|i| PickupSnapshot { id: 10 + i, position: Vec3::new(i as f32, 0.0, 0.0) })
            .collect();
        assert_eq!(random_pickup(&pickups, 0.0).map(|p| p.id), Some(10));
        assert_eq!(random_pickup(&pickups, 0.5).map(|p| p.id), Some(12));
        assert_eq!(random_pickup(&pickups, 0.999).map(|p| p.id), Some(13));
        assert!(random_pickup(&[], 0.3).is_none());
    }

    proptest! {
        #[test]
        fn nearest_pickup_is_never_beaten(
            xs in proptest::collection::vec(-100.0f32..100.0, 1..16),
            from in -100.0f32..100.0,
        ) {
            let pickups: Vec<PickupSnapshot> = xs
                .iter()
                .enumerate()
                .map(|(i, x)| PickupSnapshot { id: i as EntityId, position: Vec3::new(*x, 0.0, 0.0) })
                .collect();
            let origin = Vec3::new(from, 0.0, 0.0);
            let best = nearest_pickup(origin, &pickups).unwrap();
            let best_distance = origin.distance(best.position);
            for p in &pickups {
                prop_assert!(best_distance <= origin.distance(p.position));
            }
        }
    }
}
