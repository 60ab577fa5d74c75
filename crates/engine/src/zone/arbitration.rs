use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::interaction::Interactable;
use crate::math::Vec3;

use super::placement::{PlacementZone, ZoneId};

/// Elects the single zone the actor is interacting with this tick.
///
/// The result is memoized per tick so every zone asking during one tick sees
/// the same winner. Registering or deregistering a zone drops the memo.
#[derive(Debug, Default)]
pub struct ArbitrationCoordinator {
    registry: BTreeSet<ZoneId>,
    cache: Option<(u64, Option<ZoneId>)>,
    recompute_count: u64,
}

impl ArbitrationCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, zone: ZoneId) -> bool {
        let inserted = self.registry.insert(zone);
        if inserted {
            self.invalidate();
        }
        inserted
    }

    pub fn deregister(&mut self, zone: ZoneId) -> bool {
        let removed = self.registry.remove(&zone);
        if removed {
            self.invalidate();
        }
        removed
    }

    pub fn invalidate(&mut self) {
        self.cache = None;
    }

    pub fn is_registered(&self, zone: ZoneId) -> bool {
        self.registry.contains(&zone)
    }

    pub fn registered(&self) -> impl Iterator<Item = ZoneId> + '_ {
        self.registry.iter().copied()
    }

    pub fn cached_winner(&self, tick: u64) -> Option<Option<ZoneId>> {
        match self.cache {
            Some((cached_tick, winner)) if cached_tick == tick => Some(winner),
            _ => None,
        }
    }

    pub fn recompute_count(&self) -> u64 {
        self.recompute_count
    }

    /// Nearest registered, active zone whose own range contains the actor.
    /// Equal distances go to the lower zone id.
    pub fn nearest_zone(
        &mut self,
        tick: u64,
        actor_position: Vec3,
        zones: &BTreeMap<ZoneId, PlacementZone>,
    ) -> Option<ZoneId> {
        if let Some(winner) = self.cached_winner(tick) {
            return winner;
        }

        let mut best: Option<(ZoneId, f32)> = None;
        for zone_id in &self.registry {
            let Some(zone) = zones.get(zone_id) else {
                continue;
            };
            if !zone.is_active() {
                continue;
            }
            let gate = zone.gate();
            let anchor = zone.interaction_point();
            if !gate.is_in_range(actor_position, anchor) {
                continue;
            }
            let distance_sq = gate.range_policy().distance_sq(actor_position, anchor);
            // Registry iterates in ascending id order, so strict less keeps the
            // lower id on ties.
            if best.map_or(true, |(_, best_sq)| distance_sq < best_sq) {
                best = Some((*zone_id, distance_sq));
            }
        }

        let winner = best.map(|(zone_id, _)| zone_id);
        self.cache = Some((tick, winner));
        self.recompute_count = self.recompute_count.saturating_add(1);
        debug!(tick, winner = ?winner, "arbitration_recomputed");
        winner
    }
}
