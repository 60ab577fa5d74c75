use crate::carry::EntityId;
use crate::collab::PromptTarget;
use crate::math::Vec3;
use crate::zone::ZoneId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattleOutcome {
    Victory,
    Defeat,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InteractionEvent {
    HoldCompleted { target: PromptTarget },
    EntitySpawned { entity: EntityId },
    EntityDespawned { entity: EntityId },
    Taken { entity: EntityId },
    PutOnGround { entity: EntityId, position: Vec3 },
    PlacedOnPanel { entity: EntityId, zone: ZoneId },
    Reclaimed { entity: EntityId, zone: ZoneId },
    StaleClaimReleased { entity: EntityId, zone: ZoneId },
    BattleRequested { entity: EntityId },
    BattleResolved {
        entity: EntityId,
        outcome: BattleOutcome,
    },
    EntityUpgraded { entity: EntityId, level: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionEventKind {
    HoldCompleted,
    EntitySpawned,
    EntityDespawned,
    Taken,
    PutOnGround,
    PlacedOnPanel,
    Reclaimed,
    StaleClaimReleased,
    BattleRequested,
    BattleResolved,
    EntityUpgraded,
}

impl InteractionEvent {
    pub fn kind(&self) -> InteractionEventKind {
        match self {
            Self::HoldCompleted { .. } => InteractionEventKind::HoldCompleted,
            Self::EntitySpawned { .. } => InteractionEventKind::EntitySpawned,
            Self::EntityDespawned { .. } => InteractionEventKind::EntityDespawned,
            Self::Taken { .. } => InteractionEventKind::Taken,
            Self::PutOnGround { .. } => InteractionEventKind::PutOnGround,
            Self::PlacedOnPanel { .. } => InteractionEventKind::PlacedOnPanel,
            Self::Reclaimed { .. } => InteractionEventKind::Reclaimed,
            Self::StaleClaimReleased { .. } => InteractionEventKind::StaleClaimReleased,
            Self::BattleRequested { .. } => InteractionEventKind::BattleRequested,
            Self::BattleResolved { .. } => InteractionEventKind::BattleResolved,
            Self::EntityUpgraded { .. } => InteractionEventKind::EntityUpgraded,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InteractionEventCounts {
    pub total: u32,
    pub hold_completed: u32,
    pub entity_spawned: u32,
    pub entity_despawned: u32,
    pub taken: u32,
    pub put_on_ground: u32,
    pub placed_on_panel: u32,
    pub reclaimed: u32,
    pub stale_claim_released: u32,
    pub battle_requested: u32,
    pub battle_resolved: u32,
    pub entity_upgraded: u32,
}

impl InteractionEventCounts {
    fn record(&mut self, kind: InteractionEventKind) {
        self.total = self.total.saturating_add(1);
        let slot = match kind {
            InteractionEventKind::HoldCompleted => &mut self.hold_completed,
            InteractionEventKind::EntitySpawned => &mut self.entity_spawned,
            InteractionEventKind::EntityDespawned => &mut self.entity_despawned,
            InteractionEventKind::Taken => &mut self.taken,
            InteractionEventKind::PutOnGround => &mut self.put_on_ground,
            InteractionEventKind::PlacedOnPanel => &mut self.placed_on_panel,
            InteractionEventKind::Reclaimed => &mut self.reclaimed,
            InteractionEventKind::StaleClaimReleased => &mut self.stale_claim_released,
            InteractionEventKind::BattleRequested => &mut self.battle_requested,
            InteractionEventKind::BattleResolved => &mut self.battle_resolved,
            InteractionEventKind::EntityUpgraded => &mut self.entity_upgraded,
        };
        *slot = slot.saturating_add(1);
    }

    fn merge(&mut self, other: &Self) {
        self.total = self.total.saturating_add(other.total);
        self.hold_completed = self.hold_completed.saturating_add(other.hold_completed);
        self.entity_spawned = self.entity_spawned.saturating_add(other.entity_spawned);
        self.entity_despawned = self.entity_despawned.saturating_add(other.entity_despawned);
        self.taken = self.taken.saturating_add(other.taken);
        self.put_on_ground = self.put_on_ground.saturating_add(other.put_on_ground);
        self.placed_on_panel = self.placed_on_panel.saturating_add(other.placed_on_panel);
        self.reclaimed = self.reclaimed.saturating_add(other.reclaimed);
        self.stale_claim_released = self
            .stale_claim_released
            .saturating_add(other.stale_claim_released);
        self.battle_requested = self.battle_requested.saturating_add(other.battle_requested);
        self.battle_resolved = self.battle_resolved.saturating_add(other.battle_resolved);
        self.entity_upgraded = self.entity_upgraded.saturating_add(other.entity_upgraded);
    }
}

/// Events emitted since the last rollover, plus what the previous tick
/// emitted. Operations called between ticks land in the next tick's batch.
#[derive(Debug, Default)]
pub struct InteractionEventBus {
    current_tick_events: Vec<InteractionEvent>,
    last_tick_events: Vec<InteractionEvent>,
    last_tick_counts: InteractionEventCounts,
    lifetime_counts: InteractionEventCounts,
}

impl InteractionEventBus {
    pub(crate) fn emit(&mut self, event: InteractionEvent) {
        self.current_tick_events.push(event);
    }

    pub fn iter_emitted_so_far(&self) -> impl Iterator<Item = &InteractionEvent> {
        self.current_tick_events.iter()
    }

    pub(crate) fn finish_tick_rollover(&mut self) {
        let mut counts = InteractionEventCounts::default();
        for event in &self.current_tick_events {
            counts.record(event.kind());
        }
        self.lifetime_counts.merge(&counts);
        self.last_tick_counts = counts;
        self.last_tick_events = std::mem::take(&mut self.current_tick_events);
    }

    pub fn last_tick_events(&self) -> &[InteractionEvent] {
        &self.last_tick_events
    }

    pub fn last_tick_counts(&self) -> InteractionEventCounts {
        self.last_tick_counts
    }

    pub fn lifetime_counts(&self) -> InteractionEventCounts {
        self.lifetime_counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rollover_moves_events_and_accumulates_lifetime_counts() {
        let mut bus = InteractionEventBus::default();
        bus.emit(InteractionEvent::Taken {
            entity: EntityId(1),
        });
        bus.emit(InteractionEvent::PlacedOnPanel {
            entity: EntityId(1),
            zone: ZoneId(2),
        });
        assert_eq!(bus.iter_emitted_so_far().count(), 2);
        bus.finish_tick_rollover();
        assert_eq!(bus.iter_emitted_so_far().count(), 0);
        assert_eq!(bus.last_tick_events().len(), 2);
        assert_eq!(bus.last_tick_counts().taken, 1);

        bus.emit(InteractionEvent::Taken {
            entity: EntityId(3),
        });
        bus.finish_tick_rollover();
        assert_eq!(bus.last_tick_counts().total, 1);
        assert_eq!(bus.lifetime_counts().taken, 2);
        assert_eq!(bus.lifetime_counts().total, 3);
    }
}
