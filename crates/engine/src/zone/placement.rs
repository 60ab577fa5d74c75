use std::fmt;

use serde::{Deserialize, Serialize};

use crate::carry::EntityId;
use crate::error::InteractionError;
use crate::interaction::{
    HoldContext, HoldResolution, Interactable, InteractionGate, InteractionPolicy,
};
use crate::math::Vec3;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ZoneId(pub u32);

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "zone#{}", self.0)
    }
}

/// A zone's ownership record. `Claiming` covers the window between accepting
/// an entity and finishing its relocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ZoneClaim {
    #[default]
    Empty,
    Claiming(EntityId),
    Claimed(EntityId),
}

impl ZoneClaim {
    /// Pending claims answer as if they had already committed.
    pub fn entity(self) -> Option<EntityId> {
        match self {
            Self::Empty => None,
            Self::Claiming(entity) | Self::Claimed(entity) => Some(entity),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlacementZone {
    id: ZoneId,
    anchor: Vec3,
    placement_offset: Vec3,
    placement_yaw: f32,
    active: bool,
    claim: ZoneClaim,
    prompt_visible: bool,
    suppressed_through_tick: Option<u64>,
    gate: InteractionGate,
}

impl PlacementZone {
    pub fn new(
        id: ZoneId,
        anchor: Vec3,
        placement_offset: Vec3,
        placement_yaw: f32,
        gate: InteractionGate,
    ) -> Self {
        Self {
            id,
            anchor,
            placement_offset,
            placement_yaw,
            active: false,
            claim: ZoneClaim::Empty,
            prompt_visible: false,
            suppressed_through_tick: None,
            gate,
        }
    }

    pub fn id(&self) -> ZoneId {
        self.id
    }

    pub fn anchor(&self) -> Vec3 {
        self.anchor
    }

    pub fn placement_yaw(&self) -> f32 {
        self.placement_yaw
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn claim(&self) -> ZoneClaim {
        self.claim
    }

    pub fn claimed_entity(&self) -> Option<EntityId> {
        self.claim.entity()
    }

    pub fn is_claiming(&self) -> bool {
        matches!(self.claim, ZoneClaim::Claiming(_))
    }

    pub fn prompt_visible(&self) -> bool {
        self.prompt_visible
    }

    /// Where a placed entity rests: anchor plus the offset turned by the
    /// zone's yaw.
    pub fn placement_position(&self) -> Vec3 {
        self.anchor
            .add(self.placement_offset.rotated_yaw(self.placement_yaw))
    }

    pub fn is_suppressed(&self, tick: u64) -> bool {
        self.suppressed_through_tick
            .is_some_and(|through| tick <= through)
    }

    pub(crate) fn suppress_through(&mut self, tick: u64) {
        self.suppressed_through_tick = Some(tick);
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.active = active;
        if !active {
            self.gate.force_idle();
            self.prompt_visible = false;
        }
    }

    pub(crate) fn set_prompt_visible(&mut self, visible: bool) {
        self.prompt_visible = visible;
    }

    pub(crate) fn begin_claim(&mut self, entity: EntityId) -> Result<(), InteractionError> {
        match self.claim {
            ZoneClaim::Claiming(_) => Err(InteractionError::ClaimInProgress(self.id)),
            ZoneClaim::Claimed(occupant) => Err(InteractionError::Occupied {
                zone: self.id,
                occupant,
            }),
            ZoneClaim::Empty => {
                self.claim = ZoneClaim::Claiming(entity);
                Ok(())
            }
        }
    }

    pub(crate) fn commit_claim(&mut self) {
        if let ZoneClaim::Claiming(entity) = self.claim {
            self.claim = ZoneClaim::Claimed(entity);
        }
    }

    pub(crate) fn abort_claim(&mut self) {
        if let ZoneClaim::Claiming(_) = self.claim {
            self.claim = ZoneClaim::Empty;
        }
    }

    pub(crate) fn release_claim(&mut self) -> Option<EntityId> {
        let released = self.claim.entity();
        self.claim = ZoneClaim::Empty;
        released
    }
}

impl Interactable for PlacementZone {
    fn gate(&self) -> &InteractionGate {
        &self.gate
    }

    fn gate_mut(&mut self) -> &mut InteractionGate {
        &mut self.gate
    }

    fn interaction_point(&self) -> Vec3 {
        self.anchor
    }
}

impl InteractionPolicy for PlacementZone {
    fn on_hold_complete(&self, context: &HoldContext) -> Option<HoldResolution> {
        match self.claim {
            ZoneClaim::Empty => context
                .carried
                .map(|_| HoldResolution::PlaceOnPanel(self.id)),
            ZoneClaim::Claimed(_) => Some(HoldResolution::ReclaimFromPanel(self.id)),
            ZoneClaim::Claiming(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::math::RangePolicy;

    use super::*;

    fn zone() -> PlacementZone {
        PlacementZone::new(
            ZoneId(1),
            Vec3::new(10.0, 0.0, 0.0),
            Vec3::new(1.0, 0.5, 0.0),
            std::f32::consts::PI,
            InteractionGate::new(3.0, 2.0, RangePolicy::Horizontal),
        )
    }

    #[test]
    fn pending_claim_answers_with_final_occupant() {
        let mut zone = zone();
        zone.begin_claim(EntityId(5)).expect("claim");
        assert!(zone.is_claiming());
        assert_eq!(zone.claimed_entity(), Some(EntityId(5)));
        assert_eq!(
            zone.begin_claim(EntityId(6)),
            Err(InteractionError::ClaimInProgress(ZoneId(1)))
        );
        zone.commit_claim();
        assert_eq!(zone.claim(), ZoneClaim::Claimed(EntityId(5)));
    }

    #[test]
    fn occupied_zone_rejects_other_entity() {
        let mut zone = zone();
        zone.begin_claim(EntityId(5)).expect("claim");
        zone.commit_claim();
        assert_eq!(
            zone.begin_claim(EntityId(6)),
            Err(InteractionError::Occupied {
                zone: ZoneId(1),
                occupant: EntityId(5)
            })
        );
        assert_eq!(zone.claim(), ZoneClaim::Claimed(EntityId(5)));
    }

    #[test]
    fn abort_only_rolls_back_pending_claims() {
        let mut zone = zone();
        zone.begin_claim(EntityId(5)).expect("claim");
        zone.abort_claim();
        assert_eq!(zone.claim(), ZoneClaim::Empty);
        zone.begin_claim(EntityId(5)).expect("claim");
        zone.commit_claim();
        zone.abort_claim();
        assert_eq!(zone.claim(), ZoneClaim::Claimed(EntityId(5)));
    }

    #[test]
    fn placement_position_applies_yaw_to_offset() {
        let position = zone().placement_position();
        assert!((position.x - 9.0).abs() < 0.0001);
        assert!((position.y - 0.5).abs() < 0.0001);
        assert!(position.z.abs() < 0.0001);
    }

    #[test]
    fn suppression_window_is_inclusive() {
        let mut zone = zone();
        assert!(!zone.is_suppressed(0));
        zone.suppress_through(11);
        assert!(zone.is_suppressed(10));
        assert!(zone.is_suppressed(11));
        assert!(!zone.is_suppressed(12));
    }

    #[test]
    fn zone_policy_places_when_empty_and_reclaims_when_full() {
        let mut zone = zone();
        let holding = HoldContext {
            accepting_zone: Some(ZoneId(1)),
            carried: Some(EntityId(2)),
        };
        assert_eq!(
            zone.on_hold_complete(&holding),
            Some(HoldResolution::PlaceOnPanel(ZoneId(1)))
        );
        assert_eq!(zone.on_hold_complete(&HoldContext::default()), None);
        zone.begin_claim(EntityId(2)).expect("claim");
        assert_eq!(zone.on_hold_complete(&holding), None);
        zone.commit_claim();
        assert_eq!(
            zone.on_hold_complete(&HoldContext::default()),
            Some(HoldResolution::ReclaimFromPanel(ZoneId(1)))
        );
    }
}
