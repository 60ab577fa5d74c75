use crate::carry::{CarryState, CarryableEntity, EntityId};
use crate::math::Vec3;
use crate::zone::ZoneId;

use super::gate::InteractionGate;

/// What a completed hold should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldResolution {
    Take,
    PlaceOnPanel(ZoneId),
    PutOnGround,
    /// Drop a free entity where it stands, then start its battle.
    PutThenFight,
    StartFight,
    ReclaimFromPanel(ZoneId),
}

/// World facts a completion handler needs, sampled at the moment of
/// completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HoldContext {
    /// Arbitration winner that will take the carried entity, if any.
    pub accepting_zone: Option<ZoneId>,
    pub carried: Option<EntityId>,
}

/// Role-specific reaction to a completed hold.
pub trait InteractionPolicy {
    fn on_hold_complete(&self, context: &HoldContext) -> Option<HoldResolution>;
}

/// Read/write access to the gate an interactable owns, plus where range is
/// measured from.
pub trait Interactable {
    fn gate(&self) -> &InteractionGate;
    fn gate_mut(&mut self) -> &mut InteractionGate;
    fn interaction_point(&self) -> Vec3;
}

/// Completion precedence for carryable entities. Carried entities go to the
/// accepting zone or the ground; panel entities go back to the hand; anything
/// else fights first when a battle is pending.
pub fn resolve_hold_completion(entity: &CarryableEntity, context: &HoldContext) -> HoldResolution {
    match entity.carry_state() {
        CarryState::Carried => match context.accepting_zone {
            Some(zone) => HoldResolution::PlaceOnPanel(zone),
            None => HoldResolution::PutOnGround,
        },
        CarryState::PlacedOnPanel => match entity.owner_zone() {
            Some(zone) => HoldResolution::ReclaimFromPanel(zone),
            None => HoldResolution::Take,
        },
        CarryState::PlacedOnGround if entity.battle_pending() => HoldResolution::StartFight,
        CarryState::Free if entity.battle_pending() => HoldResolution::PutThenFight,
        CarryState::PlacedOnGround | CarryState::Free => HoldResolution::Take,
    }
}

#[cfg(test)]
mod tests {
    use crate::carry::{EconomicAttributes, Rarity};
    use crate::math::RangePolicy;

    use super::*;

    fn entity(fought: bool) -> CarryableEntity {
        CarryableEntity::new(
            EntityId(1),
            "creature.test",
            EconomicAttributes::new(Rarity::Common, 1),
            fought,
            Vec3::ZERO,
            InteractionGate::new(3.0, 1.0, RangePolicy::Horizontal),
        )
    }

    #[test]
    fn free_entity_is_taken_or_fought() {
        let context = HoldContext::default();
        assert_eq!(
            resolve_hold_completion(&entity(false), &context),
            HoldResolution::Take
        );
        assert_eq!(
            resolve_hold_completion(&entity(true), &context),
            HoldResolution::PutThenFight
        );
    }

    #[test]
    fn grounded_entity_branches_on_battle() {
        let mut calm = entity(false);
        calm.mark_on_ground(Vec3::ZERO);
        let mut hostile = entity(true);
        hostile.mark_on_ground(Vec3::ZERO);
        let context = HoldContext::default();
        assert_eq!(resolve_hold_completion(&calm, &context), HoldResolution::Take);
        assert_eq!(
            resolve_hold_completion(&hostile, &context),
            HoldResolution::StartFight
        );
    }

    #[test]
    fn carried_entity_prefers_accepting_zone() {
        let mut carried = entity(true);
        carried.mark_carried();
        assert_eq!(
            resolve_hold_completion(&carried, &HoldContext::default()),
            HoldResolution::PutOnGround
        );
        let context = HoldContext {
            accepting_zone: Some(ZoneId(4)),
            carried: Some(EntityId(1)),
        };
        assert_eq!(
            resolve_hold_completion(&carried, &context),
            HoldResolution::PlaceOnPanel(ZoneId(4))
        );
    }

    #[test]
    fn panel_entity_is_reclaimed_even_when_fought() {
        let mut placed = entity(true);
        placed.mark_on_panel(ZoneId(9), Vec3::ZERO);
        assert_eq!(
            placed.on_hold_complete(&HoldContext::default()),
            Some(HoldResolution::ReclaimFromPanel(ZoneId(9)))
        );
    }
}
