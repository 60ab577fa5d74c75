use std::fmt;

use serde::{Deserialize, Serialize};

use crate::interaction::{
    resolve_hold_completion, HoldContext, HoldResolution, Interactable, InteractionGate,
    InteractionPolicy,
};
use crate::math::Vec3;
use crate::zone::ZoneId;

use super::economy::{EconomicAttributes, Rarity};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CarryState {
    #[default]
    Free,
    Carried,
    PlacedOnGround,
    PlacedOnPanel,
}

impl CarryState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Carried => "carried",
            Self::PlacedOnGround => "placed_on_ground",
            Self::PlacedOnPanel => "placed_on_panel",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysicsBody {
    pub collider_enabled: bool,
    pub kinematic: bool,
}

impl PhysicsBody {
    fn for_state(state: CarryState) -> Self {
        let carried = state == CarryState::Carried;
        Self {
            collider_enabled: !carried,
            kinematic: carried,
        }
    }
}

/// A creature object the actor can pick up, carry, drop and put on panels.
///
/// Carry state, owner zone, physics body and prompt visibility only change
/// together through the `mark_*` transitions, so they cannot disagree.
#[derive(Debug, Clone)]
pub struct CarryableEntity {
    id: EntityId,
    template_id: String,
    position: Vec3,
    carry_state: CarryState,
    owner_zone: Option<ZoneId>,
    fought: bool,
    economy: EconomicAttributes,
    body: PhysicsBody,
    prompt_visible: bool,
    gate: InteractionGate,
}

impl CarryableEntity {
    pub fn new(
        id: EntityId,
        template_id: impl Into<String>,
        economy: EconomicAttributes,
        fought: bool,
        position: Vec3,
        gate: InteractionGate,
    ) -> Self {
        Self {
            id,
            template_id: template_id.into(),
            position,
            carry_state: CarryState::Free,
            owner_zone: None,
            fought,
            economy,
            body: PhysicsBody::for_state(CarryState::Free),
            prompt_visible: true,
            gate,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn template_id(&self) -> &str {
        &self.template_id
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn carry_state(&self) -> CarryState {
        self.carry_state
    }

    pub fn owner_zone(&self) -> Option<ZoneId> {
        self.owner_zone
    }

    pub fn fought(&self) -> bool {
        self.fought
    }

    pub fn economy(&self) -> &EconomicAttributes {
        &self.economy
    }

    pub fn body(&self) -> PhysicsBody {
        self.body
    }

    pub fn prompt_visible(&self) -> bool {
        self.prompt_visible
    }

    /// The one place the `fought` flag is interpreted. Anything sitting on a
    /// panel already won its fight, whatever the flag says.
    pub fn battle_pending(&self) -> bool {
        self.fought && self.carry_state != CarryState::PlacedOnPanel
    }

    pub fn set_rarity(&mut self, rarity: Rarity) {
        self.economy.rarity = rarity;
    }

    pub fn set_level(&mut self, level: u32) {
        self.economy.level = level.max(1);
    }

    pub(crate) fn set_economy(&mut self, economy: EconomicAttributes) {
        self.economy = economy;
    }

    pub(crate) fn set_fought(&mut self, fought: bool) {
        self.fought = fought;
    }

    pub(crate) fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub(crate) fn mark_carried(&mut self) {
        self.owner_zone = None;
        self.apply_state(CarryState::Carried);
    }

    pub(crate) fn mark_on_ground(&mut self, position: Vec3) {
        self.position = position;
        self.owner_zone = None;
        self.apply_state(CarryState::PlacedOnGround);
    }

    pub(crate) fn mark_on_panel(&mut self, zone: ZoneId, position: Vec3) {
        self.position = position;
        self.owner_zone = Some(zone);
        self.apply_state(CarryState::PlacedOnPanel);
    }

    fn apply_state(&mut self, state: CarryState) {
        self.carry_state = state;
        self.body = PhysicsBody::for_state(state);
        self.prompt_visible = state != CarryState::Carried;
    }
}

impl Interactable for CarryableEntity {
    fn gate(&self) -> &InteractionGate {
        &self.gate
    }

    fn gate_mut(&mut self) -> &mut InteractionGate {
        &mut self.gate
    }

    fn interaction_point(&self) -> Vec3 {
        self.position
    }
}

impl InteractionPolicy for CarryableEntity {
    fn on_hold_complete(&self, context: &HoldContext) -> Option<HoldResolution> {
        Some(resolve_hold_completion(self, context))
    }
}

#[cfg(test)]
mod tests {
    use crate::math::RangePolicy;

    use super::*;

    fn entity(fought: bool) -> CarryableEntity {
        CarryableEntity::new(
            EntityId(7),
            "creature.slime",
            EconomicAttributes::new(Rarity::Rare, 3),
            fought,
            Vec3::ZERO,
            InteractionGate::new(3.0, 2.0, RangePolicy::Horizontal),
        )
    }

    fn assert_consistent(entity: &CarryableEntity) {
        let carried = entity.carry_state() == CarryState::Carried;
        assert_eq!(entity.body().collider_enabled, !carried);
        assert_eq!(entity.body().kinematic, carried);
        assert_eq!(entity.prompt_visible(), !carried);
        assert_eq!(
            entity.owner_zone().is_some(),
            entity.carry_state() == CarryState::PlacedOnPanel
        );
    }

    #[test]
    fn transitions_keep_side_effects_in_lockstep() {
        let mut entity = entity(false);
        assert_consistent(&entity);
        entity.mark_carried();
        assert_consistent(&entity);
        entity.mark_on_panel(ZoneId(2), Vec3::new(1.0, 0.0, 1.0));
        assert_consistent(&entity);
        assert_eq!(entity.owner_zone(), Some(ZoneId(2)));
        entity.mark_carried();
        assert_consistent(&entity);
        entity.mark_on_ground(Vec3::new(0.0, 0.0, 2.0));
        assert_consistent(&entity);
    }

    #[test]
    fn panel_placement_masks_fought_flag() {
        let mut entity = entity(true);
        assert!(entity.battle_pending());
        entity.mark_on_panel(ZoneId(1), Vec3::ZERO);
        assert!(!entity.battle_pending());
        entity.mark_carried();
        assert!(entity.battle_pending());
    }

    #[test]
    fn transitions_do_not_touch_economy() {
        let mut entity = entity(false);
        entity.set_level(4);
        let before = *entity.economy();
        entity.mark_carried();
        entity.mark_on_panel(ZoneId(3), Vec3::ZERO);
        entity.mark_carried();
        assert_eq!(*entity.economy(), before);
    }
}
