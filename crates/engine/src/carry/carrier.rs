use crate::error::InteractionError;
use crate::math::Vec3;

use super::EntityId;

/// Whatever holds carried entities for the actor. One slot.
pub trait Carrier {
    fn can_carry(&self) -> bool;
    fn currently_carried(&self) -> Option<EntityId>;
    /// Attaching the entity already held is a no-op.
    fn attach(&mut self, entity: EntityId) -> Result<(), InteractionError>;
    fn detach(&mut self) -> Option<EntityId>;
    fn actor_position(&self) -> Vec3;
    fn set_actor_position(&mut self, position: Vec3);
}

#[derive(Debug, Clone)]
pub struct PlayerHand {
    position: Vec3,
    carried: Option<EntityId>,
    enabled: bool,
}

impl PlayerHand {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            carried: None,
            enabled: true,
        }
    }

    /// A disabled hand keeps what it holds but refuses new pickups.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

impl Carrier for PlayerHand {
    fn can_carry(&self) -> bool {
        self.enabled
    }

    fn currently_carried(&self) -> Option<EntityId> {
        self.carried
    }

    fn attach(&mut self, entity: EntityId) -> Result<(), InteractionError> {
        match self.carried {
            Some(held) if held == entity => Ok(()),
            Some(held) => Err(InteractionError::Capacity { held }),
            None if !self.enabled => Err(InteractionError::CarrierUnavailable),
            None => {
                self.carried = Some(entity);
                Ok(())
            }
        }
    }

    fn detach(&mut self) -> Option<EntityId> {
        self.carried.take()
    }

    fn actor_position(&self) -> Vec3 {
        self.position
    }

    fn set_actor_position(&mut self, position: Vec3) {
        self.position = position;
    }
}
