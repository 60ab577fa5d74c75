mod carrier;
mod economy;
mod entity;

pub use carrier::{Carrier, PlayerHand};
pub use economy::{EconomicAttributes, Rarity, Wallet};
pub use entity::{CarryState, CarryableEntity, EntityId, PhysicsBody};
