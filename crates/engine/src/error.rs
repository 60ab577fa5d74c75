use thiserror::Error;

use crate::carry::{CarryState, EntityId};
use crate::collab::CollaboratorKind;
use crate::zone::ZoneId;

/// Every rejection the interaction core can report. A rejected operation
/// leaves world state exactly as it was.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InteractionError {
    #[error("required collaborator is not attached: {0}")]
    MissingCollaborator(CollaboratorKind),
    #[error("carrier already holds entity {held}")]
    Capacity { held: EntityId },
    #[error("carrier cannot pick anything up right now")]
    CarrierUnavailable,
    #[error("zone {zone} is occupied by entity {occupant}")]
    Occupied { zone: ZoneId, occupant: EntityId },
    #[error("entity {entity} cannot {action} while {state:?}")]
    InvalidTransition {
        entity: EntityId,
        state: CarryState,
        action: &'static str,
    },
    #[error("zone {0} already has a claim in progress")]
    ClaimInProgress(ZoneId),
    #[error("zone {0} refuses placement until its reclaim window closes")]
    PlacementSuppressed(ZoneId),
    #[error("zone {0} is not active")]
    ZoneInactive(ZoneId),
    #[error("zone {0} has no claimed entity")]
    NothingClaimed(ZoneId),
    #[error("zone {0} is already registered")]
    DuplicateZone(ZoneId),
    #[error("unknown entity {0}")]
    UnknownEntity(EntityId),
    #[error("unknown zone {0}")]
    UnknownZone(ZoneId),
    #[error("unknown creature template '{0}'")]
    UnknownTemplate(String),
    #[error("upgrade costs {required} but the wallet holds {available:.2}")]
    InsufficientFunds { required: u64, available: f64 },
}
