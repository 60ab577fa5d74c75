//! Narrow interfaces to the systems the interaction core depends on but does
//! not own. The persistence interface lives in [`crate::persistence`].

use std::fmt;

use crate::carry::EntityId;
use crate::math::Vec3;
use crate::zone::ZoneId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CollaboratorKind {
    Carrier,
    PersistenceStore,
    BattleRequester,
    PromptRenderer,
    GroundProbe,
}

impl CollaboratorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Carrier => "carrier",
            Self::PersistenceStore => "persistence_store",
            Self::BattleRequester => "battle_requester",
            Self::PromptRenderer => "prompt_renderer",
            Self::GroundProbe => "ground_probe",
        }
    }
}

impl fmt::Display for CollaboratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hands a fight off to the battle mini-game. Fire-and-forget; the outcome
/// comes back through `InteractionWorld::resolve_battle`.
pub trait BattleRequester {
    fn request_battle(&mut self, entity: EntityId, template_id: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PromptTarget {
    Entity(EntityId),
    Zone(ZoneId),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PromptFrame {
    pub target: PromptTarget,
    pub visible: bool,
    pub progress: f32,
}

pub trait PromptRenderer {
    fn render_prompt(&mut self, frame: &PromptFrame);
}

pub trait GroundProbe {
    /// Returns the resting point below `position`, or `None` when there is no
    /// ground to land on.
    fn project_to_ground(&self, position: Vec3) -> Option<Vec3>;
}

/// Infinite horizontal plane.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FlatGround {
    pub height: f32,
}

impl GroundProbe for FlatGround {
    fn project_to_ground(&self, position: Vec3) -> Option<Vec3> {
        Some(Vec3::new(position.x, self.height, position.z))
    }
}
