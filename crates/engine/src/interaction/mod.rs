mod gate;
mod policy;

pub use gate::{
    GateState, InteractionGate, InteractionSession, SessionSnapshot,
    HOLD_COMPLETION_TOLERANCE_SECONDS,
};
pub use policy::{
    resolve_hold_completion, HoldContext, HoldResolution, Interactable, InteractionPolicy,
};
