mod input;
mod timers;

pub use input::{
    InputAction, InputSnapshot, KeyboardTrigger, MobileButtonEdge, MobileButtonTrigger,
    TriggerInput, TriggerSignal, TriggerSource,
};
pub use timers::{SimClock, TimerQueue};
