#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveForward,
    MoveBack,
    MoveLeft,
    MoveRight,
    Interact,
    Quit,
}

const ACTION_COUNT: usize = 6;

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ActionStates {
    down: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub(crate) fn set(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub(crate) fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }
}

impl InputAction {
    const fn index(self) -> usize {
        match self {
            InputAction::MoveForward => 0,
            InputAction::MoveBack => 1,
            InputAction::MoveLeft => 2,
            InputAction::MoveRight => 3,
            InputAction::Interact => 4,
            InputAction::Quit => 5,
        }
    }
}

/// Edge reported by the on-screen interact button. Mobile UIs only report
/// pointer-down and pointer-up, so held state has to be latched here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MobileButtonEdge {
    Start,
    Stop,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    actions: ActionStates,
    mobile_button_edge: Option<MobileButtonEdge>,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.actions.is_down(action)
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.actions.set(action, is_down);
        self
    }

    pub fn with_mobile_button_edge(mut self, edge: Option<MobileButtonEdge>) -> Self {
        self.mobile_button_edge = edge;
        self
    }

    pub fn mobile_button_edge(&self) -> Option<MobileButtonEdge> {
        self.mobile_button_edge
    }

    pub fn quit_requested(&self) -> bool {
        self.is_down(InputAction::Quit)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TriggerSource {
    #[default]
    None,
    Keyboard,
    MobileButton,
}

/// The only input an interaction gate consumes: whether the trigger is held
/// this tick, and which device produced it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TriggerSignal {
    pub held: bool,
    pub source: TriggerSource,
}

impl TriggerSignal {
    pub const fn released() -> Self {
        Self {
            held: false,
            source: TriggerSource::None,
        }
    }

    pub const fn held_by(source: TriggerSource) -> Self {
        Self { held: true, source }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct KeyboardTrigger;

impl KeyboardTrigger {
    pub fn is_held(&self, input: &InputSnapshot) -> bool {
        input.is_down(InputAction::Interact)
    }
}

/// Turns the start/stop button pair into held-key semantics.
#[derive(Debug, Clone, Copy, Default)]
pub struct MobileButtonTrigger {
    held: bool,
}

impl MobileButtonTrigger {
    pub fn apply_edge(&mut self, edge: MobileButtonEdge) {
        self.held = matches!(edge, MobileButtonEdge::Start);
    }

    pub fn is_held(&self) -> bool {
        self.held
    }

    pub fn reset(&mut self) {
        self.held = false;
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TriggerInput {
    keyboard: KeyboardTrigger,
    mobile: MobileButtonTrigger,
}

impl TriggerInput {
    pub fn sample(&mut self, input: &InputSnapshot) -> TriggerSignal {
        if let Some(edge) = input.mobile_button_edge() {
            self.mobile.apply_edge(edge);
        }
        if self.keyboard.is_held(input) {
            return TriggerSignal::held_by(TriggerSource::Keyboard);
        }
        if self.mobile.is_held() {
            return TriggerSignal::held_by(TriggerSource::MobileButton);
        }
        TriggerSignal::released()
    }

    pub fn reset(&mut self) {
        self.mobile.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyboard_interact_produces_keyboard_signal() {
        let mut trigger = TriggerInput::default();
        let input = InputSnapshot::empty().with_action_down(InputAction::Interact, true);
        assert_eq!(
            trigger.sample(&input),
            TriggerSignal::held_by(TriggerSource::Keyboard)
        );
        assert_eq!(
            trigger.sample(&InputSnapshot::empty()),
            TriggerSignal::released()
        );
    }

    #[test]
    fn mobile_button_latches_until_stop_edge() {
        let mut trigger = TriggerInput::default();
        let start =
            InputSnapshot::empty().with_mobile_button_edge(Some(MobileButtonEdge::Start));
        assert!(trigger.sample(&start).held);
        for _ in 0..5 {
            let signal = trigger.sample(&InputSnapshot::empty());
            assert_eq!(signal, TriggerSignal::held_by(TriggerSource::MobileButton));
        }
        let stop = InputSnapshot::empty().with_mobile_button_edge(Some(MobileButtonEdge::Stop));
        assert!(!trigger.sample(&stop).held);
    }

    #[test]
    fn keyboard_wins_when_both_sources_hold() {
        let mut trigger = TriggerInput::default();
        let input = InputSnapshot::empty()
            .with_action_down(InputAction::Interact, true)
            .with_mobile_button_edge(Some(MobileButtonEdge::Start));
        assert_eq!(trigger.sample(&input).source, TriggerSource::Keyboard);
        assert_eq!(
            trigger.sample(&InputSnapshot::empty()).source,
            TriggerSource::MobileButton
        );
    }
}
