use collector_engine::{InputAction, InputSnapshot, MobileButtonEdge, Vec3};
use serde::Deserialize;

/// Which device holds the interact trigger during a script step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum ScriptedTrigger {
    #[default]
    None,
    Keyboard,
    Mobile,
}

/// Stand at `actor` for `ticks` ticks with the trigger in the given state.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ScriptStep {
    pub(crate) ticks: u32,
    #[serde(default)]
    pub(crate) actor: Vec3,
    #[serde(default)]
    pub(crate) trigger: ScriptedTrigger,
}

impl ScriptStep {
    pub(crate) fn new(ticks: u32, actor: Vec3, trigger: ScriptedTrigger) -> Self {
        Self {
            ticks,
            actor,
            trigger,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct ScriptFrame {
    pub(crate) actor: Vec3,
    pub(crate) input: InputSnapshot,
}

/// Replays script steps as per-tick input snapshots. The mobile button only
/// reports edges, so a start edge is sent when a mobile step begins and a stop
/// edge when the first non-mobile step follows.
#[derive(Debug, Clone)]
pub(crate) struct ScriptedInput {
    steps: Vec<ScriptStep>,
    step_index: usize,
    ticks_into_step: u32,
    mobile_latched: bool,
}

impl ScriptedInput {
    pub(crate) fn new(steps: Vec<ScriptStep>) -> Self {
        Self {
            steps,
            step_index: 0,
            ticks_into_step: 0,
            mobile_latched: false,
        }
    }

    pub(crate) fn total_ticks(&self) -> u64 {
        self.steps.iter().map(|step| u64::from(step.ticks)).sum()
    }

    pub(crate) fn next_frame(&mut self) -> Option<ScriptFrame> {
        while let Some(step) = self.steps.get(self.step_index) {
            if self.ticks_into_step < step.ticks {
                break;
            }
            self.step_index += 1;
            self.ticks_into_step = 0;
        }
        let step = *self.steps.get(self.step_index)?;
        self.ticks_into_step += 1;

        let mut input = InputSnapshot::empty();
        match step.trigger {
            ScriptedTrigger::Keyboard => {
                input = input.with_action_down(InputAction::Interact, true);
            }
            ScriptedTrigger::Mobile if !self.mobile_latched => {
                input = input.with_mobile_button_edge(Some(MobileButtonEdge::Start));
                self.mobile_latched = true;
            }
            ScriptedTrigger::Mobile | ScriptedTrigger::None => {}
        }
        if step.trigger != ScriptedTrigger::Mobile && self.mobile_latched {
            input = input.with_mobile_button_edge(Some(MobileButtonEdge::Stop));
            self.mobile_latched = false;
        }

        Some(ScriptFrame {
            actor: step.actor,
            input,
        })
    }
}

#[cfg(test)]
mod tests {
    use collector_engine::{TriggerInput, TriggerSignal, TriggerSource};

    use super::*;

    #[test]
    fn frames_follow_step_durations() {
        let mut script = ScriptedInput::new(vec![
            ScriptStep::new(2, Vec3::new(1.0, 0.0, 0.0), ScriptedTrigger::Keyboard),
            ScriptStep::new(0, Vec3::ZERO, ScriptedTrigger::Keyboard),
            ScriptStep::new(1, Vec3::new(2.0, 0.0, 0.0), ScriptedTrigger::None),
        ]);
        assert_eq!(script.total_ticks(), 3);

        let actors = std::iter::from_fn(|| script.next_frame())
            .map(|frame| frame.actor.x)
            .collect::<Vec<_>>();
        assert_eq!(actors, vec![1.0, 1.0, 2.0]);
    }

    #[test]
    fn mobile_steps_latch_through_trigger_input() {
        let mut script = ScriptedInput::new(vec![
            ScriptStep::new(3, Vec3::ZERO, ScriptedTrigger::Mobile),
            ScriptStep::new(1, Vec3::ZERO, ScriptedTrigger::None),
        ]);
        let mut trigger = TriggerInput::default();
        let signals = std::iter::from_fn(|| script.next_frame())
            .map(|frame| trigger.sample(&frame.input))
            .collect::<Vec<_>>();
        let mobile = TriggerSignal::held_by(TriggerSource::MobileButton);
        assert_eq!(
            signals,
            vec![mobile, mobile, mobile, TriggerSignal::released()]
        );
    }

    #[test]
    fn step_parses_from_json() {
        let step: ScriptStep = serde_json::from_value(serde_json::json!({
            "ticks": 5,
            "actor": { "x": 1.0, "y": 0.0, "z": -2.0 },
            "trigger": "keyboard"
        }))
        .expect("step");
        assert_eq!(
            step,
            ScriptStep::new(5, Vec3::new(1.0, 0.0, -2.0), ScriptedTrigger::Keyboard)
        );
    }
}
