use crate::app::{TriggerSignal, TriggerSource};
use crate::math::{RangePolicy, Vec3};

/// Accumulated `f32` frame deltas drift; a 60 Hz hold of 2 s can land a few
/// ulps short of 2.0. Anything within this window counts as complete.
pub const HOLD_COMPLETION_TOLERANCE_SECONDS: f32 = 1e-4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum GateState {
    #[default]
    Idle,
    InRange,
    Holding,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionSession {
    range_radius: f32,
    hold_duration: f32,
    elapsed_hold: f32,
    state: GateState,
    trigger_source: TriggerSource,
}

impl InteractionSession {
    pub fn range_radius(&self) -> f32 {
        self.range_radius
    }

    pub fn hold_duration(&self) -> f32 {
        self.hold_duration
    }

    pub fn elapsed_hold(&self) -> f32 {
        self.elapsed_hold
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn trigger_source(&self) -> TriggerSource {
        self.trigger_source
    }

    pub fn progress(&self) -> f32 {
        if self.hold_duration <= 0.0 {
            return if self.state == GateState::Completed {
                1.0
            } else {
                0.0
            };
        }
        (self.elapsed_hold / self.hold_duration).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SessionSnapshot {
    pub progress: f32,
    pub just_completed: bool,
}

/// Timed hold-to-interact reducer. Owned by whatever can be interacted with;
/// it never fails and has no collaborators.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionGate {
    session: InteractionSession,
    range_policy: RangePolicy,
}

impl InteractionGate {
    pub fn new(range_radius: f32, hold_duration: f32, range_policy: RangePolicy) -> Self {
        Self {
            session: InteractionSession {
                range_radius: sanitize_non_negative(range_radius),
                hold_duration: sanitize_non_negative(hold_duration),
                elapsed_hold: 0.0,
                state: GateState::Idle,
                trigger_source: TriggerSource::None,
            },
            range_policy,
        }
    }

    pub fn session(&self) -> &InteractionSession {
        &self.session
    }

    pub fn state(&self) -> GateState {
        self.session.state
    }

    pub fn progress(&self) -> f32 {
        self.session.progress()
    }

    pub fn range_policy(&self) -> RangePolicy {
        self.range_policy
    }

    pub fn set_range_radius(&mut self, range_radius: f32) {
        self.session.range_radius = sanitize_non_negative(range_radius);
    }

    pub fn set_hold_duration(&mut self, hold_duration: f32) {
        self.session.hold_duration = sanitize_non_negative(hold_duration);
        self.session.elapsed_hold = self.session.elapsed_hold.min(self.session.hold_duration);
    }

    pub fn is_in_range(&self, actor_position: Vec3, entity_position: Vec3) -> bool {
        self.range_policy
            .within(actor_position, entity_position, self.session.range_radius)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            progress: self.session.progress(),
            just_completed: false,
        }
    }

    /// Cancels any hold in progress and re-arms the gate.
    pub fn force_idle(&mut self) {
        self.session.elapsed_hold = 0.0;
        self.session.state = GateState::Idle;
        self.session.trigger_source = TriggerSource::None;
    }

    pub fn update_tick(
        &mut self,
        fixed_dt_seconds: f32,
        actor_position: Vec3,
        entity_position: Vec3,
        trigger: TriggerSignal,
    ) -> SessionSnapshot {
        let dt = sanitize_non_negative(fixed_dt_seconds);
        let in_range = self.is_in_range(actor_position, entity_position);
        let session = &mut self.session;

        if !trigger.held {
            // Releasing is the only way out of Completed.
            let was_active = matches!(session.state, GateState::Holding | GateState::Completed);
            session.elapsed_hold = 0.0;
            session.trigger_source = TriggerSource::None;
            session.state = if was_active || !in_range {
                GateState::Idle
            } else {
                GateState::InRange
            };
            return self.snapshot();
        }

        session.trigger_source = trigger.source;

        if session.state == GateState::Completed {
            session.elapsed_hold = session.hold_duration;
            return self.snapshot();
        }

        if !in_range {
            session.elapsed_hold = 0.0;
            session.state = GateState::Idle;
            return self.snapshot();
        }

        session.elapsed_hold = (session.elapsed_hold + dt).clamp(0.0, session.hold_duration);
        session.state = GateState::Holding;
        if session.elapsed_hold + HOLD_COMPLETION_TOLERANCE_SECONDS >= session.hold_duration {
            session.elapsed_hold = session.hold_duration;
            session.state = GateState::Completed;
            return SessionSnapshot {
                progress: 1.0,
                just_completed: true,
            };
        }

        self.snapshot()
    }
}

fn sanitize_non_negative(value: f32) -> f32 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn held() -> TriggerSignal {
        TriggerSignal::held_by(TriggerSource::Keyboard)
    }

    fn at(x: f32) -> Vec3 {
        Vec3::new(x, 0.0, 0.0)
    }

    #[test]
    fn completion_fires_on_tick_where_hold_first_reaches_duration() {
        let mut gate = InteractionGate::new(3.0, 2.0, RangePolicy::Horizontal);
        let mut completed_on = Vec::new();
        for tick in 1..=180u32 {
            let snapshot = gate.update_tick(DT, at(0.0), at(2.0), held());
            if snapshot.just_completed {
                completed_on.push(tick);
            }
        }
        assert_eq!(completed_on, vec![120]);
        assert_eq!(gate.state(), GateState::Completed);
        assert_eq!(gate.progress(), 1.0);
    }

    #[test]
    fn leaving_range_resets_progress_and_resumes_from_zero() {
        let mut gate = InteractionGate::new(3.0, 2.0, RangePolicy::Horizontal);
        for _ in 0..60 {
            gate.update_tick(DT, at(0.0), at(2.0), held());
        }
        assert!((gate.progress() - 0.5).abs() < 0.01);

        let snapshot = gate.update_tick(DT, at(0.0), at(4.0), held());
        assert_eq!(snapshot.progress, 0.0);
        assert!(!snapshot.just_completed);
        assert_eq!(gate.state(), GateState::Idle);

        let snapshot = gate.update_tick(DT, at(0.0), at(2.0), held());
        assert!((snapshot.progress - DT / 2.0).abs() < 0.0001);
        assert_eq!(gate.state(), GateState::Holding);
    }

    #[test]
    fn progress_is_monotonic_while_holding_in_range() {
        let mut gate = InteractionGate::new(3.0, 1.5, RangePolicy::Full3D);
        let mut last = 0.0f32;
        for _ in 0..200 {
            let snapshot = gate.update_tick(DT, at(0.0), at(1.0), held());
            assert!(snapshot.progress >= last);
            assert!((0.0..=1.0).contains(&snapshot.progress));
            last = snapshot.progress;
        }
        assert_eq!(last, 1.0);
    }

    #[test]
    fn completion_is_edge_triggered_until_release() {
        let mut gate = InteractionGate::new(3.0, 0.5, RangePolicy::Horizontal);
        let mut completions = 0;
        for _ in 0..120 {
            if gate.update_tick(DT, at(0.0), at(1.0), held()).just_completed {
                completions += 1;
            }
        }
        assert_eq!(completions, 1);

        let snapshot = gate.update_tick(DT, at(0.0), at(1.0), TriggerSignal::released());
        assert_eq!(snapshot.progress, 0.0);
        assert_eq!(gate.state(), GateState::Idle);

        for _ in 0..120 {
            if gate.update_tick(DT, at(0.0), at(1.0), held()).just_completed {
                completions += 1;
            }
        }
        assert_eq!(completions, 2);
    }

    #[test]
    fn completed_gate_stays_pinned_when_actor_walks_away_still_holding() {
        let mut gate = InteractionGate::new(3.0, 0.1, RangePolicy::Horizontal);
        for _ in 0..10 {
            gate.update_tick(DT, at(0.0), at(1.0), held());
        }
        assert_eq!(gate.state(), GateState::Completed);
        let snapshot = gate.update_tick(DT, at(0.0), at(10.0), held());
        assert_eq!(snapshot.progress, 1.0);
        assert!(!snapshot.just_completed);
        assert_eq!(gate.session().elapsed_hold(), 0.1);
    }

    #[test]
    fn idle_actor_in_range_reports_in_range() {
        let mut gate = InteractionGate::new(3.0, 2.0, RangePolicy::Horizontal);
        gate.update_tick(DT, at(0.0), at(1.0), TriggerSignal::released());
        assert_eq!(gate.state(), GateState::InRange);
        gate.update_tick(DT, at(0.0), at(5.0), TriggerSignal::released());
        assert_eq!(gate.state(), GateState::Idle);
    }

    #[test]
    fn zero_duration_completes_on_first_held_tick() {
        let mut gate = InteractionGate::new(3.0, 0.0, RangePolicy::Horizontal);
        let snapshot = gate.update_tick(DT, at(0.0), at(1.0), held());
        assert!(snapshot.just_completed);
        assert_eq!(gate.progress(), 1.0);
        assert!(!gate.update_tick(DT, at(0.0), at(1.0), held()).just_completed);
    }

    #[test]
    fn force_idle_cancels_hold_and_rearms() {
        let mut gate = InteractionGate::new(3.0, 0.2, RangePolicy::Horizontal);
        for _ in 0..20 {
            gate.update_tick(DT, at(0.0), at(1.0), held());
        }
        assert_eq!(gate.state(), GateState::Completed);
        gate.force_idle();
        assert_eq!(gate.state(), GateState::Idle);
        assert_eq!(gate.progress(), 0.0);
        assert_eq!(gate.session().trigger_source(), TriggerSource::None);
    }

    #[test]
    fn trigger_source_is_recorded_but_does_not_change_timing() {
        let mut keyboard = InteractionGate::new(3.0, 1.0, RangePolicy::Horizontal);
        let mut mobile = keyboard.clone();
        for _ in 0..30 {
            keyboard.update_tick(DT, at(0.0), at(1.0), held());
            mobile.update_tick(
                DT,
                at(0.0),
                at(1.0),
                TriggerSignal::held_by(TriggerSource::MobileButton),
            );
        }
        assert_eq!(keyboard.progress(), mobile.progress());
        assert_eq!(
            mobile.session().trigger_source(),
            TriggerSource::MobileButton
        );
    }

    #[test]
    fn invalid_construction_values_are_clamped() {
        let gate = InteractionGate::new(f32::NAN, -3.0, RangePolicy::Horizontal);
        assert_eq!(gate.session().range_radius(), 0.0);
        assert_eq!(gate.session().hold_duration(), 0.0);
    }
}
