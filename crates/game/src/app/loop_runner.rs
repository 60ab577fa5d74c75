use std::process::ExitCode;

use collector_engine::{BattleOutcome, InteractionEventCounts, TriggerInput};
use tracing::{error, info, warn};

use super::bootstrap::{prepare_run, AppWiring};
use super::scene::DemoScene;
use super::script::ScriptedInput;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct RunSummary {
    pub(crate) ticks: u64,
    pub(crate) counts: InteractionEventCounts,
    pub(crate) balance: f64,
    pub(crate) claimed_zones: usize,
}

pub(crate) fn run(app: AppWiring) -> ExitCode {
    let mut prepared = match prepare_run(&app) {
        Ok(prepared) => prepared,
        Err(err) => {
            error!(error = %err, "startup_failed");
            return ExitCode::FAILURE;
        }
    };

    let outcome = prepared.config.battle_outcome.into();
    let fixed_dt_seconds = prepared.config.fixed_dt_seconds();
    let script = ScriptedInput::new(prepared.config.script.clone());
    info!(
        ticks = script.total_ticks(),
        tick_rate_hz = prepared.config.tick_rate_hz,
        "script_started"
    );
    let summary = run_script(&mut prepared.scene, script, fixed_dt_seconds, outcome);
    info!(
        ticks = summary.ticks,
        taken = summary.counts.taken,
        placed = summary.counts.placed_on_panel,
        reclaimed = summary.counts.reclaimed,
        put_on_ground = summary.counts.put_on_ground,
        battles = summary.counts.battle_requested,
        stale_released = summary.counts.stale_claim_released,
        claimed_zones = summary.claimed_zones,
        balance = summary.balance,
        "run_summary"
    );
    ExitCode::SUCCESS
}

/// Steps the world once per scripted frame. Battles requested during a tick
/// are settled right after it with `outcome`.
pub(crate) fn run_script(
    scene: &mut DemoScene,
    mut script: ScriptedInput,
    fixed_dt_seconds: f32,
    outcome: BattleOutcome,
) -> RunSummary {
    let mut trigger_input = TriggerInput::default();
    let mut ticks = 0_u64;
    while let Some(frame) = script.next_frame() {
        let trigger = trigger_input.sample(&frame.input);
        scene.world.tick(fixed_dt_seconds, frame.actor, trigger);
        ticks += 1;

        for entity in scene.battles.try_iter() {
            if let Err(err) = scene.world.resolve_battle(entity, outcome) {
                warn!(entity = %entity, error = %err, "battle_resolution_failed");
            }
        }
    }

    let world = &scene.world;
    RunSummary {
        ticks,
        counts: world.events().lifetime_counts(),
        balance: world.wallet().balance(),
        claimed_zones: world
            .zones()
            .filter(|zone| zone.claimed_entity().is_some())
            .count(),
    }
}
