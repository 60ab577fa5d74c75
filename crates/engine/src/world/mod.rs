mod events;
mod ops;

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use crate::app::{SimClock, TimerQueue, TriggerSignal};
use crate::carry::{Carrier, CarryState, CarryableEntity, EntityId, Wallet};
use crate::collab::{
    BattleRequester, CollaboratorKind, GroundProbe, PromptFrame, PromptRenderer, PromptTarget,
};
use crate::config::InteractionConfig;
use crate::content::TemplateCatalog;
use crate::error::InteractionError;
use crate::interaction::{
    GateState, HoldContext, HoldResolution, Interactable, InteractionGate, InteractionPolicy,
    SessionSnapshot,
};
use crate::math::Vec3;
use crate::persistence::PersistenceStore;
use crate::zone::{ArbitrationCoordinator, PlacementZone, ZoneClaim, ZoneId};

pub use events::{
    BattleOutcome, InteractionEvent, InteractionEventBus, InteractionEventCounts,
    InteractionEventKind,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorldSystemId {
    Clock,
    Timers,
    Arbitration,
    Zones,
    Entities,
    Income,
    Prompts,
    EventRollover,
}

impl WorldSystemId {
    pub fn name(self) -> &'static str {
        match self {
            Self::Clock => "Clock",
            Self::Timers => "Timers",
            Self::Arbitration => "Arbitration",
            Self::Zones => "Zones",
            Self::Entities => "Entities",
            Self::Income => "Income",
            Self::Prompts => "Prompts",
            Self::EventRollover => "EventRollover",
        }
    }
}

pub const WORLD_SYSTEM_ORDER: [WorldSystemId; 8] = [
    WorldSystemId::Clock,
    WorldSystemId::Timers,
    WorldSystemId::Arbitration,
    WorldSystemId::Zones,
    WorldSystemId::Entities,
    WorldSystemId::Income,
    WorldSystemId::Prompts,
    WorldSystemId::EventRollover,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerPayload {
    RevalidateClaim { zone: ZoneId, entity: EntityId },
}

/// External systems the world calls out to. Any of them may be absent; the
/// operations that need one are rejected and the absence is logged once.
#[derive(Default)]
pub struct Collaborators {
    pub carrier: Option<Box<dyn Carrier>>,
    pub store: Option<Box<dyn PersistenceStore>>,
    pub battles: Option<Box<dyn BattleRequester>>,
    pub prompts: Option<Box<dyn PromptRenderer>>,
    pub ground: Option<Box<dyn GroundProbe>>,
}

/// Owns every carryable entity and placement zone and steps them in a fixed
/// system order once per simulation tick.
pub struct InteractionWorld {
    config: InteractionConfig,
    catalog: TemplateCatalog,
    collaborators: Collaborators,
    entities: BTreeMap<EntityId, CarryableEntity>,
    zones: BTreeMap<ZoneId, PlacementZone>,
    coordinator: ArbitrationCoordinator,
    clock: SimClock,
    timers: TimerQueue<TimerPayload>,
    events: InteractionEventBus,
    wallet: Wallet,
    pending_battles: BTreeSet<EntityId>,
    warned_missing: BTreeSet<CollaboratorKind>,
    next_entity_id: u64,
    replaying: bool,
    actor_position: Vec3,
    trigger: TriggerSignal,
    // Set once a hold fires an action; cleared when the trigger is released.
    hold_consumed: bool,
    arbitration_winner: Option<ZoneId>,
    armed_zone: Option<ZoneId>,
    last_tick_order: Vec<WorldSystemId>,
}

impl InteractionWorld {
    pub fn new(config: InteractionConfig, catalog: TemplateCatalog) -> Self {
        Self {
            config,
            catalog,
            collaborators: Collaborators::default(),
            entities: BTreeMap::new(),
            zones: BTreeMap::new(),
            coordinator: ArbitrationCoordinator::new(),
            clock: SimClock::default(),
            timers: TimerQueue::default(),
            events: InteractionEventBus::default(),
            wallet: Wallet::default(),
            pending_battles: BTreeSet::new(),
            warned_missing: BTreeSet::new(),
            next_entity_id: 1,
            replaying: false,
            actor_position: Vec3::ZERO,
            trigger: TriggerSignal::released(),
            hold_consumed: false,
            arbitration_winner: None,
            armed_zone: None,
            last_tick_order: Vec::with_capacity(WORLD_SYSTEM_ORDER.len()),
        }
    }

    pub fn with_collaborators(mut self, collaborators: Collaborators) -> Self {
        self.collaborators = collaborators;
        self
    }

    pub fn with_carrier(mut self, carrier: Box<dyn Carrier>) -> Self {
        self.collaborators.carrier = Some(carrier);
        self
    }

    pub fn with_store(mut self, store: Box<dyn PersistenceStore>) -> Self {
        self.collaborators.store = Some(store);
        self
    }

    pub fn with_battles(mut self, battles: Box<dyn BattleRequester>) -> Self {
        self.collaborators.battles = Some(battles);
        self
    }

    pub fn with_prompts(mut self, prompts: Box<dyn PromptRenderer>) -> Self {
        self.collaborators.prompts = Some(prompts);
        self
    }

    pub fn with_ground(mut self, ground: Box<dyn GroundProbe>) -> Self {
        self.collaborators.ground = Some(ground);
        self
    }

    pub fn with_wallet(mut self, wallet: Wallet) -> Self {
        self.wallet = wallet;
        self
    }

    pub fn config(&self) -> &InteractionConfig {
        &self.config
    }

    pub fn catalog(&self) -> &TemplateCatalog {
        &self.catalog
    }

    pub fn entity(&self, id: EntityId) -> Option<&CarryableEntity> {
        self.entities.get(&id)
    }

    pub fn entities(&self) -> impl Iterator<Item = &CarryableEntity> {
        self.entities.values()
    }

    pub fn zone(&self, id: ZoneId) -> Option<&PlacementZone> {
        self.zones.get(&id)
    }

    pub fn zones(&self) -> impl Iterator<Item = &PlacementZone> {
        self.zones.values()
    }

    pub fn coordinator(&self) -> &ArbitrationCoordinator {
        &self.coordinator
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    pub fn wallet(&self) -> &Wallet {
        &self.wallet
    }

    pub fn events(&self) -> &InteractionEventBus {
        &self.events
    }

    pub fn store(&self) -> Option<&dyn PersistenceStore> {
        self.collaborators.store.as_deref()
    }

    pub fn carried_entity(&self) -> Option<EntityId> {
        self.collaborators
            .carrier
            .as_deref()
            .and_then(|carrier| carrier.currently_carried())
    }

    pub fn actor_position(&self) -> Vec3 {
        self.actor_position
    }

    pub fn arbitration_winner(&self) -> Option<ZoneId> {
        self.arbitration_winner
    }

    /// Zone whose gate processed input this tick.
    pub fn armed_zone(&self) -> Option<ZoneId> {
        self.armed_zone
    }

    pub fn battle_pending_for(&self, entity: EntityId) -> bool {
        self.pending_battles.contains(&entity)
    }

    pub fn last_tick_order(&self) -> &[WorldSystemId] {
        &self.last_tick_order
    }

    pub fn tick(&mut self, fixed_dt_seconds: f32, actor_position: Vec3, trigger: TriggerSignal) {
        self.last_tick_order.clear();
        for system_id in WORLD_SYSTEM_ORDER {
            self.last_tick_order.push(system_id);
            match system_id {
                WorldSystemId::Clock => self.run_clock(fixed_dt_seconds, actor_position, trigger),
                WorldSystemId::Timers => self.run_timers(),
                WorldSystemId::Arbitration => self.run_arbitration(),
                WorldSystemId::Zones => self.run_zones(fixed_dt_seconds),
                WorldSystemId::Entities => self.run_entities(fixed_dt_seconds),
                WorldSystemId::Income => self.run_income(fixed_dt_seconds),
                WorldSystemId::Prompts => self.run_prompts(),
                WorldSystemId::EventRollover => self.events.finish_tick_rollover(),
            }
        }
    }

    fn run_clock(&mut self, fixed_dt_seconds: f32, actor_position: Vec3, trigger: TriggerSignal) {
        self.clock.advance(fixed_dt_seconds);
        self.trigger = trigger;
        if !trigger.held {
            self.hold_consumed = false;
        }
        self.actor_position = match self.collaborators.carrier.as_deref_mut() {
            Some(carrier) => {
                carrier.set_actor_position(actor_position);
                carrier.actor_position()
            }
            None => {
                self.note_missing(CollaboratorKind::Carrier);
                actor_position
            }
        };
    }

    fn run_timers(&mut self) {
        for payload in self.timers.drain_due(self.clock.elapsed_seconds()) {
            match payload {
                TimerPayload::RevalidateClaim { zone, entity } => {
                    self.revalidate_claim(zone, entity);
                }
            }
        }
    }

    fn run_arbitration(&mut self) {
        self.arbitration_winner =
            self.coordinator
                .nearest_zone(self.clock.tick(), self.actor_position, &self.zones);
    }

    fn run_zones(&mut self, fixed_dt_seconds: f32) {
        let tick = self.clock.tick();
        let actor = self.actor_position;
        let trigger = self.trigger;
        let carried = self.carried_entity();
        let zone_ids = self.zones.keys().copied().collect::<Vec<_>>();

        self.armed_zone = None;
        let mut completed_zone = None;
        for zone_id in zone_ids {
            // Every zone asks; only the first ask in a tick recomputes.
            let winner = self.coordinator.nearest_zone(tick, actor, &self.zones);
            let hold_consumed = self.hold_consumed || completed_zone.is_some();
            let Some(zone) = self.zones.get_mut(&zone_id) else {
                continue;
            };
            let armed = winner == Some(zone_id)
                && zone.is_active()
                && carried.is_some()
                && zone.claim() == ZoneClaim::Empty
                && !zone.is_suppressed(tick);
            if !armed {
                zone.gate_mut().force_idle();
                zone.set_prompt_visible(false);
                continue;
            }

            zone.set_prompt_visible(true);
            self.armed_zone = Some(zone_id);
            let snapshot = step_gate(zone, fixed_dt_seconds, actor, trigger, hold_consumed);
            if snapshot.just_completed {
                completed_zone = Some(zone_id);
            }
        }

        if let Some(zone_id) = completed_zone {
            self.dispatch_zone_completion(zone_id);
        }
    }

    fn run_entities(&mut self, fixed_dt_seconds: f32) {
        let actor = self.actor_position;
        let trigger = self.trigger;
        let carried = self.carried_entity();
        let zone_armed = self.armed_zone.is_some();
        let winner = self.arbitration_winner;
        let carry_position = actor.add(self.config.carry_offset);
        let entity_ids = self.entities.keys().copied().collect::<Vec<_>>();

        for entity_id in entity_ids {
            let hold_consumed = self.hold_consumed;
            let Some(entity) = self.entities.get_mut(&entity_id) else {
                continue;
            };
            let held_here = carried == Some(entity_id);
            if held_here {
                entity.set_position(carry_position);
            }
            let runs_gate = match entity.carry_state() {
                CarryState::Carried => held_here && !zone_armed,
                // A panel entity answers only through the zone that won arbitration.
                CarryState::PlacedOnPanel => {
                    carried.is_none() && winner.is_some() && entity.owner_zone() == winner
                }
                // Full hands cannot pick up or start fights.
                _ => carried.is_none(),
            };
            if !runs_gate {
                entity.gate_mut().force_idle();
                continue;
            }

            let snapshot = step_gate(entity, fixed_dt_seconds, actor, trigger, hold_consumed);
            if snapshot.just_completed {
                self.dispatch_entity_completion(entity_id);
            }
        }
    }

    fn run_income(&mut self, fixed_dt_seconds: f32) {
        if !fixed_dt_seconds.is_finite() || fixed_dt_seconds <= 0.0 {
            return;
        }
        let per_second = self
            .zones
            .values()
            .filter_map(|zone| match zone.claim() {
                ZoneClaim::Claimed(entity) => self.entities.get(&entity),
                _ => None,
            })
            .map(|entity| entity.economy().income_per_second())
            .sum::<f64>();
        self.wallet
            .deposit(per_second * f64::from(fixed_dt_seconds));
    }

    fn run_prompts(&mut self) {
        let frames = self.prompt_frames();
        match self.collaborators.prompts.as_deref_mut() {
            Some(renderer) => {
                for frame in &frames {
                    renderer.render_prompt(frame);
                }
            }
            None => self.note_missing(CollaboratorKind::PromptRenderer),
        }
    }

    /// One frame per entity and zone, in id order.
    pub fn prompt_frames(&self) -> Vec<PromptFrame> {
        let actor = self.actor_position;
        let hands_full = self.carried_entity().is_some();
        let mut frames = Vec::with_capacity(self.entities.len() + self.zones.len());
        for entity in self.entities.values() {
            let gate = entity.gate();
            let reachable = entity.carry_state() != CarryState::PlacedOnPanel
                || (self.arbitration_winner.is_some()
                    && entity.owner_zone() == self.arbitration_winner);
            let visible = entity.prompt_visible()
                && !hands_full
                && reachable
                && gate.is_in_range(actor, entity.interaction_point());
            frames.push(PromptFrame {
                target: PromptTarget::Entity(entity.id()),
                visible,
                progress: gate.progress(),
            });
        }
        for zone in self.zones.values() {
            frames.push(PromptFrame {
                target: PromptTarget::Zone(zone.id()),
                visible: zone.prompt_visible(),
                progress: zone.gate().progress(),
            });
        }
        frames
    }

    fn dispatch_zone_completion(&mut self, zone_id: ZoneId) {
        self.hold_consumed = true;
        let context = HoldContext {
            accepting_zone: Some(zone_id),
            carried: self.carried_entity(),
        };
        let Some(zone) = self.zones.get(&zone_id) else {
            return;
        };
        let subject = context.carried.or(zone.claimed_entity());
        let resolution = zone.on_hold_complete(&context);
        self.events.emit(InteractionEvent::HoldCompleted {
            target: PromptTarget::Zone(zone_id),
        });
        match (resolution, subject) {
            (Some(resolution), Some(entity)) => self.apply_resolution(entity, resolution),
            _ => debug!(zone = %zone_id, "hold_completion_ignored"),
        }
    }

    fn dispatch_entity_completion(&mut self, entity_id: EntityId) {
        self.hold_consumed = true;
        let context = HoldContext {
            accepting_zone: self.armed_zone,
            carried: self.carried_entity(),
        };
        let Some(entity) = self.entities.get(&entity_id) else {
            return;
        };
        let resolution = entity.on_hold_complete(&context);
        self.events.emit(InteractionEvent::HoldCompleted {
            target: PromptTarget::Entity(entity_id),
        });
        match resolution {
            Some(resolution) => self.apply_resolution(entity_id, resolution),
            None => debug!(entity = %entity_id, "hold_completion_ignored"),
        }
    }

    fn apply_resolution(&mut self, entity: EntityId, resolution: HoldResolution) {
        let result = match resolution {
            HoldResolution::Take => self.take(entity),
            HoldResolution::PlaceOnPanel(zone) => self.place_on_panel(zone, entity),
            HoldResolution::PutOnGround => self.put_on_ground(entity),
            HoldResolution::PutThenFight => self.put_then_fight(entity),
            HoldResolution::StartFight => self.start_fight(entity),
            HoldResolution::ReclaimFromPanel(zone) => self.reclaim(zone).map(|_| ()),
        };
        if let Err(error) = result {
            warn!(
                entity = %entity,
                resolution = ?resolution,
                error = %error,
                "hold_completion_rejected"
            );
        }
    }

    fn note_missing(&mut self, kind: CollaboratorKind) {
        if self.warned_missing.insert(kind) {
            warn!(collaborator = kind.as_str(), "collaborator_missing");
        }
    }

    fn carrier_mut(&mut self) -> Result<&mut (dyn Carrier + 'static), InteractionError> {
        if self.collaborators.carrier.is_none() {
            self.note_missing(CollaboratorKind::Carrier);
        }
        self.collaborators
            .carrier
            .as_deref_mut()
            .ok_or(InteractionError::MissingCollaborator(CollaboratorKind::Carrier))
    }

    fn entity_gate(&self) -> InteractionGate {
        InteractionGate::new(
            self.config.entity_range_radius,
            self.config.hold_duration_seconds,
            self.config.range_policy,
        )
    }

    fn zone_gate(&self) -> InteractionGate {
        InteractionGate::new(
            self.config.zone_range_radius,
            self.config.hold_duration_seconds,
            self.config.range_policy,
        )
    }
}

/// Steps one gate. After a hold has fired an action, gates that have not
/// completed see a released trigger until the real trigger is let go, so one
/// continuous hold fires at most one action.
fn step_gate<T: Interactable>(
    target: &mut T,
    fixed_dt_seconds: f32,
    actor: Vec3,
    trigger: TriggerSignal,
    hold_consumed: bool,
) -> SessionSnapshot {
    let point = target.interaction_point();
    if hold_consumed && trigger.held {
        if target.gate().state() != GateState::Completed {
            target
                .gate_mut()
                .update_tick(fixed_dt_seconds, actor, point, TriggerSignal::released());
        }
        return target.gate().snapshot();
    }
    target
        .gate_mut()
        .update_tick(fixed_dt_seconds, actor, point, trigger)
}
