use tracing::{debug, info, warn};

use crate::carry::{CarryState, CarryableEntity, EntityId};
use crate::collab::CollaboratorKind;
use crate::error::InteractionError;
use crate::interaction::Interactable;
use crate::math::Vec3;
use crate::persistence::PlacementRecord;
use crate::zone::{PlacementZone, ZoneClaim, ZoneId};

use super::{BattleOutcome, InteractionEvent, InteractionWorld, TimerPayload};

impl InteractionWorld {
    pub fn spawn_entity(
        &mut self,
        template_id: &str,
        position: Vec3,
    ) -> Result<EntityId, InteractionError> {
        let Some(template) = self.catalog.template_by_name(template_id) else {
            return Err(InteractionError::UnknownTemplate(template_id.to_string()));
        };
        let economy = template.economy();
        let fought = template.fought;
        let id = EntityId(self.next_entity_id);
        self.next_entity_id = self.next_entity_id.saturating_add(1);

        let entity = CarryableEntity::new(
            id,
            template_id,
            economy,
            fought,
            position,
            self.entity_gate(),
        );
        self.entities.insert(id, entity);
        self.events.emit(InteractionEvent::EntitySpawned { entity: id });
        info!(entity = %id, template = template_id, fought, "entity_spawned");
        Ok(id)
    }

    /// Removes an entity after letting go of everything that references it.
    pub fn despawn_entity(&mut self, id: EntityId) -> Result<(), InteractionError> {
        let Some(entity) = self.entities.get(&id) else {
            return Err(InteractionError::UnknownEntity(id));
        };
        if let Some(zone_id) = entity.owner_zone() {
            if let Some(zone) = self.zones.get_mut(&zone_id) {
                zone.release_claim();
            }
            self.clear_record(zone_id);
        }
        if let Some(carrier) = self.collaborators.carrier.as_deref_mut() {
            if carrier.currently_carried() == Some(id) {
                carrier.detach();
            }
        }
        self.pending_battles.remove(&id);
        self.entities.remove(&id);
        self.events.emit(InteractionEvent::EntityDespawned { entity: id });
        info!(entity = %id, "entity_despawned");
        Ok(())
    }

    /// Adds an inactive zone. Call [`InteractionWorld::activate_zone`] to
    /// make it take part in arbitration.
    pub fn add_zone(
        &mut self,
        id: ZoneId,
        anchor: Vec3,
        placement_offset: Vec3,
        placement_yaw: f32,
    ) -> Result<(), InteractionError> {
        if self.zones.contains_key(&id) {
            return Err(InteractionError::DuplicateZone(id));
        }
        let zone = PlacementZone::new(id, anchor, placement_offset, placement_yaw, self.zone_gate());
        self.zones.insert(id, zone);
        debug!(zone = %id, "zone_added");
        Ok(())
    }

    pub fn activate_zone(&mut self, id: ZoneId) -> Result<(), InteractionError> {
        let Some(zone) = self.zones.get_mut(&id) else {
            return Err(InteractionError::UnknownZone(id));
        };
        if zone.is_active() {
            return Ok(());
        }
        zone.set_active(true);
        self.coordinator.register(id);
        info!(zone = %id, "zone_activated");
        Ok(())
    }

    pub fn deactivate_zone(&mut self, id: ZoneId) -> Result<(), InteractionError> {
        let Some(zone) = self.zones.get_mut(&id) else {
            return Err(InteractionError::UnknownZone(id));
        };
        if !zone.is_active() {
            return Ok(());
        }
        zone.set_active(false);
        self.coordinator.deregister(id);
        if self.armed_zone == Some(id) {
            self.armed_zone = None;
        }
        if self.arbitration_winner == Some(id) {
            self.arbitration_winner = None;
        }
        info!(zone = %id, "zone_deactivated");
        Ok(())
    }

    /// Deactivates and drops a zone. Whatever sat on it lands on the ground
    /// where it is.
    pub fn remove_zone(&mut self, id: ZoneId) -> Result<Option<EntityId>, InteractionError> {
        self.deactivate_zone(id)?;
        let Some(mut zone) = self.zones.remove(&id) else {
            return Err(InteractionError::UnknownZone(id));
        };
        let released = zone.release_claim();
        if let Some(entity_id) = released {
            if let Some(entity) = self.entities.get_mut(&entity_id) {
                if entity.owner_zone() == Some(id) {
                    let position = entity.position();
                    entity.mark_on_ground(position);
                }
            }
            self.clear_record(id);
        }
        info!(zone = %id, released = ?released, "zone_removed");
        Ok(released)
    }

    pub fn take(&mut self, id: EntityId) -> Result<(), InteractionError> {
        let Some(entity) = self.entities.get(&id) else {
            return Err(InteractionError::UnknownEntity(id));
        };
        let state = entity.carry_state();
        if !matches!(state, CarryState::Free | CarryState::PlacedOnGround) {
            return Err(InteractionError::InvalidTransition {
                entity: id,
                state,
                action: "take",
            });
        }
        if entity.battle_pending() {
            return Err(InteractionError::InvalidTransition {
                entity: id,
                state,
                action: "take before winning its battle",
            });
        }

        let carry_offset = self.config.carry_offset;
        let carrier = self.carrier_mut()?;
        if !carrier.can_carry() {
            return Err(InteractionError::CarrierUnavailable);
        }
        if let Some(held) = carrier.currently_carried() {
            warn!(entity = %id, held = %held, "take_rejected_capacity");
            return Err(InteractionError::Capacity { held });
        }
        carrier.attach(id)?;
        let position = carrier.actor_position().add(carry_offset);

        if let Some(entity) = self.entities.get_mut(&id) {
            entity.mark_carried();
            entity.set_position(position);
        }
        self.events.emit(InteractionEvent::Taken { entity: id });
        info!(entity = %id, from = state.as_str(), "entity_taken");
        Ok(())
    }

    pub fn put_on_ground(&mut self, id: EntityId) -> Result<(), InteractionError> {
        let Some(entity) = self.entities.get(&id) else {
            return Err(InteractionError::UnknownEntity(id));
        };
        let state = entity.carry_state();
        if state != CarryState::Carried {
            return Err(InteractionError::InvalidTransition {
                entity: id,
                state,
                action: "put on the ground",
            });
        }

        let drop_offset = self.config.ground_drop_offset;
        let carrier = self.carrier_mut()?;
        let actor = carrier.actor_position();
        if carrier.currently_carried() == Some(id) {
            carrier.detach();
        }
        let position = self.project_to_ground(actor.add(drop_offset));

        if let Some(entity) = self.entities.get_mut(&id) {
            entity.mark_on_ground(position);
        }
        self.events
            .emit(InteractionEvent::PutOnGround { entity: id, position });
        info!(entity = %id, x = position.x, y = position.y, z = position.z, "entity_put_on_ground");
        Ok(())
    }

    /// Settles a free entity where it stands and starts its battle.
    pub fn put_then_fight(&mut self, id: EntityId) -> Result<(), InteractionError> {
        let Some(entity) = self.entities.get(&id) else {
            return Err(InteractionError::UnknownEntity(id));
        };
        let state = entity.carry_state();
        if state != CarryState::Free || !entity.battle_pending() {
            return Err(InteractionError::InvalidTransition {
                entity: id,
                state,
                action: "settle for a fight",
            });
        }
        let resting = entity.position();
        if self.collaborators.battles.is_none() {
            self.note_missing(CollaboratorKind::BattleRequester);
            return Err(InteractionError::MissingCollaborator(
                CollaboratorKind::BattleRequester,
            ));
        }

        let position = self.project_to_ground(resting);
        if let Some(entity) = self.entities.get_mut(&id) {
            entity.mark_on_ground(position);
        }
        self.events
            .emit(InteractionEvent::PutOnGround { entity: id, position });
        self.start_fight(id)
    }

    pub fn start_fight(&mut self, id: EntityId) -> Result<(), InteractionError> {
        let Some(entity) = self.entities.get(&id) else {
            return Err(InteractionError::UnknownEntity(id));
        };
        let state = entity.carry_state();
        if state != CarryState::PlacedOnGround || !entity.battle_pending() {
            return Err(InteractionError::InvalidTransition {
                entity: id,
                state,
                action: "start a fight",
            });
        }
        if self.pending_battles.contains(&id) {
            debug!(entity = %id, "battle_already_pending");
            return Ok(());
        }
        let template_id = entity.template_id().to_string();

        let Some(battles) = self.collaborators.battles.as_deref_mut() else {
            self.note_missing(CollaboratorKind::BattleRequester);
            return Err(InteractionError::MissingCollaborator(
                CollaboratorKind::BattleRequester,
            ));
        };
        battles.request_battle(id, &template_id);
        self.pending_battles.insert(id);
        self.events.emit(InteractionEvent::BattleRequested { entity: id });
        info!(entity = %id, template = %template_id, "battle_requested");
        Ok(())
    }

    /// Applies the outcome of a battle started by [`InteractionWorld::start_fight`].
    pub fn resolve_battle(
        &mut self,
        id: EntityId,
        outcome: BattleOutcome,
    ) -> Result<(), InteractionError> {
        let Some(entity) = self.entities.get_mut(&id) else {
            return Err(InteractionError::UnknownEntity(id));
        };
        if !self.pending_battles.remove(&id) {
            return Err(InteractionError::InvalidTransition {
                entity: id,
                state: entity.carry_state(),
                action: "resolve a battle that was never started",
            });
        }
        self.events
            .emit(InteractionEvent::BattleResolved { entity: id, outcome });
        info!(entity = %id, outcome = ?outcome, "battle_resolved");
        match outcome {
            BattleOutcome::Victory => {
                entity.set_fought(false);
                Ok(())
            }
            BattleOutcome::Defeat => self.despawn_entity(id),
        }
    }

    /// Puts `entity` on `zone`. The zone's claim is `Claiming` until the
    /// entity has been detached and relocated.
    pub fn place_on_panel(&mut self, zone_id: ZoneId, id: EntityId) -> Result<(), InteractionError> {
        let tick = self.clock.tick();
        let Some(zone) = self.zones.get(&zone_id) else {
            return Err(InteractionError::UnknownZone(zone_id));
        };
        if !zone.is_active() {
            return Err(InteractionError::ZoneInactive(zone_id));
        }
        match zone.claim() {
            ZoneClaim::Claimed(occupant) if occupant == id => return Ok(()),
            ZoneClaim::Claimed(occupant) => {
                return Err(InteractionError::Occupied {
                    zone: zone_id,
                    occupant,
                })
            }
            ZoneClaim::Claiming(_) => return Err(InteractionError::ClaimInProgress(zone_id)),
            ZoneClaim::Empty => {}
        }
        if zone.is_suppressed(tick) {
            return Err(InteractionError::PlacementSuppressed(zone_id));
        }
        let placement = zone.placement_position();

        let Some(entity) = self.entities.get(&id) else {
            return Err(InteractionError::UnknownEntity(id));
        };
        let state = entity.carry_state();
        if state == CarryState::PlacedOnPanel {
            return Err(InteractionError::InvalidTransition {
                entity: id,
                state,
                action: "be placed on a second panel",
            });
        }

        if let Some(zone) = self.zones.get_mut(&zone_id) {
            zone.begin_claim(id)?;
        }
        if let Some(carrier) = self.collaborators.carrier.as_deref_mut() {
            if carrier.currently_carried() == Some(id) {
                carrier.detach();
            }
        }
        let Some(entity) = self.entities.get_mut(&id) else {
            if let Some(zone) = self.zones.get_mut(&zone_id) {
                zone.abort_claim();
            }
            return Err(InteractionError::UnknownEntity(id));
        };
        entity.mark_on_panel(zone_id, placement);
        if let Some(zone) = self.zones.get_mut(&zone_id) {
            zone.commit_claim();
        }

        self.timers.schedule_after(
            &self.clock,
            self.config.revalidation_interval_seconds,
            TimerPayload::RevalidateClaim {
                zone: zone_id,
                entity: id,
            },
        );
        if !self.replaying {
            self.save_record(zone_id, id);
        }
        self.events.emit(InteractionEvent::PlacedOnPanel {
            entity: id,
            zone: zone_id,
        });
        info!(
            entity = %id,
            zone = %zone_id,
            from = state.as_str(),
            replaying = self.replaying,
            "zone_claim_committed"
        );
        Ok(())
    }

    /// Hands the zone's entity back to the carrier and keeps the zone from
    /// accepting placements for the configured number of ticks.
    pub fn reclaim(&mut self, zone_id: ZoneId) -> Result<EntityId, InteractionError> {
        let tick = self.clock.tick();
        let Some(zone) = self.zones.get(&zone_id) else {
            return Err(InteractionError::UnknownZone(zone_id));
        };
        let id = match zone.claim() {
            ZoneClaim::Claimed(id) => id,
            ZoneClaim::Claiming(_) => return Err(InteractionError::ClaimInProgress(zone_id)),
            ZoneClaim::Empty => return Err(InteractionError::NothingClaimed(zone_id)),
        };
        if !self.entities.contains_key(&id) {
            return Err(InteractionError::UnknownEntity(id));
        }

        let carry_offset = self.config.carry_offset;
        let suppression_ticks = self.config.reclaim_suppression_ticks;
        let carrier = self.carrier_mut()?;
        if !carrier.can_carry() {
            return Err(InteractionError::CarrierUnavailable);
        }
        if let Some(held) = carrier.currently_carried() {
            if held != id {
                warn!(entity = %id, held = %held, "reclaim_rejected_capacity");
                return Err(InteractionError::Capacity { held });
            }
        }
        carrier.attach(id)?;
        let position = carrier.actor_position().add(carry_offset);

        if let Some(zone) = self.zones.get_mut(&zone_id) {
            zone.release_claim();
            zone.suppress_through(tick.saturating_add(suppression_ticks));
        }
        if let Some(entity) = self.entities.get_mut(&id) {
            entity.mark_carried();
            entity.set_position(position);
        }
        if !self.replaying {
            self.clear_record(zone_id);
        }
        self.events.emit(InteractionEvent::Reclaimed {
            entity: id,
            zone: zone_id,
        });
        info!(entity = %id, zone = %zone_id, "zone_claim_reclaimed");
        Ok(id)
    }

    /// Spends the upgrade cost from the wallet and raises the level by one.
    pub fn upgrade_entity(&mut self, id: EntityId) -> Result<u32, InteractionError> {
        let Some(entity) = self.entities.get(&id) else {
            return Err(InteractionError::UnknownEntity(id));
        };
        let mut economy = *entity.economy();
        let cost = economy.upgrade_cost();
        self.wallet.try_spend(cost)?;
        economy.level = economy.level.saturating_add(1);

        let owner_zone = match self.entities.get_mut(&id) {
            Some(entity) => {
                entity.set_economy(economy);
                entity.owner_zone()
            }
            None => None,
        };
        if let Some(zone_id) = owner_zone {
            self.save_record(zone_id, id);
        }
        self.events.emit(InteractionEvent::EntityUpgraded {
            entity: id,
            level: economy.level,
        });
        info!(entity = %id, level = economy.level, cost, "entity_upgraded");
        Ok(economy.level)
    }

    /// Moves an entity that is not being carried, as a physics push would.
    pub fn displace_entity(&mut self, id: EntityId, position: Vec3) -> Result<(), InteractionError> {
        let Some(entity) = self.entities.get_mut(&id) else {
            return Err(InteractionError::UnknownEntity(id));
        };
        if entity.carry_state() == CarryState::Carried {
            return Err(InteractionError::InvalidTransition {
                entity: id,
                state: CarryState::Carried,
                action: "be displaced",
            });
        }
        entity.set_position(position);
        debug!(entity = %id, x = position.x, y = position.y, z = position.z, "entity_displaced");
        Ok(())
    }

    /// Checks every claim now instead of waiting for its timer. Returns how
    /// many stale claims were released.
    pub fn revalidate_claims(&mut self) -> usize {
        let claims = self
            .zones
            .values()
            .filter_map(|zone| match zone.claim() {
                ZoneClaim::Claimed(entity) => Some((zone.id(), entity)),
                _ => None,
            })
            .collect::<Vec<_>>();
        let stale = claims
            .into_iter()
            .filter(|(zone, entity)| !self.claim_is_healthy(*zone, *entity))
            .collect::<Vec<_>>();
        for (zone, entity) in &stale {
            self.release_stale_claim(*zone, *entity);
        }
        stale.len()
    }

    /// Spawns and places an entity for every stored placement of a registered
    /// zone, without writing anything back to the store.
    pub fn restore_placements(&mut self) -> usize {
        let zone_ids = self.coordinator.registered().collect::<Vec<_>>();
        let Some(store) = self.collaborators.store.as_deref() else {
            self.note_missing(CollaboratorKind::PersistenceStore);
            return 0;
        };
        let mut records = Vec::new();
        for zone_id in zone_ids {
            match store.load_placement(zone_id) {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}
                Err(error) => warn!(zone = %zone_id, error = %error, "placement_load_failed"),
            }
        }

        self.replaying = true;
        let mut restored = 0;
        for record in records {
            match self.restore_record(&record) {
                Ok(()) => restored += 1,
                Err(error) => warn!(
                    zone = %record.zone_id,
                    template = %record.template_id,
                    error = %error,
                    "placement_restore_failed"
                ),
            }
        }
        self.replaying = false;
        info!(restored, "placements_restored");
        restored
    }

    fn restore_record(&mut self, record: &PlacementRecord) -> Result<(), InteractionError> {
        let Some(zone) = self.zones.get(&record.zone_id) else {
            return Err(InteractionError::UnknownZone(record.zone_id));
        };
        if let Some(occupant) = zone.claimed_entity() {
            return Err(InteractionError::Occupied {
                zone: record.zone_id,
                occupant,
            });
        }
        let position = zone.placement_position();
        let id = self.spawn_entity(&record.template_id, position)?;
        if let Some(entity) = self.entities.get_mut(&id) {
            entity.set_economy(record.economy);
            entity.set_fought(record.fought);
        }
        if let Err(error) = self.place_on_panel(record.zone_id, id) {
            let _ = self.despawn_entity(id);
            return Err(error);
        }
        Ok(())
    }

    pub(super) fn revalidate_claim(&mut self, zone_id: ZoneId, entity_id: EntityId) {
        let Some(zone) = self.zones.get(&zone_id) else {
            return;
        };
        if zone.claim() != ZoneClaim::Claimed(entity_id) {
            // The claim changed since this check was scheduled.
            return;
        }
        if self.claim_is_healthy(zone_id, entity_id) {
            self.timers.schedule_after(
                &self.clock,
                self.config.revalidation_interval_seconds,
                TimerPayload::RevalidateClaim {
                    zone: zone_id,
                    entity: entity_id,
                },
            );
            return;
        }
        self.release_stale_claim(zone_id, entity_id);
    }

    fn claim_is_healthy(&self, zone_id: ZoneId, entity_id: EntityId) -> bool {
        let (Some(zone), Some(entity)) = (self.zones.get(&zone_id), self.entities.get(&entity_id))
        else {
            return false;
        };
        let slack = self.config.placement_slack;
        entity.carry_state() == CarryState::PlacedOnPanel
            && entity.owner_zone() == Some(zone_id)
            && entity.interaction_point().distance_sq(zone.placement_position()) <= slack * slack
    }

    fn release_stale_claim(&mut self, zone_id: ZoneId, entity_id: EntityId) {
        if let Some(zone) = self.zones.get_mut(&zone_id) {
            zone.release_claim();
        }
        let mut drift = None;
        if let Some(entity) = self.entities.get_mut(&entity_id) {
            if entity.owner_zone() == Some(zone_id) {
                let position = entity.position();
                entity.mark_on_ground(position);
                drift = Some(position);
            }
        }
        self.clear_record(zone_id);
        self.events.emit(InteractionEvent::StaleClaimReleased {
            entity: entity_id,
            zone: zone_id,
        });
        warn!(
            zone = %zone_id,
            entity = %entity_id,
            position = ?drift,
            "stale_claim_released"
        );
    }

    fn project_to_ground(&mut self, position: Vec3) -> Vec3 {
        let Some(ground) = self.collaborators.ground.as_deref() else {
            self.note_missing(CollaboratorKind::GroundProbe);
            return position;
        };
        ground.project_to_ground(position).unwrap_or_else(|| {
            debug!(x = position.x, y = position.y, z = position.z, "ground_projection_missed");
            position
        })
    }

    fn save_record(&mut self, zone_id: ZoneId, entity_id: EntityId) {
        let Some(entity) = self.entities.get(&entity_id) else {
            return;
        };
        let record = PlacementRecord {
            zone_id,
            template_id: entity.template_id().to_string(),
            economy: *entity.economy(),
            fought: entity.fought(),
        };
        let Some(store) = self.collaborators.store.as_deref_mut() else {
            self.note_missing(CollaboratorKind::PersistenceStore);
            return;
        };
        if let Err(error) = store.save_placement(&record) {
            warn!(zone = %zone_id, entity = %entity_id, error = %error, "placement_save_failed");
        }
    }

    fn clear_record(&mut self, zone_id: ZoneId) {
        let Some(store) = self.collaborators.store.as_deref_mut() else {
            self.note_missing(CollaboratorKind::PersistenceStore);
            return;
        };
        if let Err(error) = store.clear_placement(zone_id) {
            warn!(zone = %zone_id, error = %error, "placement_clear_failed");
        }
    }
}
