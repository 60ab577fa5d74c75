use std::collections::BTreeMap;
use std::sync::mpsc::{self, Receiver, Sender};

use collector_engine::{
    BattleRequester, EntityId, FlatGround, InteractionError, InteractionWorld, PersistenceStore,
    PlayerHand, PromptFrame, PromptRenderer, PromptTarget, TemplateCatalog, Vec3, Wallet,
};
use tracing::{debug, info, warn};

use super::config::HarnessConfig;

/// Forwards battle requests to the run loop, which settles them with the
/// configured outcome.
pub(crate) struct QueuedBattles {
    sender: Sender<EntityId>,
}

impl QueuedBattles {
    pub(crate) fn channel() -> (Self, Receiver<EntityId>) {
        let (sender, receiver) = mpsc::channel();
        (Self { sender }, receiver)
    }
}

impl BattleRequester for QueuedBattles {
    fn request_battle(&mut self, entity: EntityId, template_id: &str) {
        info!(entity = %entity, template = template_id, "battle_queued");
        if self.sender.send(entity).is_err() {
            warn!(entity = %entity, "battle_queue_closed");
        }
    }
}

/// Logs prompt visibility changes instead of drawing them.
#[derive(Debug, Default)]
pub(crate) struct LoggedPrompts {
    visible: BTreeMap<PromptTarget, bool>,
}

impl PromptRenderer for LoggedPrompts {
    fn render_prompt(&mut self, frame: &PromptFrame) {
        let was_visible = self.visible.insert(frame.target, frame.visible);
        if was_visible == Some(frame.visible) {
            return;
        }
        if frame.visible {
            debug!(target_kind = ?frame.target, progress = frame.progress, "prompt_shown");
        } else if was_visible.is_some() {
            debug!(target_kind = ?frame.target, "prompt_hidden");
        }
    }
}

pub(crate) struct DemoScene {
    pub(crate) world: InteractionWorld,
    pub(crate) battles: Receiver<EntityId>,
}

/// Builds the world from the harness layout, restoring stored placements
/// before the scripted spawns are added.
pub(crate) fn build_demo_scene(
    config: &HarnessConfig,
    catalog: TemplateCatalog,
    store: Option<Box<dyn PersistenceStore>>,
) -> Result<DemoScene, InteractionError> {
    let (battles, receiver) = QueuedBattles::channel();
    let mut world = InteractionWorld::new(config.interaction.clone(), catalog)
        .with_carrier(Box::new(PlayerHand::new(Vec3::ZERO)))
        .with_battles(Box::new(battles))
        .with_prompts(Box::new(LoggedPrompts::default()))
        .with_ground(Box::new(FlatGround::default()))
        .with_wallet(Wallet::with_balance(config.starting_balance));
    if let Some(store) = store {
        world = world.with_store(store);
    }

    for zone in &config.zones {
        world.add_zone(
            zone.id,
            zone.anchor,
            zone.placement_offset,
            zone.placement_yaw,
        )?;
        if zone.active {
            world.activate_zone(zone.id)?;
        }
    }
    let restored = if world.store().is_some() {
        world.restore_placements()
    } else {
        0
    };
    for spawn in &config.spawns {
        world.spawn_entity(&spawn.template, spawn.position)?;
    }

    info!(
        zones = config.zones.len(),
        spawned = config.spawns.len(),
        restored,
        "scene_loaded"
    );
    Ok(DemoScene {
        world,
        battles: receiver,
    })
}

#[cfg(test)]
mod tests {
    use collector_engine::{MemoryPlacementStore, ZoneClaim, ZoneId};

    use super::super::demo_catalog;
    use super::*;

    #[test]
    fn scene_registers_active_zones_and_spawns() {
        let scene =
            build_demo_scene(&HarnessConfig::default(), demo_catalog(), None).expect("scene");
        assert_eq!(scene.world.zones().count(), 2);
        assert!(scene.world.coordinator().is_registered(ZoneId(1)));
        assert_eq!(scene.world.entities().count(), 2);
    }

    #[test]
    fn unknown_spawn_template_fails_scene_build() {
        let mut config = HarnessConfig::default();
        config.spawns[0].template = "creature.missing".to_string();
        assert!(matches!(
            build_demo_scene(&config, demo_catalog(), None),
            Err(InteractionError::UnknownTemplate(_))
        ));
    }

    #[test]
    fn stored_placements_are_restored_before_spawns() {
        let mut first = build_demo_scene(
            &HarnessConfig::default(),
            demo_catalog(),
            Some(Box::new(MemoryPlacementStore::new())),
        )
        .expect("scene");
        let slime = first
            .world
            .entities()
            .find(|entity| entity.template_id() == "creature.slime")
            .map(|entity| entity.id())
            .expect("slime");
        first.world.place_on_panel(ZoneId(1), slime).expect("place");
        let record = first
            .world
            .store()
            .and_then(|store| store.load_placement(ZoneId(1)).ok().flatten())
            .expect("record");

        let mut store = MemoryPlacementStore::new();
        store.save_placement(&record).expect("seed");
        let second =
            build_demo_scene(&HarnessConfig::default(), demo_catalog(), Some(Box::new(store)))
                .expect("scene");
        assert!(matches!(
            second.world.zone(ZoneId(1)).map(|zone| zone.claim()),
            Some(ZoneClaim::Claimed(_))
        ));
        assert_eq!(second.world.entities().count(), 3);
    }

    #[test]
    fn queued_battles_reach_the_receiver() {
        let (mut battles, receiver) = QueuedBattles::channel();
        battles.request_battle(EntityId(4), "creature.ash_wyrm");
        assert_eq!(receiver.try_iter().collect::<Vec<_>>(), vec![EntityId(4)]);
    }

    #[test]
    fn logged_prompts_track_visibility() {
        let mut prompts = LoggedPrompts::default();
        let target = PromptTarget::Zone(ZoneId(1));
        prompts.render_prompt(&PromptFrame {
            target,
            visible: true,
            progress: 0.0,
        });
        assert_eq!(prompts.visible.get(&target), Some(&true));
        prompts.render_prompt(&PromptFrame {
            target,
            visible: false,
            progress: 0.0,
        });
        assert_eq!(prompts.visible.get(&target), Some(&false));
    }
}
