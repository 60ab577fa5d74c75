use std::fs;
use std::path::{Path, PathBuf};

use collector_engine::{BattleOutcome, InteractionConfig, InvalidConfigError, Vec3, ZoneId};
use serde::Deserialize;
use thiserror::Error;

use super::script::{ScriptStep, ScriptedTrigger};

pub(crate) const DEFAULT_TICK_RATE_HZ: u32 = 60;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum ScriptedBattleOutcome {
    #[default]
    Victory,
    Defeat,
}

impl From<ScriptedBattleOutcome> for BattleOutcome {
    fn from(outcome: ScriptedBattleOutcome) -> Self {
        match outcome {
            ScriptedBattleOutcome::Victory => BattleOutcome::Victory,
            ScriptedBattleOutcome::Defeat => BattleOutcome::Defeat,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ZoneSetup {
    pub(crate) id: ZoneId,
    pub(crate) anchor: Vec3,
    #[serde(default)]
    pub(crate) placement_offset: Vec3,
    #[serde(default)]
    pub(crate) placement_yaw: f32,
    #[serde(default = "default_active")]
    pub(crate) active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct SpawnSetup {
    pub(crate) template: String,
    pub(crate) position: Vec3,
}

/// Everything a headless run needs besides content: tuning, the scene layout
/// and the scripted input timeline.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct HarnessConfig {
    pub(crate) tick_rate_hz: u32,
    pub(crate) starting_balance: f64,
    pub(crate) battle_outcome: ScriptedBattleOutcome,
    pub(crate) persist_placements: bool,
    pub(crate) interaction: InteractionConfig,
    pub(crate) zones: Vec<ZoneSetup>,
    pub(crate) spawns: Vec<SpawnSetup>,
    pub(crate) script: Vec<ScriptStep>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        let origin = Vec3::ZERO;
        let wyrm_spot = Vec3::new(-4.0, 0.0, 0.0);
        let second_panel = Vec3::new(3.0, 0.0, -1.0);
        Self {
            tick_rate_hz: DEFAULT_TICK_RATE_HZ,
            starting_balance: 0.0,
            battle_outcome: ScriptedBattleOutcome::Victory,
            persist_placements: true,
            interaction: InteractionConfig::default(),
            zones: vec![
                ZoneSetup {
                    id: ZoneId(1),
                    anchor: Vec3::new(0.0, 0.0, -2.0),
                    placement_offset: Vec3::ZERO,
                    placement_yaw: 0.0,
                    active: true,
                },
                ZoneSetup {
                    id: ZoneId(2),
                    anchor: Vec3::new(3.0, 0.0, -2.0),
                    placement_offset: Vec3::ZERO,
                    placement_yaw: 0.0,
                    active: true,
                },
            ],
            spawns: vec![
                SpawnSetup {
                    template: "creature.slime".to_string(),
                    position: Vec3::new(1.0, 0.0, 0.0),
                },
                SpawnSetup {
                    template: "creature.ash_wyrm".to_string(),
                    position: wyrm_spot,
                },
            ],
            script: vec![
                ScriptStep::new(130, origin, ScriptedTrigger::Keyboard),
                ScriptStep::new(1, origin, ScriptedTrigger::None),
                ScriptStep::new(130, origin, ScriptedTrigger::Keyboard),
                ScriptStep::new(1, wyrm_spot, ScriptedTrigger::None),
                ScriptStep::new(130, wyrm_spot, ScriptedTrigger::Mobile),
                ScriptStep::new(2, wyrm_spot, ScriptedTrigger::None),
                ScriptStep::new(130, wyrm_spot, ScriptedTrigger::Keyboard),
                ScriptStep::new(1, second_panel, ScriptedTrigger::None),
                ScriptStep::new(130, second_panel, ScriptedTrigger::Keyboard),
                ScriptStep::new(300, second_panel, ScriptedTrigger::None),
            ],
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("read harness config '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse harness config '{path}' at {field}: {source}")]
    Parse {
        path: PathBuf,
        field: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("harness config field {field} {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
    #[error(transparent)]
    Interaction(#[from] InvalidConfigError),
}

impl HarnessConfig {
    pub(crate) fn fixed_dt_seconds(&self) -> f32 {
        1.0 / self.tick_rate_hz.max(1) as f32
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_rate_hz == 0 {
            return Err(ConfigError::Invalid {
                field: "tick_rate_hz",
                reason: "must be at least 1",
            });
        }
        if !self.starting_balance.is_finite() || self.starting_balance < 0.0 {
            return Err(ConfigError::Invalid {
                field: "starting_balance",
                reason: "must be a finite, non-negative amount",
            });
        }
        self.interaction.validate()?;
        Ok(())
    }
}

pub(crate) fn load_harness_config(path: &Path) -> Result<HarnessConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_harness_config(path, &raw)?;
    config.validate()?;
    Ok(config)
}

fn parse_harness_config(path: &Path, raw: &str) -> Result<HarnessConfig, ConfigError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize::<_, HarnessConfig>(&mut deserializer).map_err(|error| {
        let field = error.path().to_string();
        ConfigError::Parse {
            path: path.to_path_buf(),
            field,
            source: error.into_inner(),
        }
    })
}
