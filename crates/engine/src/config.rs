use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::math::{RangePolicy, Vec3};

pub const DEFAULT_HOLD_DURATION_SECONDS: f32 = 2.0;
pub const DEFAULT_RANGE_RADIUS: f32 = 3.0;
pub const DEFAULT_PLACEMENT_SLACK: f32 = 1.0;
pub const DEFAULT_REVALIDATION_INTERVAL_SECONDS: f64 = 0.5;

/// Tuning shared by every gate, zone and entity in a world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InteractionConfig {
    pub hold_duration_seconds: f32,
    pub entity_range_radius: f32,
    pub zone_range_radius: f32,
    pub range_policy: RangePolicy,
    /// How far a panel-placed entity may drift from its placement point
    /// before the claim is considered stale.
    pub placement_slack: f32,
    pub revalidation_interval_seconds: f64,
    /// Added to the actor position when a carried entity is put down.
    pub ground_drop_offset: Vec3,
    /// Held entities ride at actor position plus this offset.
    pub carry_offset: Vec3,
    pub reclaim_suppression_ticks: u64,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            hold_duration_seconds: DEFAULT_HOLD_DURATION_SECONDS,
            entity_range_radius: DEFAULT_RANGE_RADIUS,
            zone_range_radius: DEFAULT_RANGE_RADIUS,
            range_policy: RangePolicy::Horizontal,
            placement_slack: DEFAULT_PLACEMENT_SLACK,
            revalidation_interval_seconds: DEFAULT_REVALIDATION_INTERVAL_SECONDS,
            ground_drop_offset: Vec3::new(0.0, 0.0, 1.0),
            carry_offset: Vec3::new(0.0, 1.0, 0.0),
            reclaim_suppression_ticks: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid interaction config: {field} {reason}")]
pub struct InvalidConfigError {
    pub field: &'static str,
    pub reason: &'static str,
}

impl InteractionConfig {
    pub fn validate(&self) -> Result<(), InvalidConfigError> {
        non_negative_f32("hold_duration_seconds", self.hold_duration_seconds)?;
        non_negative_f32("entity_range_radius", self.entity_range_radius)?;
        non_negative_f32("zone_range_radius", self.zone_range_radius)?;
        non_negative_f32("placement_slack", self.placement_slack)?;
        if !self.revalidation_interval_seconds.is_finite()
            || self.revalidation_interval_seconds <= 0.0
        {
            return Err(InvalidConfigError {
                field: "revalidation_interval_seconds",
                reason: "must be finite and > 0",
            });
        }
        Ok(())
    }
}

fn non_negative_f32(field: &'static str, value: f32) -> Result<(), InvalidConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(InvalidConfigError {
            field,
            reason: "must be finite and >= 0",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let config = InteractionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.reclaim_suppression_ticks, 1);
        assert_eq!(config.range_policy, RangePolicy::Horizontal);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: InteractionConfig =
            serde_json::from_str(r#"{"hold_duration_seconds": 0.5, "range_policy": "Full3D"}"#)
                .expect("parse");
        assert!((config.hold_duration_seconds - 0.5).abs() < 0.0001);
        assert_eq!(config.range_policy, RangePolicy::Full3D);
        assert!((config.zone_range_radius - DEFAULT_RANGE_RADIUS).abs() < 0.0001);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result = serde_json::from_str::<InteractionConfig>(r#"{"hold_seconds": 1.0}"#);
        assert!(result.is_err());
    }

    #[test]
    fn zero_revalidation_interval_is_invalid() {
        let config = InteractionConfig {
            revalidation_interval_seconds: 0.0,
            ..InteractionConfig::default()
        };
        let err = config.validate().expect_err("invalid");
        assert_eq!(err.field, "revalidation_interval_seconds");
    }
}
