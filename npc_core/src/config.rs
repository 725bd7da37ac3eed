//! Generator configuration.
//!
//! Every tunable constant of the pipeline lives here so callers can override
//! them from a TOML document without touching code. Defaults reproduce the
//! standard rules.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::logging::TracingConfig;

/// Tunables for attribute rolling, ASI planning, spell picking and request
/// cleaning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Highest value ASI may raise an attribute to.
    pub attribute_cap: i32,

    /// Hit dice needed per ability score increase.
    pub asi_hit_dice_per_increase: u32,

    /// Attribute points granted by each increase.
    pub asi_points_per_increase: u32,

    /// Sampling weight of the first priority attribute.
    pub asi_priority_weight: f64,

    /// Multiplier applied per position down the priority list.
    pub asi_priority_scale: f64,

    /// Hit dice the ASI plan is generated for, independent of the actual
    /// hit dice of the character.
    pub asi_planning_hit_dice: u32,

    /// Upper bound on whole-set attribute rerolls.
    pub reroll_cap: u32,

    /// Candidate spells drawn per spell level.
    pub spell_choice_cap: usize,

    /// Weight of a loadout that does not declare one.
    pub default_loadout_weight: u32,

    /// Weight of a spell list whose profile weight is unusable.
    pub default_spell_list_weight: f64,

    /// Statblock entries with a higher visibility tier are suppressed.
    pub visibility_threshold: u8,

    pub min_hit_dice: u32,
    pub max_hit_dice: u32,

    pub logging: TracingConfig,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            attribute_cap: 20,
            asi_hit_dice_per_increase: 4,
            asi_points_per_increase: 2,
            asi_priority_weight: 3.0,
            asi_priority_scale: 0.75,
            asi_planning_hit_dice: 20,
            reroll_cap: 100,
            spell_choice_cap: 12,
            default_loadout_weight: 10,
            default_spell_list_weight: 1.0,
            visibility_threshold: 1,
            min_hit_dice: 1,
            max_hit_dice: 20,
            logging: TracingConfig::default(),
        }
    }
}

impl GeneratorConfig {
    /// Create a configuration with default values.
    pub fn with_defaults() -> Self {
        Self::default()
    }

    /// Parse overrides from TOML. Missing keys keep their defaults.
    pub fn from_toml_str(document: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(document)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.attribute_cap < 1 {
            return Err(ConfigError::invalid("attribute_cap", "must be positive"));
        }
        if self.asi_hit_dice_per_increase == 0 {
            return Err(ConfigError::invalid(
                "asi_hit_dice_per_increase",
                "must be at least 1",
            ));
        }
        if !(self.asi_priority_weight > 0.0) || !(self.asi_priority_scale > 0.0) {
            return Err(ConfigError::invalid(
                "asi_priority_weight",
                "weights must be positive",
            ));
        }
        if self.min_hit_dice == 0 || self.min_hit_dice > self.max_hit_dice {
            return Err(ConfigError::invalid(
                "min_hit_dice",
                format!(
                    "range {}..={} is empty or starts at zero",
                    self.min_hit_dice, self.max_hit_dice
                ),
            ));
        }
        Ok(())
    }

    /// Whether a hit dice count is accepted by request cleaning.
    pub fn hit_dice_in_range(&self, hit_dice: i64) -> bool {
        hit_dice >= self.min_hit_dice as i64 && hit_dice <= self.max_hit_dice as i64
    }
}
