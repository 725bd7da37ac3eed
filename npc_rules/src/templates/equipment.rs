//! Armor, weapon and loadout templates.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::mechanics::{ArmorCategory, AttackClass, DamageType, Dice};

/// A wearable armor (or an armor-like AC formula such as "unarmored").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArmorTemplate {
    /// Internal name, filled in from the catalog key.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    pub base_ac: i32,
    #[serde(default)]
    pub category: ArmorCategory,
    #[serde(default)]
    pub min_strength: i32,
    #[serde(default)]
    pub stealth_disadvantage: bool,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl ArmorTemplate {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

/// A weapon as listed in content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeaponTemplate {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    pub damage: Dice,
    pub damage_type: DamageType,
    #[serde(default)]
    pub attack_class: AttackClass,
    /// Normal range in feet (ranged and thrown weapons).
    #[serde(default)]
    pub short_range: u32,
    #[serde(default)]
    pub long_range: u32,
    /// e.g. `finesse`, `thrown`, `versatile`, `reach`, `monk`, `light`.
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default = "default_targets")]
    pub targets: u32,
}

fn default_targets() -> u32 {
    1
}

impl WeaponTemplate {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

/// One bundled equipment choice.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Loadout {
    #[serde(default)]
    pub weapons: Vec<String>,
    #[serde(default)]
    pub armors: Vec<String>,
    #[serde(default)]
    pub shield: bool,
    /// Relative draw weight; the configured default applies when absent.
    #[serde(default)]
    pub weight: Option<u32>,
}

impl Loadout {
    /// Draw weight, falling back to `default_weight`.
    pub fn weight_or(&self, default_weight: u32) -> u32 {
        self.weight.unwrap_or(default_weight)
    }
}

/// A named, weighted list of loadouts.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoadoutPool {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub loadouts: Vec<Loadout>,
}

impl LoadoutPool {
    pub fn is_empty(&self) -> bool {
        self.loadouts.is_empty()
    }
}
