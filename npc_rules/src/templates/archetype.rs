//! Race and class templates, plus the subrace/subclass variants they carry.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{attribute_map, FeatureSpec};
use crate::mechanics::{Attribute, Size, Skill};

/// Fields shared by races, classes, subraces and subclasses.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ArchetypeCommon {
    /// Grouping labels for "random by category" selection.
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default, deserialize_with = "attribute_map")]
    pub attribute_bonuses: BTreeMap<Attribute, i32>,
    /// Flat stat overrides, e.g. `walk_speed_base = 25`.
    #[serde(default)]
    pub base_stats: BTreeMap<String, i32>,
    #[serde(default)]
    pub priority_attributes: Vec<Attribute>,
    #[serde(default)]
    pub skills: Vec<Skill>,
    /// Pool for `random_skill_count` seeded picks.
    #[serde(default)]
    pub random_skills: Vec<Skill>,
    #[serde(default)]
    pub random_skill_count: u32,
    #[serde(default)]
    pub saves: Vec<Attribute>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default)]
    pub traits: Vec<String>,
    #[serde(default)]
    pub features: Vec<FeatureSpec>,
}

impl ArchetypeCommon {
    pub fn has_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }
}

/// A subrace or subclass layered on top of its parent.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SubTemplate {
    #[serde(default)]
    pub name: String,
    /// Replaces the parent's display name when set.
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(flatten)]
    pub common: ArchetypeCommon,
}

/// A playable race.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceTemplate {
    #[serde(default)]
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub size: Size,
    #[serde(default = "default_creature_type")]
    pub creature_type: String,
    #[serde(default)]
    pub senses: Vec<String>,
    #[serde(flatten)]
    pub common: ArchetypeCommon,
    #[serde(default)]
    pub subraces: BTreeMap<String, SubTemplate>,
}

fn default_creature_type() -> String {
    "humanoid".to_string()
}

/// A character class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassTemplate {
    #[serde(default)]
    pub name: String,
    pub display_name: String,
    #[serde(default = "default_hit_dice_size")]
    pub hit_dice_size: u32,
    #[serde(default)]
    pub loadout_pool: Option<String>,
    #[serde(default)]
    pub spellcaster_profile: Option<String>,
    #[serde(flatten)]
    pub common: ArchetypeCommon,
    #[serde(default)]
    pub subclasses: BTreeMap<String, SubTemplate>,
}

fn default_hit_dice_size() -> u32 {
    8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_race_from_toml() {
        let race: RaceTemplate = toml::from_str(
            r#"
            display_name = "dwarf"
            attribute_bonuses = { con = 2 }
            base_stats = { walk_speed_base = 25 }
            senses = ["darkvision 60 ft."]
            traits = ["dwarven_resilience"]

            [subraces.hill]
            display_name = "hill dwarf"
            attribute_bonuses = { wis = 1 }
            "#,
        )
        .unwrap();
        assert_eq!(race.size, Size::Medium);
        assert_eq!(race.creature_type, "humanoid");
        assert_eq!(race.common.attribute_bonuses.get(&Attribute::Con), Some(&2));
        assert_eq!(race.common.base_stats.get("walk_speed_base"), Some(&25));
        let hill = &race.subraces["hill"];
        assert_eq!(hill.display_name.as_deref(), Some("hill dwarf"));
        assert_eq!(hill.common.attribute_bonuses.get(&Attribute::Wis), Some(&1));
    }

    #[test]
    fn test_class_from_toml() {
        let class: ClassTemplate = toml::from_str(
            r#"
            display_name = "soldier"
            hit_dice_size = 10
            loadout_pool = "soldier"
            priority_attributes = ["str", "con"]
            saves = ["str", "con"]
            random_skills = ["athletics", "intimidation"]
            random_skill_count = 1
            features = [{ name = "multiattack", args = [2] }]
            "#,
        )
        .unwrap();
        assert_eq!(class.hit_dice_size, 10);
        assert_eq!(
            class.common.priority_attributes,
            vec![Attribute::Str, Attribute::Con]
        );
        assert_eq!(class.common.features[0].args, vec!["2".to_string()]);
        assert!(class.spellcaster_profile.is_none());
    }

    #[test]
    fn test_bad_attribute_key_is_rejected() {
        let result: Result<RaceTemplate, _> = toml::from_str(
            r#"
            display_name = "odd"
            attribute_bonuses = { luck = 2 }
            "#,
        );
        assert!(result.is_err());
    }
}
