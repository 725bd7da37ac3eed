//! Spells, spell lists and spellcaster profiles.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::mechanics::{Attribute, ReadyStyle, SpellSchool};

/// A single spell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spell {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default = "default_source")]
    pub source: String,
    /// 0 for cantrips.
    pub level: u8,
    pub school: SpellSchool,
    /// Class names that can learn this spell.
    #[serde(default)]
    pub classes: BTreeSet<String>,
}

fn default_source() -> String {
    "SRD".to_string()
}

impl Spell {
    pub fn is_cantrip(&self) -> bool {
        self.level == 0
    }
}

/// Derived ("auto") membership filter for a spell list. Empty criteria match
/// everything.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SpellFilter {
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub schools: Vec<SpellSchool>,
    #[serde(default)]
    pub levels: Vec<u8>,
    #[serde(default)]
    pub sources: Vec<String>,
}

impl SpellFilter {
    /// Check whether a spell satisfies every non-empty criterion.
    pub fn matches(&self, spell: &Spell) -> bool {
        (self.classes.is_empty() || self.classes.iter().any(|c| spell.classes.contains(c)))
            && (self.schools.is_empty() || self.schools.contains(&spell.school))
            && (self.levels.is_empty() || self.levels.contains(&spell.level))
            && (self.sources.is_empty() || self.sources.contains(&spell.source))
    }
}

/// A spell list as written in content, before membership is resolved.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SpellListDef {
    /// Default weight when a spellcaster lists this without its own weight.
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub auto: Option<SpellFilter>,
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Other lists whose members are pulled in.
    #[serde(default)]
    pub compose: Vec<String>,
}

/// A resolved spell list. Members are kept in catalog (name) order.
#[derive(Debug, Clone, Serialize)]
pub struct SpellList {
    pub name: String,
    pub weight: f64,
    pub spells: Vec<Arc<Spell>>,
}

impl SpellList {
    /// Members of one spell level, in list order.
    pub fn spells_of_level(&self, level: u8) -> impl Iterator<Item = &Arc<Spell>> {
        self.spells.iter().filter(move |s| s.level == level)
    }

    pub fn count_of_level(&self, level: u8) -> usize {
        self.spells_of_level(level).count()
    }

    pub fn contains(&self, spell_name: &str) -> bool {
        self.spells.iter().any(|s| s.name == spell_name)
    }
}

/// Cantrips-known progression, indexed by caster level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CantripProgression {
    #[default]
    None,
    /// 2 / 3 / 4 (druid, bard, warlock style).
    Minor,
    /// 3 / 4 / 5 (wizard, cleric style).
    Standard,
    /// 4 / 5 / 6 (sorcerer style).
    Major,
}

/// Fixed spells-known progression for "known" casters, indexed by caster level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KnownSpellsTable {
    Bard,
    Sorcerer,
    Warlock,
    Ranger,
}

/// How a class casts spells.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpellcasterProfile {
    #[serde(default)]
    pub name: String,
    pub casting_stat: Attribute,
    #[serde(default)]
    pub ready_style: ReadyStyle,
    /// 1 for full casters, 2 for half casters, 3 for third casters.
    #[serde(default = "default_hd_per_casting_level")]
    pub hd_per_casting_level: u32,
    #[serde(default)]
    pub cantrips: CantripProgression,
    #[serde(default)]
    pub spells_known: Option<KnownSpellsTable>,
    #[serde(default)]
    pub spells_known_modifier: i32,
    /// Weighted lists the caster draws candidates from.
    #[serde(default)]
    pub spell_lists: BTreeMap<String, f64>,
    /// Lists whose castable members are always readied.
    #[serde(default)]
    pub free_spell_lists: Vec<String>,
    /// e.g. `warlock` (pact slots), `spellbook`.
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

fn default_hd_per_casting_level() -> u32 {
    1
}

impl SpellcasterProfile {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spell(name: &str, level: u8, school: SpellSchool, classes: &[&str]) -> Spell {
        Spell {
            name: name.to_string(),
            display_name: name.to_string(),
            source: default_source(),
            level,
            school,
            classes: classes.iter().map(|c| c.to_string()).collect(),
        }
    }

    #[test]
    fn test_filter_matches_all_criteria() {
        let filter = SpellFilter {
            classes: vec!["wizard".to_string()],
            schools: vec![SpellSchool::Evocation],
            ..Default::default()
        };
        assert!(filter.matches(&spell("fire_bolt", 0, SpellSchool::Evocation, &["wizard"])));
        assert!(!filter.matches(&spell("sleep", 1, SpellSchool::Enchantment, &["wizard"])));
        assert!(!filter.matches(&spell("sacred_flame", 0, SpellSchool::Evocation, &["cleric"])));
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = SpellFilter::default();
        assert!(filter.matches(&spell("light", 0, SpellSchool::Evocation, &[])));
    }

    #[test]
    fn test_spell_list_level_counts() {
        let list = SpellList {
            name: "test".to_string(),
            weight: 1.0,
            spells: vec![
                Arc::new(spell("a", 0, SpellSchool::Evocation, &[])),
                Arc::new(spell("b", 1, SpellSchool::Evocation, &[])),
                Arc::new(spell("c", 1, SpellSchool::Abjuration, &[])),
            ],
        };
        assert_eq!(list.count_of_level(0), 1);
        assert_eq!(list.count_of_level(1), 2);
        assert_eq!(list.count_of_level(2), 0);
        assert!(list.contains("c"));
    }

    #[test]
    fn test_profile_defaults() {
        let profile: SpellcasterProfile = toml::from_str(
            r#"
            casting_stat = "int"
            cantrips = "standard"
            spell_lists = { wizard = 1.0 }
            tags = ["spellbook"]
            "#,
        )
        .unwrap();
        assert_eq!(profile.ready_style, ReadyStyle::Prepared);
        assert_eq!(profile.hd_per_casting_level, 1);
        assert_eq!(profile.cantrips, CantripProgression::Standard);
        assert!(profile.has_tag("spellbook"));
    }
}
