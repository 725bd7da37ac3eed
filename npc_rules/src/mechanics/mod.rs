//! Game mechanics vocabulary: attributes, skills, damage types, dice and the
//! small enums shared by every content template.

mod dice;

pub use dice::*;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error returned when a mechanics keyword in content data is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownKeyword {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownKeyword {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// The six core ability scores, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Attribute {
    Str,
    Dex,
    Con,
    Int,
    Wis,
    Cha,
}

impl Attribute {
    /// Canonical slot order used when rolled values are assigned.
    pub const ALL: [Attribute; 6] = [
        Attribute::Str,
        Attribute::Dex,
        Attribute::Con,
        Attribute::Int,
        Attribute::Wis,
        Attribute::Cha,
    ];

    /// Stat-map key holding the raw score (`"str"`).
    pub fn key(&self) -> &'static str {
        match self {
            Attribute::Str => "str",
            Attribute::Dex => "dex",
            Attribute::Con => "con",
            Attribute::Int => "int",
            Attribute::Wis => "wis",
            Attribute::Cha => "cha",
        }
    }

    /// Stat-map key holding the derived modifier (`"str_mod"`).
    pub fn mod_key(&self) -> String {
        format!("{}_mod", self.key())
    }

    /// Full display name.
    pub fn name(&self) -> &'static str {
        match self {
            Attribute::Str => "Strength",
            Attribute::Dex => "Dexterity",
            Attribute::Con => "Constitution",
            Attribute::Int => "Intelligence",
            Attribute::Wis => "Wisdom",
            Attribute::Cha => "Charisma",
        }
    }

    /// Short display name used in save summaries (`"Str"`).
    pub fn abbreviation(&self) -> &'static str {
        match self {
            Attribute::Str => "Str",
            Attribute::Dex => "Dex",
            Attribute::Con => "Con",
            Attribute::Int => "Int",
            Attribute::Wis => "Wis",
            Attribute::Cha => "Cha",
        }
    }

    /// Position in [`Attribute::ALL`].
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Attribute {
    type Err = UnknownKeyword;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        Attribute::ALL
            .into_iter()
            .find(|a| a.key() == lowered || a.name().eq_ignore_ascii_case(&lowered))
            .ok_or_else(|| UnknownKeyword::new("attribute", s))
    }
}

/// Skills, each keyed to a governing attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Skill {
    Acrobatics,
    AnimalHandling,
    Arcana,
    Athletics,
    Deception,
    History,
    Insight,
    Intimidation,
    Investigation,
    Medicine,
    Nature,
    Perception,
    Performance,
    Persuasion,
    Religion,
    SleightOfHand,
    Stealth,
    Survival,
}

impl Skill {
    pub const ALL: [Skill; 18] = [
        Skill::Acrobatics,
        Skill::AnimalHandling,
        Skill::Arcana,
        Skill::Athletics,
        Skill::Deception,
        Skill::History,
        Skill::Insight,
        Skill::Intimidation,
        Skill::Investigation,
        Skill::Medicine,
        Skill::Nature,
        Skill::Perception,
        Skill::Performance,
        Skill::Persuasion,
        Skill::Religion,
        Skill::SleightOfHand,
        Skill::Stealth,
        Skill::Survival,
    ];

    pub fn attribute(&self) -> Attribute {
        match self {
            Skill::Athletics => Attribute::Str,
            Skill::Acrobatics | Skill::SleightOfHand | Skill::Stealth => Attribute::Dex,
            Skill::Arcana
            | Skill::History
            | Skill::Investigation
            | Skill::Nature
            | Skill::Religion => Attribute::Int,
            Skill::AnimalHandling
            | Skill::Insight
            | Skill::Medicine
            | Skill::Perception
            | Skill::Survival => Attribute::Wis,
            Skill::Deception | Skill::Intimidation | Skill::Performance | Skill::Persuasion => {
                Attribute::Cha
            }
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Skill::Acrobatics => "acrobatics",
            Skill::AnimalHandling => "animal_handling",
            Skill::Arcana => "arcana",
            Skill::Athletics => "athletics",
            Skill::Deception => "deception",
            Skill::History => "history",
            Skill::Insight => "insight",
            Skill::Intimidation => "intimidation",
            Skill::Investigation => "investigation",
            Skill::Medicine => "medicine",
            Skill::Nature => "nature",
            Skill::Perception => "perception",
            Skill::Performance => "performance",
            Skill::Persuasion => "persuasion",
            Skill::Religion => "religion",
            Skill::SleightOfHand => "sleight_of_hand",
            Skill::Stealth => "stealth",
            Skill::Survival => "survival",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Skill::Acrobatics => "Acrobatics",
            Skill::AnimalHandling => "Animal Handling",
            Skill::Arcana => "Arcana",
            Skill::Athletics => "Athletics",
            Skill::Deception => "Deception",
            Skill::History => "History",
            Skill::Insight => "Insight",
            Skill::Intimidation => "Intimidation",
            Skill::Investigation => "Investigation",
            Skill::Medicine => "Medicine",
            Skill::Nature => "Nature",
            Skill::Perception => "Perception",
            Skill::Performance => "Performance",
            Skill::Persuasion => "Persuasion",
            Skill::Religion => "Religion",
            Skill::SleightOfHand => "Sleight of Hand",
            Skill::Stealth => "Stealth",
            Skill::Survival => "Survival",
        }
    }
}

impl fmt::Display for Skill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Skill {
    type Err = UnknownKeyword;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase().replace(' ', "_");
        Skill::ALL
            .into_iter()
            .find(|skill| skill.key() == lowered)
            .ok_or_else(|| UnknownKeyword::new("skill", s))
    }
}

/// All damage types a weapon, spell or resistance can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DamageType {
    // Physical
    Bludgeoning,
    Piercing,
    Slashing,

    // Elemental
    Acid,
    Cold,
    Fire,
    Lightning,
    Thunder,

    // Magical
    Force,
    Necrotic,
    Poison,
    Psychic,
    Radiant,
}

impl DamageType {
    pub const ALL: [DamageType; 13] = [
        DamageType::Bludgeoning,
        DamageType::Piercing,
        DamageType::Slashing,
        DamageType::Acid,
        DamageType::Cold,
        DamageType::Fire,
        DamageType::Lightning,
        DamageType::Thunder,
        DamageType::Force,
        DamageType::Necrotic,
        DamageType::Poison,
        DamageType::Psychic,
        DamageType::Radiant,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DamageType::Bludgeoning => "bludgeoning",
            DamageType::Piercing => "piercing",
            DamageType::Slashing => "slashing",
            DamageType::Acid => "acid",
            DamageType::Cold => "cold",
            DamageType::Fire => "fire",
            DamageType::Lightning => "lightning",
            DamageType::Thunder => "thunder",
            DamageType::Force => "force",
            DamageType::Necrotic => "necrotic",
            DamageType::Poison => "poison",
            DamageType::Psychic => "psychic",
            DamageType::Radiant => "radiant",
        }
    }
}

impl fmt::Display for DamageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DamageType {
    type Err = UnknownKeyword;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        DamageType::ALL
            .into_iter()
            .find(|d| d.name() == lowered)
            .ok_or_else(|| UnknownKeyword::new("damage type", s))
    }
}

/// Creature size categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Size {
    Tiny,
    Small,
    #[default]
    Medium,
    Large,
    Huge,
    Gargantuan,
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Size::Tiny => "Tiny",
            Size::Small => "Small",
            Size::Medium => "Medium",
            Size::Large => "Large",
            Size::Huge => "Huge",
            Size::Gargantuan => "Gargantuan",
        };
        f.write_str(name)
    }
}

/// Armor weight class. Declaration order is the tie-break preference when
/// several armors give the same AC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ArmorCategory {
    #[default]
    None,
    Light,
    Medium,
    Heavy,
}

/// Whether a weapon is swung or fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AttackClass {
    #[default]
    Melee,
    Ranged,
}

/// Where a trait shows up in the statblock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TraitCategory {
    #[default]
    Passive,
    /// Mechanically active but never rendered.
    Hidden,
    Action,
    Reaction,
}

/// How a spellcaster decides which spells are castable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReadyStyle {
    #[default]
    Prepared,
    Known,
}

/// Schools of magic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpellSchool {
    Abjuration,
    Conjuration,
    Divination,
    Enchantment,
    Evocation,
    Illusion,
    Necromancy,
    Transmutation,
}

/// Ordinal suffix for levels ("1st", "2nd", "11th").
pub fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}

/// Ability modifier for a score, flooring toward negative infinity.
pub fn attribute_modifier(score: i32) -> i32 {
    (score - 10).div_euclid(2)
}
