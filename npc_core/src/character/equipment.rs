//! Per-character equipment instances.
//!
//! An equipped item keeps a reference to its catalog template and a private
//! copy of every field a feature may change. Templates themselves are never
//! touched.

use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;

use npc_rules::{
    ArmorCategory, ArmorTemplate, AttackClass, Attribute, DamageType, Dice, WeaponTemplate,
};

use super::Stats;
use crate::statblock::{number_word, signed};

/// AC granted by a shield.
pub const SHIELD_AC: i32 = 2;

/// An armor option available to one character.
#[derive(Debug, Clone, Serialize)]
pub struct EquippedArmor {
    #[serde(skip)]
    pub template: Arc<ArmorTemplate>,
    /// Key on the character; usually the template name.
    pub name: String,
    pub display_name: String,
    pub base_ac: i32,
    pub category: ArmorCategory,
    pub min_strength: i32,
    pub stealth_disadvantage: bool,
    pub tags: BTreeSet<String>,
    /// Attributes whose modifiers are added on top of DEX (unarmored defense).
    pub extra_attributes: Vec<Attribute>,
}

impl EquippedArmor {
    pub fn new(template: &Arc<ArmorTemplate>) -> Self {
        Self {
            template: Arc::clone(template),
            name: template.name.clone(),
            display_name: template.display_name.clone(),
            base_ac: template.base_ac,
            category: template.category,
            min_strength: template.min_strength,
            stealth_disadvantage: template.stealth_disadvantage,
            tags: template.tags.clone(),
            extra_attributes: Vec::new(),
        }
    }

    /// Rename this instance so it can sit next to the plain template entry.
    pub fn with_key(mut self, name: impl Into<String>, display_name: impl Into<String>) -> Self {
        self.name = name.into();
        self.display_name = display_name.into();
        self
    }

    pub fn with_extra_attribute(mut self, attribute: Attribute) -> Self {
        self.extra_attributes.push(attribute);
        self
    }

    /// Highest DEX modifier this armor lets through, `None` for no cap.
    pub fn dex_cap(&self, medium_armor_master: bool) -> Option<i32> {
        match self.category {
            ArmorCategory::None | ArmorCategory::Light => None,
            ArmorCategory::Medium if medium_armor_master => Some(3),
            ArmorCategory::Medium => Some(2),
            ArmorCategory::Heavy => Some(0),
        }
    }

    /// AC while wearing this armor.
    pub fn armor_class(&self, stats: &Stats, medium_armor_master: bool, shield: bool) -> i32 {
        let dex = stats.modifier(Attribute::Dex);
        let dex = match self.dex_cap(medium_armor_master) {
            Some(cap) => dex.min(cap),
            None => dex,
        };
        let extra: i32 = self
            .extra_attributes
            .iter()
            .map(|attr| stats.modifier(*attr))
            .sum();
        let shield = if shield { SHIELD_AC } else { 0 };
        self.base_ac + dex + extra + shield + stats.get("ac_bonus")
    }

    /// Whether a character with `strength` is slowed by this armor.
    pub fn slows(&self, strength: i32) -> bool {
        self.category == ArmorCategory::Heavy && strength < self.min_strength
    }

    /// Whether the item is worn on top of normal armor choice (mage armor).
    pub fn is_stacking(&self) -> bool {
        self.tags.contains("stacking")
    }

    /// The "no armor" options never print their name in the AC line.
    pub fn is_natural(&self) -> bool {
        self.category == ArmorCategory::None
            && !self.is_stacking()
            && self.extra_attributes.is_empty()
    }
}

/// A weapon carried by one character.
#[derive(Debug, Clone, Serialize)]
pub struct EquippedWeapon {
    #[serde(skip)]
    pub template: Arc<WeaponTemplate>,
    pub name: String,
    pub display_name: String,
    pub damage: Dice,
    pub damage_type: DamageType,
    pub attack_class: AttackClass,
    pub short_range: u32,
    pub long_range: u32,
    pub tags: BTreeSet<String>,
    pub targets: u32,
    /// Magic bonus to hit and damage.
    pub bonus: i32,
}

/// Everything needed to print and rate one weapon attack.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeaponProfile {
    pub attribute: Attribute,
    pub to_hit: i32,
    pub damage: Dice,
    pub damage_bonus: i32,
    pub average_damage: i32,
    /// Two-handed damage for versatile weapons.
    pub versatile: Option<(Dice, i32)>,
    pub reach: u32,
}

/// `"7 (1d8 + 3)"`, the way statblocks print damage.
pub fn damage_expression(dice: Dice, bonus: i32) -> String {
    let average = (dice.average_floor() + bonus).max(1);
    match bonus {
        0 => format!("{} ({})", average, dice),
        b if b > 0 => format!("{} ({} + {})", average, dice, b),
        b => format!("{} ({} - {})", average, dice, -b),
    }
}

/// One die size up, as a versatile weapon gets when held in two hands.
pub fn next_die_size(size: u32) -> u32 {
    match size {
        s if s < 4 => 4,
        s if s >= 12 => s,
        s => s + 2,
    }
}

impl EquippedWeapon {
    pub fn new(template: &Arc<WeaponTemplate>) -> Self {
        Self {
            template: Arc::clone(template),
            name: template.name.clone(),
            display_name: template.display_name.clone(),
            damage: template.damage,
            damage_type: template.damage_type,
            attack_class: template.attack_class,
            short_range: template.short_range,
            long_range: template.long_range,
            tags: template.tags.clone(),
            targets: template.targets,
            bonus: 0,
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// The attribute this weapon attacks with. Finesse weapons, and monk
    /// weapons tagged `martial_arts` on this copy, use the better of STR and
    /// DEX.
    pub fn attack_attribute(&self, stats: &Stats) -> Attribute {
        if self.has_tag("finesse") || self.has_tag("martial_arts") {
            if stats.modifier(Attribute::Dex) > stats.modifier(Attribute::Str) {
                return Attribute::Dex;
            }
            return Attribute::Str;
        }
        match self.attack_class {
            AttackClass::Melee => Attribute::Str,
            AttackClass::Ranged => Attribute::Dex,
        }
    }

    /// Resolve to-hit and damage against the owner's stats. `brute` adds a
    /// die to melee damage.
    pub fn profile(&self, stats: &Stats, brute: bool) -> WeaponProfile {
        let attribute = self.attack_attribute(stats);
        let modifier = stats.modifier(attribute);
        let extra_die = if brute && self.attack_class == AttackClass::Melee {
            1
        } else {
            0
        };
        let damage = self.damage.with_count(self.damage.count + extra_die);
        let damage_bonus = modifier + self.bonus;
        let versatile = self
            .has_tag("versatile")
            .then(|| (damage.with_size(next_die_size(damage.size)), damage_bonus));
        let reach = if self.has_tag("reach") { 10 } else { 5 };

        WeaponProfile {
            attribute,
            to_hit: stats.get("proficiency") + modifier + self.bonus,
            damage,
            damage_bonus,
            average_damage: (damage.average_floor() + damage_bonus).max(1),
            versatile,
            reach,
        }
    }

    /// Statblock body text for this attack.
    pub fn description(&self, profile: &WeaponProfile) -> String {
        let targets = if self.targets == 1 {
            "one target".to_string()
        } else {
            format!("{} targets", number_word(self.targets))
        };
        let range = format!("range {}/{} ft.", self.short_range, self.long_range);
        let reach = format!("reach {} ft.", profile.reach);
        let to_hit = signed(profile.to_hit);
        let kind = match self.attack_class {
            AttackClass::Melee if self.has_tag("thrown") => format!(
                "Melee or Ranged Weapon Attack: {} to hit, {} or {}",
                to_hit, reach, range
            ),
            AttackClass::Melee => format!("Melee Weapon Attack: {} to hit, {}", to_hit, reach),
            AttackClass::Ranged => format!("Ranged Weapon Attack: {} to hit, {}", to_hit, range),
        };
        let mut text = format!(
            "{}, {}. Hit: {} {} damage",
            kind,
            targets,
            damage_expression(profile.damage, profile.damage_bonus),
            self.damage_type.name()
        );
        if let Some((dice, bonus)) = profile.versatile {
            text.push_str(&format!(
                ", or {} {} damage if used with two hands",
                damage_expression(dice, bonus),
                self.damage_type.name()
            ));
        }
        text.push('.');
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(str_score: i32, dex_score: i32, proficiency: i32) -> Stats {
        let mut stats = Stats::new();
        stats.set("str", str_score);
        stats.set("dex", dex_score);
        stats.set("proficiency", proficiency);
        stats
    }

    fn armor(category: ArmorCategory, base_ac: i32) -> Arc<ArmorTemplate> {
        Arc::new(ArmorTemplate {
            name: "test".to_string(),
            display_name: "test".to_string(),
            base_ac,
            category,
            min_strength: 15,
            stealth_disadvantage: false,
            tags: BTreeSet::new(),
        })
    }

    fn weapon(damage: &str, attack_class: AttackClass, tags: &[&str]) -> Arc<WeaponTemplate> {
        Arc::new(WeaponTemplate {
            name: "test".to_string(),
            display_name: "test".to_string(),
            damage: damage.parse().unwrap(),
            damage_type: DamageType::Slashing,
            attack_class,
            short_range: 20,
            long_range: 60,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            targets: 1,
        })
    }

    #[test]
    fn test_dex_caps_by_category() {
        let s = stats(10, 18, 2);
        let light = EquippedArmor::new(&armor(ArmorCategory::Light, 11));
        let medium = EquippedArmor::new(&armor(ArmorCategory::Medium, 14));
        let heavy = EquippedArmor::new(&armor(ArmorCategory::Heavy, 18));
        assert_eq!(light.armor_class(&s, false, false), 15);
        assert_eq!(medium.armor_class(&s, false, false), 16);
        assert_eq!(medium.armor_class(&s, true, false), 17);
        assert_eq!(heavy.armor_class(&s, false, true), 20);
    }

    #[test]
    fn test_heavy_armor_dex_penalty_still_applies() {
        let s = stats(16, 6, 2);
        let heavy = EquippedArmor::new(&armor(ArmorCategory::Heavy, 16));
        assert_eq!(heavy.armor_class(&s, false, false), 14);
    }

    #[test]
    fn test_extra_attribute_and_bonus() {
        let mut s = stats(10, 14, 2);
        s.set("wis", 16);
        s.set("ac_bonus", 1);
        let unarmored = EquippedArmor::new(&armor(ArmorCategory::None, 10))
            .with_key("unarmored_defense", "unarmored defense")
            .with_extra_attribute(Attribute::Wis);
        assert_eq!(unarmored.armor_class(&s, false, false), 16);
        assert!(!unarmored.is_natural());
    }

    #[test]
    fn test_slows() {
        let plate = EquippedArmor::new(&armor(ArmorCategory::Heavy, 18));
        assert!(plate.slows(13));
        assert!(!plate.slows(15));
        assert!(!EquippedArmor::new(&armor(ArmorCategory::Medium, 14)).slows(3));
    }

    #[test]
    fn test_finesse_uses_better_attribute() {
        let rapier = EquippedWeapon::new(&weapon("1d8", AttackClass::Melee, &["finesse"]));
        let profile = rapier.profile(&stats(10, 16, 2), false);
        assert_eq!(profile.attribute, Attribute::Dex);
        assert_eq!(profile.to_hit, 5);
        assert_eq!(profile.average_damage, 7);
    }

    #[test]
    fn test_versatile_and_reach() {
        let glaive =
            EquippedWeapon::new(&weapon("1d8", AttackClass::Melee, &["versatile", "reach"]));
        let profile = glaive.profile(&stats(16, 10, 2), false);
        assert_eq!(profile.versatile, Some((Dice::new(1, 10), 3)));
        assert_eq!(profile.reach, 10);
        let text = glaive.description(&profile);
        assert_eq!(
            text,
            "Melee Weapon Attack: +5 to hit, reach 10 ft., one target. Hit: 7 (1d8 + 3) slashing damage, or 8 (1d10 + 3) slashing damage if used with two hands."
        );
    }

    #[test]
    fn test_brute_adds_melee_die_only() {
        let s = stats(14, 14, 2);
        let club = EquippedWeapon::new(&weapon("1d6", AttackClass::Melee, &[]));
        assert_eq!(club.profile(&s, true).damage, Dice::new(2, 6));
        let bow = EquippedWeapon::new(&weapon("1d6", AttackClass::Ranged, &[]));
        assert_eq!(bow.profile(&s, true).damage, Dice::new(1, 6));
    }

    #[test]
    fn test_damage_expression() {
        assert_eq!(damage_expression(Dice::new(1, 8), 3), "7 (1d8 + 3)");
        assert_eq!(damage_expression(Dice::new(1, 4), -1), "1 (1d4 - 1)");
        assert_eq!(damage_expression(Dice::new(2, 6), 0), "7 (2d6)");
    }
}
