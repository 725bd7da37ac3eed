//! The character aggregate.
//!
//! A [`Character`] is the single mutable object of one build. The pipeline
//! fills in identity and template data, features mutate it pass by pass, and
//! once CR and entries are gathered it is read-only data for presentation.

mod equipment;
mod stats;

pub use equipment::*;
pub use stats::*;

use std::collections::BTreeSet;
use std::sync::Arc;

use indexmap::IndexMap;
use npc_rules::{
    ArmorTemplate, Attribute, DamageType, Size, Skill, WeaponTemplate,
};
use serde::Serialize;
use tracing::{debug, warn};

use crate::cr::{estimate_cr, CrEstimate, CrFactor, CrInputs};
use crate::features::Feature;
use crate::random::{choose, seeded_rng};
use crate::spellcasting::SpellcastingFeature;
use crate::statblock::{title_case, EntryCategory, StatBlockEntry};

/// Character tag that widens the medium armor DEX cap to 3.
pub const MEDIUM_ARMOR_MASTER_TAG: &str = "medium_armor_master";

/// Character tag that removes the heavy armor speed penalty.
pub const HEAVY_ARMOR_TRAINING_TAG: &str = "heavy_armor_training";

/// Character tag that adds a die to melee weapon damage.
pub const BRUTE_TAG: &str = "brute";

/// Movement modes with `<mode>_speed_base` / `<mode>_speed` stats.
pub const SPEED_MODES: [&str; 5] = ["walk", "fly", "swim", "climb", "burrow"];

/// Feet lost per movement mode when heavy armor is too heavy to wear well.
pub const HEAVY_ARMOR_SPEED_PENALTY: i32 = 10;

const DEFAULT_WALK_SPEED: i32 = 30;
const DEFAULT_HIT_DIE: i32 = 8;

/// One generated NPC.
#[derive(Debug, Serialize)]
pub struct Character {
    pub seed: String,
    pub name: Option<String>,

    pub race_name: String,
    pub subrace_name: Option<String>,
    pub class_name: String,
    pub subclass_name: Option<String>,
    pub race_display: String,
    pub class_display: String,
    pub creature_type: String,
    pub size: Size,

    pub stats: Stats,
    pub attribute_bonuses: IndexMap<Attribute, i32>,
    pub priority_attributes: Vec<Attribute>,

    pub skills: BTreeSet<Skill>,
    pub skills_expertise: BTreeSet<Skill>,
    pub tool_proficiencies: BTreeSet<String>,
    pub tools_expertise: BTreeSet<String>,
    pub saves: BTreeSet<Attribute>,
    pub save_advantages: BTreeSet<String>,
    pub save_disadvantages: BTreeSet<String>,

    pub armors: IndexMap<String, EquippedArmor>,
    /// Stacking armors such as mage armor; never the chosen armor.
    pub extra_armors: IndexMap<String, EquippedArmor>,
    pub chosen_armor: Option<String>,
    pub has_shield: bool,
    pub weapons: IndexMap<String, EquippedWeapon>,

    /// Slots are `None` only while the feature is running a pass.
    #[serde(skip)]
    pub features: IndexMap<String, Option<Box<dyn Feature>>>,
    pub tags: IndexMap<String, Vec<String>>,

    pub damage_resistances: BTreeSet<DamageType>,
    pub damage_immunities: BTreeSet<DamageType>,
    pub damage_vulnerabilities: BTreeSet<DamageType>,
    pub condition_immunities: BTreeSet<String>,
    pub languages: Vec<String>,
    pub senses: Vec<String>,

    /// Six rolled values before swaps and bonuses, in canonical order.
    pub raw_attribute_rolls: Vec<i32>,
    /// Attributes that received an ASI point, in application order.
    pub asi_applied: Vec<Attribute>,
    pub cr_factors: Vec<CrFactor>,
    pub entries: Vec<StatBlockEntry>,
    pub cr: Option<CrEstimate>,
}

impl Character {
    pub fn new(seed: impl Into<String>, hit_dice: u32) -> Self {
        let mut stats = Stats::new();
        stats.set("hit_dice_num", hit_dice as i32);
        stats.set("hit_dice_size", DEFAULT_HIT_DIE);
        stats.set("attacks_per_round", 1);
        stats.set("walk_speed_base", DEFAULT_WALK_SPEED);

        Self {
            seed: seed.into(),
            name: None,
            race_name: String::new(),
            subrace_name: None,
            class_name: String::new(),
            subclass_name: None,
            race_display: String::new(),
            class_display: String::new(),
            creature_type: "humanoid".to_string(),
            size: Size::default(),
            stats,
            attribute_bonuses: IndexMap::new(),
            priority_attributes: Vec::new(),
            skills: BTreeSet::new(),
            skills_expertise: BTreeSet::new(),
            tool_proficiencies: BTreeSet::new(),
            tools_expertise: BTreeSet::new(),
            saves: BTreeSet::new(),
            save_advantages: BTreeSet::new(),
            save_disadvantages: BTreeSet::new(),
            armors: IndexMap::new(),
            extra_armors: IndexMap::new(),
            chosen_armor: None,
            has_shield: false,
            weapons: IndexMap::new(),
            features: IndexMap::new(),
            tags: IndexMap::new(),
            damage_resistances: BTreeSet::new(),
            damage_immunities: BTreeSet::new(),
            damage_vulnerabilities: BTreeSet::new(),
            condition_immunities: BTreeSet::new(),
            languages: Vec::new(),
            senses: Vec::new(),
            raw_attribute_rolls: Vec::new(),
            asi_applied: Vec::new(),
            cr_factors: Vec::new(),
            entries: Vec::new(),
            cr: None,
        }
    }

    pub fn hit_dice(&self) -> u32 {
        self.stats.get("hit_dice_num").max(0) as u32
    }

    /// Register a feature and then, in order, any sub-features it created.
    /// A key that is already present is skipped.
    pub fn add_feature(&mut self, mut feature: Box<dyn Feature>) -> bool {
        let key = feature.key().to_string();
        if self.features.contains_key(&key) {
            debug!(feature = %key, "feature already registered");
            return false;
        }
        let sub_features = feature.take_sub_features();
        self.features.insert(key, Some(feature));
        for sub in sub_features {
            self.add_feature(sub);
        }
        true
    }

    /// First feature that can cast spells, skipping one that is mid-pass.
    pub fn find_spellcaster(&self) -> Option<&SpellcastingFeature> {
        self.features
            .values()
            .flatten()
            .find_map(|f| f.as_spellcaster())
    }

    pub fn find_spellcaster_mut(&mut self) -> Option<&mut SpellcastingFeature> {
        self.features
            .values_mut()
            .flatten()
            .find_map(|f| f.as_spellcaster_mut())
    }

    /// Grant an armor option. Stacking armors go to the extra list.
    pub fn add_armor(&mut self, template: &Arc<ArmorTemplate>) {
        self.add_equipped_armor(EquippedArmor::new(template));
    }

    pub fn add_equipped_armor(&mut self, armor: EquippedArmor) {
        let target = if armor.is_stacking() {
            &mut self.extra_armors
        } else {
            &mut self.armors
        };
        target.entry(armor.name.clone()).or_insert(armor);
    }

    pub fn add_extra_armor(&mut self, template: &Arc<ArmorTemplate>) {
        let armor = EquippedArmor::new(template);
        self.extra_armors.entry(armor.name.clone()).or_insert(armor);
    }

    pub fn add_weapon(&mut self, template: &Arc<WeaponTemplate>) {
        self.weapons
            .entry(template.name.clone())
            .or_insert_with(|| EquippedWeapon::new(template));
    }

    pub fn add_language(&mut self, language: &str) {
        if !self.languages.iter().any(|l| l == language) {
            self.languages.push(language.to_string());
        }
    }

    pub fn add_sense(&mut self, sense: &str) {
        if !self.senses.iter().any(|s| s == sense) {
            self.senses.push(sense.to_string());
        }
    }

    /// Set a character tag, appending to the arguments of an existing one.
    pub fn add_tag(&mut self, name: impl Into<String>, args: Vec<String>) {
        self.tags.entry(name.into()).or_default().extend(args);
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.contains_key(name)
    }

    pub fn tag_args(&self, name: &str) -> &[String] {
        self.tags.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// How text templates refer to the character: the first word of its
    /// name, or its class.
    pub fn short_name(&self) -> String {
        self.name
            .as_deref()
            .and_then(|n| n.split_whitespace().next())
            .map(str::to_string)
            .unwrap_or_else(|| {
                if self.class_display.is_empty() {
                    "creature".to_string()
                } else {
                    self.class_display.clone()
                }
            })
    }

    /// Fill `{stat}` placeholders from the stat sheet and `{name}` with the
    /// short name. Unknown placeholders are left in place.
    pub fn render_text(&self, template: &str) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let Some(close) = after.find('}') else {
                out.push_str(&rest[open..]);
                return out;
            };
            let key = &after[..close];
            match key {
                "name" => out.push_str(&self.short_name()),
                _ => match self.stats.try_get(key) {
                    Some(value) => out.push_str(&value.to_string()),
                    None => {
                        warn!(placeholder = key, "text template references an unknown stat");
                        out.push('{');
                        out.push_str(key);
                        out.push('}');
                    }
                },
            }
            rest = &after[close + 1..];
        }
        out.push_str(rest);
        out
    }

    pub fn proficiency(&self) -> i32 {
        self.stats.get("proficiency")
    }

    pub fn skill_bonus(&self, skill: Skill) -> i32 {
        let mut bonus = self.stats.modifier(skill.attribute());
        if self.skills.contains(&skill) {
            bonus += self.proficiency();
        }
        if self.skills_expertise.contains(&skill) {
            bonus += self.proficiency();
        }
        bonus
    }

    pub fn save_bonus(&self, attribute: Attribute) -> i32 {
        self.stats.get(&format!("{}_save", attribute.key()))
    }

    /// Refresh everything that follows from scores and hit dice.
    pub fn compute_derived_stats(&mut self) {
        let hit_dice = self.hit_dice() as i32;
        let proficiency = hit_dice / 5 + 2 + self.stats.get("proficiency_bonus_extra");
        self.stats.set("proficiency", proficiency);

        for attribute in Attribute::ALL {
            let key = attribute.key();
            let modifier = self.stats.modifier(attribute);
            let save = if self.saves.contains(&attribute) {
                modifier + proficiency
            } else {
                modifier
            };
            self.stats.set(attribute.mod_key(), modifier);
            self.stats.set(format!("{}_save", key), save);
            self.stats.set(format!("{}_save_dc", key), 8 + proficiency + modifier);
            self.stats.set(format!("{}_attack", key), proficiency + modifier);
        }

        let size = self.stats.get("hit_dice_size");
        let per_die = self.stats.modifier(Attribute::Con) + self.stats.get("bonus_hp_per_level");
        let hit_points = hit_dice * (size + 1) / 2
            + hit_dice * per_die
            + self.stats.get("hit_dice_extra")
            + self.stats.get("hit_points_extra");
        self.stats.set("hit_points_total", hit_points.max(hit_dice));

        self.stats
            .set("passive_perception", 10 + self.skill_bonus(Skill::Perception));
    }

    fn armor_class_with(&self, armor: &EquippedArmor) -> i32 {
        armor.armor_class(
            &self.stats,
            self.has_tag(MEDIUM_ARMOR_MASTER_TAG),
            self.has_shield,
        )
    }

    /// Pick the armor giving the best AC. Ties prefer lighter categories,
    /// then a seeded choice.
    pub fn choose_armor(&mut self) {
        let scored: Vec<(&String, i32, _)> = self
            .armors
            .iter()
            .map(|(name, armor)| (name, self.armor_class_with(armor), armor.category))
            .collect();
        let Some(best_ac) = scored.iter().map(|(_, ac, _)| *ac).max() else {
            self.chosen_armor = None;
            self.refresh_armor_class();
            return;
        };
        let Some(lightest) = scored
            .iter()
            .filter(|(_, ac, _)| *ac == best_ac)
            .map(|(_, _, category)| *category)
            .min()
        else {
            return;
        };
        let candidates: Vec<String> = scored
            .iter()
            .filter(|(_, ac, category)| *ac == best_ac && *category == lightest)
            .map(|(name, _, _)| (*name).clone())
            .collect();

        let chosen = if candidates.len() == 1 {
            candidates.into_iter().next()
        } else {
            let mut rng = seeded_rng(&self.seed, "armor choice");
            choose(&mut rng, &candidates).cloned()
        };
        debug!(armor = ?chosen, armor_class = best_ac, "chose armor");
        self.chosen_armor = chosen;
        self.refresh_armor_class();
    }

    /// Re-read the chosen armor into the `armor_class` stat.
    pub fn refresh_armor_class(&mut self) {
        let armor_class = self.armor_class();
        self.stats.set("armor_class", armor_class);
    }

    pub fn chosen_armor(&self) -> Option<&EquippedArmor> {
        self.chosen_armor.as_ref().and_then(|n| self.armors.get(n))
    }

    /// AC from the chosen armor, or bare DEX when nothing was granted.
    pub fn armor_class(&self) -> i32 {
        match self.chosen_armor() {
            Some(armor) => self.armor_class_with(armor),
            None => {
                let shield = if self.has_shield { SHIELD_AC } else { 0 };
                10 + self.stats.modifier(Attribute::Dex) + shield + self.stats.get("ac_bonus")
            }
        }
    }

    /// The extra armor that beats the chosen armor, with its AC.
    pub fn best_extra_armor(&self) -> Option<(&EquippedArmor, i32)> {
        let base = self.armor_class();
        self.extra_armors
            .values()
            .map(|armor| (armor, self.armor_class_with(armor)))
            .filter(|(_, ac)| *ac > base)
            .max_by_key(|(_, ac)| *ac)
    }

    /// AC the CR estimate works from.
    pub fn effective_armor_class(&self) -> i32 {
        self.best_extra_armor()
            .map(|(_, ac)| ac)
            .unwrap_or_else(|| self.armor_class())
    }

    /// Whether the chosen armor slows this character.
    pub fn is_slowed_by_armor(&self) -> bool {
        !self.has_tag(HEAVY_ARMOR_TRAINING_TAG)
            && self
                .chosen_armor()
                .is_some_and(|a| a.slows(self.stats.score(Attribute::Str)))
    }

    /// Write final speeds. Must run after [`choose_armor`](Self::choose_armor).
    pub fn finalize_speeds(&mut self) {
        let penalty = if self.is_slowed_by_armor() {
            HEAVY_ARMOR_SPEED_PENALTY
        } else {
            0
        };
        for mode in SPEED_MODES {
            let base = self.stats.get(&format!("{}_speed_base", mode));
            let bonus = self.stats.get(&format!("{}_speed_bonus", mode));
            if base <= 0 && bonus <= 0 {
                self.stats.set(format!("{}_speed", mode), 0);
                continue;
            }
            self.stats
                .set(format!("{}_speed", mode), (base + bonus - penalty).max(0));
        }
    }

    /// Collect every CR factor and statblock entry, then estimate CR.
    pub fn gather_cr_and_entries(&mut self) {
        let brute = self.has_tag(BRUTE_TAG);
        let attacks_per_round = self.stats.get("attacks_per_round").max(1) as f64;

        let mut factors = Vec::new();
        let mut entries = Vec::new();

        for weapon in self.weapons.values() {
            let profile = weapon.profile(&self.stats, brute);
            factors.push(CrFactor::Attack {
                to_hit: profile.to_hit,
                damage: profile.average_damage as f64 * attacks_per_round,
            });
            entries.push(StatBlockEntry::new(
                EntryCategory::Attack,
                title_case(&weapon.display_name),
                weapon.description(&profile),
            ));
        }
        for feature in self.features.values().flatten() {
            factors.extend(feature.cr_factors(self));
            entries.extend(feature.stat_block_entries(self));
        }

        let inputs = CrInputs {
            hit_points: self.stats.get("hit_points_total"),
            armor_class: self.effective_armor_class(),
            proficiency: self.proficiency(),
        };
        let cr = estimate_cr(inputs, &factors);
        debug!(cr = %cr.label, factors = factors.len(), "estimated challenge rating");

        self.cr = Some(cr);
        self.cr_factors = factors;
        self.entries = entries;
    }
}
