//! The spellcasting resolver.
//!
//! A [`SpellcastingFeature`] owns everything about one spellcaster profile on
//! a character: caster level, slots, candidate spells per level and the
//! readied subset. Other features extend it through
//! [`SpellcastingFeature::add_free_spell_list`] during the first pass; spells
//! are chosen in the third pass.

mod attacks;

pub use attacks::*;

use std::collections::BTreeSet;
use std::sync::Arc;

use indexmap::IndexMap;
use npc_rules::{
    cantrips_known, ordinal, pact_slots, spells_known, standard_slots, Attribute, ReadyStyle,
    Spell, SpellList, SpellcasterProfile, MAGE_ARMOR,
};
use tracing::debug;

use crate::character::Character;
use crate::cr::CrFactor;
use crate::error::BuildError;
use crate::features::{Feature, FeatureArgs, PassContext};
use crate::random::weighted_index;
use crate::statblock::{signed, EntryCategory, StatBlockEntry};

/// Profile tag selecting pact magic slots.
pub const PACT_MAGIC_TAG: &str = "warlock";

/// Profile tag marking casters that keep unreadied candidates in a book.
pub const SPELLBOOK_TAG: &str = "spellbook";

/// Spell levels 0 (cantrips) through 9.
const SPELL_LEVELS: usize = 10;

/// Caster level for a hit-dice count and a hit-dice-per-level divisor.
///
/// Partial casters reach their first caster level at exactly `divisor` hit
/// dice and scale with the rounded-up quotient after that.
pub fn caster_level(hit_dice: u32, divisor: u32) -> u32 {
    if divisor <= 1 {
        return hit_dice;
    }
    match hit_dice.cmp(&divisor) {
        std::cmp::Ordering::Less => 0,
        std::cmp::Ordering::Equal => 1,
        std::cmp::Ordering::Greater => hit_dice.div_ceil(divisor),
    }
}

/// Slot layout for one caster level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotTable {
    /// Slots per spell level, index 0 is 1st level.
    Standard([u32; 9]),
    /// A flat count of slots that all share one level.
    Pact { count: u32, level: u8 },
}

impl SlotTable {
    pub fn for_profile(profile: &SpellcasterProfile, caster_level: u32) -> Self {
        if profile.has_tag(PACT_MAGIC_TAG) {
            let (count, level) = pact_slots(caster_level);
            SlotTable::Pact { count, level }
        } else {
            SlotTable::Standard(standard_slots(caster_level))
        }
    }

    /// Highest spell level with any slot, 0 when nothing above cantrips is
    /// castable.
    pub fn max_level(&self) -> u8 {
        match self {
            SlotTable::Standard(slots) => slots
                .iter()
                .rposition(|n| *n > 0)
                .map(|i| i as u8 + 1)
                .unwrap_or(0),
            SlotTable::Pact { count, level } if *count > 0 => *level,
            SlotTable::Pact { .. } => 0,
        }
    }

    /// Slots usable for a spell of `level`.
    pub fn slots_at_or_above(&self, level: u8) -> u32 {
        if level == 0 {
            return 0;
        }
        match self {
            SlotTable::Standard(slots) => slots[level as usize - 1..].iter().sum(),
            SlotTable::Pact { count, level: pact } if level <= *pact => *count,
            SlotTable::Pact { .. } => 0,
        }
    }
}

/// `spellcasting(profile)`.
#[derive(Debug)]
pub struct SpellcastingFeature {
    key: String,
    profile: Arc<SpellcasterProfile>,
    /// List name to weight, in registration order.
    spell_lists: IndexMap<String, f64>,
    free_spell_lists: Vec<String>,
    caster_level: u32,
    slots: SlotTable,
    budget: u32,
    free_spells: BTreeSet<String>,
    choices: Vec<Vec<Arc<Spell>>>,
    readied: Vec<Vec<Arc<Spell>>>,
    readied_names: BTreeSet<String>,
    attacks: Vec<SpellAttack>,
}

impl SpellcastingFeature {
    pub fn new(key: &str, profile: Arc<SpellcasterProfile>, default_weight: f64) -> Self {
        let spell_lists = profile
            .spell_lists
            .iter()
            .map(|(name, weight)| {
                let weight = if weight.is_finite() && *weight > 0.0 {
                    *weight
                } else {
                    default_weight
                };
                (name.clone(), weight)
            })
            .collect();
        let free_spell_lists = profile.free_spell_lists.clone();
        Self {
            key: key.to_string(),
            profile,
            spell_lists,
            free_spell_lists,
            caster_level: 0,
            slots: SlotTable::Standard([0; 9]),
            budget: 0,
            free_spells: BTreeSet::new(),
            choices: vec![Vec::new(); SPELL_LEVELS],
            readied: vec![Vec::new(); SPELL_LEVELS],
            readied_names: BTreeSet::new(),
            attacks: Vec::new(),
        }
    }

    pub fn construct(args: &FeatureArgs<'_>) -> Result<Box<dyn Feature>, BuildError> {
        args.expect_no_more_than(1)?;
        let profile = args.catalog.spellcaster(args.required(0)?)?;
        for list in profile.spell_lists.keys().chain(&profile.free_spell_lists) {
            args.catalog.spell_list(list)?;
        }
        Ok(Box::new(Self::new(
            args.key,
            Arc::clone(profile),
            args.config.default_spell_list_weight,
        )))
    }

    pub fn profile(&self) -> &SpellcasterProfile {
        &self.profile
    }

    pub fn casting_stat(&self) -> Attribute {
        self.profile.casting_stat
    }

    /// Register a list whose castable spells are always readied. Only
    /// effective before the third pass.
    pub fn add_free_spell_list(&mut self, name: &str) {
        if !self.free_spell_lists.iter().any(|l| l == name) {
            self.free_spell_lists.push(name.to_string());
        }
    }

    /// Register an extra weighted candidate list, adding to its weight if it
    /// is already present.
    pub fn add_spell_list(&mut self, name: &str, weight: f64) {
        *self.spell_lists.entry(name.to_string()).or_insert(0.0) += weight;
    }

    pub fn free_spell_lists(&self) -> &[String] {
        &self.free_spell_lists
    }

    pub fn caster_level(&self) -> u32 {
        self.caster_level
    }

    pub fn slots(&self) -> SlotTable {
        self.slots
    }

    /// Leveled spells the caster may ready beyond free spells.
    pub fn budget(&self) -> u32 {
        self.budget
    }

    pub fn free_spells(&self) -> &BTreeSet<String> {
        &self.free_spells
    }

    pub fn is_free(&self, spell: &str) -> bool {
        self.free_spells.contains(spell)
    }

    pub fn choices_at(&self, level: u8) -> &[Arc<Spell>] {
        self.choices
            .get(level as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn readied_at(&self, level: u8) -> &[Arc<Spell>] {
        self.readied
            .get(level as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn readied_spells(&self) -> impl Iterator<Item = &Arc<Spell>> {
        self.readied.iter().flatten()
    }

    pub fn is_readied(&self, spell: &str) -> bool {
        self.readied_names.contains(spell)
    }

    pub fn attacks(&self) -> &[SpellAttack] {
        &self.attacks
    }

    fn ready(&mut self, spell: Arc<Spell>) -> bool {
        if !self.readied_names.insert(spell.name.clone()) {
            return false;
        }
        self.readied[spell.level as usize].push(spell);
        true
    }

    fn resolve_lists(
        &self,
        ctx: &PassContext<'_>,
    ) -> Result<(Vec<(Arc<SpellList>, f64)>, Vec<Arc<SpellList>>), BuildError> {
        let weighted = self
            .spell_lists
            .iter()
            .map(|(name, weight)| Ok((Arc::clone(ctx.catalog.spell_list(name)?), *weight)))
            .collect::<Result<Vec<_>, BuildError>>()?;
        let free = self
            .free_spell_lists
            .iter()
            .map(|name| Ok(Arc::clone(ctx.catalog.spell_list(name)?)))
            .collect::<Result<Vec<_>, BuildError>>()?;
        Ok((weighted, free))
    }

    /// Ready every castable member of the free lists.
    fn add_free_spells(&mut self, free_lists: &[Arc<SpellList>]) {
        if self.caster_level == 0 {
            return;
        }
        let max_level = self.slots.max_level();
        for list in free_lists {
            for spell in &list.spells {
                if spell.level <= max_level {
                    self.free_spells.insert(spell.name.clone());
                    self.ready(Arc::clone(spell));
                }
            }
        }
    }

    /// Weighted candidate picks for every spell level, without replacement.
    fn set_spell_choices(
        &mut self,
        ctx: &PassContext<'_>,
        lists: &[(Arc<SpellList>, f64)],
    ) {
        let cap = ctx.config.spell_choice_cap;
        for level in 0..SPELL_LEVELS as u8 {
            let mut pool: IndexMap<&str, (&Arc<Spell>, f64)> = IndexMap::new();
            for (list, weight) in lists {
                let count = list.count_of_level(level);
                if count == 0 {
                    continue;
                }
                let share = weight / count as f64;
                for spell in list.spells_of_level(level) {
                    if self.free_spells.contains(&spell.name) {
                        continue;
                    }
                    pool.entry(spell.name.as_str()).or_insert((spell, 0.0)).1 += share;
                }
            }

            let mut rng = ctx.rng(&format!("{}spellpicking{}", self.key, level));
            let mut picked = Vec::new();
            while picked.len() < cap && !pool.is_empty() {
                let weights: Vec<f64> = pool.values().map(|(_, w)| *w).collect();
                let Some(index) = weighted_index(&mut rng, &weights) else {
                    break;
                };
                if let Some((_, (spell, _))) = pool.shift_remove_index(index) {
                    picked.push(Arc::clone(spell));
                }
            }
            self.choices[level as usize] = picked;
        }
    }

    fn spell_budget(&self, character: &Character) -> u32 {
        let budget = match self.profile.spells_known {
            Some(table) => spells_known(table, self.caster_level) as i32,
            None => {
                self.caster_level as i32
                    + character.stats.modifier(self.casting_stat())
                    + self.profile.spells_known_modifier
            }
        };
        budget.max(0) as u32
    }

    /// Pick readied spells from the candidates.
    fn select_readied_spells(&mut self, ctx: &PassContext<'_>) {
        if self.caster_level == 0 {
            return;
        }
        self.budget = self.spell_budget(ctx.character);

        let cantrips = cantrips_known(self.profile.cantrips, self.caster_level) as usize;
        let candidates: Vec<_> = self.choices[0].iter().take(cantrips).cloned().collect();
        for spell in candidates {
            self.ready(spell);
        }

        let max_level = self.slots.max_level();
        let mut cursors = [0usize; SPELL_LEVELS];
        let mut remaining = self.budget;

        for level in 1..=max_level {
            if remaining == 0 {
                break;
            }
            if self.ready_next_candidate(level, &mut cursors) {
                remaining -= 1;
            }
        }

        let mut rng = ctx.rng(&format!("{}spell readying", self.key));
        while remaining > 0 {
            let weights: Vec<f64> = (1..=max_level)
                .map(|level| {
                    if cursors[level as usize] >= self.choices[level as usize].len() {
                        return 0.0;
                    }
                    let picked = self.readied[level as usize].len().max(1);
                    self.slots.slots_at_or_above(level) as f64 / picked as f64
                })
                .collect();
            let Some(index) = weighted_index(&mut rng, &weights) else {
                break;
            };
            if self.ready_next_candidate(index as u8 + 1, &mut cursors) {
                remaining -= 1;
            }
        }
    }

    fn ready_next_candidate(&mut self, level: u8, cursors: &mut [usize; SPELL_LEVELS]) -> bool {
        let slot = level as usize;
        while let Some(spell) = self.choices[slot].get(cursors[slot]).cloned() {
            cursors[slot] += 1;
            if self.ready(spell) {
                return true;
            }
        }
        false
    }

    fn post_process(&mut self, ctx: &mut PassContext<'_>) -> Result<(), BuildError> {
        if self.is_readied(MAGE_ARMOR) {
            ctx.character.add_extra_armor(ctx.catalog.armor(MAGE_ARMOR)?);
        }
        let hit_dice = ctx.character.hit_dice();
        self.attacks = self
            .readied_at(0)
            .iter()
            .filter_map(|spell| {
                SpellAttackKind::from_spell_name(&spell.name).map(|kind| {
                    SpellAttack::new(kind, Arc::clone(spell), self.casting_stat(), hit_dice)
                })
            })
            .collect();
        Ok(())
    }

    fn spell_names(spells: &[Arc<Spell>]) -> String {
        spells
            .iter()
            .map(|s| s.display_name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn describe(&self, character: &Character) -> String {
        let stat = self.casting_stat();
        let name = character.short_name();
        let style = match self.profile.ready_style {
            ReadyStyle::Prepared => "prepared",
            ReadyStyle::Known => "known",
        };
        let mut lines = vec![format!(
            "The {} is a {}-level spellcaster. Its spellcasting ability is {} (spell save DC {}, {} to hit with spell attacks).",
            name,
            ordinal(self.caster_level),
            stat.name(),
            character.stats.get(&format!("{}_save_dc", stat.key())),
            signed(character.stats.get(&format!("{}_attack", stat.key()))),
        )];
        if let SlotTable::Pact { .. } = self.slots {
            lines[0].push_str(" It regains its expended spell slots when it finishes a short or long rest.");
        }
        lines[0].push_str(&format!(" It has the following spells {}:", style));

        if !self.readied[0].is_empty() {
            lines.push(format!(
                "Cantrips (at will): {}",
                Self::spell_names(&self.readied[0])
            ));
        }
        match self.slots {
            SlotTable::Standard(slots) => {
                for level in 1..SPELL_LEVELS {
                    let spells = &self.readied[level];
                    if spells.is_empty() {
                        continue;
                    }
                    let count = slots[level - 1];
                    lines.push(format!(
                        "{} level ({} slot{}): {}",
                        ordinal(level as u32),
                        count,
                        if count == 1 { "" } else { "s" },
                        Self::spell_names(spells)
                    ));
                }
            }
            SlotTable::Pact { count, level } => {
                let spells: Vec<_> = self.readied[1..].iter().flatten().cloned().collect();
                if !spells.is_empty() {
                    lines.push(format!(
                        "1st-{} level ({} {}-level slot{}): {}",
                        ordinal(level as u32),
                        count,
                        ordinal(level as u32),
                        if count == 1 { "" } else { "s" },
                        Self::spell_names(&spells)
                    ));
                }
            }
        }
        lines.join("\n")
    }

    /// Castable candidates that were not readied.
    fn spellbook_extras(&self) -> Vec<Arc<Spell>> {
        let max_level = self.slots.max_level() as usize;
        self.choices
            .iter()
            .take(max_level + 1)
            .skip(1)
            .flatten()
            .filter(|s| !self.is_readied(&s.name))
            .cloned()
            .collect()
    }
}

impl Feature for SpellcastingFeature {
    fn key(&self) -> &str {
        &self.key
    }

    fn third_pass(&mut self, ctx: &mut PassContext<'_>) -> Result<(), BuildError> {
        self.caster_level = caster_level(ctx.character.hit_dice(), self.profile.hd_per_casting_level);
        self.slots = SlotTable::for_profile(&self.profile, self.caster_level);

        let (weighted, free) = self.resolve_lists(ctx)?;
        self.add_free_spells(&free);
        self.set_spell_choices(ctx, &weighted);
        self.select_readied_spells(ctx);
        self.post_process(ctx)?;

        debug!(
            feature = %self.key,
            caster_level = self.caster_level,
            budget = self.budget,
            free = self.free_spells.len(),
            readied = self.readied_names.len(),
            "readied spells"
        );
        Ok(())
    }

    fn cr_factors(&self, character: &Character) -> Vec<CrFactor> {
        let mut factors: Vec<CrFactor> = self.attacks.iter().map(|a| a.cr_factor(character)).collect();
        if self.readied[1..].iter().any(|spells| !spells.is_empty()) {
            factors.push(CrFactor::Ability {
                level: self.caster_level as i32 + 3,
                dc: character
                    .stats
                    .get(&format!("{}_save_dc", self.casting_stat().key())),
            });
        }
        factors
    }

    fn stat_block_entries(&self, character: &Character) -> Vec<StatBlockEntry> {
        if self.readied_names.is_empty() {
            return Vec::new();
        }
        let mut entries = vec![StatBlockEntry::new(
            EntryCategory::Spellcasting,
            "Spellcasting",
            self.describe(character),
        )];
        if self.profile.has_tag(SPELLBOOK_TAG) {
            let extras = self.spellbook_extras();
            if !extras.is_empty() {
                entries.push(
                    StatBlockEntry::new(
                        EntryCategory::Passive,
                        "Spellbook",
                        format!(
                            "The {}'s spellbook also holds: {}.",
                            character.short_name(),
                            Self::spell_names(&extras)
                        ),
                    )
                    .with_visibility(2),
                );
            }
        }
        entries.extend(self.attacks.iter().map(|a| a.entry(character)));
        entries
    }

    fn as_spellcaster(&self) -> Option<&SpellcastingFeature> {
        Some(self)
    }

    fn as_spellcaster_mut(&mut self) -> Option<&mut SpellcastingFeature> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::features::{run_pass, test_support, Pass};
    use npc_rules::Catalog;

    const FIXTURE: &str = r#"
        [armor.mage_armor]
        base_ac = 13
        category = "none"
        tags = ["stacking", "spell"]

        [spell.fire_bolt]
        level = 0
        school = "evocation"
        classes = ["wizard"]

        [spell.light]
        level = 0
        school = "evocation"
        classes = ["wizard"]

        [spell.magic_missile]
        level = 1
        school = "evocation"
        classes = ["wizard"]

        [spell.mage_armor]
        level = 1
        school = "abjuration"
        classes = ["wizard"]

        [spell.shield]
        level = 1
        school = "abjuration"
        classes = ["wizard"]

        [spell.misty_step]
        level = 2
        school = "conjuration"
        classes = ["wizard"]

        [spell.fireball]
        level = 3
        school = "evocation"
        classes = ["wizard"]

        [spell.bless]
        level = 1
        school = "enchantment"
        classes = ["cleric"]

        [spell_list.wizard]
        auto = { classes = ["wizard"] }

        [spell_list.blessings]
        include = ["bless"]

        [spellcaster.wizard]
        casting_stat = "int"
        ready_style = "prepared"
        cantrips = "standard"
        spell_lists = { wizard = 1.0 }

        [spellcaster.half]
        casting_stat = "int"
        hd_per_casting_level = 2
        spell_lists = { wizard = 1.0 }
    "#;

    fn catalog() -> Catalog {
        Catalog::from_toml_str(FIXTURE).unwrap()
    }

    fn caster(catalog: &Catalog, profile: &str, hit_dice: u32, int: i32) -> Character {
        let mut character = Character::new("spell seed", hit_dice);
        character.stats.set("int", int);
        let feature = test_support::with_args("spellcasting", &[profile], hit_dice, catalog, |args| {
            SpellcastingFeature::construct(args).unwrap()
        });
        character.add_feature(feature);
        character.compute_derived_stats();
        character
    }

    fn run_third(character: &mut Character, catalog: &Catalog) {
        let config = GeneratorConfig::default();
        run_pass(character, catalog, &config, Pass::First).unwrap();
        run_pass(character, catalog, &config, Pass::Third).unwrap();
    }

    #[test]
    fn test_caster_level_rule() {
        assert_eq!(caster_level(7, 1), 7);
        assert_eq!(caster_level(1, 2), 0);
        assert_eq!(caster_level(2, 2), 1);
        assert_eq!(caster_level(3, 2), 2);
        assert_eq!(caster_level(5, 3), 2);
        assert_eq!(caster_level(3, 3), 1);
        assert_eq!(caster_level(2, 3), 0);
    }

    #[test]
    fn test_slot_tables() {
        let standard = SlotTable::Standard(standard_slots(5));
        assert_eq!(standard.max_level(), 3);
        assert_eq!(standard.slots_at_or_above(1), 9);
        assert_eq!(standard.slots_at_or_above(3), 2);
        assert_eq!(standard.slots_at_or_above(4), 0);

        let pact = SlotTable::Pact { count: 2, level: 3 };
        assert_eq!(pact.max_level(), 3);
        assert_eq!(pact.slots_at_or_above(1), 2);
        assert_eq!(pact.slots_at_or_above(4), 0);
        assert_eq!(SlotTable::Pact { count: 0, level: 0 }.max_level(), 0);
    }

    #[test]
    fn test_readied_count_matches_budget() {
        let catalog = catalog();
        // Caster level 5, +1 int: budget 6, only 6 leveled wizard spells exist.
        let mut character = caster(&catalog, "wizard", 5, 12);
        run_third(&mut character, &catalog);
        let spellcaster = character.find_spellcaster().unwrap();

        assert_eq!(spellcaster.budget(), 6);
        let leveled = spellcaster.readied_spells().filter(|s| s.level > 0).count();
        assert_eq!(leveled, 5);
        assert_eq!(spellcaster.readied_at(0).len(), 2);
        // One guaranteed pick at each castable level.
        assert!((1..=3).all(|l| !spellcaster.readied_at(l).is_empty()));
    }

    #[test]
    fn test_small_budget_limits_readied() {
        let catalog = catalog();
        let mut character = caster(&catalog, "wizard", 1, 8);
        run_third(&mut character, &catalog);
        let spellcaster = character.find_spellcaster().unwrap();
        assert_eq!(spellcaster.budget(), 0);
        assert_eq!(spellcaster.readied_spells().filter(|s| s.level > 0).count(), 0);
    }

    #[test]
    fn test_half_caster_below_divisor_readies_nothing() {
        let catalog = catalog();
        let mut character = caster(&catalog, "half", 1, 18);
        run_third(&mut character, &catalog);
        let spellcaster = character.find_spellcaster().unwrap();
        assert_eq!(spellcaster.caster_level(), 0);
        assert_eq!(spellcaster.readied_spells().count(), 0);
        assert!(spellcaster.cr_factors(&character).is_empty());
    }

    #[test]
    fn test_free_list_spells_are_readied_without_budget() {
        let catalog = catalog();
        let mut character = caster(&catalog, "wizard", 1, 8);
        character
            .find_spellcaster_mut()
            .unwrap()
            .add_free_spell_list("blessings");
        run_third(&mut character, &catalog);
        let spellcaster = character.find_spellcaster().unwrap();
        assert!(spellcaster.is_free("bless"));
        assert!(spellcaster.is_readied("bless"));
        assert!(spellcaster.choices_at(1).iter().all(|s| s.name != "bless"));
    }

    #[test]
    fn test_selection_is_deterministic() {
        let catalog = catalog();
        let names = |character: &Character| -> Vec<String> {
            character
                .find_spellcaster()
                .unwrap()
                .readied_spells()
                .map(|s| s.name.clone())
                .collect()
        };
        let mut a = caster(&catalog, "wizard", 3, 14);
        let mut b = caster(&catalog, "wizard", 3, 14);
        run_third(&mut a, &catalog);
        run_third(&mut b, &catalog);
        assert_eq!(names(&a), names(&b));
    }

    #[test]
    fn test_mage_armor_grants_extra_armor() {
        let catalog = catalog();
        // Budget covers every leveled candidate, so mage armor is readied.
        let mut character = caster(&catalog, "wizard", 5, 20);
        run_third(&mut character, &catalog);
        assert!(character.find_spellcaster().unwrap().is_readied(MAGE_ARMOR));
        assert!(character.extra_armors.contains_key(MAGE_ARMOR));
    }

    #[test]
    fn test_unknown_profile_is_fatal() {
        let catalog = catalog();
        let result = test_support::with_args("spellcasting", &["bard"], 1, &catalog, |args| {
            SpellcastingFeature::construct(args).map(|_| ())
        });
        assert!(matches!(result, Err(BuildError::Catalog(_))));
    }

    #[test]
    fn test_entry_lists_slots() {
        let catalog = catalog();
        let mut character = caster(&catalog, "wizard", 5, 20);
        run_third(&mut character, &catalog);
        let entries = character
            .find_spellcaster()
            .unwrap()
            .stat_block_entries(&character);
        let text = &entries[0].text;
        assert!(text.contains("5th-level spellcaster"));
        assert!(text.contains("Intelligence"));
        assert!(text.contains("1st level (4 slots)"));
        assert!(text.contains("3rd level (2 slots): fireball"));
    }
}
