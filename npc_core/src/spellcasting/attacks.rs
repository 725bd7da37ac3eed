//! Attack cantrips that need their own statblock line and CR factor.

use std::sync::Arc;

use npc_rules::{Attribute, DamageType, Dice, Spell};

use crate::character::{damage_expression, Character};
use crate::cr::CrFactor;
use crate::statblock::{number_word, signed, title_case, EntryCategory, StatBlockEntry};

/// Character tag that adds the casting modifier to each eldritch blast beam.
pub const AGONIZING_BLAST_TAG: &str = "agonizing_blast";

/// Cantrip damage dice (or beams) by hit dice: 1, then +1 at 5, 11 and 17.
pub fn cantrip_scale(hit_dice: u32) -> u32 {
    1 + [5, 11, 17].iter().filter(|t| hit_dice >= **t).count() as u32
}

/// The attack cantrips with dedicated handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpellAttackKind {
    ChillTouch,
    EldritchBlast,
}

impl SpellAttackKind {
    pub fn from_spell_name(name: &str) -> Option<Self> {
        match name {
            "chill_touch" => Some(Self::ChillTouch),
            "eldritch_blast" => Some(Self::EldritchBlast),
            _ => None,
        }
    }
}

/// A readied attack cantrip bound to its caster.
#[derive(Debug, Clone)]
pub struct SpellAttack {
    pub kind: SpellAttackKind,
    pub spell: Arc<Spell>,
    pub casting_stat: Attribute,
    /// Dice per attack.
    pub dice: Dice,
    /// Separate attack rolls per action.
    pub beams: u32,
    pub damage_type: DamageType,
}

impl SpellAttack {
    pub fn new(
        kind: SpellAttackKind,
        spell: Arc<Spell>,
        casting_stat: Attribute,
        hit_dice: u32,
    ) -> Self {
        let scale = cantrip_scale(hit_dice);
        let (dice, beams, damage_type) = match kind {
            SpellAttackKind::ChillTouch => (Dice::new(scale, 8), 1, DamageType::Necrotic),
            SpellAttackKind::EldritchBlast => (Dice::new(1, 10), scale, DamageType::Force),
        };
        Self {
            kind,
            spell,
            casting_stat,
            dice,
            beams,
            damage_type,
        }
    }

    fn damage_bonus(&self, character: &Character) -> i32 {
        match self.kind {
            SpellAttackKind::EldritchBlast if character.has_tag(AGONIZING_BLAST_TAG) => {
                character.stats.modifier(self.casting_stat)
            }
            _ => 0,
        }
    }

    fn to_hit(&self, character: &Character) -> i32 {
        character.stats.get(&format!("{}_attack", self.casting_stat.key()))
    }

    /// Expected damage of one full casting.
    pub fn average_damage(&self, character: &Character) -> f64 {
        let per_beam = self.dice.average() + self.damage_bonus(character) as f64;
        per_beam.max(1.0) * self.beams as f64
    }

    pub fn cr_factor(&self, character: &Character) -> CrFactor {
        CrFactor::Attack {
            to_hit: self.to_hit(character),
            damage: self.average_damage(character),
        }
    }

    pub fn entry(&self, character: &Character) -> StatBlockEntry {
        let name = character.short_name();
        let mut text = format!(
            "Ranged Spell Attack: {} to hit, range 120 ft., one creature. Hit: {} {} damage",
            signed(self.to_hit(character)),
            damage_expression(self.dice, self.damage_bonus(character)),
            self.damage_type.name()
        );
        match self.kind {
            SpellAttackKind::ChillTouch => text.push_str(&format!(
                ", and the target can't regain hit points until the start of the {}'s next turn.",
                name
            )),
            SpellAttackKind::EldritchBlast if self.beams > 1 => text.push_str(&format!(
                ". The spell creates {} beams, which can target the same creature or different ones.",
                number_word(self.beams)
            )),
            SpellAttackKind::EldritchBlast => text.push('.'),
        }
        StatBlockEntry::new(
            EntryCategory::Attack,
            format!("{} (Cantrip)", title_case(&self.spell.display_name)),
            text,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use npc_rules::SpellSchool;
    use std::collections::BTreeSet;

    fn spell(name: &str) -> Arc<Spell> {
        Arc::new(Spell {
            name: name.to_string(),
            display_name: name.replace('_', " "),
            source: "SRD".to_string(),
            level: 0,
            school: SpellSchool::Evocation,
            classes: BTreeSet::new(),
        })
    }

    fn caster(hit_dice: u32, cha: i32) -> Character {
        let mut character = Character::new("seed", hit_dice);
        character.stats.set("cha", cha);
        character.stats.set("cha_attack", 5);
        character
    }

    #[test]
    fn test_cantrip_scale() {
        assert_eq!(cantrip_scale(1), 1);
        assert_eq!(cantrip_scale(5), 2);
        assert_eq!(cantrip_scale(11), 3);
        assert_eq!(cantrip_scale(20), 4);
    }

    #[test]
    fn test_eldritch_blast_beams_and_agonizing() {
        let mut character = caster(5, 16);
        let blast = SpellAttack::new(
            SpellAttackKind::EldritchBlast,
            spell("eldritch_blast"),
            Attribute::Cha,
            5,
        );
        assert_eq!(blast.beams, 2);
        assert_eq!(blast.average_damage(&character), 11.0);

        character.add_tag(AGONIZING_BLAST_TAG, Vec::new());
        assert_eq!(blast.average_damage(&character), 17.0);
        let entry = blast.entry(&character);
        assert_eq!(entry.title, "Eldritch Blast (Cantrip)");
        assert!(entry.text.contains("+5 to hit"));
        assert!(entry.text.contains("8 (1d10 + 3) force damage"));
        assert!(entry.text.contains("two beams"));
    }

    #[test]
    fn test_chill_touch_scales_dice() {
        let character = caster(11, 10);
        let touch = SpellAttack::new(
            SpellAttackKind::ChillTouch,
            spell("chill_touch"),
            Attribute::Cha,
            11,
        );
        assert_eq!(touch.dice, Dice::new(3, 8));
        assert_eq!(
            touch.cr_factor(&character),
            CrFactor::Attack { to_hit: 5, damage: 13.5 }
        );
    }
}
