//! Small class features: unarmored defense, sneak attack, expertise and
//! extra skills.

use npc_rules::{Attribute, Dice, Skill, UNARMORED};

use super::{Feature, FeatureArgs, PassContext};
use crate::character::{Character, EquippedArmor};
use crate::cr::CrFactor;
use crate::error::BuildError;
use crate::random::choose_distinct;
use crate::statblock::{EntryCategory, StatBlockEntry};

/// `unarmored_defense(attr)`: an extra armor option of 10 + DEX + attr.
#[derive(Debug, Clone)]
pub struct UnarmoredDefense {
    key: String,
    attribute: Attribute,
}

impl UnarmoredDefense {
    pub fn construct(args: &FeatureArgs<'_>) -> Result<Box<dyn Feature>, BuildError> {
        args.expect_no_more_than(1)?;
        Ok(Box::new(Self {
            key: args.key.to_string(),
            attribute: args.parse(0)?,
        }))
    }
}

impl Feature for UnarmoredDefense {
    fn key(&self) -> &str {
        &self.key
    }

    fn first_pass(&mut self, ctx: &mut PassContext<'_>) -> Result<(), BuildError> {
        let armor = EquippedArmor::new(ctx.catalog.armor(UNARMORED)?)
            .with_key(self.key.clone(), "unarmored defense")
            .with_extra_attribute(self.attribute);
        ctx.character.add_equipped_armor(armor);
        Ok(())
    }
}

/// `sneak_attack()`: ceil(hd / 2) d6 once per turn.
#[derive(Debug, Clone)]
pub struct SneakAttack {
    key: String,
    dice: Dice,
}

impl SneakAttack {
    pub fn construct(args: &FeatureArgs<'_>) -> Result<Box<dyn Feature>, BuildError> {
        args.expect_no_more_than(0)?;
        Ok(Box::new(Self {
            key: args.key.to_string(),
            dice: Dice::new(args.hit_dice.div_ceil(2).max(1), 6),
        }))
    }

    pub fn dice(&self) -> Dice {
        self.dice
    }
}

impl Feature for SneakAttack {
    fn key(&self) -> &str {
        &self.key
    }

    fn cr_factors(&self, _character: &Character) -> Vec<CrFactor> {
        vec![CrFactor::EffectiveDamageMod(self.dice.average())]
    }

    fn stat_block_entries(&self, character: &Character) -> Vec<StatBlockEntry> {
        let text = format!(
            "The {} deals an extra {} ({}) damage when it hits a target with a weapon attack \
             and has advantage on the attack roll, or when the target is within 5 feet of an \
             ally of the {} that isn't incapacitated and the {} doesn't have disadvantage on \
             the attack roll.",
            character.short_name(),
            self.dice.average_floor(),
            self.dice,
            character.short_name(),
            character.short_name()
        );
        vec![StatBlockEntry::new(
            EntryCategory::Passive,
            "Sneak Attack (1/Turn)",
            text,
        )]
    }
}

/// `expertise(count)`: double proficiency in `count` proficient skills.
///
/// Runs in the second pass so every skill granted during the first pass is
/// eligible.
#[derive(Debug, Clone)]
pub struct Expertise {
    key: String,
    count: usize,
    chosen: Vec<Skill>,
}

impl Expertise {
    pub fn construct(args: &FeatureArgs<'_>) -> Result<Box<dyn Feature>, BuildError> {
        args.expect_no_more_than(1)?;
        Ok(Box::new(Self {
            key: args.key.to_string(),
            count: args.parse(0)?,
            chosen: Vec::new(),
        }))
    }

    pub fn chosen(&self) -> &[Skill] {
        &self.chosen
    }
}

impl Feature for Expertise {
    fn key(&self) -> &str {
        &self.key
    }

    fn second_pass(&mut self, ctx: &mut PassContext<'_>) -> Result<(), BuildError> {
        let candidates: Vec<Skill> = ctx
            .character
            .skills
            .iter()
            .filter(|s| !ctx.character.skills_expertise.contains(*s))
            .copied()
            .collect();
        let mut rng = ctx.rng(&format!("{}expertise", self.key));
        self.chosen = choose_distinct(&mut rng, &candidates, self.count);
        ctx.character.skills_expertise.extend(self.chosen.iter().copied());
        Ok(())
    }
}

/// `extra_skills(count)`: `count` additional skill proficiencies.
#[derive(Debug, Clone)]
pub struct ExtraSkills {
    key: String,
    count: usize,
}

impl ExtraSkills {
    pub fn construct(args: &FeatureArgs<'_>) -> Result<Box<dyn Feature>, BuildError> {
        args.expect_no_more_than(1)?;
        Ok(Box::new(Self {
            key: args.key.to_string(),
            count: args.parse(0)?,
        }))
    }
}

impl Feature for ExtraSkills {
    fn key(&self) -> &str {
        &self.key
    }

    fn first_pass(&mut self, ctx: &mut PassContext<'_>) -> Result<(), BuildError> {
        let candidates: Vec<Skill> = Skill::ALL
            .into_iter()
            .filter(|s| !ctx.character.skills.contains(s))
            .collect();
        let mut rng = ctx.rng(&format!("{}skill choice", self.key));
        let picked = choose_distinct(&mut rng, &candidates, self.count);
        ctx.character.skills.extend(picked);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::features::test_support::with_args;
    use crate::features::{run_pass, Pass};
    use npc_rules::Catalog;

    fn catalog() -> Catalog {
        Catalog::from_toml_str(
            r#"
            [armor.unarmored]
            base_ac = 10
            category = "none"
            "#,
        )
        .unwrap()
    }

    fn run(character: &mut Character, catalog: &Catalog, passes: &[Pass]) {
        let config = GeneratorConfig::default();
        for pass in passes {
            run_pass(character, catalog, &config, *pass).unwrap();
        }
    }

    #[test]
    fn test_unarmored_defense_adds_option() {
        let catalog = catalog();
        let mut character = Character::new("seed", 1);
        character.add_feature(
            with_args("unarmored_defense", &["wis"], 1, &catalog, UnarmoredDefense::construct)
                .unwrap(),
        );
        run(&mut character, &catalog, &[Pass::First]);
        character.stats.set("dex", 16);
        character.stats.set("wis", 14);
        let armor = &character.armors["unarmored_defense"];
        assert_eq!(armor.armor_class(&character.stats, false, false), 15);
    }

    #[test]
    fn test_unarmored_defense_rejects_bad_attribute() {
        let catalog = catalog();
        let result = with_args("unarmored_defense", &["luck"], 1, &catalog, UnarmoredDefense::construct);
        assert!(result.is_err());
    }

    #[test]
    fn test_sneak_attack_dice() {
        let catalog = catalog();
        for (hd, count) in [(1, 1), (2, 1), (3, 2), (10, 5), (11, 6)] {
            let feature = with_args("sneak_attack", &[], hd, &catalog, SneakAttack::construct).unwrap();
            let character = Character::new("seed", hd);
            assert_eq!(
                feature.cr_factors(&character),
                vec![CrFactor::EffectiveDamageMod(count as f64 * 3.5)]
            );
        }
    }

    #[test]
    fn test_expertise_picks_from_proficient_skills() {
        let catalog = catalog();
        let mut character = Character::new("seed", 3);
        character.skills.extend([Skill::Stealth, Skill::Perception, Skill::Survival]);
        character.add_feature(with_args("expertise", &["2"], 3, &catalog, Expertise::construct).unwrap());
        run(&mut character, &catalog, &[Pass::First, Pass::Second]);
        assert_eq!(character.skills_expertise.len(), 2);
        assert!(character.skills_expertise.is_subset(&character.skills));
    }

    #[test]
    fn test_expertise_degrades_when_few_skills() {
        let catalog = catalog();
        let mut character = Character::new("seed", 3);
        character.skills.insert(Skill::Stealth);
        character.add_feature(with_args("expertise", &["4"], 3, &catalog, Expertise::construct).unwrap());
        run(&mut character, &catalog, &[Pass::Second]);
        assert_eq!(character.skills_expertise.len(), 1);
    }

    #[test]
    fn test_extra_skills_are_new() {
        let catalog = catalog();
        let mut character = Character::new("seed", 3);
        character.skills.insert(Skill::Arcana);
        character.add_feature(with_args("extra_skills", &["2"], 3, &catalog, ExtraSkills::construct).unwrap());
        run(&mut character, &catalog, &[Pass::First]);
        assert_eq!(character.skills.len(), 3);
        assert!(character.skills.contains(&Skill::Arcana));
    }
}
