//! Unarmed fighting style for martial artists.

use npc_rules::{Attribute, Dice};

use super::{Feature, FeatureArgs, PassContext};
use crate::character::Character;
use crate::cr::CrFactor;
use crate::error::BuildError;
use crate::statblock::{EntryCategory, StatBlockEntry};

/// Weapon granted to every martial artist.
pub const UNARMED_STRIKE: &str = "unarmed_strike";

/// Character tag set while martial arts is active. Carries the die size.
pub const MARTIAL_ARTS_TAG: &str = "martial_arts";

/// Martial arts die size by hit dice.
pub fn martial_arts_die(hit_dice: u32) -> u32 {
    match hit_dice {
        0..=4 => 4,
        5..=10 => 6,
        11..=16 => 8,
        _ => 10,
    }
}

/// `martial_arts()`.
#[derive(Debug, Clone)]
pub struct MartialArts {
    key: String,
    die: Dice,
}

impl MartialArts {
    pub fn construct(args: &FeatureArgs<'_>) -> Result<Box<dyn Feature>, BuildError> {
        args.expect_no_more_than(0)?;
        Ok(Box::new(Self {
            key: args.key.to_string(),
            die: Dice::new(1, martial_arts_die(args.hit_dice)),
        }))
    }

    pub fn die(&self) -> Dice {
        self.die
    }
}

impl Feature for MartialArts {
    fn key(&self) -> &str {
        &self.key
    }

    fn first_pass(&mut self, ctx: &mut PassContext<'_>) -> Result<(), BuildError> {
        ctx.character.add_weapon(ctx.catalog.weapon(UNARMED_STRIKE)?);
        ctx.character
            .add_tag(MARTIAL_ARTS_TAG, vec![self.die.size.to_string()]);
        Ok(())
    }

    /// Weapons are all granted by now; upgrade the monk ones on this
    /// character's copies only.
    fn second_pass(&mut self, ctx: &mut PassContext<'_>) -> Result<(), BuildError> {
        for weapon in ctx.character.weapons.values_mut() {
            if !weapon.has_tag("monk") {
                continue;
            }
            weapon.tags.insert(MARTIAL_ARTS_TAG.to_string());
            if weapon.damage.count == 1 && weapon.damage.size < self.die.size {
                weapon.damage = self.die;
            }
        }
        Ok(())
    }

    /// One extra unarmed strike as a bonus action.
    fn cr_factors(&self, character: &Character) -> Vec<CrFactor> {
        let bonus = self.die.average() + character.stats.modifier(Attribute::Dex) as f64;
        vec![CrFactor::EffectiveDamageMod(bonus.max(1.0))]
    }

    fn stat_block_entries(&self, character: &Character) -> Vec<StatBlockEntry> {
        let text = format!(
            "The {} can use Dexterity instead of Strength for unarmed strikes and monk weapons, \
             which deal {} damage. When it attacks with one on its turn, it can make one unarmed \
             strike as a bonus action.",
            character.short_name(),
            self.die
        );
        vec![StatBlockEntry::new(EntryCategory::Passive, "Martial Arts", text)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::features::test_support::with_args;
    use crate::features::{run_pass, Pass};
    use npc_rules::Catalog;

    const CONTENT: &str = r#"
        [weapon.unarmed_strike]
        damage = "1d4"
        damage_type = "bludgeoning"
        tags = ["monk"]

        [weapon.quarterstaff]
        damage = "1d6"
        damage_type = "bludgeoning"
        tags = ["monk", "versatile"]

        [weapon.greatsword]
        damage = "2d6"
        damage_type = "slashing"
    "#;

    #[test]
    fn test_die_progression() {
        assert_eq!(martial_arts_die(1), 4);
        assert_eq!(martial_arts_die(5), 6);
        assert_eq!(martial_arts_die(11), 8);
        assert_eq!(martial_arts_die(17), 10);
    }

    #[test]
    fn test_upgrades_copies_not_templates() {
        let catalog = Catalog::from_toml_str(CONTENT).unwrap();
        let config = GeneratorConfig::default();
        let mut character = Character::new("seed", 11);
        character.add_weapon(catalog.weapon("quarterstaff").unwrap());
        character.add_weapon(catalog.weapon("greatsword").unwrap());
        let feature = with_args("martial_arts", &[], 11, &catalog, MartialArts::construct).unwrap();
        character.add_feature(feature);

        run_pass(&mut character, &catalog, &config, Pass::First).unwrap();
        run_pass(&mut character, &catalog, &config, Pass::Second).unwrap();

        let staff = &character.weapons["quarterstaff"];
        assert_eq!(staff.damage, Dice::new(1, 8));
        assert!(staff.has_tag(MARTIAL_ARTS_TAG));
        assert_eq!(character.weapons["unarmed_strike"].damage, Dice::new(1, 8));
        assert_eq!(character.weapons["greatsword"].damage, Dice::new(2, 6));
        assert!(character.has_tag(MARTIAL_ARTS_TAG));

        // The shared template is untouched.
        let template = catalog.weapon("quarterstaff").unwrap();
        assert_eq!(template.damage, Dice::new(1, 6));
        assert!(!template.has_tag(MARTIAL_ARTS_TAG));
    }

    #[test]
    fn test_bonus_action_damage_factor() {
        let catalog = Catalog::from_toml_str(CONTENT).unwrap();
        let feature = with_args("martial_arts", &[], 1, &catalog, MartialArts::construct).unwrap();
        let mut character = Character::new("seed", 1);
        character.stats.set("dex", 16);
        assert_eq!(
            feature.cr_factors(&character),
            vec![CrFactor::EffectiveDamageMod(5.5)]
        );
    }
}
