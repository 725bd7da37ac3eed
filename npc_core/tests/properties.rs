//! Invariants that must hold for any seed.

use std::sync::Arc;

use npc_core::{estimate_cr, BuildRequest, CrFactor, CrInputs, Generator, GeneratorConfig};
use npc_rules::{Attribute, Catalog, CR_MAX_INDEX, CR_TABLE};
use proptest::prelude::*;

const PORTER: &str = r#"
    [class.porter]
    display_name = "porter"
    loadout_pool = "porter"
    priority_attributes = ["int", "wis", "cha"]
    base_stats = { walk_speed_bonus = -25, swim_speed_base = 5 }

    [loadout_pool.porter]
    loadouts = [{ weapons = ["club"], armors = ["plate"] }]
"#;

fn porter_generator() -> Generator {
    let mut catalog = Catalog::builtin().unwrap();
    catalog.merge_toml_str(PORTER).unwrap();
    catalog.validate().unwrap();
    Generator::new(Arc::new(catalog), GeneratorConfig::default())
}

fn factor_strategy() -> impl Strategy<Value = CrFactor> {
    prop_oneof![
        (-5..40i32, 0.0..2000.0f64).prop_map(|(to_hit, damage)| CrFactor::Attack { to_hit, damage }),
        (-5..60i32, 0..40i32).prop_map(|(level, dc)| CrFactor::Ability { level, dc }),
        (-10.0..10.0f64).prop_map(CrFactor::EffectiveDamageMod),
        (-5..5i32).prop_map(CrFactor::EffectiveAcMod),
        (-50..50i32).prop_map(CrFactor::EffectiveHpMod),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn test_3d6_scores_stay_in_dice_range(seed in "[a-z0-9]{1,12}", hit_dice in 1u32..4) {
        let generator = Generator::with_defaults().unwrap();
        let request = BuildRequest::new("humanoid", "thug", hit_dice)
            .with_seed(seed)
            .with_roll_method("3d6");
        let character = generator.new_character(&request).unwrap();

        prop_assert_eq!(character.raw_attribute_rolls.len(), 6);
        for value in &character.raw_attribute_rolls {
            prop_assert!((3..=18).contains(value));
        }
        // Humanoids get no racial bonus and nothing improves before 4 HD.
        for attribute in Attribute::ALL {
            prop_assert!((3..=18).contains(&character.stats.score(attribute)));
        }
    }

    #[test]
    fn test_improvements_respect_attribute_cap(
        seed in "[a-z0-9]{1,12}",
        race in prop::sample::select(vec!["humanoid", "orc", "half_elf", "dwarf"]),
        method in prop::sample::select(vec!["4d6", "heroic", "3d6"]),
    ) {
        let generator = Generator::with_defaults().unwrap();
        let cap = generator.config().attribute_cap;
        let request = BuildRequest::new(race, "soldier", 20)
            .with_seed(seed)
            .with_roll_method(method);
        let character = generator.new_character(&request).unwrap();

        for attribute in Attribute::ALL {
            prop_assert!(character.stats.score(attribute) <= cap);
        }
    }

    #[test]
    fn test_speeds_never_negative_under_heavy_armor(seed in "[a-z0-9]{1,12}", hit_dice in 1u32..8) {
        let generator = porter_generator();
        let request = BuildRequest::new("humanoid", "porter", hit_dice)
            .with_seed(seed)
            .with_roll_method("3d6");
        let character = generator.new_character(&request).unwrap();

        prop_assert_eq!(character.chosen_armor.as_deref(), Some("plate"));
        for mode in ["walk", "fly", "swim", "climb", "burrow"] {
            let key = format!("{}_speed", mode);
            prop_assert!(character.stats.get(&key) >= 0);
        }
        if character.stats.score(Attribute::Str) < 15 {
            prop_assert_eq!(character.stats.get("walk_speed"), 0);
            prop_assert_eq!(character.stats.get("swim_speed"), 0);
        } else {
            prop_assert_eq!(character.stats.get("walk_speed"), 5);
            prop_assert_eq!(character.stats.get("swim_speed"), 5);
        }
    }

    #[test]
    fn test_cr_index_stays_in_table(
        hit_points in -100..5000i32,
        armor_class in -5..40i32,
        proficiency in 0..12i32,
        factors in prop::collection::vec(factor_strategy(), 0..6),
    ) {
        let estimate = estimate_cr(
            CrInputs { hit_points, armor_class, proficiency },
            &factors,
        );
        prop_assert!((0..=CR_MAX_INDEX).contains(&estimate.index));
        prop_assert_eq!(estimate.label.as_str(), CR_TABLE[estimate.index as usize].label);
    }
}

#[test]
fn test_cr_clamps_at_both_ends() {
    let weakling = estimate_cr(
        CrInputs {
            hit_points: 1,
            armor_class: 0,
            proficiency: 2,
        },
        &[],
    );
    assert_eq!(weakling.index, 0);
    assert_eq!(weakling.label, "0");

    let titan = estimate_cr(
        CrInputs {
            hit_points: 100_000,
            armor_class: 40,
            proficiency: 9,
        },
        &[CrFactor::Attack {
            to_hit: 30,
            damage: 10_000.0,
        }],
    );
    assert_eq!(titan.index, CR_MAX_INDEX);
    assert_eq!(titan.label, "30");
}
