//! End-to-end builds and small fixtures around feature ordering.

use npc_core::character::Character;
use npc_core::features::{run_pass, DivineDomain, Pass};
use npc_core::{BuildRequest, FeatureArgs, Generator, GeneratorConfig, SpellcastingFeature};
use npc_rules::Catalog;
use rstest::{fixture, rstest};

#[fixture]
fn generator() -> Generator {
    Generator::with_defaults().unwrap()
}

#[rstest]
fn test_soldier_scenario(generator: Generator) {
    let request = BuildRequest::new("humanoid", "soldier", 5)
        .with_seed("test1")
        .with_roll_method("3d6");
    let character = generator.new_character(&request).unwrap();

    assert_eq!(character.stats.get("proficiency"), 3);
    let granted = ["chain_mail", "scale_mail", "chain_shirt", "ring_mail", "unarmored"];
    let chosen = character.chosen_armor.as_deref().unwrap();
    assert!(granted.contains(&chosen), "unexpected armor {}", chosen);
    assert!(character.raw_attribute_rolls.iter().all(|v| (3..=18).contains(v)));
    assert_eq!(character.stats.get("attacks_per_round"), 2);
    assert!(character.cr.is_some());

    let block = character.stat_block(1);
    assert_eq!(block.proficiency, "+3");
    assert!(block.multiattack[0].text.contains("two weapon attacks"));
    assert!(!block.attacks.is_empty());
}

#[rstest]
#[case("humanoid", "priest")]
#[case("elf", "cultist")]
#[case("half_elf", "mage")]
fn test_casters_render_spellcasting(generator: Generator, #[case] race: &str, #[case] class: &str) {
    let request = BuildRequest::new(race, class, 7).with_seed("casters");
    let block = generator.build_stat_block(&request).unwrap();
    assert_eq!(block.spellcasting.len(), 1);
    assert!(block.spellcasting[0].text.contains("spellcaster"));
}

#[rstest]
fn test_cultist_has_pact_slots_and_blast(generator: Generator) {
    let request = BuildRequest::new("humanoid", "cultist", 5).with_seed("pact");
    let character = generator.new_character(&request).unwrap();
    let spellcaster = character.find_spellcaster().unwrap();
    assert!(spellcaster.is_readied("eldritch_blast"));
    let block = character.stat_block(1);
    assert!(block.spellcasting[0].text.contains("short or long rest"));
    let blast = block
        .attacks
        .iter()
        .find(|a| a.title == "Eldritch Blast (Cantrip)")
        .unwrap();
    assert!(blast.text.contains("two beams"));
}

#[rstest]
fn test_martial_artist_uses_unarmored_defense(generator: Generator) {
    let request = BuildRequest::new("humanoid", "martial_artist", 5).with_seed("monk");
    let character = generator.new_character(&request).unwrap();
    assert!(character.weapons.contains_key("unarmed_strike"));
    assert!(character.armors.contains_key("unarmored_defense"));
    assert!(character.has_tag("martial_arts"));
}

const DOMAIN_FIXTURE: &str = r#"
    [spell.sacred_flame]
    level = 0
    school = "evocation"
    classes = ["cleric"]

    [spell.guiding_bolt]
    level = 1
    school = "evocation"
    classes = ["cleric"]

    [spell.shield_of_faith]
    level = 1
    school = "abjuration"

    [spell_list.cleric]
    auto = { classes = ["cleric"] }

    [spell_list.light_domain]
    include = ["shield_of_faith"]

    [spellcaster.cleric]
    casting_stat = "wis"
    cantrips = "standard"
    spell_lists = { cleric = 1.0 }
"#;

#[test]
fn test_domain_free_list_reaches_spellcasting_by_third_pass() {
    let catalog = Catalog::from_toml_str(DOMAIN_FIXTURE).unwrap();
    let config = GeneratorConfig::default();
    let mut character = Character::new("domain seed", 3);
    character.stats.set("wis", 14);
    character.compute_derived_stats();

    let caster_args = ["cleric".to_string()];
    let base = FeatureArgs {
        name: "spellcasting",
        key: "spellcasting",
        args: &caster_args,
        seed: "domain seed",
        hit_dice: 3,
        catalog: &catalog,
        config: &config,
    };
    character.add_feature(SpellcastingFeature::construct(&base).unwrap());
    let domain_args = ["light".to_string()];
    character.add_feature(
        DivineDomain::construct(&FeatureArgs {
            name: "divine_domain",
            key: "divine_domain",
            args: &domain_args,
            ..base
        })
        .unwrap(),
    );

    run_pass(&mut character, &catalog, &config, Pass::First).unwrap();
    assert_eq!(
        character.find_spellcaster().unwrap().free_spell_lists(),
        ["light_domain".to_string()]
    );

    run_pass(&mut character, &catalog, &config, Pass::Second).unwrap();
    run_pass(&mut character, &catalog, &config, Pass::Third).unwrap();
    let spellcaster = character.find_spellcaster().unwrap();
    assert!(spellcaster.is_free("shield_of_faith"));
    assert!(spellcaster.is_readied("shield_of_faith"));
}

#[test]
fn test_domain_without_spellcaster_is_fatal() {
    let catalog = Catalog::from_toml_str(DOMAIN_FIXTURE).unwrap();
    let config = GeneratorConfig::default();
    let mut character = Character::new("domain seed", 3);
    let args = ["light".to_string()];
    character.add_feature(
        DivineDomain::construct(&FeatureArgs {
            name: "divine_domain",
            key: "divine_domain",
            args: &args,
            seed: "domain seed",
            hit_dice: 3,
            catalog: &catalog,
            config: &config,
        })
        .unwrap(),
    );
    assert!(run_pass(&mut character, &catalog, &config, Pass::First).is_err());
}

const SMALL_LIST: &str = r#"
    [spell.a1]
    level = 1
    school = "evocation"
    classes = ["tiny"]

    [spell.b1]
    level = 1
    school = "evocation"
    classes = ["tiny"]

    [spell.c2]
    level = 2
    school = "evocation"
    classes = ["tiny"]

    [spell.d3]
    level = 3
    school = "evocation"
    classes = ["tiny"]

    [spell.e5]
    level = 5
    school = "evocation"
    classes = ["tiny"]

    [spell_list.tiny]
    auto = { classes = ["tiny"] }

    [spellcaster.tiny]
    casting_stat = "int"
    spell_lists = { tiny = 1.0 }
"#;

#[rstest]
fn test_readied_count_is_min_of_budget_and_candidates(
    #[values(1, 2, 3, 5, 9, 17)] hit_dice: u32,
    #[values(6, 10, 16, 20)] int: i32,
) {
    let catalog = Catalog::from_toml_str(SMALL_LIST).unwrap();
    let config = GeneratorConfig::default();
    let mut character = Character::new("small list", hit_dice);
    character.stats.set("int", int);
    character.compute_derived_stats();
    let args = ["tiny".to_string()];
    character.add_feature(
        SpellcastingFeature::construct(&FeatureArgs {
            name: "spellcasting",
            key: "spellcasting",
            args: &args,
            seed: "small list",
            hit_dice,
            catalog: &catalog,
            config: &config,
        })
        .unwrap(),
    );
    run_pass(&mut character, &catalog, &config, Pass::Third).unwrap();

    let spellcaster = character.find_spellcaster().unwrap();
    let max_level = spellcaster.slots().max_level();
    let candidates: usize = (1..=max_level).map(|l| spellcaster.choices_at(l).len()).sum();
    let readied = spellcaster
        .readied_spells()
        .filter(|s| s.level > 0 && !spellcaster.is_free(&s.name))
        .count();
    assert_eq!(readied, (spellcaster.budget() as usize).min(candidates));
}
