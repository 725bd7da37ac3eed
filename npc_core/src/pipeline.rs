//! The character assembly pipeline.
//!
//! [`Generator::new_character`] runs every stage in a fixed order:
//! 1. race and class templates (stats, proficiencies, loadout)
//! 2. trait and feature registration
//! 3. first pass
//! 4. attribute rolling and ASI
//! 5. derived stats, second and third pass, derived stats again
//! 6. armor choice and speeds
//! 7. fourth pass and finalize
//! 8. CR factors and statblock entries

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info_span};

use npc_rules::{
    ArchetypeCommon, Catalog, CatalogError, ContentKind, SubTemplate, UNARMORED,
};

use crate::asi::improve_attributes;
use crate::attributes::{roll_attributes, AttributeRollMethod};
use crate::character::Character;
use crate::config::GeneratorConfig;
use crate::error::BuildError;
use crate::features::{run_pass, FeatureArgs, FeatureRegistry, Pass, TraitFeature, SPELLCASTING_FEATURE};
use crate::loadout::{equip_loadout, get_random_loadout};
use crate::random::{choose, choose_distinct, fresh_seed, seeded_rng};
use crate::request::BuildRequest;
use crate::statblock::StatBlock;

/// Builds characters from a shared catalog.
#[derive(Debug, Clone)]
pub struct Generator {
    catalog: Arc<Catalog>,
    registry: FeatureRegistry,
    config: GeneratorConfig,
}

impl Generator {
    pub fn new(catalog: Arc<Catalog>, config: GeneratorConfig) -> Self {
        Self {
            catalog,
            registry: FeatureRegistry::with_builtins(),
            config,
        }
    }

    /// The built-in catalog with default configuration.
    pub fn with_defaults() -> Result<Self, BuildError> {
        Ok(Self::new(
            Arc::new(Catalog::builtin()?),
            GeneratorConfig::default(),
        ))
    }

    /// Replace the feature registry, e.g. to add custom features.
    pub fn with_registry(mut self, registry: FeatureRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn registry(&self) -> &FeatureRegistry {
        &self.registry
    }

    /// Build one character.
    pub fn new_character(&self, request: &BuildRequest) -> Result<Character, BuildError> {
        let seed = request.seed.clone().unwrap_or_else(fresh_seed);
        let span = info_span!(
            "build_character",
            seed = %seed,
            race = %request.race,
            class = %request.class,
            hit_dice = request.hit_dice_num
        );
        let _enter = span.enter();

        let method = AttributeRollMethod::preset(&request.attribute_roll_method)?;
        let catalog = self.catalog.as_ref();
        let race = catalog.race(&request.race)?;
        let class = catalog.class(&request.class)?;

        let mut character = Character::new(seed, request.hit_dice_num);
        character.name = request.name.clone();

        let subrace = pick_sub(
            &race.subraces,
            request.subrace.as_deref(),
            &character.seed,
            "subrace choice",
            ContentKind::Subrace,
        )?;
        let subclass = pick_sub(
            &class.subclasses,
            request.subclass.as_deref(),
            &character.seed,
            "subclass choice",
            ContentKind::Subclass,
        )?;

        // Race
        character.race_name = race.name.clone();
        character.race_display = race.display_name.clone();
        character.size = race.size;
        character.creature_type = race.creature_type.clone();
        for sense in &race.senses {
            character.add_sense(sense);
        }
        self.apply_common(&mut character, &race.common, &race.name);
        if let Some(sub) = subrace {
            character.subrace_name = Some(sub.name.clone());
            character.race_display = sub
                .display_name
                .clone()
                .unwrap_or_else(|| format!("{} {}", sub.name.replace('_', " "), race.display_name));
            self.apply_common(&mut character, &sub.common, &sub.name);
        }

        // Class
        character.class_name = class.name.clone();
        character.class_display = class.display_name.clone();
        character.stats.set("hit_dice_size", class.hit_dice_size as i32);
        self.apply_common(&mut character, &class.common, &class.name);
        if let Some(sub) = subclass {
            character.subclass_name = Some(sub.name.clone());
            if let Some(display) = &sub.display_name {
                character.class_display = display.clone();
            }
            self.apply_common(&mut character, &sub.common, &sub.name);
        }

        character.add_armor(catalog.armor(UNARMORED)?);
        if let Some(pool_name) = &class.loadout_pool {
            let pool = catalog.loadout_pool(pool_name)?;
            if let Some(loadout) = get_random_loadout(pool, &character.seed, &self.config) {
                equip_loadout(&mut character, loadout, catalog)?;
            }
        }

        // Features, in declaration order
        self.register(&mut character, &race.common)?;
        if let Some(sub) = subrace {
            self.register(&mut character, &sub.common)?;
        }
        if let Some(profile) = &class.spellcaster_profile {
            let args = [profile.clone()];
            let feature = self.registry.construct(&FeatureArgs {
                name: SPELLCASTING_FEATURE,
                key: SPELLCASTING_FEATURE,
                args: &args,
                ..self.feature_args(&character)
            })?;
            character.add_feature(feature);
        }
        self.register(&mut character, &class.common)?;
        if let Some(sub) = subclass {
            self.register(&mut character, &sub.common)?;
        }
        debug!(features = character.features.len(), "registered features");

        run_pass(&mut character, catalog, &self.config, Pass::First)?;

        roll_attributes(&mut character, &method, &self.config);
        improve_attributes(&mut character, &self.config);
        character.compute_derived_stats();

        run_pass(&mut character, catalog, &self.config, Pass::Second)?;
        run_pass(&mut character, catalog, &self.config, Pass::Third)?;
        character.compute_derived_stats();

        character.choose_armor();
        character.finalize_speeds();

        run_pass(&mut character, catalog, &self.config, Pass::Fourth)?;
        run_pass(&mut character, catalog, &self.config, Pass::Finalize)?;
        character.compute_derived_stats();
        character.refresh_armor_class();
        character.finalize_speeds();

        character.gather_cr_and_entries();
        debug!(
            cr = character.cr.as_ref().map(|c| c.label.as_str()).unwrap_or("-"),
            "built character"
        );
        Ok(character)
    }

    /// Build a character and render its statblock at the request's
    /// visibility.
    pub fn build_stat_block(&self, request: &BuildRequest) -> Result<StatBlock, BuildError> {
        let character = self.new_character(request)?;
        Ok(character.stat_block(request.visibility))
    }

    fn feature_args<'a>(&'a self, character: &'a Character) -> FeatureArgs<'a> {
        FeatureArgs {
            name: "",
            key: "",
            args: &[],
            seed: &character.seed,
            hit_dice: character.hit_dice(),
            catalog: &self.catalog,
            config: &self.config,
        }
    }

    /// Copy the data part of a race, class or variant onto the character.
    fn apply_common(&self, character: &mut Character, common: &ArchetypeCommon, owner: &str) {
        for (attribute, bonus) in &common.attribute_bonuses {
            *character.attribute_bonuses.entry(*attribute).or_insert(0) += bonus;
        }
        for (stat, value) in &common.base_stats {
            character.stats.set(stat.as_str(), *value);
        }
        for attribute in &common.priority_attributes {
            if !character.priority_attributes.contains(attribute) {
                character.priority_attributes.push(*attribute);
            }
        }
        character.skills.extend(common.skills.iter().copied());
        if common.random_skill_count > 0 {
            let pool: Vec<_> = common
                .random_skills
                .iter()
                .copied()
                .filter(|s| !character.skills.contains(s))
                .collect();
            let mut rng = seeded_rng(&character.seed, &format!("{}skill choice", owner));
            let picked = choose_distinct(&mut rng, &pool, common.random_skill_count as usize);
            character.skills.extend(picked);
        }
        character.saves.extend(common.saves.iter().copied());
        for language in &common.languages {
            character.add_language(language);
        }
        character
            .tool_proficiencies
            .extend(common.tools.iter().cloned());
    }

    /// Register traits, then declared features.
    fn register(&self, character: &mut Character, common: &ArchetypeCommon) -> Result<(), BuildError> {
        for name in &common.traits {
            let template = self.catalog.trait_template(name)?;
            character.add_feature(Box::new(TraitFeature::new(template)?));
        }
        for spec in &common.features {
            let feature = self
                .registry
                .construct_spec(spec, self.feature_args(character))?;
            character.add_feature(feature);
        }
        Ok(())
    }
}

/// The requested variant, or a seeded pick when none was requested.
fn pick_sub<'a>(
    variants: &'a BTreeMap<String, SubTemplate>,
    requested: Option<&str>,
    seed: &str,
    label: &str,
    kind: ContentKind,
) -> Result<Option<&'a SubTemplate>, CatalogError> {
    if let Some(name) = requested {
        return variants
            .get(name)
            .map(Some)
            .ok_or_else(|| CatalogError::not_found(kind, name));
    }
    let names: Vec<&String> = variants.keys().collect();
    let mut rng = seeded_rng(seed, label);
    Ok(choose(&mut rng, &names).and_then(|name| variants.get(*name)))
}
