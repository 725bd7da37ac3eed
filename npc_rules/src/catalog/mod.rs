//! The content catalog - the read-only store every character build draws from.
//!
//! A catalog is assembled once from one or more TOML documents, validated,
//! and then shared (typically behind an `Arc`) by any number of concurrent
//! builds. Nothing in it changes after loading.

mod loader;

pub use loader::*;

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::error::{CatalogError, ContentKind};
use crate::templates::{
    ArmorTemplate, ClassTemplate, LoadoutPool, RaceTemplate, Spell, SpellList, SpellListDef,
    SpellcasterProfile, TraitTemplate, WeaponTemplate,
};

/// Name of the armor every character can fall back to.
pub const UNARMORED: &str = "unarmored";

/// Name of the stacking armor granted by the mage armor spell.
pub const MAGE_ARMOR: &str = "mage_armor";

const BUILTIN_DOCUMENTS: [&str; 5] = [
    include_str!("../../content/equipment.toml"),
    include_str!("../../content/traits.toml"),
    include_str!("../../content/spells.toml"),
    include_str!("../../content/races.toml"),
    include_str!("../../content/classes.toml"),
];

/// Immutable lookup tables of every content kind, keyed by internal name.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    armors: BTreeMap<String, Arc<ArmorTemplate>>,
    weapons: BTreeMap<String, Arc<WeaponTemplate>>,
    traits: BTreeMap<String, Arc<TraitTemplate>>,
    races: BTreeMap<String, Arc<RaceTemplate>>,
    classes: BTreeMap<String, Arc<ClassTemplate>>,
    spells: BTreeMap<String, Arc<Spell>>,
    spell_list_defs: BTreeMap<String, SpellListDef>,
    spell_lists: BTreeMap<String, Arc<SpellList>>,
    spellcasters: BTreeMap<String, Arc<SpellcasterProfile>>,
    loadout_pools: BTreeMap<String, Arc<LoadoutPool>>,
}

fn lookup<'a, T>(
    map: &'a BTreeMap<String, Arc<T>>,
    kind: ContentKind,
    name: &str,
) -> Result<&'a Arc<T>, CatalogError> {
    map.get(name)
        .ok_or_else(|| CatalogError::not_found(kind, name))
}

impl Catalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// The content shipped with this crate, validated.
    pub fn builtin() -> Result<Self, CatalogError> {
        let mut catalog = Self::new();
        for document in BUILTIN_DOCUMENTS {
            catalog.merge_toml_str(document)?;
        }
        catalog.validate()?;
        debug!(
            races = catalog.races.len(),
            classes = catalog.classes.len(),
            spells = catalog.spells.len(),
            "loaded builtin catalog"
        );
        Ok(catalog)
    }

    /// Parse a single content document into a fresh catalog.
    pub fn from_toml_str(document: &str) -> Result<Self, CatalogError> {
        let mut catalog = Self::new();
        catalog.merge_toml_str(document)?;
        Ok(catalog)
    }

    pub fn armor(&self, name: &str) -> Result<&Arc<ArmorTemplate>, CatalogError> {
        lookup(&self.armors, ContentKind::Armor, name)
    }

    pub fn weapon(&self, name: &str) -> Result<&Arc<WeaponTemplate>, CatalogError> {
        lookup(&self.weapons, ContentKind::Weapon, name)
    }

    pub fn trait_template(&self, name: &str) -> Result<&Arc<TraitTemplate>, CatalogError> {
        lookup(&self.traits, ContentKind::Trait, name)
    }

    pub fn race(&self, name: &str) -> Result<&Arc<RaceTemplate>, CatalogError> {
        lookup(&self.races, ContentKind::Race, name)
    }

    pub fn class(&self, name: &str) -> Result<&Arc<ClassTemplate>, CatalogError> {
        lookup(&self.classes, ContentKind::Class, name)
    }

    pub fn spell(&self, name: &str) -> Result<&Arc<Spell>, CatalogError> {
        lookup(&self.spells, ContentKind::Spell, name)
    }

    pub fn spell_list(&self, name: &str) -> Result<&Arc<SpellList>, CatalogError> {
        lookup(&self.spell_lists, ContentKind::SpellList, name)
    }

    pub fn spellcaster(&self, name: &str) -> Result<&Arc<SpellcasterProfile>, CatalogError> {
        lookup(&self.spellcasters, ContentKind::Spellcaster, name)
    }

    pub fn loadout_pool(&self, name: &str) -> Result<&Arc<LoadoutPool>, CatalogError> {
        lookup(&self.loadout_pools, ContentKind::LoadoutPool, name)
    }

    /// Race names in sorted order.
    pub fn race_names(&self) -> impl Iterator<Item = &str> {
        self.races.keys().map(String::as_str)
    }

    /// Class names in sorted order.
    pub fn class_names(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }

    /// Races carrying a category label.
    pub fn races_in_category<'a>(
        &'a self,
        category: &'a str,
    ) -> impl Iterator<Item = &'a Arc<RaceTemplate>> + 'a {
        self.races
            .values()
            .filter(move |r| r.common.has_category(category))
    }

    /// Classes carrying a category label.
    pub fn classes_in_category<'a>(
        &'a self,
        category: &'a str,
    ) -> impl Iterator<Item = &'a Arc<ClassTemplate>> + 'a {
        self.classes
            .values()
            .filter(move |c| c.common.has_category(category))
    }

    /// All spells in name order.
    pub fn spells(&self) -> impl Iterator<Item = &Arc<Spell>> {
        self.spells.values()
    }

    /// Check that every cross-template reference resolves.
    pub fn validate(&self) -> Result<(), CatalogError> {
        for race in self.races.values() {
            self.check_traits(ContentKind::Race, &race.name, &race.common.traits)?;
            for sub in race.subraces.values() {
                self.check_traits(ContentKind::Subrace, &sub.name, &sub.common.traits)?;
            }
        }

        for class in self.classes.values() {
            self.check_traits(ContentKind::Class, &class.name, &class.common.traits)?;
            for sub in class.subclasses.values() {
                self.check_traits(ContentKind::Subclass, &sub.name, &sub.common.traits)?;
            }
            if let Some(pool) = &class.loadout_pool {
                if !self.loadout_pools.contains_key(pool) {
                    return Err(CatalogError::invalid_reference(
                        ContentKind::Class,
                        &class.name,
                        ContentKind::LoadoutPool,
                        pool,
                    ));
                }
            }
            if let Some(profile) = &class.spellcaster_profile {
                if !self.spellcasters.contains_key(profile) {
                    return Err(CatalogError::invalid_reference(
                        ContentKind::Class,
                        &class.name,
                        ContentKind::Spellcaster,
                        profile,
                    ));
                }
            }
        }

        for profile in self.spellcasters.values() {
            for list in profile.spell_lists.keys().chain(&profile.free_spell_lists) {
                if !self.spell_lists.contains_key(list) {
                    return Err(CatalogError::invalid_reference(
                        ContentKind::Spellcaster,
                        &profile.name,
                        ContentKind::SpellList,
                        list,
                    ));
                }
            }
        }

        for pool in self.loadout_pools.values() {
            for loadout in &pool.loadouts {
                for armor in &loadout.armors {
                    if !self.armors.contains_key(armor) {
                        return Err(CatalogError::invalid_reference(
                            ContentKind::LoadoutPool,
                            &pool.name,
                            ContentKind::Armor,
                            armor,
                        ));
                    }
                }
                for weapon in &loadout.weapons {
                    if !self.weapons.contains_key(weapon) {
                        return Err(CatalogError::invalid_reference(
                            ContentKind::LoadoutPool,
                            &pool.name,
                            ContentKind::Weapon,
                            weapon,
                        ));
                    }
                }
            }
        }

        for template in self.traits.values() {
            for armor in template.tag_args("give_armor") {
                if !self.armors.contains_key(armor) {
                    return Err(CatalogError::invalid_reference(
                        ContentKind::Trait,
                        &template.name,
                        ContentKind::Armor,
                        armor,
                    ));
                }
            }
            for weapon in template.tag_args("give_weapon") {
                if !self.weapons.contains_key(weapon) {
                    return Err(CatalogError::invalid_reference(
                        ContentKind::Trait,
                        &template.name,
                        ContentKind::Weapon,
                        weapon,
                    ));
                }
            }
        }

        Ok(())
    }

    fn check_traits(
        &self,
        kind: ContentKind,
        owner: &str,
        traits: &[String],
    ) -> Result<(), CatalogError> {
        match traits.iter().find(|t| !self.traits.contains_key(*t)) {
            Some(missing) => Err(CatalogError::invalid_reference(
                kind,
                owner,
                ContentKind::Trait,
                missing,
            )),
            None => Ok(()),
        }
    }
}
