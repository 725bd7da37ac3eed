//! TOML content documents and spell-list resolution.

use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use super::Catalog;
use crate::error::{CatalogError, ContentKind};
use crate::templates::{
    display_from_internal, ArmorTemplate, ClassTemplate, LoadoutPool, RaceTemplate, Spell,
    SpellList, SpellListDef, SpellcasterProfile, TraitTemplate, WeaponTemplate,
};

/// Default weight for a spell list that does not declare one.
pub const DEFAULT_SPELL_LIST_WEIGHT: f64 = 1.0;

/// One content document. Every table is optional so content can be split
/// across files freely.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CatalogDocument {
    pub armor: BTreeMap<String, ArmorTemplate>,
    pub weapon: BTreeMap<String, WeaponTemplate>,
    #[serde(rename = "trait")]
    pub traits: BTreeMap<String, TraitTemplate>,
    pub race: BTreeMap<String, RaceTemplate>,
    pub class: BTreeMap<String, ClassTemplate>,
    pub spell: BTreeMap<String, Spell>,
    pub spell_list: BTreeMap<String, SpellListDef>,
    pub spellcaster: BTreeMap<String, SpellcasterProfile>,
    pub loadout_pool: BTreeMap<String, LoadoutPool>,
}

fn fill_display(display_name: &mut String, name: &str) {
    if display_name.is_empty() {
        *display_name = display_from_internal(name);
    }
}

impl Catalog {
    /// Layer another document on top of this catalog. Entries replace
    /// existing entries of the same kind and name. Spell lists are
    /// re-resolved afterwards.
    pub fn merge_toml_str(&mut self, document: &str) -> Result<(), CatalogError> {
        let document: CatalogDocument = toml::from_str(document)?;
        self.merge_document(document)
    }

    /// Layer an already-parsed document on top of this catalog.
    pub fn merge_document(&mut self, document: CatalogDocument) -> Result<(), CatalogError> {
        for (name, mut armor) in document.armor {
            armor.name = name.clone();
            fill_display(&mut armor.display_name, &name);
            self.armors.insert(name, Arc::new(armor));
        }
        for (name, mut weapon) in document.weapon {
            weapon.name = name.clone();
            fill_display(&mut weapon.display_name, &name);
            self.weapons.insert(name, Arc::new(weapon));
        }
        for (name, mut template) in document.traits {
            template.name = name.clone();
            fill_display(&mut template.display_name, &name);
            self.traits.insert(name, Arc::new(template));
        }
        for (name, mut race) in document.race {
            race.name = name.clone();
            for (sub_name, sub) in race.subraces.iter_mut() {
                sub.name = sub_name.clone();
            }
            self.races.insert(name, Arc::new(race));
        }
        for (name, mut class) in document.class {
            class.name = name.clone();
            for (sub_name, sub) in class.subclasses.iter_mut() {
                sub.name = sub_name.clone();
            }
            self.classes.insert(name, Arc::new(class));
        }
        for (name, mut spell) in document.spell {
            if spell.level > 9 {
                return Err(CatalogError::invalid_value(
                    format!("spell.{}.level", name),
                    spell.level.to_string(),
                ));
            }
            spell.name = name.clone();
            fill_display(&mut spell.display_name, &name);
            self.spells.insert(name, Arc::new(spell));
        }
        for (name, mut profile) in document.spellcaster {
            if profile.hd_per_casting_level == 0 {
                return Err(CatalogError::invalid_value(
                    format!("spellcaster.{}.hd_per_casting_level", name),
                    "0",
                ));
            }
            profile.name = name.clone();
            self.spellcasters.insert(name, Arc::new(profile));
        }
        for (name, mut pool) in document.loadout_pool {
            pool.name = name.clone();
            self.loadout_pools.insert(name, Arc::new(pool));
        }
        self.spell_list_defs.extend(document.spell_list);

        self.resolve_spell_lists()
    }

    /// Rebuild every resolved spell list from its definition.
    fn resolve_spell_lists(&mut self) -> Result<(), CatalogError> {
        let mut resolved: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for name in self.spell_list_defs.keys() {
            let mut stack = Vec::new();
            self.resolve_members(name, &mut resolved, &mut stack)?;
        }

        self.spell_lists = resolved
            .into_iter()
            .map(|(name, members)| {
                let weight = self
                    .spell_list_defs
                    .get(&name)
                    .and_then(|d| d.weight)
                    .unwrap_or(DEFAULT_SPELL_LIST_WEIGHT);
                let spells = members
                    .iter()
                    .filter_map(|spell| self.spells.get(spell).cloned())
                    .collect();
                let list = SpellList {
                    name: name.clone(),
                    weight,
                    spells,
                };
                (name, Arc::new(list))
            })
            .collect();

        Ok(())
    }

    fn resolve_members(
        &self,
        name: &str,
        resolved: &mut BTreeMap<String, BTreeSet<String>>,
        stack: &mut Vec<String>,
    ) -> Result<BTreeSet<String>, CatalogError> {
        if let Some(members) = resolved.get(name) {
            return Ok(members.clone());
        }
        if stack.iter().any(|n| n == name) {
            return Err(CatalogError::SpellListCycle {
                name: name.to_string(),
            });
        }
        let def = self
            .spell_list_defs
            .get(name)
            .ok_or_else(|| CatalogError::not_found(ContentKind::SpellList, name))?;

        stack.push(name.to_string());

        let mut members = BTreeSet::new();

        // Step 1: derived membership
        if let Some(filter) = &def.auto {
            members.extend(
                self.spells
                    .values()
                    .filter(|s| filter.matches(s))
                    .map(|s| s.name.clone()),
            );
        }

        // Step 2: explicit includes
        for spell in &def.include {
            if !self.spells.contains_key(spell) {
                return Err(CatalogError::invalid_reference(
                    ContentKind::SpellList,
                    name,
                    ContentKind::Spell,
                    spell,
                ));
            }
            members.insert(spell.clone());
        }

        // Step 3: composed lists
        for other in &def.compose {
            if !self.spell_list_defs.contains_key(other) {
                return Err(CatalogError::invalid_reference(
                    ContentKind::SpellList,
                    name,
                    ContentKind::SpellList,
                    other,
                ));
            }
            members.extend(self.resolve_members(other, resolved, stack)?);
        }

        // Step 4: exclusions win over everything else
        for spell in &def.exclude {
            members.remove(spell);
        }

        stack.pop();
        resolved.insert(name.to_string(), members.clone());
        Ok(members)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPELLS: &str = r#"
        [spell.fire_bolt]
        level = 0
        school = "evocation"
        classes = ["wizard"]

        [spell.magic_missile]
        level = 1
        school = "evocation"
        classes = ["wizard"]

        [spell.sleep]
        level = 1
        school = "enchantment"
        classes = ["wizard", "bard"]

        [spell.cure_wounds]
        level = 1
        school = "evocation"
        classes = ["cleric"]
    "#;

    fn catalog_with(lists: &str) -> Result<Catalog, CatalogError> {
        let mut catalog = Catalog::from_toml_str(SPELLS)?;
        catalog.merge_toml_str(lists)?;
        Ok(catalog)
    }

    #[test]
    fn test_auto_membership() {
        let catalog = catalog_with(
            r#"
            [spell_list.wizard]
            auto = { classes = ["wizard"] }
            "#,
        )
        .unwrap();
        let list = catalog.spell_list("wizard").unwrap();
        let names: Vec<_> = list.spells.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["fire_bolt", "magic_missile", "sleep"]);
        assert_eq!(list.weight, DEFAULT_SPELL_LIST_WEIGHT);
    }

    #[test]
    fn test_include_exclude_and_compose() {
        let catalog = catalog_with(
            r#"
            [spell_list.evokers]
            auto = { schools = ["evocation"] }
            exclude = ["cure_wounds"]

            [spell_list.mixed]
            weight = 2.5
            compose = ["evokers"]
            include = ["sleep"]
            exclude = ["fire_bolt"]
            "#,
        )
        .unwrap();
        let mixed = catalog.spell_list("mixed").unwrap();
        let names: Vec<_> = mixed.spells.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["magic_missile", "sleep"]);
        assert_eq!(mixed.weight, 2.5);
    }

    #[test]
    fn test_compose_cycle_is_rejected() {
        let result = catalog_with(
            r#"
            [spell_list.a]
            compose = ["b"]

            [spell_list.b]
            compose = ["a"]
            "#,
        );
        assert!(matches!(result, Err(CatalogError::SpellListCycle { .. })));
    }

    #[test]
    fn test_unknown_include_is_rejected() {
        let result = catalog_with(
            r#"
            [spell_list.a]
            include = ["wish"]
            "#,
        );
        assert!(matches!(result, Err(CatalogError::InvalidReference { .. })));
    }

    #[test]
    fn test_display_names_are_filled() {
        let catalog = Catalog::from_toml_str(
            r#"
            [armor.studded_leather]
            base_ac = 12
            category = "light"
            "#,
        )
        .unwrap();
        let armor = catalog.armor("studded_leather").unwrap();
        assert_eq!(armor.name, "studded_leather");
        assert_eq!(armor.display_name, "studded leather");
    }

    #[test]
    fn test_parse_error_is_reported() {
        assert!(matches!(
            Catalog::from_toml_str("[armor.broken]\nbase_ac = \"high\""),
            Err(CatalogError::Parse(_))
        ));
    }
}
