//! The implicit feature behind every template trait.
//!
//! Traits are mostly text, but their tag map can also grant equipment,
//! proficiencies, defenses, character tags and flat stat bonuses. Tags the
//! engine does not interpret are left alone so content can carry data for
//! other consumers.

use std::sync::Arc;

use npc_rules::{DamageType, Skill, TraitCategory, TraitTemplate};
use tracing::debug;

use super::{Feature, FeatureArgs, PassContext};
use crate::character::Character;
use crate::cr::CrFactor;
use crate::error::BuildError;
use crate::statblock::{title_case, EntryCategory, StatBlockEntry};

/// A trait template bound to one character.
#[derive(Debug, Clone)]
pub struct TraitFeature {
    key: String,
    template: Arc<TraitTemplate>,
}

impl TraitFeature {
    /// Bind a template. CR modifier tags are checked here so a bad number
    /// fails the build instead of dropping out of the estimate.
    pub fn new(template: &Arc<TraitTemplate>) -> Result<Self, BuildError> {
        let feature = Self {
            key: template.name.clone(),
            template: Arc::clone(template),
        };
        for tag in ["cr_hp_mod", "cr_ac_mod", "cr_damage_mod"] {
            if feature.template.has_tag(tag) {
                feature.integer(tag)?;
            }
        }
        Ok(feature)
    }

    /// Registry constructor: `trait(name)`.
    pub fn construct(args: &FeatureArgs<'_>) -> Result<Box<dyn Feature>, BuildError> {
        args.expect_no_more_than(1)?;
        let template = args.catalog.trait_template(args.required(0)?)?;
        Ok(Box::new(Self::new(template)?))
    }

    pub fn template(&self) -> &TraitTemplate {
        &self.template
    }

    fn malformed(&self, tag: &str, reason: impl Into<String>) -> BuildError {
        BuildError::malformed(
            format!("trait {}", self.template.name),
            format!("tag '{}': {}", tag, reason.into()),
        )
    }

    fn damage_types(&self, tag: &str) -> Result<Vec<DamageType>, BuildError> {
        self.template
            .tag_args(tag)
            .iter()
            .map(|arg| arg.parse().map_err(|e| self.malformed(tag, format!("{}", e))))
            .collect()
    }

    fn skills(&self, tag: &str) -> Result<Vec<Skill>, BuildError> {
        self.template
            .tag_args(tag)
            .iter()
            .map(|arg| arg.parse().map_err(|e| self.malformed(tag, format!("{}", e))))
            .collect()
    }

    fn integer(&self, tag: &str) -> Result<i32, BuildError> {
        let args = self.template.tag_args(tag);
        let [value] = args else {
            return Err(self.malformed(tag, "expected exactly one number"));
        };
        value
            .parse()
            .map_err(|_| self.malformed(tag, format!("'{}' is not a number", value)))
    }
}

impl Feature for TraitFeature {
    fn key(&self) -> &str {
        &self.key
    }

    fn first_pass(&mut self, ctx: &mut PassContext<'_>) -> Result<(), BuildError> {
        let character = &mut *ctx.character;

        for armor in self.template.tag_args("give_armor") {
            character.add_armor(ctx.catalog.armor(armor)?);
        }
        for weapon in self.template.tag_args("give_weapon") {
            character.add_weapon(ctx.catalog.weapon(weapon)?);
        }

        for damage in self.damage_types("damage_resistance")? {
            character.damage_resistances.insert(damage);
        }
        for damage in self.damage_types("damage_immunity")? {
            character.damage_immunities.insert(damage);
        }
        for damage in self.damage_types("damage_vulnerability")? {
            character.damage_vulnerabilities.insert(damage);
        }
        for condition in self.template.tag_args("condition_immunity") {
            character.condition_immunities.insert(condition.clone());
        }

        for skill in self.skills("skill")? {
            character.skills.insert(skill);
        }
        for skill in self.skills("expertise")? {
            character.skills.insert(skill);
            character.skills_expertise.insert(skill);
        }
        for tool in self.template.tag_args("tool") {
            character.tool_proficiencies.insert(tool.clone());
        }
        for language in self.template.tag_args("language") {
            character.add_language(language);
        }
        for sense in self.template.tag_args("sense") {
            character.add_sense(sense);
        }
        for condition in self.template.tag_args("save_advantage") {
            character.save_advantages.insert(condition.clone());
        }
        for condition in self.template.tag_args("save_disadvantage") {
            character.save_disadvantages.insert(condition.clone());
        }
        for tag in self.template.tag_args("character_tag") {
            character.add_tag(tag, Vec::new());
        }

        let bonus = self.template.tag_args("stat_bonus");
        if !bonus.is_empty() {
            if bonus.len() % 2 != 0 {
                return Err(self.malformed("stat_bonus", "expected stat/value pairs"));
            }
            for pair in bonus.chunks(2) {
                let value: i32 = pair[1].parse().map_err(|_| {
                    self.malformed("stat_bonus", format!("'{}' is not a number", pair[1]))
                })?;
                character.stats.add(pair[0].as_str(), value);
            }
        }

        debug!(trait_name = %self.template.name, "applied trait tags");
        Ok(())
    }

    fn cr_factors(&self, _character: &Character) -> Vec<CrFactor> {
        let mut factors = Vec::new();
        // Malformed numbers were rejected in `new`.
        if self.template.has_tag("cr_hp_mod") {
            if let Ok(v) = self.integer("cr_hp_mod") {
                factors.push(CrFactor::EffectiveHpMod(v));
            }
        }
        if self.template.has_tag("cr_ac_mod") {
            if let Ok(v) = self.integer("cr_ac_mod") {
                factors.push(CrFactor::EffectiveAcMod(v));
            }
        }
        if self.template.has_tag("cr_damage_mod") {
            if let Ok(v) = self.integer("cr_damage_mod") {
                factors.push(CrFactor::EffectiveDamageMod(v as f64));
            }
        }
        factors
    }

    fn stat_block_entries(&self, character: &Character) -> Vec<StatBlockEntry> {
        let category = match self.template.category {
            TraitCategory::Hidden => return Vec::new(),
            TraitCategory::Passive => EntryCategory::Passive,
            TraitCategory::Action => EntryCategory::Action,
            TraitCategory::Reaction => EntryCategory::Reaction,
        };
        let mut title = title_case(&self.template.display_name);
        if let Some(subtitle) = &self.template.subtitle {
            title = format!("{} ({})", title, subtitle);
        }
        vec![StatBlockEntry::new(
            category,
            title,
            character.render_text(&self.template.text),
        )
        .with_visibility(self.template.visibility)]
    }
}
