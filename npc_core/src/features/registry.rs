//! Name -> constructor lookup for features declared in content.

use std::collections::BTreeMap;
use std::fmt;

use npc_rules::FeatureSpec;

use super::{
    DivineDomain, Expertise, ExtraSkills, Feature, FeatureArgs, MartialArts, Multiattack,
    SneakAttack, TraitFeature, UnarmoredDefense,
};
use crate::error::BuildError;
use crate::spellcasting::SpellcastingFeature;

/// Builds a feature instance from its declaration.
pub type FeatureConstructor = fn(&FeatureArgs<'_>) -> Result<Box<dyn Feature>, BuildError>;

/// Registry name of the implicit per-trait feature.
pub const TRAIT_FEATURE: &str = "trait";

/// Registry name of the spellcasting feature.
pub const SPELLCASTING_FEATURE: &str = "spellcasting";

/// Maps feature names used in content to their constructors.
#[derive(Clone)]
pub struct FeatureRegistry {
    constructors: BTreeMap<String, FeatureConstructor>,
}

impl fmt::Debug for FeatureRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.constructors.keys()).finish()
    }
}

impl Default for FeatureRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl FeatureRegistry {
    /// A registry with nothing in it.
    pub fn empty() -> Self {
        Self {
            constructors: BTreeMap::new(),
        }
    }

    /// Every feature this crate ships.
    pub fn with_builtins() -> Self {
        Self::empty()
            .with(TRAIT_FEATURE, TraitFeature::construct)
            .with(SPELLCASTING_FEATURE, SpellcastingFeature::construct)
            .with("multiattack", Multiattack::construct)
            .with("divine_domain", DivineDomain::construct)
            .with("martial_arts", MartialArts::construct)
            .with("unarmored_defense", UnarmoredDefense::construct)
            .with("sneak_attack", SneakAttack::construct)
            .with("expertise", Expertise::construct)
            .with("extra_skills", ExtraSkills::construct)
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, name: impl Into<String>, constructor: FeatureConstructor) -> Self {
        self.register(name, constructor);
        self
    }

    /// Add or replace a constructor.
    pub fn register(&mut self, name: impl Into<String>, constructor: FeatureConstructor) {
        self.constructors.insert(name.into(), constructor);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }

    /// Construct the feature `args.name`.
    pub fn construct(&self, args: &FeatureArgs<'_>) -> Result<Box<dyn Feature>, BuildError> {
        let constructor = self
            .constructors
            .get(args.name)
            .ok_or_else(|| BuildError::UnknownFeature {
                name: args.name.to_string(),
            })?;
        constructor(args)
    }

    /// Convenience for a declared [`FeatureSpec`].
    pub fn construct_spec(
        &self,
        spec: &FeatureSpec,
        template: FeatureArgs<'_>,
    ) -> Result<Box<dyn Feature>, BuildError> {
        let args = FeatureArgs {
            name: &spec.name,
            key: spec.instance_key(),
            args: &spec.args,
            ..template
        };
        self.construct(&args)
    }
}
