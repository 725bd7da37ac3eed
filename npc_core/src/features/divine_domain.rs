//! Cleric domains.

use tracing::debug;

use super::{Feature, FeatureArgs, PassContext, TraitFeature};
use crate::character::Character;
use crate::error::BuildError;
use crate::random::choose;
use crate::statblock::{title_case, EntryCategory, StatBlockEntry};

/// Armor granted by the life domain's heavy armor proficiency.
const LIFE_DOMAIN_ARMOR: &str = "chain_mail";

/// Trait granted alongside the war domain.
const WAR_DOMAIN_TRAIT: &str = "parry";

/// `divine_domain(domain, ...)`: a seeded pick among the listed domains.
///
/// The chosen domain's spell list (`<domain>_domain`) is registered as a free
/// list on the character's spellcaster during the first pass, before spells
/// are picked in the third.
#[derive(Debug)]
pub struct DivineDomain {
    key: String,
    domain: String,
    spell_list: String,
    sub_features: Vec<Box<dyn Feature>>,
}

impl DivineDomain {
    pub fn construct(args: &FeatureArgs<'_>) -> Result<Box<dyn Feature>, BuildError> {
        if args.args.is_empty() {
            return Err(args.malformed("needs at least one domain"));
        }
        let mut rng = args.rng(&format!("{}domain choice", args.key));
        let domain = choose(&mut rng, args.args)
            .cloned()
            .ok_or_else(|| args.malformed("needs at least one domain"))?;

        let spell_list = format!("{}_domain", domain);
        args.catalog.spell_list(&spell_list)?;

        let mut sub_features: Vec<Box<dyn Feature>> = Vec::new();
        if domain == "war" {
            let parry = args.catalog.trait_template(WAR_DOMAIN_TRAIT)?;
            sub_features.push(Box::new(TraitFeature::new(parry)?));
        }

        debug!(domain = %domain, "chose divine domain");
        Ok(Box::new(Self {
            key: args.key.to_string(),
            domain,
            spell_list,
            sub_features,
        }))
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }
}

impl Feature for DivineDomain {
    fn key(&self) -> &str {
        &self.key
    }

    fn first_pass(&mut self, ctx: &mut PassContext<'_>) -> Result<(), BuildError> {
        if self.domain == "life" {
            ctx.character.add_armor(ctx.catalog.armor(LIFE_DOMAIN_ARMOR)?);
        }
        let spellcaster = ctx
            .character
            .find_spellcaster_mut()
            .ok_or_else(|| BuildError::missing_capability(&self.key, "spellcasting"))?;
        spellcaster.add_free_spell_list(&self.spell_list);
        Ok(())
    }

    fn take_sub_features(&mut self) -> Vec<Box<dyn Feature>> {
        std::mem::take(&mut self.sub_features)
    }

    fn stat_block_entries(&self, character: &Character) -> Vec<StatBlockEntry> {
        let text = format!(
            "The {} draws its power from the {} domain and always has its domain spells prepared.",
            character.short_name(),
            self.domain
        );
        vec![StatBlockEntry::new(
            EntryCategory::Passive,
            format!("{} Domain", title_case(&self.domain)),
            text,
        )
        .with_visibility(2)]
    }
}
