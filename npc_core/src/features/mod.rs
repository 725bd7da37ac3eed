//! The feature engine.
//!
//! Every race trait, class ability and spellcasting block on a character is a
//! [`Feature`]. Features run through a fixed sequence of passes, each pass
//! completing across all features before the next begins:
//! 1. **first_pass**: hit-dice-only decisions (grants, skills, tags, free lists)
//! 2. **second_pass**: adjustments that need final ability modifiers
//! 3. **third_pass**: the main pass (spell selection, late item grants)
//! 4. **fourth_pass**: cross-feature fixups once everything else is settled
//! 5. **finalize**: last chance to write stats before CR and statblock output
//!
//! Features never hold references to each other. They find collaborators
//! through capability queries on the character (see
//! [`Character::find_spellcaster_mut`]) or signal through character tags.

mod class_features;
mod divine_domain;
mod martial_arts;
mod multiattack;
mod registry;
mod traits;

pub use class_features::*;
pub use divine_domain::*;
pub use martial_arts::*;
pub use multiattack::*;
pub use registry::*;
pub use traits::*;

use std::fmt;
use std::str::FromStr;

use npc_rules::Catalog;
use tracing::debug;

use crate::character::Character;
use crate::config::GeneratorConfig;
use crate::cr::CrFactor;
use crate::error::BuildError;
use crate::random::{seeded_rng, SeededRng};
use crate::spellcasting::SpellcastingFeature;
use crate::statblock::StatBlockEntry;

/// Mutable access handed to a feature during a pass.
pub struct PassContext<'a> {
    pub character: &'a mut Character,
    pub catalog: &'a Catalog,
    pub config: &'a GeneratorConfig,
}

impl<'a> PassContext<'a> {
    /// The seeded stream for one labeled decision of this character.
    pub fn rng(&self, label: &str) -> SeededRng {
        seeded_rng(&self.character.seed, label)
    }
}

/// A unit of character behavior. Every hook defaults to a no-op.
pub trait Feature: fmt::Debug + Send + Sync {
    /// Key this feature is stored under on the character.
    fn key(&self) -> &str;

    fn first_pass(&mut self, _ctx: &mut PassContext<'_>) -> Result<(), BuildError> {
        Ok(())
    }

    fn second_pass(&mut self, _ctx: &mut PassContext<'_>) -> Result<(), BuildError> {
        Ok(())
    }

    fn third_pass(&mut self, _ctx: &mut PassContext<'_>) -> Result<(), BuildError> {
        Ok(())
    }

    fn fourth_pass(&mut self, _ctx: &mut PassContext<'_>) -> Result<(), BuildError> {
        Ok(())
    }

    fn finalize(&mut self, _ctx: &mut PassContext<'_>) -> Result<(), BuildError> {
        Ok(())
    }

    /// Signals for the CR estimator. Read-only.
    fn cr_factors(&self, _character: &Character) -> Vec<CrFactor> {
        Vec::new()
    }

    /// Statblock output. Read-only.
    fn stat_block_entries(&self, _character: &Character) -> Vec<StatBlockEntry> {
        Vec::new()
    }

    /// Features registered by this one during construction. Drained once,
    /// right after construction.
    fn take_sub_features(&mut self) -> Vec<Box<dyn Feature>> {
        Vec::new()
    }

    fn as_spellcaster(&self) -> Option<&SpellcastingFeature> {
        None
    }

    fn as_spellcaster_mut(&mut self) -> Option<&mut SpellcastingFeature> {
        None
    }
}

/// The ordered feature passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    First,
    Second,
    Third,
    Fourth,
    Finalize,
}

impl Pass {
    pub fn name(&self) -> &'static str {
        match self {
            Pass::First => "first_pass",
            Pass::Second => "second_pass",
            Pass::Third => "third_pass",
            Pass::Fourth => "fourth_pass",
            Pass::Finalize => "finalize",
        }
    }
}

/// Run one pass over every feature in insertion order.
///
/// Each feature is lifted out of its slot while it runs so it can borrow the
/// character mutably, then put back even if it failed.
pub fn run_pass(
    character: &mut Character,
    catalog: &Catalog,
    config: &GeneratorConfig,
    pass: Pass,
) -> Result<(), BuildError> {
    debug!(pass = pass.name(), features = character.features.len(), "running feature pass");

    let keys: Vec<String> = character.features.keys().cloned().collect();
    for key in keys {
        let Some(mut feature) = character.features.get_mut(&key).and_then(Option::take) else {
            continue;
        };

        let result = {
            let mut ctx = PassContext {
                character: &mut *character,
                catalog,
                config,
            };
            match pass {
                Pass::First => feature.first_pass(&mut ctx),
                Pass::Second => feature.second_pass(&mut ctx),
                Pass::Third => feature.third_pass(&mut ctx),
                Pass::Fourth => feature.fourth_pass(&mut ctx),
                Pass::Finalize => feature.finalize(&mut ctx),
            }
        };

        if let Some(slot) = character.features.get_mut(&key) {
            *slot = Some(feature);
        }
        result?;
    }
    Ok(())
}

/// Everything a feature constructor may read.
#[derive(Clone, Copy)]
pub struct FeatureArgs<'a> {
    /// Registry name of the feature.
    pub name: &'a str,
    /// Key the instance will be stored under.
    pub key: &'a str,
    pub args: &'a [String],
    pub seed: &'a str,
    pub hit_dice: u32,
    pub catalog: &'a Catalog,
    pub config: &'a GeneratorConfig,
}

impl<'a> FeatureArgs<'a> {
    /// The seeded stream for one labeled construction-time decision.
    pub fn rng(&self, label: &str) -> SeededRng {
        seeded_rng(self.seed, label)
    }

    pub fn malformed(&self, reason: impl Into<String>) -> BuildError {
        BuildError::malformed(self.name, reason)
    }

    /// Positional argument, or a malformed-arguments error.
    pub fn required(&self, index: usize) -> Result<&'a str, BuildError> {
        self.args
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| self.malformed(format!("missing argument {}", index + 1)))
    }

    /// Parse a positional argument.
    pub fn parse<T: FromStr>(&self, index: usize) -> Result<T, BuildError> {
        let raw = self.required(index)?;
        raw.parse()
            .map_err(|_| self.malformed(format!("cannot parse argument '{}'", raw)))
    }

    /// Parse an optional positional argument, falling back to `default`.
    pub fn parse_or<T: FromStr>(&self, index: usize, default: T) -> Result<T, BuildError> {
        match self.args.get(index) {
            Some(_) => self.parse(index),
            None => Ok(default),
        }
    }

    pub fn expect_no_more_than(&self, count: usize) -> Result<(), BuildError> {
        if self.args.len() > count {
            return Err(self.malformed(format!(
                "expected at most {} arguments, got {}",
                count,
                self.args.len()
            )));
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Debug)]
    struct Recorder {
        key: String,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Feature for Recorder {
        fn key(&self) -> &str {
            &self.key
        }

        fn first_pass(&mut self, ctx: &mut PassContext<'_>) -> Result<(), BuildError> {
            self.log.lock().unwrap().push(format!("{}:first", self.key));
            // The running feature is out of its slot; the others are not.
            assert!(ctx.character.features.get(&self.key).unwrap().is_none());
            Ok(())
        }

        fn second_pass(&mut self, _ctx: &mut PassContext<'_>) -> Result<(), BuildError> {
            self.log.lock().unwrap().push(format!("{}:second", self.key));
            if self.key == "broken" {
                return Err(BuildError::malformed("broken", "fails on purpose"));
            }
            Ok(())
        }
    }

    fn recorder(key: &str, log: &Arc<Mutex<Vec<String>>>) -> Box<dyn Feature> {
        Box::new(Recorder {
            key: key.to_string(),
            log: Arc::clone(log),
        })
    }

    #[test]
    fn test_passes_complete_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let catalog = Catalog::new();
        let config = GeneratorConfig::default();
        let mut character = Character::new("seed", 1);
        character.add_feature(recorder("a", &log));
        character.add_feature(recorder("b", &log));

        run_pass(&mut character, &catalog, &config, Pass::First).unwrap();
        run_pass(&mut character, &catalog, &config, Pass::Second).unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["a:first", "b:first", "a:second", "b:second"]
        );
        assert!(character.features.values().all(Option::is_some));
    }

    #[test]
    fn test_failing_feature_is_restored_and_error_propagates() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let catalog = Catalog::new();
        let config = GeneratorConfig::default();
        let mut character = Character::new("seed", 1);
        character.add_feature(recorder("broken", &log));
        character.add_feature(recorder("after", &log));

        let result = run_pass(&mut character, &catalog, &config, Pass::Second);
        assert!(matches!(result, Err(BuildError::MalformedArguments { .. })));
        assert!(character.features["broken"].is_some());
        // Nothing after the failure ran.
        assert_eq!(*log.lock().unwrap(), vec!["broken:second"]);
    }

    #[test]
    fn test_feature_args_parsing() {
        let catalog = Catalog::new();
        test_support::with_args("multiattack", &["2", "x"], 1, &catalog, |args| {
            assert_eq!(args.parse::<u32>(0).unwrap(), 2);
            assert!(matches!(
                args.parse::<u32>(1),
                Err(BuildError::MalformedArguments { .. })
            ));
            assert!(args.required(2).is_err());
            assert_eq!(args.parse_or::<u32>(5, 7).unwrap(), 7);
            assert!(args.expect_no_more_than(1).is_err());
        });
    }
}
