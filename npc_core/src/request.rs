//! Build requests and cleaning of untrusted request maps.
//!
//! A malformed request never fails: bad or missing required values are
//! replaced with random legal ones and the result is flagged invalid so the
//! caller can show the user what was used instead.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use npc_rules::Catalog;

use crate::attributes::{DEFAULT_ROLL_METHOD, ROLL_METHOD_PRESETS};
use crate::config::GeneratorConfig;

/// Everything needed to build one character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRequest {
    /// Base seed; a fresh one is generated per build when absent.
    pub seed: Option<String>,
    pub name: Option<String>,
    pub race: String,
    /// Chosen by seed when absent.
    pub subrace: Option<String>,
    pub class: String,
    pub subclass: Option<String>,
    pub hit_dice_num: u32,
    pub attribute_roll_method: String,
    pub visibility: u8,
}

impl BuildRequest {
    pub fn new(race: impl Into<String>, class: impl Into<String>, hit_dice_num: u32) -> Self {
        Self {
            seed: None,
            name: None,
            race: race.into(),
            subrace: None,
            class: class.into(),
            subclass: None,
            hit_dice_num,
            attribute_roll_method: DEFAULT_ROLL_METHOD.to_string(),
            visibility: GeneratorConfig::default().visibility_threshold,
        }
    }

    pub fn with_seed(mut self, seed: impl Into<String>) -> Self {
        self.seed = Some(seed.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_roll_method(mut self, method: impl Into<String>) -> Self {
        self.attribute_roll_method = method.into();
        self
    }

    pub fn with_subrace(mut self, subrace: impl Into<String>) -> Self {
        self.subrace = Some(subrace.into());
        self
    }

    pub fn with_subclass(mut self, subclass: impl Into<String>) -> Self {
        self.subclass = Some(subclass.into());
        self
    }

    /// Validate a raw option map against the catalog.
    pub fn clean(raw: &Map<String, Value>, catalog: &Catalog, config: &GeneratorConfig) -> CleanedRequest {
        let mut cleaner = Cleaner {
            raw,
            valid: true,
            rng: rand::thread_rng(),
        };

        let seed = match raw.get("seed") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(_) => cleaner.reject("seed", None),
        };
        let name = cleaner.optional_string("name");

        let race = cleaner.required_choice("race", catalog.race_names());
        let subrace = cleaner.optional_choice(
            "subrace",
            catalog
                .race(&race)
                .map(|r| r.subraces.keys().cloned().collect())
                .unwrap_or_default(),
        );
        let class = cleaner.required_choice("class", catalog.class_names());
        let subclass = cleaner.optional_choice(
            "subclass",
            catalog
                .class(&class)
                .map(|c| c.subclasses.keys().cloned().collect())
                .unwrap_or_default(),
        );

        let hit_dice_range = config.min_hit_dice..=config.max_hit_dice;
        let hit_dice_num = match raw.get("hit_dice_num").and_then(Value::as_i64) {
            Some(hd) if config.hit_dice_in_range(hd) => hd as u32,
            _ => {
                let random = cleaner.rng.gen_range(hit_dice_range);
                cleaner.reject("hit_dice_num", random)
            }
        };

        let attribute_roll_method = match raw.get("attribute_roll_method") {
            None | Some(Value::Null) => DEFAULT_ROLL_METHOD.to_string(),
            Some(Value::String(m)) if ROLL_METHOD_PRESETS.contains(&m.as_str()) => m.clone(),
            Some(_) => {
                let random = ROLL_METHOD_PRESETS
                    .choose(&mut cleaner.rng)
                    .unwrap_or(&DEFAULT_ROLL_METHOD)
                    .to_string();
                cleaner.reject("attribute_roll_method", random)
            }
        };

        let visibility = match raw.get("visibility") {
            None | Some(Value::Null) => config.visibility_threshold,
            Some(v) => match v.as_u64().and_then(|v| u8::try_from(v).ok()) {
                Some(v) => v,
                None => cleaner.reject("visibility", config.visibility_threshold),
            },
        };

        CleanedRequest {
            request: BuildRequest {
                seed,
                name,
                race,
                subrace,
                class,
                subclass,
                hit_dice_num,
                attribute_roll_method,
                visibility,
            },
            valid: cleaner.valid,
        }
    }
}

/// A request after cleaning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanedRequest {
    pub request: BuildRequest,
    /// False when any value had to be replaced.
    pub valid: bool,
}

struct Cleaner<'a> {
    raw: &'a Map<String, Value>,
    valid: bool,
    rng: rand::rngs::ThreadRng,
}

impl Cleaner<'_> {
    fn reject<T>(&mut self, field: &str, replacement: T) -> T {
        debug!(field, "replaced invalid request value");
        self.valid = false;
        replacement
    }

    fn optional_string(&mut self, field: &str) -> Option<String> {
        match self.raw.get(field) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => self.reject(field, None),
        }
    }

    fn required_choice<'c>(
        &mut self,
        field: &str,
        options: impl Iterator<Item = &'c str>,
    ) -> String {
        let options: Vec<&str> = options.collect();
        if let Some(Value::String(s)) = self.raw.get(field) {
            if options.contains(&s.as_str()) {
                return s.clone();
            }
        }
        let random = options
            .choose(&mut self.rng)
            .map(|o| o.to_string())
            .unwrap_or_default();
        self.reject(field, random)
    }

    /// A sub-choice is optional; one that does not belong to its parent is
    /// dropped so the build picks one by seed.
    fn optional_choice(&mut self, field: &str, options: Vec<String>) -> Option<String> {
        match self.raw.get(field) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if options.contains(s) => Some(s.clone()),
            Some(_) => self.reject(field, None),
        }
    }
}
