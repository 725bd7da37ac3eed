//! Trait templates and feature declarations.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{scalar_list, tag_map};
use crate::mechanics::TraitCategory;

/// A named piece of statblock text that may also carry mechanical tags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraitTemplate {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub category: TraitCategory,
    /// Body text; `{stat_name}` placeholders resolve against the owner's stats.
    #[serde(default)]
    pub text: String,
    /// Entries above the requested visibility are suppressed from the statblock.
    #[serde(default)]
    pub visibility: u8,
    /// Mechanical tags, e.g. `give_armor = ["chain_mail"]`.
    #[serde(default, deserialize_with = "tag_map")]
    pub tags: BTreeMap<String, Vec<String>>,
}

impl TraitTemplate {
    /// Arguments of a tag, or an empty slice if the tag is absent.
    pub fn tag_args(&self, tag: &str) -> &[String] {
        self.tags.get(tag).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains_key(tag)
    }
}

/// A feature declared on a race or class: the registry name plus its
/// argument tuple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSpec {
    pub name: String,
    #[serde(default, deserialize_with = "scalar_list")]
    pub args: Vec<String>,
    /// Instance key on the character; defaults to `name`.
    #[serde(default)]
    pub key: Option<String>,
}

impl FeatureSpec {
    pub fn new(name: impl Into<String>, args: &[&str]) -> Self {
        Self {
            name: name.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
            key: None,
        }
    }

    /// The key this feature is stored under on the character.
    pub fn instance_key(&self) -> &str {
        self.key.as_deref().unwrap_or(&self.name)
    }
}
