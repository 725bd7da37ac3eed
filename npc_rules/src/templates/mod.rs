//! Immutable content templates.
//!
//! Templates are deserialized from content documents, stored in the
//! [`Catalog`](crate::Catalog) behind `Arc`, and never mutated afterwards.
//! Anything a generated character needs to change is copied into its own
//! per-character instance first.

mod archetype;
mod equipment;
mod spells;
mod traits;

pub use archetype::*;
pub use equipment::*;
pub use spells::*;
pub use traits::*;

use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

use crate::mechanics::Attribute;

/// Turn an internal name (`chain_mail`) into a display name (`chain mail`).
pub fn display_from_internal(name: &str) -> String {
    name.replace('_', " ")
}

/// Deserialize a `{ str = 2, dex = 1 }` table into typed attribute keys.
pub(crate) fn attribute_map<'de, D>(deserializer: D) -> Result<BTreeMap<Attribute, i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, i32>::deserialize(deserializer)?;
    raw.into_iter()
        .map(|(key, value)| {
            key.parse::<Attribute>()
                .map(|attr| (attr, value))
                .map_err(serde::de::Error::custom)
        })
        .collect()
}

/// A scalar argument as written in content: `"2"`, `2`, `2.5` or `true`.
#[derive(Deserialize)]
#[serde(untagged)]
enum ScalarArg {
    Text(String),
    Integer(i64),
    Float(f64),
    Flag(bool),
}

impl From<ScalarArg> for String {
    fn from(arg: ScalarArg) -> Self {
        match arg {
            ScalarArg::Text(s) => s,
            ScalarArg::Integer(i) => i.to_string(),
            ScalarArg::Float(f) => f.to_string(),
            ScalarArg::Flag(b) => b.to_string(),
        }
    }
}

/// Deserialize a list of scalars into strings so feature constructors can
/// parse them uniformly.
pub(crate) fn scalar_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<ScalarArg>::deserialize(deserializer)?;
    Ok(raw.into_iter().map(String::from).collect())
}

/// Deserialize a `tag = [args]` table whose args may be any scalar.
pub(crate) fn tag_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, Vec<ScalarArg>>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(tag, args)| (tag, args.into_iter().map(String::from).collect()))
        .collect())
}
