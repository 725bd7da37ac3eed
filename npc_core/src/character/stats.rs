//! The numeric stat sheet.

use serde::Serialize;
use std::collections::BTreeMap;

use npc_rules::{attribute_modifier, Attribute};

/// Ordered `name -> value` map of every numeric stat. Unknown keys read as 0.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Stats(BTreeMap<String, i32>);

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> i32 {
        self.0.get(key).copied().unwrap_or(0)
    }

    /// Like [`get`](Self::get) but tells a missing key from a zero.
    pub fn try_get(&self, key: &str) -> Option<i32> {
        self.0.get(key).copied()
    }

    pub fn set(&mut self, key: impl Into<String>, value: i32) {
        self.0.insert(key.into(), value);
    }

    pub fn add(&mut self, key: impl Into<String>, delta: i32) {
        *self.0.entry(key.into()).or_insert(0) += delta;
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i32)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn score(&self, attribute: Attribute) -> i32 {
        self.get(attribute.key())
    }

    /// Modifier computed from the current score, independent of whether
    /// derived stats have been refreshed.
    pub fn modifier(&self, attribute: Attribute) -> i32 {
        attribute_modifier(self.score(attribute))
    }
}
