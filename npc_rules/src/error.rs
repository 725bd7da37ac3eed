//! Catalog error types.

use std::fmt;
use thiserror::Error;

/// The kinds of content the catalog holds, used to qualify lookup failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Armor,
    Weapon,
    Trait,
    Race,
    Class,
    Subrace,
    Subclass,
    Spell,
    SpellList,
    Spellcaster,
    LoadoutPool,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Armor => "armor",
            ContentKind::Weapon => "weapon",
            ContentKind::Trait => "trait",
            ContentKind::Race => "race",
            ContentKind::Class => "class",
            ContentKind::Subrace => "subrace",
            ContentKind::Subclass => "subclass",
            ContentKind::Spell => "spell",
            ContentKind::SpellList => "spell list",
            ContentKind::Spellcaster => "spellcaster profile",
            ContentKind::LoadoutPool => "loadout pool",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while loading or querying the content catalog.
///
/// Every variant indicates a content-authoring problem, never bad user input.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A lookup by name found nothing.
    #[error("{kind} '{name}' not found in catalog")]
    NotFound { kind: ContentKind, name: String },

    /// A content document failed to parse.
    #[error("failed to parse content document: {0}")]
    Parse(#[from] toml::de::Error),

    /// A template names another template that does not exist.
    #[error("{kind} '{name}' references missing {missing_kind} '{reference}'")]
    InvalidReference {
        kind: ContentKind,
        name: String,
        missing_kind: ContentKind,
        reference: String,
    },

    /// Spell lists compose each other in a loop.
    #[error("spell list '{name}' composes itself")]
    SpellListCycle { name: String },

    /// A field holds a value outside what the rules allow.
    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },
}

impl CatalogError {
    /// Create a NotFound error.
    pub fn not_found(kind: ContentKind, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    /// Create an InvalidReference error.
    pub fn invalid_reference(
        kind: ContentKind,
        name: impl Into<String>,
        missing_kind: ContentKind,
        reference: impl Into<String>,
    ) -> Self {
        Self::InvalidReference {
            kind,
            name: name.into(),
            missing_kind,
            reference: reference.into(),
        }
    }

    /// Create an InvalidValue error.
    pub fn invalid_value(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.into(),
        }
    }
}
