//! Error types for character assembly.

use npc_rules::CatalogError;
use thiserror::Error;

/// A generator configuration that could not be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse generator config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid generator config value for '{field}': {reason}")]
    Invalid { field: String, reason: String },
}

impl ConfigError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Fatal build failures. All of these point at content or configuration
/// bugs; malformed user requests are cleaned instead (see
/// [`BuildRequest::clean`](crate::BuildRequest::clean)).
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("unknown feature '{name}'")]
    UnknownFeature { name: String },

    #[error("malformed arguments for feature '{feature}': {reason}")]
    MalformedArguments { feature: String, reason: String },

    #[error("feature '{feature}' needs a {capability} feature on the same character")]
    MissingCapability { feature: String, capability: String },

    #[error("unknown attribute roll method '{name}'")]
    UnknownRollMethod { name: String },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl BuildError {
    pub fn malformed(feature: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedArguments {
            feature: feature.into(),
            reason: reason.into(),
        }
    }

    pub fn missing_capability(feature: impl Into<String>, capability: impl Into<String>) -> Self {
        Self::MissingCapability {
            feature: feature.into(),
            capability: capability.into(),
        }
    }
}
