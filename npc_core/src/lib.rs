//! # NPC Core
//!
//! The character assembly pipeline. Given a race, a class, a hit-dice count
//! and a seed, it derives a complete, internally consistent character and its
//! challenge rating from the content in an [`npc_rules::Catalog`].
//!
//! ## Core Components
//!
//! - **pipeline**: [`Generator`] runs every build stage in order
//! - **features**: the multi-pass feature engine and built-in features
//! - **spellcasting**: caster levels, slots and seeded spell selection
//! - **cr**: the table-driven challenge rating estimate
//! - **character** / **statblock**: the aggregate and its presentation view
//! - **request**: cleaning of untrusted build requests
//!
//! ## Determinism
//!
//! Every random decision draws from its own stream seeded by
//! `base_seed + label` (see [`random`]). The same request against the same
//! catalog always yields the same character.

pub mod asi;
pub mod attributes;
pub mod character;
pub mod config;
pub mod cr;
pub mod error;
pub mod features;
pub mod loadout;
pub mod logging;
pub mod pipeline;
pub mod random;
pub mod request;
pub mod spellcasting;
pub mod statblock;

pub use attributes::{AttributeRollMethod, DEFAULT_ROLL_METHOD, ROLL_METHOD_PRESETS};
pub use character::Character;
pub use config::GeneratorConfig;
pub use cr::{estimate_cr, CrEstimate, CrFactor, CrInputs};
pub use error::{BuildError, ConfigError};
pub use features::{Feature, FeatureArgs, FeatureRegistry, Pass, PassContext};
pub use logging::{init_tracing, TracingConfig};
pub use pipeline::Generator;
pub use request::{BuildRequest, CleanedRequest};
pub use spellcasting::SpellcastingFeature;
pub use statblock::{EntryCategory, StatBlock, StatBlockEntry};
