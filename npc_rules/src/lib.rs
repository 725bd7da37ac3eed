//! # NPC Rules
//!
//! The content side of NPC generation: mechanics vocabulary, immutable
//! templates, reference tables and the catalog that holds them. This crate
//! contains no randomness and no character assembly logic.

pub mod catalog;
pub mod error;
pub mod mechanics;
pub mod tables;
pub mod templates;

pub use catalog::*;
pub use error::*;
pub use mechanics::*;
pub use tables::*;
pub use templates::*;
