//! Persona domain module.
//!
//! A persona bundles a system prompt with a greeting and a display identity.
//! The registry is built once at session start and never mutated afterwards.
//!
//! # Module Structure
//!
//! - `model`: `Persona`, `PersonaSource` and the read-only `PersonaRegistry`
//! - `preset`: built-in personas shipped with cao

mod model;
mod preset;

pub use model::{DEFAULT_PERSONA_KEY, Persona, PersonaRegistry, PersonaSource};
pub use preset::get_default_presets;
