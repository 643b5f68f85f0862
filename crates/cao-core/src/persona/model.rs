//! Persona domain model.
//!
//! Represents the personas a session can switch between. Each persona has a
//! short key (typed as `/key`), a display identity, a system prompt and a
//! greeting.

use serde::{Deserialize, Serialize};

use crate::error::{CaoError, Result};

/// Key of the persona every session starts with.
pub const DEFAULT_PERSONA_KEY: &str = "default";

/// Keys a persona may not use because the router claims them first.
const RESERVED_KEYS: [&str; 2] = ["exit", "quit"];

/// Where a persona definition came from.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PersonaSource {
    /// Built into cao
    System,
    /// Defined in the user's config file
    #[default]
    User,
}

/// A named bundle of system prompt, greeting and display identity.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Persona {
    /// Short identifier, typed as `/key` in a session.
    pub key: String,
    /// Name shown in notices and panel titles.
    pub display_name: String,
    /// Emoji shown next to the display name.
    pub emoji: String,
    /// Instructions sent as the conversation's system message.
    pub system_prompt: String,
    /// First assistant message of a session started with this persona.
    pub greeting: String,
    #[serde(default)]
    pub source: PersonaSource,
}

impl Persona {
    /// `"🌱 Cao"`-style label used in titles and notices.
    pub fn label(&self) -> String {
        format!("{} {}", self.emoji, self.display_name)
    }

    /// Whether this persona ships with cao rather than the user's config.
    pub fn is_builtin(&self) -> bool {
        self.source == PersonaSource::System
    }
}

/// Read-only lookup of personas by key.
///
/// Built once at session start. Insertion order is kept for display, with
/// `default` always present.
#[derive(Debug, Clone)]
pub struct PersonaRegistry {
    personas: Vec<Persona>,
}

impl PersonaRegistry {
    /// Builds a registry from the built-in presets.
    pub fn builtin() -> Self {
        Self {
            personas: super::get_default_presets(),
        }
    }

    /// Builds a registry from an explicit persona list.
    ///
    /// Keys are normalized to lowercase. A later persona with the same key
    /// replaces an earlier one in place.
    ///
    /// # Errors
    ///
    /// Returns `CaoError::Config` if a key is empty, contains whitespace or a
    /// slash, is reserved (`exit`, `quit`), or if no `default` persona exists.
    pub fn from_personas(personas: impl IntoIterator<Item = Persona>) -> Result<Self> {
        let mut registry: Vec<Persona> = Vec::new();

        for mut persona in personas {
            persona.key = persona.key.trim().to_lowercase();
            validate_key(&persona.key)?;

            match registry.iter_mut().find(|p| p.key == persona.key) {
                Some(existing) => *existing = persona,
                None => registry.push(persona),
            }
        }

        if !registry.iter().any(|p| p.key == DEFAULT_PERSONA_KEY) {
            return Err(CaoError::config(format!(
                "persona registry must contain a '{DEFAULT_PERSONA_KEY}' persona"
            )));
        }

        Ok(Self {
            personas: registry,
        })
    }

    /// Built-in presets with `overrides` merged over them by key.
    ///
    /// Overrides are marked as user personas whatever their `source` says.
    pub fn with_overrides(overrides: impl IntoIterator<Item = Persona>) -> Result<Self> {
        let overrides = overrides.into_iter().map(|mut persona| {
            persona.source = PersonaSource::User;
            persona
        });
        Self::from_personas(super::get_default_presets().into_iter().chain(overrides))
    }

    /// Looks up a persona by key (case-insensitive).
    pub fn get(&self, key: &str) -> Result<&Persona> {
        let key = key.trim().to_lowercase();
        self.personas
            .iter()
            .find(|p| p.key == key)
            .ok_or_else(|| CaoError::not_found("persona", key))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_ok()
    }

    /// Registered keys in registry order.
    pub fn keys(&self) -> Vec<&str> {
        self.personas.iter().map(|p| p.key.as_str()).collect()
    }

    pub fn default_key(&self) -> &'static str {
        DEFAULT_PERSONA_KEY
    }

    /// The `default` persona.
    pub fn default_persona(&self) -> &Persona {
        // from_personas and builtin both guarantee the default entry
        self.personas
            .iter()
            .find(|p| p.key == DEFAULT_PERSONA_KEY)
            .unwrap_or(&self.personas[0])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Persona> {
        self.personas.iter()
    }

    pub fn len(&self) -> usize {
        self.personas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.personas.is_empty()
    }
}

impl Default for PersonaRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CaoError::config("persona key must not be empty"));
    }
    if key.chars().any(|c| c.is_whitespace() || c == '/') {
        return Err(CaoError::config(format!(
            "persona key '{key}' must not contain whitespace or '/'"
        )));
    }
    if RESERVED_KEYS.contains(&key) {
        return Err(CaoError::config(format!(
            "persona key '{key}' is reserved for leaving the session"
        )));
    }
    Ok(())
}
