//! Configuration model.
//!
//! `CaoConfig` mirrors `config.toml`. Model entries are resolved once at
//! session start into an immutable [`ResolvedModel`]; nothing re-reads the
//! config or the environment afterwards.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::debug;

use crate::error::{CaoError, Result};
use crate::persona::Persona;

/// Request timeout used when a model entry does not set `timeout_secs`.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Provider name of local models that need no API key.
pub const OLLAMA_PROVIDER: &str = "ollama";

/// JSON shape of a successful chat-completion response.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ResponseShape {
    /// `{"choices": [{"message": {"content": ...}}]}`
    #[serde(rename = "openai")]
    #[strum(serialize = "openai")]
    OpenAiStyle,
    /// `{"message": {"content": ...}}`
    #[serde(rename = "ollama")]
    #[strum(serialize = "ollama")]
    OllamaStyle,
}

/// One `[models.<name>]` entry.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ModelConfig {
    pub api_base: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_shape: Option<ResponseShape>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl ModelConfig {
    pub fn new(
        api_base: impl Into<String>,
        model: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            api_base: api_base.into(),
            model: model.into(),
            provider: Some(provider.into()),
            api_key: None,
            response_shape: None,
            timeout_secs: None,
        }
    }

    /// Resolves this entry into the immutable settings a session uses.
    ///
    /// `name` is the entry's key in the config; it is the provider when the
    /// entry sets none. `env` looks up environment variables.
    ///
    /// # Errors
    ///
    /// Returns `CaoError::Config` when a non-local provider has no API key in
    /// `<PROVIDER>_API_KEY` or in the entry itself.
    pub fn resolve<F>(&self, name: &str, env: F) -> Result<ResolvedModel>
    where
        F: Fn(&str) -> Option<String>,
    {
        let provider = self
            .provider
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(name)
            .to_lowercase();

        let is_local = provider == OLLAMA_PROVIDER;

        let response_shape = self.response_shape.unwrap_or(if is_local {
            ResponseShape::OllamaStyle
        } else {
            ResponseShape::OpenAiStyle
        });

        let api_key = if is_local {
            None
        } else {
            let env_var = api_key_env_var(&provider);
            let key = env(&env_var)
                .filter(|k| !k.trim().is_empty())
                .or_else(|| self.api_key.clone().filter(|k| !k.trim().is_empty()));
            match key {
                Some(key) => Some(key),
                None => {
                    return Err(CaoError::config(format!(
                        "{env_var} is not set and model '{name}' has no api_key in the config"
                    )));
                }
            }
        };

        debug!(%provider, %response_shape, "Resolved model '{}'", name);

        Ok(ResolvedModel {
            name: name.to_string(),
            api_base: self.api_base.trim_end_matches('/').to_string(),
            model: self.model.clone(),
            provider,
            api_key,
            response_shape,
            timeout_secs: self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
        })
    }
}

/// Name of the environment variable holding a provider's API key.
pub fn api_key_env_var(provider: &str) -> String {
    format!("{}_API_KEY", provider.to_uppercase().replace('-', "_"))
}

/// A model entry resolved for one session. Immutable.
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedModel {
    /// Key of the entry in the config.
    pub name: String,
    /// Base URL without a trailing slash.
    pub api_base: String,
    pub model: String,
    pub provider: String,
    pub api_key: Option<String>,
    pub response_shape: ResponseShape,
    pub timeout_secs: u64,
}

impl ResolvedModel {
    /// Endpoint the completion client posts to.
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.api_base)
    }
}

// Keeps API keys out of logs and debug output.
impl std::fmt::Debug for ResolvedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedModel")
            .field("name", &self.name)
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("response_shape", &self.response_shape)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Root of `config.toml`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct CaoConfig {
    pub default_model: String,
    #[serde(default)]
    pub models: BTreeMap<String, ModelConfig>,
    #[serde(rename = "persona", default, skip_serializing_if = "Vec::is_empty")]
    pub personas: Vec<Persona>,
    /// Built-in models the user removed; skipped when merging defaults.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed_models: Vec<String>,
}

impl Default for CaoConfig {
    fn default() -> Self {
        let mut models = BTreeMap::new();
        models.insert(
            "deepseek".to_string(),
            ModelConfig::new("https://api.deepseek.com/v1", "deepseek-chat", "deepseek"),
        );
        models.insert(
            "openai".to_string(),
            ModelConfig::new("https://api.openai.com/v1", "gpt-4o", "openai"),
        );
        models.insert(
            OLLAMA_PROVIDER.to_string(),
            ModelConfig::new("http://localhost:11434/v1", "qwen2.5-coder:7b", OLLAMA_PROVIDER),
        );

        Self {
            default_model: "deepseek".to_string(),
            models,
            personas: Vec::new(),
            removed_models: Vec::new(),
        }
    }
}

impl CaoConfig {
    /// Merges a user config over the built-in defaults.
    ///
    /// User models replace defaults with the same name, and built-ins listed
    /// in `removed_models` stay removed. A user `default_model` naming an
    /// unknown model is ignored.
    pub fn merged_over_defaults(user: CaoConfig) -> Self {
        let mut config = Self::default();
        for name in &user.removed_models {
            config.models.remove(name);
        }
        config.models.extend(user.models);
        config.personas = user.personas;
        config.removed_models = user.removed_models;

        if config.models.contains_key(&user.default_model) {
            config.default_model = user.default_model;
        } else {
            // The built-in default may itself have been removed.
            if !config.models.contains_key(&config.default_model) {
                if let Some(first) = config.models.keys().next() {
                    config.default_model = first.clone();
                }
            }
            tracing::warn!(
                "default_model '{}' is not a configured model, keeping '{}'",
                user.default_model,
                config.default_model
            );
        }

        config
    }

    /// Looks up a model entry by name.
    pub fn model(&self, name: &str) -> Result<&ModelConfig> {
        self.models.get(name).ok_or_else(|| {
            CaoError::config(format!(
                "unsupported model '{name}'. Supported models: {}",
                self.model_names().join(", ")
            ))
        })
    }

    pub fn model_names(&self) -> Vec<&str> {
        self.models.keys().map(String::as_str).collect()
    }

    /// Adds or replaces a model entry.
    pub fn add_model(&mut self, name: impl Into<String>, model: ModelConfig) {
        let name = name.into();
        self.removed_models.retain(|removed| *removed != name);
        self.models.insert(name, model);
    }

    /// Removes a model entry.
    ///
    /// # Errors
    ///
    /// Fails when the model does not exist or is the default model.
    pub fn remove_model(&mut self, name: &str) -> Result<ModelConfig> {
        if name == self.default_model {
            return Err(CaoError::config(format!(
                "cannot remove '{name}': it is the default model"
            )));
        }
        let removed = self
            .models
            .remove(name)
            .ok_or_else(|| CaoError::not_found("model", name))?;

        let is_builtin = Self::default().models.contains_key(name);
        if is_builtin && !self.removed_models.iter().any(|r| r == name) {
            self.removed_models.push(name.to_string());
        }
        Ok(removed)
    }

    /// Makes an existing model the default.
    pub fn set_default_model(&mut self, name: &str) -> Result<()> {
        if !self.models.contains_key(name) {
            return Err(CaoError::not_found("model", name));
        }
        self.default_model = name.to_string();
        Ok(())
    }

    /// Checks the invariants an imported config must satisfy.
    pub fn validate(&self) -> Result<()> {
        if self.models.is_empty() {
            return Err(CaoError::config("config must define at least one model"));
        }
        if !self.models.contains_key(&self.default_model) {
            return Err(CaoError::config(format!(
                "default_model '{}' is not one of the configured models",
                self.default_model
            )));
        }
        Ok(())
    }
}
