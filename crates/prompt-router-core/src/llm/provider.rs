use crate::config::{ProviderSettings, Settings};
use crate::constants::{defaults, endpoints, env, models};
use crate::error::{Result, RouterError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Identifies one of the fixed routing targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Claude,
    OpenAI,
    Cursor,
    Universal,
}

impl ProviderId {
    /// Human-readable provider name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Claude => "Claude (Anthropic)",
            Self::OpenAI => "OpenAI",
            Self::Cursor => "Cursor",
            Self::Universal => "Universal",
        }
    }

    /// Stable identifier used on the command line, in templates and in output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Claude => "claude",
            Self::OpenAI => "openai",
            Self::Cursor => "cursor",
            Self::Universal => "universal",
        }
    }

    pub fn all() -> &'static [ProviderId] {
        &[
            ProviderId::Claude,
            ProviderId::OpenAI,
            ProviderId::Cursor,
            ProviderId::Universal,
        ]
    }

    /// Providers that need an API key. `Universal` is plain text output.
    pub fn keyed() -> &'static [ProviderId] {
        &[ProviderId::Claude, ProviderId::OpenAI, ProviderId::Cursor]
    }

    pub fn needs_api_key(&self) -> bool {
        !matches!(self, Self::Universal)
    }

    pub fn default_api_key_env(&self) -> &'static str {
        match self {
            Self::Claude => env::CLAUDE_API_KEY,
            Self::OpenAI => env::OPENAI_API_KEY,
            Self::Cursor => env::CURSOR_API_KEY,
            Self::Universal => "",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Claude => models::DEFAULT_CLAUDE_MODEL,
            Self::OpenAI => models::DEFAULT_OPENAI_MODEL,
            Self::Cursor => models::DEFAULT_CURSOR_MODEL,
            Self::Universal => models::UNIVERSAL_MODEL,
        }
    }

    pub fn default_endpoint(&self) -> &'static str {
        match self {
            Self::Claude => endpoints::CLAUDE_MESSAGES_URL,
            Self::OpenAI => endpoints::OPENAI_CHAT_URL,
            Self::Cursor => endpoints::CURSOR_ENDPOINT,
            Self::Universal => "",
        }
    }

    /// Name of the template merged by the router for this provider.
    pub fn template_name(&self) -> &'static str {
        match self {
            Self::Claude => "claude_template",
            Self::OpenAI => "openai_template",
            Self::Cursor => "cursor_template",
            Self::Universal => "universal_template",
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            Self::Claude => 0,
            Self::OpenAI => 1,
            Self::Cursor => 2,
            Self::Universal => 3,
        }
    }
}

impl FromStr for ProviderId {
    type Err = RouterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "claude" | "anthropic" => Ok(Self::Claude),
            "openai" | "gpt" => Ok(Self::OpenAI),
            "cursor" => Ok(Self::Cursor),
            "universal" => Ok(Self::Universal),
            _ => Err(RouterError::InvalidTarget(s.to_string())),
        }
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved configuration for a single provider. Built once at startup.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderConfig {
    pub id: ProviderId,
    /// True when the provider's API key variable holds a non-empty value.
    pub available: bool,
    pub api_key_env: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub endpoint: String,
}

impl ProviderConfig {
    fn resolve(
        id: ProviderId,
        entry: Option<&ProviderSettings>,
        temperature: f32,
        lookup: &dyn Fn(&str) -> Option<String>,
    ) -> Self {
        let api_key_env = entry
            .map(|e| e.api_key_env.clone())
            .unwrap_or_else(|| id.default_api_key_env().to_string());

        let available = if id.needs_api_key() {
            !api_key_env.is_empty()
                && lookup(&api_key_env).is_some_and(|key| !key.trim().is_empty())
        } else {
            true
        };

        Self {
            id,
            available,
            api_key_env,
            model: entry
                .map(|e| e.model.clone())
                .unwrap_or_else(|| id.default_model().to_string()),
            max_tokens: entry.map(|e| e.max_tokens).unwrap_or(defaults::MAX_TOKENS),
            temperature: entry.and_then(|e| e.temperature).unwrap_or(temperature),
            endpoint: entry
                .map(|e| e.endpoint.clone())
                .unwrap_or_else(|| id.default_endpoint().to_string()),
        }
    }
}

/// Holds exactly one `ProviderConfig` per `ProviderId`.
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    providers: Vec<ProviderConfig>,
}

impl ProviderRegistry {
    /// Build the registry from settings and the process environment.
    pub fn from_env(settings: &Settings) -> Result<Self> {
        Self::load(settings, |key| std::env::var(key).ok())
    }

    /// Build the registry using `lookup` to read API key variables.
    ///
    /// Fails when none of the keyed providers has a usable key; partial
    /// availability is fine.
    pub fn load<F>(settings: &Settings, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let providers: Vec<ProviderConfig> = ProviderId::all()
            .iter()
            .map(|id| {
                ProviderConfig::resolve(
                    *id,
                    settings.provider(*id),
                    settings.default_temperature,
                    &lookup,
                )
            })
            .collect();

        let registry = Self { providers };

        let usable: Vec<&str> = ProviderId::keyed()
            .iter()
            .filter(|id| registry.is_available(**id))
            .map(|id| id.as_str())
            .collect();

        if usable.is_empty() {
            let vars: Vec<&str> = ProviderId::keyed()
                .iter()
                .map(|id| registry.get(*id).api_key_env.as_str())
                .collect();
            return Err(RouterError::Config(format!(
                "no provider API key configured; set at least one of {}",
                vars.join(", ")
            )));
        }

        tracing::info!("Providers available: {}", usable.join(", "));
        Ok(registry)
    }

    pub fn get(&self, id: ProviderId) -> &ProviderConfig {
        &self.providers[id.index()]
    }

    pub fn is_available(&self, id: ProviderId) -> bool {
        self.get(id).available
    }

    /// Fails with `NoProviderAvailable` when `id` has no API key.
    pub fn require_available(&self, id: ProviderId) -> Result<&ProviderConfig> {
        let config = self.get(id);
        if config.available {
            Ok(config)
        } else {
            Err(RouterError::NoProviderAvailable(format!(
                "{} requires {} to be set",
                id.name(),
                config.api_key_env
            )))
        }
    }

    pub fn available_providers(&self) -> Vec<&ProviderConfig> {
        self.providers.iter().filter(|c| c.available).collect()
    }

    pub fn all_providers(&self) -> &[ProviderConfig] {
        &self.providers
    }
}
