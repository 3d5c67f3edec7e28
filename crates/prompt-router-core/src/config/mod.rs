use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::constants::{defaults, env, paths};
use crate::error::{Result, RouterError};
use crate::llm::provider::ProviderId;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(deserialize_with = "claude_section")]
    pub claude: ProviderSettings,
    #[serde(deserialize_with = "openai_section")]
    pub openai: ProviderSettings,
    #[serde(deserialize_with = "cursor_section")]
    pub cursor: ProviderSettings,
    pub default_temperature: f32,
    /// Directory whose `<name>.txt` files override the built-in templates.
    pub templates_dir: Option<PathBuf>,
    pub log: LogSettings,
    pub cache: CacheSettings,
    pub batch: BatchSettings,
}

/// Per-provider settings. The API key itself is never stored, only the
/// name of the variable that holds it.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderSettings {
    pub api_key_env: String,
    pub model: String,
    pub max_tokens: u32,
    /// Overrides `default_temperature` for this provider.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    pub endpoint: String,
}

impl ProviderSettings {
    fn defaults_for(id: ProviderId) -> Self {
        Self {
            api_key_env: id.default_api_key_env().to_string(),
            model: id.default_model().to_string(),
            max_tokens: defaults::MAX_TOKENS,
            temperature: None,
            endpoint: id.default_endpoint().to_string(),
        }
    }
}

/// A provider table as written in the file. Keys left out fall back to the
/// defaults of the provider the table belongs to.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProviderSection {
    api_key_env: Option<String>,
    model: Option<String>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
    endpoint: Option<String>,
}

impl ProviderSection {
    fn resolve(self, id: ProviderId) -> ProviderSettings {
        let base = ProviderSettings::defaults_for(id);
        ProviderSettings {
            api_key_env: self.api_key_env.unwrap_or(base.api_key_env),
            model: self.model.unwrap_or(base.model),
            max_tokens: self.max_tokens.unwrap_or(base.max_tokens),
            temperature: self.temperature,
            endpoint: self.endpoint.unwrap_or(base.endpoint),
        }
    }
}

fn claude_section<'de, D>(d: D) -> std::result::Result<ProviderSettings, D::Error>
where
    D: Deserializer<'de>,
{
    ProviderSection::deserialize(d).map(|s| s.resolve(ProviderId::Claude))
}

fn openai_section<'de, D>(d: D) -> std::result::Result<ProviderSettings, D::Error>
where
    D: Deserializer<'de>,
{
    ProviderSection::deserialize(d).map(|s| s.resolve(ProviderId::OpenAI))
}

fn cursor_section<'de, D>(d: D) -> std::result::Result<ProviderSettings, D::Error>
where
    D: Deserializer<'de>,
{
    ProviderSection::deserialize(d).map(|s| s.resolve(ProviderId::Cursor))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub level: String,
    /// Where the append-only log file lives. Defaults to the user data dir.
    pub dir: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            dir: None,
        }
    }
}

/// Result cache. Off unless enabled here or with `--enable-cache`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub enabled: bool,
    pub dir: Option<PathBuf>,
    pub ttl_hours: i64,
    pub max_entries: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: None,
            ttl_hours: defaults::CACHE_TTL_HOURS,
            max_entries: defaults::CACHE_MAX_ENTRIES,
        }
    }
}

impl CacheSettings {
    pub fn file_path(&self) -> PathBuf {
        self.dir
            .clone()
            .unwrap_or_else(|| data_dir().join(paths::CACHE_DIR))
            .join(paths::CACHE_FILE)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSettings {
    /// Where `<batch_id>_report.json` files are written.
    pub reports_dir: Option<PathBuf>,
}

impl BatchSettings {
    pub fn reports_dir(&self) -> PathBuf {
        self.reports_dir
            .clone()
            .unwrap_or_else(|| data_dir().join(paths::REPORTS_DIR))
    }
}

/// Per-user data directory (`<data_local_dir>/prompt-router`).
pub fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(paths::CONFIG_DIR)
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            claude: ProviderSettings::defaults_for(ProviderId::Claude),
            openai: ProviderSettings::defaults_for(ProviderId::OpenAI),
            cursor: ProviderSettings::defaults_for(ProviderId::Cursor),
            default_temperature: defaults::TEMPERATURE,
            templates_dir: None,
            log: LogSettings::default(),
            cache: CacheSettings::default(),
            batch: BatchSettings::default(),
        }
    }
}

impl Settings {
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(paths::CONFIG_DIR)
            .join(paths::CONFIG_FILE)
    }

    /// Load the config file (if any) and apply environment overrides.
    ///
    /// A config file that cannot be read or parsed does not stop startup:
    /// defaults are used and the problem comes back as the second value, so
    /// the caller can log it once logging is set up.
    pub fn load() -> Result<(Self, Option<RouterError>)> {
        Self::load_from(&Self::config_path(), |key| std::env::var(key).ok())
    }

    pub fn load_from<F>(path: &Path, lookup: F) -> Result<(Self, Option<RouterError>)>
    where
        F: Fn(&str) -> Option<String>,
    {
        let (mut settings, issue) = match Self::read_file(path) {
            Ok(settings) => (settings.unwrap_or_default(), None),
            Err(e) => (Self::default(), Some(e)),
        };
        settings.apply_env(lookup)?;
        Ok((settings, issue))
    }

    /// Parse a TOML config file. `Ok(None)` when the file does not exist.
    pub fn read_file(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map(Some)
            .map_err(|e| RouterError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Like [`Settings::read_file`], but falls back to defaults with a warning.
    pub fn load_file(path: &Path) -> Self {
        match Self::read_file(path) {
            Ok(settings) => settings.unwrap_or_default(),
            Err(e) => {
                tracing::warn!("Ignoring config: {}", e);
                Self::default()
            }
        }
    }

    /// Write these settings to the default config path.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_path();
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| RouterError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply overrides read through `lookup`. Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(model) = get(env::CLAUDE_MODEL) {
            self.claude.model = model;
        }
        if let Some(raw) = get(env::CLAUDE_MAX_TOKENS) {
            self.claude.max_tokens = parse_var(env::CLAUDE_MAX_TOKENS, &raw)?;
        }
        if let Some(model) = get(env::OPENAI_MODEL) {
            self.openai.model = model;
        }
        if let Some(raw) = get(env::OPENAI_MAX_TOKENS) {
            self.openai.max_tokens = parse_var(env::OPENAI_MAX_TOKENS, &raw)?;
        }
        if let Some(model) = get(env::CURSOR_MODEL) {
            self.cursor.model = model;
        }
        if let Some(raw) = get(env::CURSOR_MAX_TOKENS) {
            self.cursor.max_tokens = parse_var(env::CURSOR_MAX_TOKENS, &raw)?;
        }
        if let Some(endpoint) = get(env::CURSOR_ENDPOINT) {
            self.cursor.endpoint = endpoint;
        }
        if let Some(raw) = get(env::DEFAULT_TEMPERATURE) {
            let temperature: f32 = parse_var(env::DEFAULT_TEMPERATURE, &raw)?;
            if !(0.0..=2.0).contains(&temperature) {
                return Err(RouterError::Config(format!(
                    "{} must be between 0.0 and 2.0, got {}",
                    env::DEFAULT_TEMPERATURE,
                    temperature
                )));
            }
            self.default_temperature = temperature;
        }
        if let Some(dir) = get(env::TEMPLATES_DIR) {
            self.templates_dir = Some(PathBuf::from(dir));
        }
        if let Some(level) = get(env::LOG_LEVEL) {
            self.log.level = level.to_lowercase();
        }
        Ok(())
    }

    /// Settings for a keyed provider. `Universal` has none.
    pub fn provider(&self, id: ProviderId) -> Option<&ProviderSettings> {
        match id {
            ProviderId::Claude => Some(&self.claude),
            ProviderId::OpenAI => Some(&self.openai),
            ProviderId::Cursor => Some(&self.cursor),
            ProviderId::Universal => None,
        }
    }
}

fn parse_var<T: FromStr>(key: &str, raw: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| RouterError::Config(format!("invalid value for {key} ('{raw}'): {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.claude.model, "claude-sonnet-4-20250514");
        assert_eq!(settings.claude.api_key_env, "ANTHROPIC_API_KEY");
        assert_eq!(settings.openai.model, "gpt-4o");
        assert_eq!(settings.cursor.endpoint, "localhost:8080");
        assert_eq!(settings.default_temperature, 0.7);
        assert!(settings.provider(ProviderId::Universal).is_none());
    }

    #[test]
    fn test_env_overrides() {
        let mut settings = Settings::default();
        settings
            .apply_env(lookup_from(&[
                ("CLAUDE_MODEL", "claude-opus"),
                ("OPENAI_MAX_TOKENS", "1024"),
                ("CURSOR_ENDPOINT", "localhost:9999"),
                ("DEFAULT_TEMPERATURE", "0.2"),
                ("LOG_LEVEL", "DEBUG"),
            ]))
            .unwrap();

        assert_eq!(settings.claude.model, "claude-opus");
        assert_eq!(settings.openai.max_tokens, 1024);
        assert_eq!(settings.cursor.endpoint, "localhost:9999");
        assert_eq!(settings.default_temperature, 0.2);
        assert_eq!(settings.log.level, "debug");
    }

    #[test]
    fn test_env_rejects_bad_numbers() {
        let mut settings = Settings::default();
        let err = settings
            .apply_env(lookup_from(&[("CLAUDE_MAX_TOKENS", "lots")]))
            .unwrap_err();
        assert!(err.to_string().contains("CLAUDE_MAX_TOKENS"));

        let err = settings
            .apply_env(lookup_from(&[("DEFAULT_TEMPERATURE", "3.5")]))
            .unwrap_err();
        assert!(matches!(err, RouterError::Config(_)));
    }

    #[test]
    fn test_empty_env_values_are_ignored() {
        let mut settings = Settings::default();
        settings
            .apply_env(lookup_from(&[("OPENAI_MODEL", "")]))
            .unwrap();
        assert_eq!(settings.openai.model, "gpt-4o");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            default_temperature = 0.3

            [openai]
            api_key_env = "MY_OPENAI_KEY"
            model = "gpt-4o-mini"
            max_tokens = 2000
            endpoint = "https://example.test/v1"
            "#,
        )
        .unwrap();

        assert_eq!(settings.openai.api_key_env, "MY_OPENAI_KEY");
        assert_eq!(settings.claude.model, "claude-sonnet-4-20250514");
        assert_eq!(settings.default_temperature, 0.3);
        assert!(!settings.cache.enabled);
    }

    #[test]
    fn test_partial_provider_section_fills_provider_defaults() {
        let settings: Settings = toml::from_str(
            "default_temperature = 0.3\n[openai]\nmodel = \"gpt-4o-mini\"\n[cursor]\nmax_tokens = 900\n",
        )
        .unwrap();

        assert_eq!(settings.default_temperature, 0.3);
        assert_eq!(settings.openai.model, "gpt-4o-mini");
        assert_eq!(settings.openai.api_key_env, "OPENAI_API_KEY");
        assert_eq!(settings.openai.max_tokens, 4000);
        assert_eq!(settings.cursor.max_tokens, 900);
        assert_eq!(settings.cursor.model, "cursor-default");
        assert_eq!(settings.cursor.endpoint, "localhost:8080");
    }

    #[test]
    fn test_load_from_reports_invalid_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "default_temperature = \"warm\"\n").unwrap();

        let (settings, issue) =
            Settings::load_from(&path, lookup_from(&[("OPENAI_MODEL", "gpt-env")])).unwrap();

        assert_eq!(settings.default_temperature, 0.7);
        assert_eq!(settings.openai.model, "gpt-env");
        match issue {
            Some(RouterError::Config(msg)) => assert!(msg.contains("config.toml")),
            other => panic!("Expected a config issue, got {:?}", other),
        }
    }

    #[test]
    fn test_load_from_missing_file_is_silent() {
        let dir = tempfile::TempDir::new().unwrap();
        let (settings, issue) =
            Settings::load_from(&dir.path().join("absent.toml"), |_| None).unwrap();
        assert!(issue.is_none());
        assert_eq!(settings.claude.max_tokens, 4000);
    }
}
