//! Configuration: built-in defaults, optional TOML file, then environment
//!
//! Environment variables win over the file so that deployments can keep
//! credentials out of `jarvis.toml`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::intent::IntentDefaults;
use crate::types::Language;
use crate::weather::TemperatureUnit;

/// Config file looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "jarvis.toml";

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const OPENAI_MODEL: &str = "gpt-4o-mini";

/// Runtime configuration for the assistant and its collaborators
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JarvisConfig {
    /// Port for the webhook server
    pub port: u16,

    /// Completion API key (OPENAI_KEY)
    pub openai_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: String,

    /// Search API key (SERPAPI_KEY); web search is refused without it
    pub serpapi_key: Option<String>,

    /// Language used when detection is inconclusive
    pub default_language: Language,

    /// Place used by weather queries that name none
    pub default_place: String,

    /// Subject used by encyclopedia lookups that name none
    pub default_subject: String,

    /// Directory holding one history file per sender
    pub history_dir: PathBuf,

    /// Bounded wait applied to every outbound HTTP call
    pub http_timeout_secs: u64,

    pub temperature_unit: TemperatureUnit,
}

fn default_history_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("jarvis")
        .join("history")
}

impl Default for JarvisConfig {
    fn default() -> Self {
        let intent_defaults = IntentDefaults::default();
        Self {
            port: 3000,
            openai_key: None,
            openai_model: OPENAI_MODEL.to_string(),
            openai_base_url: OPENAI_BASE_URL.to_string(),
            serpapi_key: None,
            default_language: Language::En,
            default_place: intent_defaults.place,
            default_subject: intent_defaults.subject,
            history_dir: default_history_dir(),
            http_timeout_secs: 15,
            temperature_unit: TemperatureUnit::Celsius,
        }
    }
}

impl JarvisConfig {
    /// Load from `path` (or `jarvis.toml` if present), then apply the process environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a TOML config file; missing keys keep their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read: {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("Failed to parse: {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid config TOML")
    }

    /// Overlay values from an environment lookup
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("PORT") {
            self.port = v.trim().parse().with_context(|| format!("Invalid PORT: {}", v))?;
        }
        if let Some(v) = get("OPENAI_KEY") {
            self.openai_key = Some(v);
        }
        if let Some(v) = get("OPENAI_MODEL") {
            self.openai_model = v;
        }
        if let Some(v) = get("OPENAI_BASE_URL") {
            self.openai_base_url = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = get("SERPAPI_KEY") {
            self.serpapi_key = Some(v);
        }
        if let Some(v) = get("JARVIS_DEFAULT_LANG") {
            self.default_language = Language::parse(&v)
                .with_context(|| format!("Invalid JARVIS_DEFAULT_LANG: {} (expected ro or en)", v))?;
        }
        if let Some(v) = get("JARVIS_DEFAULT_PLACE") {
            self.default_place = v;
        }
        if let Some(v) = get("JARVIS_DEFAULT_SUBJECT") {
            self.default_subject = v;
        }
        if let Some(v) = get("JARVIS_HISTORY_DIR") {
            self.history_dir = PathBuf::from(v);
        }
        if let Some(v) = get("HTTP_TIMEOUT_SECS") {
            self.http_timeout_secs = v
                .trim()
                .parse()
                .with_context(|| format!("Invalid HTTP_TIMEOUT_SECS: {}", v))?;
        }
        if let Some(v) = get("TEMPERATURE_UNIT") {
            self.temperature_unit = TemperatureUnit::from_str(&v);
        }

        Ok(())
    }

    pub fn intent_defaults(&self) -> IntentDefaults {
        IntentDefaults {
            place: self.default_place.clone(),
            subject: self.default_subject.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = JarvisConfig::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.openai_model, "gpt-4o-mini");
        assert_eq!(config.default_language, Language::En);
        assert_eq!(config.default_place, "București");
        assert!(config.openai_key.is_none());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = JarvisConfig::from_toml(
            r#"
            default_language = "ro"
            default_place = "Cluj-Napoca"
            temperature_unit = "fahrenheit"
            "#,
        )
        .unwrap();
        assert_eq!(config.default_language, Language::Ro);
        assert_eq!(config.default_place, "Cluj-Napoca");
        assert_eq!(config.temperature_unit, TemperatureUnit::Fahrenheit);
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = JarvisConfig::from_toml("port = 8080\ndefault_language = \"en\"").unwrap();
        let env = env_of(&[
            ("PORT", "9000"),
            ("OPENAI_KEY", "sk-test"),
            ("SERPAPI_KEY", "serp"),
            ("JARVIS_DEFAULT_LANG", "ro"),
            ("OPENAI_BASE_URL", "http://localhost:8000/v1/"),
            ("TEMPERATURE_UNIT", "F"),
        ]);
        config.apply_env(|k| env.get(k).cloned()).unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.openai_key.as_deref(), Some("sk-test"));
        assert_eq!(config.serpapi_key.as_deref(), Some("serp"));
        assert_eq!(config.default_language, Language::Ro);
        assert_eq!(config.openai_base_url, "http://localhost:8000/v1");
        assert_eq!(config.temperature_unit, TemperatureUnit::Fahrenheit);
    }

    #[test]
    fn test_blank_env_values_are_ignored() {
        let mut config = JarvisConfig::default();
        let env = env_of(&[("OPENAI_KEY", "  ")]);
        config.apply_env(|k| env.get(k).cloned()).unwrap();
        assert!(config.openai_key.is_none());
    }

    #[test]
    fn test_invalid_language_is_an_error() {
        let mut config = JarvisConfig::default();
        let env = env_of(&[("JARVIS_DEFAULT_LANG", "de")]);
        let err = config.apply_env(|k| env.get(k).cloned()).unwrap_err();
        assert!(err.to_string().contains("JARVIS_DEFAULT_LANG"));
    }

    #[test]
    fn test_intent_defaults_follow_config() {
        let mut config = JarvisConfig::default();
        config.default_place = "Timișoara".to_string();
        config.default_subject = "Dacia".to_string();
        let defaults = config.intent_defaults();
        assert_eq!(defaults.place, "Timișoara");
        assert_eq!(defaults.subject, "Dacia");
    }
}
