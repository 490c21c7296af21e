//! Response composition
//!
//! Detects the language, classifies the message, calls the one collaborator
//! category the intent needs and renders the reply. Every collaborator error
//! is caught at the branch boundary and replaced by a fixed apology in the
//! sender's language, so `respond` never fails.

use anyhow::{Context, Result as AnyResult};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::JarvisConfig;
use crate::error::{JarvisError, Result};
use crate::geocode::{Geocoder, OpenMeteoGeocoder};
use crate::history::{FileHistoryStore, HistoryStore};
use crate::intent::{classify, IntentDefaults};
use crate::lang::detect;
use crate::llm::{CompletionRequest, CompletionService, OpenAiChat};
use crate::reply;
use crate::search::{
    domain_of, source_domains, sources_block, strip_markup, HttpPageFetcher, PageFetcher,
    SearchService, SerpApiSearch, SourceText, MAX_PAGES, PAGE_TEXT_MAX_CHARS,
};
use crate::types::{ChatTurn, InboundMessage, Intent, Language, Timeframe};
use crate::weather::{format_current, format_tomorrow, ForecastService, OpenMeteoForecast, TemperatureUnit};
use crate::wiki::{truncate_summary, Encyclopedia, WikipediaSummary, SUMMARY_MAX_CHARS};

const USER_AGENT: &str = concat!("jarvis/", env!("CARGO_PKG_VERSION"));

/// External services the composer depends on
#[derive(Clone)]
pub struct Collaborators {
    pub completion: Arc<dyn CompletionService>,
    pub geocoder: Arc<dyn Geocoder>,
    pub forecast: Arc<dyn ForecastService>,
    pub encyclopedia: Arc<dyn Encyclopedia>,
    pub search: Arc<dyn SearchService>,
    pub pages: Arc<dyn PageFetcher>,
    pub history: Arc<dyn HistoryStore>,
}

impl Collaborators {
    /// HTTP-backed collaborators sharing one client with a uniform timeout
    pub fn from_config(config: &JarvisConfig) -> AnyResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            completion: Arc::new(OpenAiChat::new(
                client.clone(),
                config.openai_base_url.clone(),
                config.openai_model.clone(),
                config.openai_key.clone(),
            )),
            geocoder: Arc::new(OpenMeteoGeocoder::new(client.clone())),
            forecast: Arc::new(OpenMeteoForecast::new(client.clone(), config.temperature_unit)),
            encyclopedia: Arc::new(WikipediaSummary::new(client.clone())),
            search: Arc::new(SerpApiSearch::new(client.clone(), config.serpapi_key.clone())),
            pages: Arc::new(HttpPageFetcher::new(client)),
            history: Arc::new(FileHistoryStore::new(config.history_dir.clone())),
        })
    }
}

/// Policy values the composer needs from configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ComposerSettings {
    pub default_language: Language,
    pub intent_defaults: IntentDefaults,
    pub temperature_unit: TemperatureUnit,
}

impl Default for ComposerSettings {
    fn default() -> Self {
        Self {
            default_language: Language::En,
            intent_defaults: IntentDefaults::default(),
            temperature_unit: TemperatureUnit::Celsius,
        }
    }
}

impl From<&JarvisConfig> for ComposerSettings {
    fn from(config: &JarvisConfig) -> Self {
        Self {
            default_language: config.default_language,
            intent_defaults: config.intent_defaults(),
            temperature_unit: config.temperature_unit,
        }
    }
}

/// Turns inbound messages into replies
pub struct Composer {
    services: Collaborators,
    settings: ComposerSettings,
}

impl Composer {
    pub fn new(services: Collaborators, settings: ComposerSettings) -> Self {
        Self { services, settings }
    }

    pub fn from_config(config: &JarvisConfig) -> AnyResult<Self> {
        Ok(Self::new(Collaborators::from_config(config)?, config.into()))
    }

    pub fn detect_language(&self, text: &str) -> Language {
        detect(text, self.settings.default_language)
    }

    pub fn classify(&self, text: &str) -> Intent {
        classify(text, &self.settings.intent_defaults)
    }

    /// Produce a reply for one inbound message; never fails
    pub async fn respond(&self, message: &InboundMessage) -> String {
        let lang = self.detect_language(&message.text);
        let intent = self.classify(&message.text);

        info!(
            sender = %message.sender_id,
            intent = intent.name(),
            lang = lang.code(),
            "handling message"
        );

        let reply = match &intent {
            Intent::Weather { timeframe, place } => self.weather(*timeframe, place, lang).await,
            Intent::Encyclopedia { subject } => self.encyclopedia(subject, lang).await,
            Intent::WebSearch { query } => self.web_search(query, lang).await,
            Intent::GeneralChat { query } => {
                self.general_chat(&message.sender_id, query, lang).await
            }
        };

        let exchange = vec![ChatTurn::user(message.text.clone()), ChatTurn::assistant(reply.clone())];
        if let Err(e) = self.services.history.append(&message.sender_id, exchange).await {
            warn!(sender = %message.sender_id, error = %e, "failed to record history");
        }

        reply
    }

    /// Map a branch error to its user-facing string
    fn fallback(&self, branch: &str, err: JarvisError, lang: Language, apology: &str) -> String {
        warn!(branch, error = %err, "collaborator failed");
        match err {
            JarvisError::ConfigMissing(var) => reply::config_missing(var, lang),
            _ => apology.to_string(),
        }
    }

    // ========================================================================
    // Weather
    // ========================================================================

    async fn weather(&self, timeframe: Timeframe, place: &str, lang: Language) -> String {
        match self.try_weather(timeframe, place, lang).await {
            Ok(text) => text,
            Err(e) => self.fallback("weather", e, lang, reply::weather_unavailable(lang)),
        }
    }

    async fn try_weather(&self, timeframe: Timeframe, place: &str, lang: Language) -> Result<String> {
        let location = self
            .services
            .geocoder
            .locate(place, lang)
            .await?
            .ok_or_else(|| JarvisError::EmptyResult(format!("no location named '{}'", place)))?;

        let unit = self.settings.temperature_unit;
        match timeframe {
            Timeframe::Now => {
                let conditions = self.services.forecast.current(&location).await?;
                Ok(format_current(&location.name, &conditions, unit, lang))
            }
            Timeframe::Tomorrow => {
                let outlook = self.services.forecast.tomorrow(&location).await?;
                Ok(format_tomorrow(&location.name, &outlook, unit, lang))
            }
        }
    }

    // ========================================================================
    // Encyclopedia
    // ========================================================================

    async fn encyclopedia(&self, subject: &str, lang: Language) -> String {
        match self.services.encyclopedia.summary(subject, lang).await {
            Ok(Some(extract)) => truncate_summary(&extract, SUMMARY_MAX_CHARS),
            Ok(None) => reply::encyclopedia_not_found(lang).to_string(),
            Err(e) => self.fallback("encyclopedia", e, lang, reply::encyclopedia_unavailable(lang)),
        }
    }

    // ========================================================================
    // Web Search
    // ========================================================================

    async fn web_search(&self, query: &str, lang: Language) -> String {
        match self.try_web_search(query, lang).await {
            Ok(text) => text,
            Err(e) => self.fallback("web_search", e, lang, reply::search_failed(lang)),
        }
    }

    async fn try_web_search(&self, query: &str, lang: Language) -> Result<String> {
        let hits = self.services.search.search(query, lang).await?.select();
        if hits.is_empty() {
            return Err(JarvisError::EmptyResult("search returned no results".to_string()));
        }

        let mut sources = Vec::new();
        for hit in hits.iter().take(MAX_PAGES) {
            match self.services.pages.fetch(&hit.link).await {
                Ok(html) => {
                    let text = strip_markup(&html, PAGE_TEXT_MAX_CHARS);
                    if text.is_empty() {
                        debug!(url = %hit.link, "page had no text");
                        continue;
                    }
                    sources.push(SourceText {
                        domain: domain_of(&hit.link),
                        text,
                    });
                }
                Err(e) => debug!(url = %hit.link, error = %e, "skipping page"),
            }
        }

        if sources.is_empty() {
            return Err(JarvisError::EmptyResult("no fetchable result pages".to_string()));
        }

        let request = CompletionRequest::new(
            reply::synthesis_instruction(lang, &source_domains(&sources)),
            format!("Question: {}\n\n{}", query, sources_block(&sources)),
        );
        self.services.completion.complete(&request).await
    }

    // ========================================================================
    // General Chat
    // ========================================================================

    async fn general_chat(&self, sender_id: &str, query: &str, lang: Language) -> String {
        let history = match self.services.history.load(sender_id).await {
            Ok(history) => history,
            Err(e) => {
                warn!(sender = %sender_id, error = %e, "failed to load history");
                Vec::new()
            }
        };

        let request = CompletionRequest::new(reply::chat_instruction(lang), query).with_history(history);
        match self.services.completion.complete(&request).await {
            Ok(text) => text,
            Err(e) => self.fallback("general_chat", e, lang, reply::chat_failed(lang)),
        }
    }
}
