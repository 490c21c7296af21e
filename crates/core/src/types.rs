//! Domain models shared by the router, composer and transport
//!
//! This module contains the core types used throughout the assistant:
//! - Inbound messages and detected language
//! - Intent variants produced by the classifier
//! - Conversation turns stored in history
//! - Locations and forecast values returned by collaborators

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Inbound Message & Language
// ============================================================================

/// A message received from the messaging gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub sender_id: String,
    pub text: String,
}

impl InboundMessage {
    pub fn new(sender_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            sender_id: sender_id.into(),
            text: text.into(),
        }
    }
}

/// Language of a message; drives reply templates and provider hints
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Ro,
    #[default]
    En,
}

impl Language {
    /// ISO 639-1 code, used for Wikipedia hosts and search hints
    pub fn code(&self) -> &'static str {
        match self {
            Language::Ro => "ro",
            Language::En => "en",
        }
    }

    /// Parse from a config/env string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "ro" | "romanian" | "română" | "romana" => Some(Language::Ro),
            "en" | "english" => Some(Language::En),
            _ => None,
        }
    }
}

// ============================================================================
// Intent
// ============================================================================

/// When a weather query is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timeframe {
    Now,
    Tomorrow,
}

/// Classified purpose of an inbound message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Intent {
    Weather { timeframe: Timeframe, place: String },
    Encyclopedia { subject: String },
    WebSearch { query: String },
    GeneralChat { query: String },
}

impl Intent {
    /// Short name for log fields
    pub fn name(&self) -> &'static str {
        match self {
            Intent::Weather { .. } => "weather",
            Intent::Encyclopedia { .. } => "encyclopedia",
            Intent::WebSearch { .. } => "web_search",
            Intent::GeneralChat { .. } => "general_chat",
        }
    }
}

// ============================================================================
// Conversation History
// ============================================================================

/// Role of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

/// A single conversation turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

// ============================================================================
// Collaborator Values
// ============================================================================

/// Geocoded place
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    /// Canonical name as returned by the geocoder
    pub name: String,
}

/// Current conditions; any field may be missing from the provider
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurrentConditions {
    pub temperature: Option<f64>,
    pub apparent_temperature: Option<f64>,
    pub wind_speed: Option<f64>,
}

/// Next-day aggregate; any field may be missing from the provider
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailyOutlook {
    pub temperature_min: Option<f64>,
    pub temperature_max: Option<f64>,
    /// Maximum precipitation probability, percent
    pub precipitation_probability: Option<f64>,
    pub wind_speed_max: Option<f64>,
}

/// One search engine result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub link: String,
}
