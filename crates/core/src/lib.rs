//! Jarvis Core Library
//!
//! Bilingual (Romanian/English) chat assistant behind a messaging webhook:
//! - Language detection and keyword intent routing
//! - Weather, encyclopedia, web search and general chat collaborators
//! - Response composition with per-sender conversation history
//! - Axum transport for the gateway webhook

pub mod error;
pub mod types;

pub mod config;
pub mod intent;
pub mod lang;
pub mod reply;

pub mod geocode;
pub mod history;
pub mod llm;
pub mod search;
pub mod weather;
pub mod wiki;

pub mod composer;
pub mod webhook;

// Re-export commonly used types at crate root
pub use composer::{Collaborators, Composer, ComposerSettings};
pub use config::JarvisConfig;
pub use error::{JarvisError, Result};
pub use intent::{classify, IntentDefaults};
pub use lang::detect;
pub use types::{ChatRole, ChatTurn, InboundMessage, Intent, Language, Timeframe};
