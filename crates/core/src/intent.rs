//! Keyword-based intent classification
//!
//! Rules are evaluated in order and the first match wins. Categories overlap
//! (a weather question often mentions "today"), so the order is the policy.

use regex::Regex;
use std::sync::OnceLock;

use crate::types::{Intent, Timeframe};

/// Values substituted when a message names no place or subject
#[derive(Debug, Clone, PartialEq)]
pub struct IntentDefaults {
    pub place: String,
    pub subject: String,
}

impl Default for IntentDefaults {
    fn default() -> Self {
        Self {
            place: "București".to_string(),
            subject: "România".to_string(),
        }
    }
}

// ============================================================================
// Keyword Sets
// ============================================================================

fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("Invalid regex"))
}

/// Stems match inflected forms (vremea, temperatura); "grade" and "degrees"
/// must be whole words so "upgrade" and "grades" stay out
fn weather_keywords() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(
        &RE,
        r"(?i)\b(vreme|temperatur|weather|forecast)|\b(grade|degrees)\b",
    )
}

fn tomorrow_keywords() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"(?i)(mâine|maine|tomorrow)")
}

/// "in|în|la <place>" up to the next punctuation mark
fn place_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"(?i)\b(?:in|în|la)\s+([^,.;:!?]+)")
}

fn wiki_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"(?i)^wiki(?:\s+|$)")
}

fn population_keywords() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(
        &RE,
        r"(?i)\w*(populați|populati|population|locuitori|inhabitants)\w*",
    )
}

/// Question filler left behind once a population keyword is removed
fn population_filler() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(
        &RE,
        r"(?i)\b(what|what's|is|the|of|how|many|much|câți|cati|câtă|cata|are|has|have|ce|care|este|e|din|a|al|in|în)\b",
    )
}

fn live_info_keywords() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(
        &RE,
        r"(?i)\b(program|programul|orar|orarul|scor|scorul|meci|meciul|pret|preț|pretul|prețul|curs|cursul|știri|stiri|news|score|scores|price|prices|schedule|result|results|rezultat|rezultatul|rezultatele|latest|live|today|tonight|tomorrow|now|azi|astăzi|astazi|mâine|maine|acum|exchange rate)\b",
    )
}

/// Words that end a captured place ("in Paris tomorrow")
const PLACE_END_WORDS: &[&str] = &[
    "today", "tomorrow", "now", "tonight", "azi", "astăzi", "astazi", "mâine", "maine", "acum",
    "diseară", "diseara",
];

// ============================================================================
// Extraction
// ============================================================================

/// Extract the place from "in <city>", "în <city>" or "la <city>"
fn extract_place(text: &str) -> Option<String> {
    let caps = place_pattern().captures(text)?;
    let raw = caps.get(1)?.as_str();

    let words: Vec<&str> = raw
        .split_whitespace()
        .take_while(|w| !PLACE_END_WORDS.contains(&w.to_lowercase().as_str()))
        .collect();

    let place = words.join(" ");
    if place.is_empty() {
        None
    } else {
        Some(place)
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip the lookup trigger(s) from the text to get the encyclopedia subject
fn extract_subject(text: &str) -> String {
    if wiki_prefix().is_match(text) {
        let rest = wiki_prefix().replace(text, "");
        return rest.trim().trim_end_matches('?').trim().to_string();
    }

    let without_keyword = population_keywords().replace_all(text, " ");
    let without_filler = population_filler().replace_all(&without_keyword, " ");
    collapse_whitespace(&without_filler)
        .trim_matches(|c: char| c.is_ascii_punctuation() || c.is_whitespace())
        .to_string()
}

// ============================================================================
// Ordered Rules
// ============================================================================

/// One classification rule: a predicate and the intent it builds
struct Rule {
    name: &'static str,
    matches: fn(&str) -> bool,
    build: fn(&str, &IntentDefaults) -> Intent,
}

/// Priority order: weather, encyclopedia, web search; chat is the fallback
const RULES: &[Rule] = &[
    Rule {
        name: "weather",
        matches: |t| weather_keywords().is_match(t),
        build: |t, defaults| Intent::Weather {
            timeframe: if tomorrow_keywords().is_match(t) {
                Timeframe::Tomorrow
            } else {
                Timeframe::Now
            },
            place: extract_place(t).unwrap_or_else(|| defaults.place.clone()),
        },
    },
    Rule {
        name: "encyclopedia",
        matches: |t| wiki_prefix().is_match(t) || population_keywords().is_match(t),
        build: |t, defaults| {
            let subject = extract_subject(t);
            Intent::Encyclopedia {
                subject: if subject.is_empty() {
                    defaults.subject.clone()
                } else {
                    subject
                },
            }
        },
    },
    Rule {
        name: "web_search",
        matches: |t| live_info_keywords().is_match(t),
        build: |t, _| Intent::WebSearch {
            query: t.to_string(),
        },
    },
];

/// Classify an inbound text into exactly one intent
pub fn classify(text: &str, defaults: &IntentDefaults) -> Intent {
    let t = text.trim();

    for rule in RULES {
        if (rule.matches)(t) {
            tracing::debug!(rule = rule.name, "intent rule matched");
            return (rule.build)(t, defaults);
        }
    }

    Intent::GeneralChat {
        query: t.to_string(),
    }
}
