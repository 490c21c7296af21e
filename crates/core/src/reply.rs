//! Fixed user-facing strings and system instructions, per language

use crate::types::Language;

/// Persona shared by every completion call
const PERSONA: &str = "You are Jarvis, a helpful AI assistant. Always reply in the same language as the user input. If the user writes in Romanian, answer naturally in Romanian. If the user writes in English, answer in English. Keep answers clear, concise, and contextual.";

pub fn weather_unavailable(lang: Language) -> &'static str {
    match lang {
        Language::Ro => "Îmi pare rău, nu am putut obține vremea acum. Încearcă din nou mai târziu.",
        Language::En => "Sorry, I couldn't get the weather right now. Please try again later.",
    }
}

pub fn encyclopedia_not_found(lang: Language) -> &'static str {
    match lang {
        Language::Ro => "Nu am găsit nimic pe Wikipedia despre asta.",
        Language::En => "I couldn't find anything on Wikipedia about that.",
    }
}

pub fn encyclopedia_unavailable(lang: Language) -> &'static str {
    match lang {
        Language::Ro => "Îmi pare rău, Wikipedia nu răspunde acum.",
        Language::En => "Sorry, Wikipedia isn't answering right now.",
    }
}

pub fn search_failed(lang: Language) -> &'static str {
    match lang {
        Language::Ro => "Îmi pare rău, nu am găsit informații actuale despre asta.",
        Language::En => "Sorry, I couldn't find up-to-date information about that.",
    }
}

pub fn chat_failed(lang: Language) -> &'static str {
    match lang {
        Language::Ro => "Eroare la Jarvis 🤖",
        Language::En => "Jarvis error 🤖",
    }
}

/// Instructive message for a credential the chosen branch cannot work without
pub fn config_missing(variable: &str, lang: Language) -> String {
    match (variable, lang) {
        ("SERPAPI_KEY", Language::Ro) => {
            "Căutarea web nu este configurată: setează SERPAPI_KEY pentru a o activa.".to_string()
        }
        ("SERPAPI_KEY", Language::En) => {
            "Web search isn't configured: set SERPAPI_KEY to enable it.".to_string()
        }
        (var, Language::Ro) => format!("Jarvis nu este configurat complet: lipsește {}.", var),
        (var, Language::En) => format!("Jarvis isn't fully configured: {} is missing.", var),
    }
}

/// System instruction for general chat
pub fn chat_instruction(lang: Language) -> String {
    let hint = match lang {
        Language::Ro => "The user is writing in Romanian; answer in Romanian.",
        Language::En => "The user is writing in English; answer in English.",
    };
    format!("{} {}", PERSONA, hint)
}

/// System instruction for answering from fetched search sources
pub fn synthesis_instruction(lang: Language, domains: &str) -> String {
    let (language, label) = match lang {
        Language::Ro => ("Romanian", "Surse"),
        Language::En => ("English", "Sources"),
    };
    format!(
        "{} Answer the user's question in {} using only the sources provided below. \
         Be concise (at most a few sentences) and say so if the sources do not contain the answer. \
         Finish with a final line exactly of the form \"{}: {}\".",
        PERSONA, language, label, domains
    )
}
